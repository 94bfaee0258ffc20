use super::ResourceRegistry;

use raycomp_backend::Device;

pub struct RenderPassApi<'a> {
    pub(crate) device: &'a dyn Device,
    pub resources: &'a ResourceRegistry,
}

impl<'a> RenderPassApi<'a> {
    pub fn device(&self) -> &'a dyn Device {
        self.device
    }
}
