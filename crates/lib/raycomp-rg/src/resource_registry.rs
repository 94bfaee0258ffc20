use super::resource::*;
use raycomp_backend::{access::AccessType, BackendError};
use std::sync::Arc;

pub enum AnyRenderResource {
    ImportedImage(Arc<Image>),
    ImportedRayTracingAcceleration(Arc<RayTracingAcceleration>),
}

impl AnyRenderResource {
    pub fn borrow(&self) -> AnyRenderResourceRef {
        match self {
            AnyRenderResource::ImportedImage(inner) => AnyRenderResourceRef::Image(inner.as_ref()),
            AnyRenderResource::ImportedRayTracingAcceleration(inner) => {
                AnyRenderResourceRef::RayTracingAcceleration(inner.as_ref())
            }
        }
    }
}

pub enum AnyRenderResourceRef<'a> {
    Image(&'a Image),
    RayTracingAcceleration(&'a RayTracingAcceleration),
}

pub(crate) struct RegistryResource {
    pub resource: AnyRenderResource,
    pub access_type: AccessType,
}

pub struct ResourceRegistry {
    pub(crate) resources: Vec<RegistryResource>,
}

impl ResourceRegistry {
    pub fn image<ViewType: GpuViewType>(
        &self,
        resource: Ref<Image, ViewType>,
    ) -> Result<&Image, BackendError> {
        self.get::<Image>(resource.handle)
    }

    pub fn rt_acceleration<ViewType: GpuViewType>(
        &self,
        resource: Ref<RayTracingAcceleration, ViewType>,
    ) -> Result<&RayTracingAcceleration, BackendError> {
        self.get::<RayTracingAcceleration>(resource.handle)
    }

    fn get<Res: Resource>(&self, handle: GraphRawResourceHandle) -> Result<&Res, BackendError> {
        self.resources
            .get(handle.id as usize)
            .and_then(|res| Res::borrow_resource(&res.resource))
            .ok_or_else(|| BackendError::ResourceAccess {
                info: format!("resource {} has an unexpected type", handle.id),
            })
    }
}
