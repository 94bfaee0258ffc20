use crate::RenderPassApi;

use super::{
    graph::{PassResourceRef, RecordedPass, RenderGraph},
    resource::*,
};

use raycomp_backend::{access::AccessType, BackendError};
use std::marker::PhantomData;

pub struct PassBuilder<'rg> {
    pub(crate) rg: &'rg mut RenderGraph,
    pub(crate) pass: Option<RecordedPass>,
}

impl<'s> Drop for PassBuilder<'s> {
    fn drop(&mut self) {
        if let Some(pass) = self.pass.take() {
            self.rg.record_pass(pass)
        }
    }
}

impl<'rg> PassBuilder<'rg> {
    pub fn write<Res: Resource>(
        &mut self,
        handle: &mut Handle<Res>,
        access_type: AccessType,
    ) -> Ref<Res, GpuUav> {
        match access_type {
            AccessType::ComputeShaderWrite
            | AccessType::AnyShaderWrite
            | AccessType::TransferWrite
            | AccessType::ColorAttachmentWrite
            | AccessType::DepthStencilAttachmentWrite
            | AccessType::General => {}
            _ => {
                panic!("Invalid access type: {:?}", access_type);
            }
        }

        let pass = self.pass.as_mut().expect("pass already recorded");

        pass.write.push(PassResourceRef {
            handle: handle.raw,
            access_type,
        });

        // Subsequent users of the handle observe the written version.
        handle.raw = handle.raw.next_version();

        Ref {
            desc: handle.desc.clone(),
            handle: handle.raw,
            marker: PhantomData,
        }
    }

    pub fn read<Res: Resource>(
        &mut self,
        handle: &Handle<Res>,
        access_type: AccessType,
    ) -> Ref<Res, GpuSrv> {
        match access_type {
            AccessType::ComputeShaderReadSampledImageOrUniformTexelBuffer
            | AccessType::AnyShaderReadSampledImageOrUniformTexelBuffer
            | AccessType::AnyShaderReadOther
            | AccessType::ColorAttachmentRead
            | AccessType::DepthStencilAttachmentRead
            | AccessType::TransferRead
            | AccessType::Present => {}
            _ => {
                panic!("Invalid access type: {:?}", access_type);
            }
        }

        let pass = self.pass.as_mut().expect("pass already recorded");

        pass.read.push(PassResourceRef {
            handle: handle.raw,
            access_type,
        });

        Ref {
            desc: handle.desc.clone(),
            handle: handle.raw,
            marker: PhantomData,
        }
    }

    pub fn render(
        mut self,
        render: impl (FnOnce(&mut RenderPassApi) -> Result<(), BackendError>) + 'static,
    ) {
        let prev = self
            .pass
            .as_mut()
            .expect("pass already recorded")
            .render_fn
            .replace(Box::new(render));

        assert!(prev.is_none());
    }
}
