pub use raycomp_backend::{
    image::{Image, ImageDesc},
    ray_tracing::RayTracingAcceleration,
};
use std::marker::PhantomData;

use super::resource_registry::{AnyRenderResource, AnyRenderResourceRef};

pub trait Resource {
    type Desc: ResourceDesc;

    fn borrow_resource(res: &AnyRenderResource) -> Option<&Self>;
}

impl Resource for Image {
    type Desc = ImageDesc;

    fn borrow_resource(res: &AnyRenderResource) -> Option<&Self> {
        match res.borrow() {
            AnyRenderResourceRef::Image(img) => Some(img),
            _ => None,
        }
    }
}

#[derive(Clone, Copy, Debug)]
pub struct RayTracingAccelerationDesc {
    pub instance_count: usize,
}

impl Resource for RayTracingAcceleration {
    type Desc = RayTracingAccelerationDesc;

    fn borrow_resource(res: &AnyRenderResource) -> Option<&Self> {
        match res.borrow() {
            AnyRenderResourceRef::RayTracingAcceleration(inner) => Some(inner),
            _ => None,
        }
    }
}

pub trait ResourceDesc: Clone + std::fmt::Debug {
    type Resource: Resource;
}

impl ResourceDesc for ImageDesc {
    type Resource = Image;
}

impl ResourceDesc for RayTracingAccelerationDesc {
    type Resource = RayTracingAcceleration;
}

#[derive(Clone, Copy, Eq, PartialEq, Hash, Debug)]
pub(crate) struct GraphRawResourceHandle {
    pub(crate) id: u32,
    pub(crate) version: u32,
}

impl GraphRawResourceHandle {
    pub(crate) fn next_version(self) -> Self {
        Self {
            id: self.id,
            version: self.version + 1,
        }
    }
}

/// Graph-local identity of a resource, stable across versions.
#[derive(Clone, Copy, Eq, PartialEq, Hash, Debug, PartialOrd, Ord)]
pub struct ResourceId(pub u32);

#[derive(Debug)]
pub struct Handle<ResType: Resource> {
    pub(crate) raw: GraphRawResourceHandle,
    pub(crate) desc: <ResType as Resource>::Desc,
    pub(crate) marker: PhantomData<ResType>,
}

impl<ResType: Resource> PartialEq for Handle<ResType> {
    fn eq(&self, other: &Self) -> bool {
        self.raw == other.raw
    }
}

impl<ResType: Resource> Eq for Handle<ResType> {}

impl<ResType: Resource> Handle<ResType> {
    pub fn desc(&self) -> &<ResType as Resource>::Desc {
        &self.desc
    }

    pub fn id(&self) -> ResourceId {
        ResourceId(self.raw.id)
    }
}

#[derive(Debug)]
pub struct Ref<ResType: Resource, ViewType: GpuViewType> {
    pub(crate) handle: GraphRawResourceHandle,
    pub(crate) desc: <ResType as Resource>::Desc,
    pub(crate) marker: PhantomData<(ResType, ViewType)>,
}

impl<ResType: Resource, ViewType: GpuViewType> Ref<ResType, ViewType> {
    pub fn desc(&self) -> &<ResType as Resource>::Desc {
        &self.desc
    }

    pub fn id(&self) -> ResourceId {
        ResourceId(self.handle.id)
    }
}

impl<ResType: Resource, ViewType: GpuViewType> Clone for Ref<ResType, ViewType>
where
    <ResType as Resource>::Desc: Clone,
{
    fn clone(&self) -> Self {
        Self {
            handle: self.handle,
            desc: self.desc.clone(),
            marker: PhantomData,
        }
    }
}

impl<ResType: Resource, ViewType: GpuViewType> Copy for Ref<ResType, ViewType> where
    <ResType as Resource>::Desc: Copy
{
}

#[derive(Clone, Copy, Debug)]
pub struct GpuSrv;
#[derive(Clone, Copy, Debug)]
pub struct GpuUav;

pub trait GpuViewType {
    const IS_WRITABLE: bool;
}
impl GpuViewType for GpuSrv {
    const IS_WRITABLE: bool = false;
}
impl GpuViewType for GpuUav {
    const IS_WRITABLE: bool = true;
}
