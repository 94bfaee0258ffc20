use crate::{
    access::AccessType,
    image::{Image, ImageDesc},
    ray_tracing::{
        RayTracingAcceleration, RayTracingInstanceDesc, RayTracingKernelDesc,
        RayTracingTopAccelerationDesc, TraceRaysParams,
    },
    BackendError,
};

pub enum BarrierTarget<'a> {
    Image(&'a Image),
    RayTracingAcceleration(&'a RayTracingAcceleration),
}

/// The GPU as seen by the compositor.
///
/// Every method only enqueues work; nothing blocks on the GPU. Ordering between
/// enqueued commands is the render graph's responsibility, expressed through
/// `record_barrier`.
pub trait Device: Send + Sync {
    fn create_image(&self, desc: ImageDesc) -> Result<Image, BackendError>;

    /// The image must not be used by any command recorded after this call.
    fn release_image(&self, image: &Image);

    fn create_ray_tracing_top_acceleration(
        &self,
        desc: &RayTracingTopAccelerationDesc,
    ) -> Result<RayTracingAcceleration, BackendError>;

    fn release_ray_tracing_acceleration(&self, accel: &RayTracingAcceleration);

    /// Rebuilds `tlas` in place from updated instance records.
    ///
    /// The instance count must match the one the structure was created with.
    fn rebuild_ray_tracing_top_acceleration(
        &self,
        tlas: &RayTracingAcceleration,
        instances: &[RayTracingInstanceDesc],
    ) -> Result<(), BackendError>;

    /// Launches one ray generation invocation per element of `extent`.
    fn trace_rays(
        &self,
        kernel: &RayTracingKernelDesc,
        params: &TraceRaysParams,
        extent: [u32; 3],
    ) -> Result<(), BackendError>;

    fn copy_image(&self, src: &Image, dst: &Image) -> Result<(), BackendError>;

    fn record_barrier(&self, target: BarrierTarget, prev: AccessType, next: AccessType);
}
