//! A device that executes nothing but keeps exact books.
//!
//! Every allocation, release and enqueued command is recorded, which makes it
//! usable as a headless backend and as the reference device in tests.

use std::collections::HashMap;

use parking_lot::Mutex;

use crate::{
    access::AccessType,
    device::{BarrierTarget, Device},
    image::{Image, ImageDesc, ImageId},
    ray_tracing::{
        AccelerationId, RayTracingAcceleration, RayTracingInstanceDesc, RayTracingKernelDesc,
        RayTracingTopAccelerationDesc, TraceRaysParams,
    },
    BackendError,
};

#[derive(Clone, Debug, PartialEq)]
pub enum NullCommand {
    CreateImage {
        image: ImageId,
        desc: ImageDesc,
    },
    ReleaseImage {
        image: ImageId,
    },
    CreateAcceleration {
        accel: AccelerationId,
        instance_count: usize,
    },
    ReleaseAcceleration {
        accel: AccelerationId,
    },
    RebuildAcceleration {
        accel: AccelerationId,
        instances: Vec<RayTracingInstanceDesc>,
    },
    TraceRays {
        kernel: String,
        acceleration_slot: String,
        accel: AccelerationId,
        output: ImageId,
        inputs: Vec<ImageId>,
        zoom: f32,
        frame_index: u32,
        convergence_step: u32,
        extent: [u32; 3],
    },
    CopyImage {
        src: ImageId,
        dst: ImageId,
    },
    Barrier {
        resource: u64,
        prev: AccessType,
        next: AccessType,
    },
}

#[derive(Default)]
struct NullDeviceState {
    next_id: u64,
    live_images: HashMap<ImageId, ImageDesc>,
    live_accels: HashMap<AccelerationId, Vec<RayTracingInstanceDesc>>,
    image_allocation_count: usize,
    commands: Vec<NullCommand>,
    fail_allocations: bool,
}

impl NullDeviceState {
    fn next_id(&mut self) -> u64 {
        self.next_id += 1;
        self.next_id
    }

    fn check_live_image(&self, image: &Image, what: &str) -> Result<(), BackendError> {
        if self.live_images.contains_key(&image.raw) {
            Ok(())
        } else {
            Err(BackendError::ResourceAccess {
                info: format!("{} {:?} is not a live image", what, image.raw),
            })
        }
    }
}

#[derive(Default)]
pub struct NullDevice {
    state: Mutex<NullDeviceState>,
}

impl NullDevice {
    pub fn new() -> Self {
        Self::default()
    }

    /// Makes every subsequent image allocation fail, simulating device memory exhaustion.
    pub fn set_fail_allocations(&self, fail: bool) {
        self.state.lock().fail_allocations = fail;
    }

    pub fn live_image_count(&self) -> usize {
        self.state.lock().live_images.len()
    }

    pub fn is_image_live(&self, image: ImageId) -> bool {
        self.state.lock().live_images.contains_key(&image)
    }

    pub fn image_allocation_count(&self) -> usize {
        self.state.lock().image_allocation_count
    }

    pub fn live_acceleration_count(&self) -> usize {
        self.state.lock().live_accels.len()
    }

    /// Instance records as of the most recent build of `accel`.
    pub fn acceleration_instances(
        &self,
        accel: AccelerationId,
    ) -> Option<Vec<RayTracingInstanceDesc>> {
        self.state.lock().live_accels.get(&accel).cloned()
    }

    pub fn commands(&self) -> Vec<NullCommand> {
        self.state.lock().commands.clone()
    }

    pub fn take_commands(&self) -> Vec<NullCommand> {
        std::mem::take(&mut self.state.lock().commands)
    }
}

impl Device for NullDevice {
    fn create_image(&self, desc: ImageDesc) -> Result<Image, BackendError> {
        log::trace!("Creating an image: {:?}", desc);

        let mut state = self.state.lock();
        if state.fail_allocations || desc.is_empty() {
            return Err(BackendError::Allocation {
                name: "image".to_owned(),
                reason: format!("cannot allocate {:?}", desc.extent),
            });
        }

        let image = ImageId(state.next_id());
        state.live_images.insert(image, desc);
        state.image_allocation_count += 1;
        state.commands.push(NullCommand::CreateImage { image, desc });

        Ok(Image { raw: image, desc })
    }

    fn release_image(&self, image: &Image) {
        let mut state = self.state.lock();
        if state.live_images.remove(&image.raw).is_some() {
            state
                .commands
                .push(NullCommand::ReleaseImage { image: image.raw });
        } else {
            log::warn!("Releasing an image that is not live: {:?}", image.raw);
        }
    }

    fn create_ray_tracing_top_acceleration(
        &self,
        desc: &RayTracingTopAccelerationDesc,
    ) -> Result<RayTracingAcceleration, BackendError> {
        log::trace!(
            "Creating ray tracing top acceleration with {} instances",
            desc.instances.len()
        );

        let mut state = self.state.lock();
        let accel = AccelerationId(state.next_id());
        state.live_accels.insert(accel, desc.instances.clone());
        state.commands.push(NullCommand::CreateAcceleration {
            accel,
            instance_count: desc.instances.len(),
        });

        Ok(RayTracingAcceleration {
            raw: accel,
            instance_count: desc.instances.len(),
        })
    }

    fn release_ray_tracing_acceleration(&self, accel: &RayTracingAcceleration) {
        let mut state = self.state.lock();
        if state.live_accels.remove(&accel.raw).is_some() {
            state
                .commands
                .push(NullCommand::ReleaseAcceleration { accel: accel.raw });
        }
    }

    fn rebuild_ray_tracing_top_acceleration(
        &self,
        tlas: &RayTracingAcceleration,
        instances: &[RayTracingInstanceDesc],
    ) -> Result<(), BackendError> {
        let mut state = self.state.lock();

        let live = state.live_accels.get_mut(&tlas.raw).ok_or_else(|| {
            BackendError::AccelerationUpdate {
                info: format!("{:?} is not a live acceleration structure", tlas.raw),
            }
        })?;

        if live.len() != instances.len() {
            return Err(BackendError::AccelerationUpdate {
                info: format!(
                    "{:?} was built with {} instances, got {}",
                    tlas.raw,
                    live.len(),
                    instances.len()
                ),
            });
        }

        live.copy_from_slice(instances);
        state.commands.push(NullCommand::RebuildAcceleration {
            accel: tlas.raw,
            instances: instances.to_vec(),
        });

        Ok(())
    }

    fn trace_rays(
        &self,
        kernel: &RayTracingKernelDesc,
        params: &TraceRaysParams,
        extent: [u32; 3],
    ) -> Result<(), BackendError> {
        let mut state = self.state.lock();

        state.check_live_image(params.output, "Ray tracing output")?;
        for input in params.input_images() {
            state.check_live_image(input, "Ray tracing input")?;
        }

        if !params.output.desc.is_storage() {
            return Err(BackendError::ResourceAccess {
                info: format!(
                    "Ray tracing output {:?} does not support random writes",
                    params.output.raw
                ),
            });
        }

        if !state.live_accels.contains_key(&params.acceleration.raw) {
            return Err(BackendError::ResourceAccess {
                info: format!(
                    "{:?} is not a live acceleration structure",
                    params.acceleration.raw
                ),
            });
        }

        state.commands.push(NullCommand::TraceRays {
            kernel: kernel.name.clone(),
            acceleration_slot: params.acceleration_slot.to_owned(),
            accel: params.acceleration.raw,
            output: params.output.raw,
            inputs: params.input_images().map(|img| img.raw).collect(),
            zoom: params.zoom,
            frame_index: params.frame_index,
            convergence_step: params.convergence_step,
            extent,
        });

        Ok(())
    }

    fn copy_image(&self, src: &Image, dst: &Image) -> Result<(), BackendError> {
        let mut state = self.state.lock();

        state.check_live_image(src, "Copy source")?;
        state.check_live_image(dst, "Copy destination")?;

        if src.extent_2d() != dst.extent_2d() {
            return Err(BackendError::ResourceAccess {
                info: format!(
                    "Copy extent mismatch: {:?} -> {:?}",
                    src.extent_2d(),
                    dst.extent_2d()
                ),
            });
        }

        state.commands.push(NullCommand::CopyImage {
            src: src.raw,
            dst: dst.raw,
        });

        Ok(())
    }

    fn record_barrier(&self, target: BarrierTarget, prev: AccessType, next: AccessType) {
        let resource = match target {
            BarrierTarget::Image(image) => image.raw.0,
            BarrierTarget::RayTracingAcceleration(accel) => accel.raw.0,
        };

        self.state.lock().commands.push(NullCommand::Barrier {
            resource,
            prev,
            next,
        });
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::ash::vk;
    use glam::{Affine3A, Vec3};

    fn storage_desc(extent: [u32; 2]) -> ImageDesc {
        ImageDesc::new_2d(vk::Format::R16G16B16A16_SFLOAT, extent)
            .usage(vk::ImageUsageFlags::STORAGE | vk::ImageUsageFlags::TRANSFER_SRC)
    }

    fn instance(id: u64, x: f32) -> RayTracingInstanceDesc {
        RayTracingInstanceDesc {
            instance_id: id,
            transformation: Affine3A::from_translation(Vec3::new(x, 0.0, 0.0)),
            material_index: 0,
            mask: 0xff,
        }
    }

    #[test]
    fn tracks_live_images() {
        let device = NullDevice::new();
        let a = device.create_image(storage_desc([4, 4])).unwrap();
        let b = device.create_image(storage_desc([8, 8])).unwrap();
        assert_ne!(a.raw, b.raw);
        assert_eq!(device.live_image_count(), 2);

        device.release_image(&a);
        assert_eq!(device.live_image_count(), 1);
        assert!(!device.is_image_live(a.raw));
        assert_eq!(device.image_allocation_count(), 2);
    }

    #[test]
    fn refuses_empty_images() {
        let device = NullDevice::new();
        assert!(device.create_image(storage_desc([0, 0])).is_err());
        assert_eq!(device.image_allocation_count(), 0);
    }

    #[test]
    fn rebuild_keeps_membership() {
        let device = NullDevice::new();
        let tlas = device
            .create_ray_tracing_top_acceleration(&RayTracingTopAccelerationDesc {
                instances: vec![instance(1, 0.0), instance(2, 0.0)],
            })
            .unwrap();

        device
            .rebuild_ray_tracing_top_acceleration(&tlas, &[instance(1, 3.0), instance(2, 4.0)])
            .unwrap();

        let placed = device.acceleration_instances(tlas.raw).unwrap();
        assert_eq!(placed[0].transformation.translation.x, 3.0);
        assert_eq!(placed[1].transformation.translation.x, 4.0);

        assert!(device
            .rebuild_ray_tracing_top_acceleration(&tlas, &[instance(1, 0.0)])
            .is_err());
    }

    #[test]
    fn trace_rays_requires_storage_output() {
        let device = NullDevice::new();
        let tlas = device
            .create_ray_tracing_top_acceleration(&RayTracingTopAccelerationDesc {
                instances: vec![],
            })
            .unwrap();
        let sampled = device
            .create_image(
                ImageDesc::new_2d(vk::Format::R8G8B8A8_UNORM, [4, 4])
                    .usage(vk::ImageUsageFlags::SAMPLED),
            )
            .unwrap();

        let kernel = RayTracingKernelDesc {
            name: "test".to_owned(),
            raygen_entry: "MainRayGenShader".to_owned(),
            shader_pass: "RayTracingPass".to_owned(),
        };

        let params = TraceRaysParams {
            acceleration_slot: "g_SceneAccelStruct",
            acceleration: &tlas,
            output: &sampled,
            zoom: 1.0,
            frame_index: 0,
            convergence_step: 0,
            color: None,
            normal_smoothness: None,
            depth: None,
            motion: None,
            environment: None,
        };

        assert!(device.trace_rays(&kernel, &params, [4, 4, 1]).is_err());
    }
}
