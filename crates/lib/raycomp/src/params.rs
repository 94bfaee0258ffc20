//! Typed parameter record for the ray generation kernel.

use raycomp_backend::{
    access::{AccessMode, AccessType},
    image::Image,
    ray_tracing::{RayTracingAcceleration, TraceRaysParams},
    BackendError,
};
use raycomp_rg::{self as rg, GpuSrv, GpuUav, PassBuilder, ResourceRegistry};
use serde::{Deserialize, Serialize};

use crate::{
    accel::AccelerationStructureBinding,
    camera::CameraDesc,
    dependencies::{FrameDependencyDeclaration, FrameSurface},
    error::RayTracingError,
    frame::Gbuffer,
};

#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum GbufferChannel {
    Albedo,
    NormalSmoothness,
    Depth,
    Motion,
}

impl GbufferChannel {
    pub fn surface(self) -> FrameSurface {
        match self {
            GbufferChannel::Albedo => FrameSurface::Albedo,
            GbufferChannel::NormalSmoothness => FrameSurface::NormalSmoothness,
            GbufferChannel::Depth => FrameSurface::Depth,
            GbufferChannel::Motion => FrameSurface::Motion,
        }
    }
}

/// Scalar kernel parameters. Recomputed every frame.
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct RayTraceConstants {
    /// `tan(vertical_fov / 2)`
    pub zoom: f32,
    pub frame_index: u32,
    /// Always 0; accumulation across frames belongs to the kernel.
    pub convergence_step: u32,
}

pub struct RayTraceParams {
    pub constants: RayTraceConstants,
    pub acceleration_slot: String,
    pub acceleration: rg::Ref<RayTracingAcceleration, GpuSrv>,
    pub output: rg::Ref<Image, GpuUav>,
    pub albedo: Option<rg::Ref<Image, GpuSrv>>,
    pub normal_smoothness: Option<rg::Ref<Image, GpuSrv>>,
    pub depth: Option<rg::Ref<Image, GpuSrv>>,
    pub motion: Option<rg::Ref<Image, GpuSrv>>,
    pub environment: Option<rg::Ref<Image, GpuSrv>>,
}

impl RayTraceParams {
    pub fn resolve<'a>(
        &'a self,
        resources: &'a ResourceRegistry,
    ) -> Result<TraceRaysParams<'a>, BackendError> {
        let image = move |r: Option<rg::Ref<Image, GpuSrv>>| r.map(|r| resources.image(r)).transpose();

        Ok(TraceRaysParams {
            acceleration_slot: &self.acceleration_slot,
            acceleration: resources.rt_acceleration(self.acceleration)?,
            output: resources.image(self.output)?,
            zoom: self.constants.zoom,
            frame_index: self.constants.frame_index,
            convergence_step: self.constants.convergence_step,
            color: image(self.albedo)?,
            normal_smoothness: image(self.normal_smoothness)?,
            depth: image(self.depth)?,
            motion: image(self.motion)?,
            environment: image(self.environment)?,
        })
    }
}

pub struct BindInputs<'a> {
    pub constants: RayTraceConstants,
    pub acceleration: &'a AccelerationStructureBinding,
    pub tlas: &'a rg::Handle<RayTracingAcceleration>,
    pub gbuffer: &'a Gbuffer,
    pub environment: Option<&'a rg::Handle<Image>>,
}

/// Gathers what the kernel consumes and declares the matching accesses.
pub struct ParameterBinder {
    inputs: Vec<GbufferChannel>,
}

impl ParameterBinder {
    pub fn new(inputs: Vec<GbufferChannel>) -> Self {
        Self { inputs }
    }

    pub fn inputs(&self) -> &[GbufferChannel] {
        &self.inputs
    }

    pub fn constants(&self, camera: &CameraDesc, frame_index: u32) -> RayTraceConstants {
        RayTraceConstants {
            zoom: camera.projection_scale(),
            frame_index,
            convergence_step: 0,
        }
    }

    /// First consumed channel that `gbuffer` does not provide.
    pub fn missing_input(&self, gbuffer: &Gbuffer) -> Option<GbufferChannel> {
        self.inputs
            .iter()
            .copied()
            .find(|&channel| gbuffer.channel(channel).is_none())
    }

    pub fn check_inputs(&self, gbuffer: &Gbuffer) -> Result<(), RayTracingError> {
        match self.missing_input(gbuffer) {
            Some(missing) => Err(RayTracingError::MissingGbufferInput(missing)),
            None => Ok(()),
        }
    }

    /// Declares every access of the dispatch on `pass` and in `deps`, and returns
    /// the record to resolve once the pass executes.
    pub fn bind(
        &self,
        pass: &mut PassBuilder,
        inputs: BindInputs,
        output: &mut rg::Handle<Image>,
        deps: &mut FrameDependencyDeclaration,
    ) -> Result<RayTraceParams, RayTracingError> {
        self.check_inputs(inputs.gbuffer)?;

        let mut read_channel = |channel: GbufferChannel| {
            if !self.inputs.contains(&channel) {
                return None;
            }

            let handle = inputs.gbuffer.channel(channel)?;
            deps.declare(channel.surface(), AccessMode::Read);
            Some(pass.read(handle, AccessType::AnyShaderReadSampledImageOrUniformTexelBuffer))
        };

        let albedo = read_channel(GbufferChannel::Albedo);
        let normal_smoothness = read_channel(GbufferChannel::NormalSmoothness);
        let depth = read_channel(GbufferChannel::Depth);
        let motion = read_channel(GbufferChannel::Motion);

        let environment = inputs.environment.map(|env| {
            deps.declare(FrameSurface::Environment, AccessMode::Read);
            pass.read(env, AccessType::AnyShaderReadSampledImageOrUniformTexelBuffer)
        });

        deps.declare(FrameSurface::AccelerationStructure, AccessMode::Read);
        let acceleration = pass.read(
            inputs.tlas,
            AccessType::AnyShaderReadOther,
        );

        deps.declare(FrameSurface::Output, AccessMode::ReadWrite);
        let output = pass.write(output, AccessType::General);

        Ok(RayTraceParams {
            constants: inputs.constants,
            acceleration_slot: inputs.acceleration.slot.clone(),
            acceleration,
            output,
            albedo,
            normal_smoothness,
            depth,
            motion,
            environment,
        })
    }
}
