//! Per-frame sequencing of the ray tracing work.
//!
//! Each call to [`RayTracingPass::record_frame`] walks
//! `Idle → ViewportCheck → StructureRefit → ResourceBind → Dispatch → Composite → Idle`,
//! leaving early at the guards. The guards that drop a whole frame all run
//! before the refit, so such a frame records no passes. Nothing is executed
//! here: the work is recorded into the render graph, which orders it against
//! the host's own passes.

use std::sync::Arc;

use anyhow::Context;
use raycomp_backend::{
    access::{AccessMode, AccessType},
    ash::vk,
    image::Image,
    ray_tracing::RayTracingKernelDesc,
    Device,
};
use raycomp_rg::{imageops, RenderGraph};

use crate::{
    accel::{AccelerationStructureBinding, SceneAccelerationStructure},
    dependencies::{FrameDependencyDeclaration, FrameSurface},
    frame::FrameContext,
    output_cache::OutputImageCache,
    params::{BindInputs, GbufferChannel, ParameterBinder, RayTraceConstants},
};

#[allow(unused_imports)]
use log::{debug, error, info, trace, warn};

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum FrameState {
    Idle,
    ViewportCheck,
    StructureRefit,
    ResourceBind,
    Dispatch,
    Composite,
}

/// Frame-local conditions under which some or all of the ray work is skipped.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum FrameSkip {
    /// Width or height is zero. Nothing is recorded.
    DegenerateViewport,
    /// The color target is the presentation image. Nothing is recorded.
    BackBufferTarget,
    /// The color target does not match the viewport, so the composite copy
    /// cannot cover it. Nothing is recorded.
    TargetExtentMismatch {
        viewport: [u32; 2],
        target: [u32; 2],
    },
    /// The kernel consumes a G-buffer channel this frame does not provide.
    /// Nothing is recorded.
    MissingGbufferInput(GbufferChannel),
    /// No dispatch. The previous output is composited if there is one.
    InactiveCamera,
}

#[derive(Clone, Debug)]
pub struct FrameReport {
    pub frame_index: u32,
    pub viewport: [u32; 2],
    pub states: Vec<FrameState>,
    pub skip: Option<FrameSkip>,
    pub viewport_changed: bool,
    pub output_reallocated: bool,
    pub rebound: bool,
    pub refitted: bool,
    pub dispatched: bool,
    pub composited: bool,
    pub constants: Option<RayTraceConstants>,
    pub dependencies: FrameDependencyDeclaration,
}

impl FrameReport {
    fn new(frame_index: u32, viewport: [u32; 2]) -> Self {
        Self {
            frame_index,
            viewport,
            states: vec![FrameState::Idle],
            skip: None,
            viewport_changed: false,
            output_reallocated: false,
            rebound: false,
            refitted: false,
            dispatched: false,
            composited: false,
            constants: None,
            dependencies: Default::default(),
        }
    }

    pub fn visited(&self, state: FrameState) -> bool {
        self.states.contains(&state)
    }
}

pub struct RayTracingPass {
    device: Arc<dyn Device>,
    kernel: Arc<RayTracingKernelDesc>,
    binder: ParameterBinder,
    accel: SceneAccelerationStructure,
    acceleration_slot: String,
    binding: Option<AccelerationStructureBinding>,
    output_cache: OutputImageCache,
    output_format: vk::Format,
    environment: Option<Arc<Image>>,
    viewport: Option<[u32; 2]>,
    state: FrameState,
}

impl RayTracingPass {
    pub fn new(
        device: Arc<dyn Device>,
        kernel: RayTracingKernelDesc,
        binder: ParameterBinder,
        accel: SceneAccelerationStructure,
        acceleration_slot: impl Into<String>,
        output_format: vk::Format,
    ) -> Self {
        Self {
            device,
            kernel: Arc::new(kernel),
            binder,
            accel,
            acceleration_slot: acceleration_slot.into(),
            binding: None,
            output_cache: OutputImageCache::new(),
            output_format,
            environment: None,
            viewport: None,
            state: FrameState::Idle,
        }
    }

    pub fn set_environment(&mut self, environment: Option<Arc<Image>>) {
        self.environment = environment;
    }

    pub fn accel(&self) -> &SceneAccelerationStructure {
        &self.accel
    }

    pub fn accel_mut(&mut self) -> &mut SceneAccelerationStructure {
        &mut self.accel
    }

    pub fn output_cache(&self) -> &OutputImageCache {
        &self.output_cache
    }

    /// The most recent ray traced image, if a dispatch has written it since the
    /// last reallocation.
    pub fn output(&self) -> Option<Arc<Image>> {
        if self.output_cache.has_valid_contents() {
            self.output_cache.image().cloned()
        } else {
            None
        }
    }

    pub fn state(&self) -> FrameState {
        self.state
    }

    pub fn viewport(&self) -> Option<[u32; 2]> {
        self.viewport
    }

    /// Records this frame's ray tracing work into `rg`.
    ///
    /// The graph is expected to be executed before the next call; the output
    /// image counts as written as soon as its dispatch has been recorded.
    pub fn record_frame(
        &mut self,
        rg: &mut RenderGraph,
        frame: &mut FrameContext,
    ) -> anyhow::Result<FrameReport> {
        puffin::profile_function!();

        let mut report = FrameReport::new(frame.frame_index, frame.camera.viewport());
        let result = self.advance(rg, frame, &mut report);
        self.enter(FrameState::Idle, &mut report);

        if let Some(skip) = report.skip {
            debug!("Frame {}: ray tracing skipped: {:?}", frame.frame_index, skip);
        }

        result.map(|()| report)
    }

    fn enter(&mut self, state: FrameState, report: &mut FrameReport) {
        trace!("{:?} -> {:?}", self.state, state);
        self.state = state;
        report.states.push(state);
    }

    fn advance(
        &mut self,
        rg: &mut RenderGraph,
        frame: &mut FrameContext,
        report: &mut FrameReport,
    ) -> anyhow::Result<()> {
        self.enter(FrameState::ViewportCheck, report);

        let viewport = frame.camera.viewport();
        if self.viewport != Some(viewport) {
            debug!("Viewport changed from {:?} to {:?}", self.viewport, viewport);
            self.viewport = Some(viewport);
            report.viewport_changed = true;
        }

        let prev_output = self.output_cache.image().map(|image| image.raw);
        let output_image = match self
            .output_cache
            .acquire(self.device.as_ref(), viewport, self.output_format)
            .context("Acquiring the ray tracing output")?
        {
            Some(image) => image,
            None => {
                report.skip = Some(FrameSkip::DegenerateViewport);
                return Ok(());
            }
        };
        report.output_reallocated = prev_output != Some(output_image.raw);

        if rg.is_swap_chain(&frame.color_target) {
            report.skip = Some(FrameSkip::BackBufferTarget);
            return Ok(());
        }

        let target = frame.color_target.desc().extent_2d();
        if target != viewport {
            report.skip = Some(FrameSkip::TargetExtentMismatch { viewport, target });
            return Ok(());
        }

        if frame.camera.is_active {
            if let Some(missing) = self.binder.missing_input(&frame.gbuffer) {
                report.skip = Some(FrameSkip::MissingGbufferInput(missing));
                return Ok(());
            }
        }

        self.enter(FrameState::StructureRefit, report);

        let tlas = self
            .accel
            .refit(rg, frame.scene)
            .context("Refitting the scene acceleration structure")?;
        report.refitted = true;

        let binding = match self.binding.take() {
            Some(binding) if binding.generation == self.accel.generation() => binding,
            _ => {
                let binding = self.accel.bind(&self.acceleration_slot)?;
                debug!(
                    "Binding acceleration structure {:?} to {:?}",
                    binding.acceleration, binding.slot
                );
                report.rebound = true;
                binding
            }
        };
        self.binding = Some(binding.clone());

        self.enter(FrameState::ResourceBind, report);

        let constants = self.binder.constants(&frame.camera, frame.frame_index);
        report.constants = Some(constants);

        let mut output = rg.import(output_image, self.output_cache.last_access());

        // The dispatch pass is opened here so every access it makes is declared
        // before the kernel is attached.
        let dispatch = if frame.camera.is_active {
            let environment = self.environment.clone().map(|env| {
                rg.import(
                    env,
                    AccessType::AnyShaderReadSampledImageOrUniformTexelBuffer,
                )
            });

            let mut pass = rg.add_pass("ray trace");
            let params = self.binder.bind(
                &mut pass,
                BindInputs {
                    constants,
                    acceleration: &binding,
                    tlas: &tlas,
                    gbuffer: &frame.gbuffer,
                    environment: environment.as_ref(),
                },
                &mut output,
                &mut report.dependencies,
            )?;

            Some((pass, params))
        } else {
            None
        };

        self.enter(FrameState::Dispatch, report);

        if let Some((pass, params)) = { dispatch } {
            let kernel = self.kernel.clone();
            let extent = [viewport[0], viewport[1], 1];

            pass.render(move |api| {
                let params = params.resolve(api.resources)?;
                api.device().trace_rays(&kernel, &params, extent)
            });

            self.output_cache.mark_written();
            self.output_cache.set_last_access(AccessType::General);
            report.dispatched = true;
        } else {
            report.skip = Some(FrameSkip::InactiveCamera);

            if !self.output_cache.has_valid_contents() {
                return Ok(());
            }
        }

        self.enter(FrameState::Composite, report);

        imageops::copy_image_named(
            rg,
            "ray tracing composite",
            &output,
            &mut frame.color_target,
        );
        report
            .dependencies
            .declare(FrameSurface::Output, AccessMode::Read);
        report
            .dependencies
            .declare(FrameSurface::ColorTarget, AccessMode::Write);

        self.output_cache.set_last_access(AccessType::TransferRead);
        report.composited = true;

        Ok(())
    }
}

impl Drop for RayTracingPass {
    fn drop(&mut self) {
        self.output_cache.release(self.device.as_ref());
    }
}
