use std::sync::Arc;

use anyhow::Context;
use raycomp_backend::{image::Image, ray_tracing::AccelerationStructureSettings, Device};
use raycomp_rg::RenderGraph;

use crate::{
    accel::SceneAccelerationStructure,
    camera::CameraKind,
    config::RayTracingConfig,
    error::RayTracingError,
    frame::FrameContext,
    orchestrator::{FrameReport, RayTracingPass},
    params::ParameterBinder,
    render_pass::{RenderPassEvent, RenderPassHook},
    scene::{InstanceId, SceneTransforms},
};

#[allow(unused_imports)]
use log::{debug, error, info, trace, warn};

/// Host-facing entry point: owns the ray tracing pass and enqueues it for game cameras.
pub struct RayTracingFeature {
    pass: Option<RayTracingPass>,
    disabled_reason: Option<RayTracingError>,
    last_report: Option<FrameReport>,
}

impl RayTracingFeature {
    /// Builds the pass over every participating instance, sorted by id.
    ///
    /// Missing configuration does not fail creation; the feature stays disabled for
    /// the session instead. Device and scene failures are errors.
    pub fn create(
        config: &RayTracingConfig,
        device: Arc<dyn Device>,
        instances: &[InstanceId],
        scene: &dyn SceneTransforms,
    ) -> anyhow::Result<Self> {
        let kernel = match config.validate() {
            Ok(kernel) => kernel,
            Err(err) => {
                warn!("Ray tracing disabled: {}", err);
                return Ok(Self {
                    pass: None,
                    disabled_reason: Some(err),
                    last_report: None,
                });
            }
        };

        let mut instances = instances.to_vec();
        instances.sort();

        let mut accel =
            SceneAccelerationStructure::new(device.clone(), AccelerationStructureSettings::default());
        if let Some(material) = config.default_material {
            accel = accel.with_default_material(material);
        }
        accel
            .initialize(&instances, scene)
            .context("Initializing the scene acceleration structure")?;

        info!(
            "Ray tracing kernel {:?} over {} instances",
            kernel.name,
            instances.len()
        );

        let pass = RayTracingPass::new(
            device,
            kernel.kernel_desc(),
            ParameterBinder::new(kernel.inputs.clone()),
            accel,
            config.acceleration_slot.clone(),
            config.output_format.vk_format(),
        );

        Ok(Self {
            pass: Some(pass),
            disabled_reason: None,
            last_report: None,
        })
    }

    pub fn is_enabled(&self) -> bool {
        self.pass.is_some()
    }

    pub fn disabled_reason(&self) -> Option<&RayTracingError> {
        self.disabled_reason.as_ref()
    }

    pub fn pass(&self) -> Option<&RayTracingPass> {
        self.pass.as_ref()
    }

    pub fn pass_mut(&mut self) -> Option<&mut RayTracingPass> {
        self.pass.as_mut()
    }

    pub fn set_environment(&mut self, environment: Option<Arc<Image>>) {
        if let Some(pass) = &mut self.pass {
            pass.set_environment(environment);
        }
    }

    /// Enqueues this frame's work. Returns `None` when the feature is disabled or
    /// the camera does not render ray traced output.
    pub fn add_render_passes(
        &mut self,
        rg: &mut RenderGraph,
        frame: &mut FrameContext,
    ) -> anyhow::Result<Option<FrameReport>> {
        let pass = match &mut self.pass {
            Some(pass) if frame.camera.kind == CameraKind::Game => pass,
            _ => return Ok(None),
        };

        let report = pass.record_frame(rg, frame)?;
        self.last_report = Some(report.clone());

        Ok(Some(report))
    }

    pub fn last_report(&self) -> Option<&FrameReport> {
        self.last_report.as_ref()
    }

    pub fn output(&self) -> Option<Arc<Image>> {
        self.pass.as_ref().and_then(|pass| pass.output())
    }
}

impl RenderPassHook for RayTracingFeature {
    fn name(&self) -> &str {
        "ray tracing"
    }

    fn insertion_point(&self) -> RenderPassEvent {
        RenderPassEvent::AfterGbuffer
    }

    fn record(&mut self, rg: &mut RenderGraph, frame: &mut FrameContext) -> anyhow::Result<()> {
        self.add_render_passes(rg, frame).map(|_| ())
    }
}
