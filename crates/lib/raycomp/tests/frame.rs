use std::{collections::HashMap, sync::Arc};

use raycomp::{
    backend::{
        access::{AccessMode, AccessType},
        ash::vk,
        image::{Image, ImageDesc},
        null_device::NullCommand,
        NullDevice,
    },
    camera::{CameraDesc, CameraKind},
    config::{KernelConfig, RayTracingConfig},
    dependencies::FrameSurface,
    feature::RayTracingFeature,
    frame::{FrameContext, Gbuffer},
    glam::{Affine3A, Vec3},
    orchestrator::{FrameReport, FrameSkip, FrameState},
    params::GbufferChannel,
    render_pass::{record_hooks, RenderPassEvent, RenderPassHook},
    rg::RenderGraph,
    scene::InstanceId,
};

const ALL_CHANNELS: [GbufferChannel; 4] = [
    GbufferChannel::Albedo,
    GbufferChannel::NormalSmoothness,
    GbufferChannel::Depth,
    GbufferChannel::Motion,
];

struct TestHost {
    device: Arc<NullDevice>,
    scene: HashMap<InstanceId, Affine3A>,
    color: Arc<Image>,
    gbuffer: Vec<(GbufferChannel, Arc<Image>)>,
}

impl TestHost {
    fn new(extent: [u32; 2]) -> Self {
        let device = Arc::new(NullDevice::new());
        let image = |format| {
            use raycomp::backend::Device;

            Arc::new(
                device
                    .create_image(ImageDesc::new_2d(format, extent).usage(
                        vk::ImageUsageFlags::SAMPLED | vk::ImageUsageFlags::COLOR_ATTACHMENT,
                    ))
                    .unwrap(),
            )
        };

        let color = image(vk::Format::R16G16B16A16_SFLOAT);
        let gbuffer = ALL_CHANNELS
            .iter()
            .map(|&channel| (channel, image(vk::Format::R16G16B16A16_SFLOAT)))
            .collect();

        let scene = (1..=4)
            .map(|i| {
                (
                    InstanceId(i),
                    Affine3A::from_translation(Vec3::new(i as f32, 0.0, -4.0)),
                )
            })
            .collect();

        let host = Self {
            device,
            scene,
            color,
            gbuffer,
        };
        host.device.take_commands();
        host
    }

    fn instances(&self) -> Vec<InstanceId> {
        // Deliberately unsorted; the feature sorts.
        let mut ids: Vec<_> = self.scene.keys().copied().collect();
        ids.sort_by(|a, b| b.cmp(a));
        ids
    }

    fn feature(&self, inputs: Vec<GbufferChannel>) -> RayTracingFeature {
        RayTracingFeature::create(
            &config(inputs),
            self.device.clone(),
            &self.instances(),
            &self.scene,
        )
        .unwrap()
    }

    fn frame(
        &self,
        rg: &mut RenderGraph,
        camera: CameraDesc,
        frame_index: u32,
    ) -> FrameContext<'_> {
        let mut gbuffer = Gbuffer::default();
        for (channel, image) in &self.gbuffer {
            let handle = Some(rg.import(image.clone(), AccessType::Nothing));
            match channel {
                GbufferChannel::Albedo => gbuffer.albedo = handle,
                GbufferChannel::NormalSmoothness => gbuffer.normal_smoothness = handle,
                GbufferChannel::Depth => gbuffer.depth = handle,
                GbufferChannel::Motion => gbuffer.motion = handle,
            }
        }

        FrameContext {
            camera,
            frame_index,
            scene: &self.scene,
            gbuffer,
            color_target: rg.import(self.color.clone(), AccessType::Nothing),
        }
    }

    fn output_id(&self, commands: &[NullCommand]) -> Option<raycomp::backend::ImageId> {
        commands.iter().find_map(|cmd| match cmd {
            NullCommand::TraceRays { output, .. } => Some(*output),
            _ => None,
        })
    }
}

fn config(inputs: Vec<GbufferChannel>) -> RayTracingConfig {
    RayTracingConfig {
        kernel: Some(KernelConfig {
            name: "reference".to_owned(),
            raygen_entry: "MainRayGenShader".to_owned(),
            shader_pass: "RayTracingPass".to_owned(),
            inputs,
        }),
        default_material: Some(1),
        ..Default::default()
    }
}

fn add_gbuffer_pass(rg: &mut RenderGraph, frame: &mut FrameContext) {
    let mut pass = rg.add_pass("gbuffer");
    for channel in ALL_CHANNELS {
        if let Some(handle) = frame.gbuffer.channel_mut(channel) {
            pass.write(handle, AccessType::ColorAttachmentWrite);
        }
    }
    pass.write(&mut frame.color_target, AccessType::ColorAttachmentWrite);
    pass.render(|_| Ok(()));
}

fn add_post_pass(rg: &mut RenderGraph, frame: &mut FrameContext) {
    let mut pass = rg.add_pass("post");
    pass.read(
        &frame.color_target,
        AccessType::ComputeShaderReadSampledImageOrUniformTexelBuffer,
    );
    pass.render(|_| Ok(()));
}

/// Records and executes one host frame; returns the report and the device commands it issued.
fn run_frame(
    host: &TestHost,
    feature: &mut RayTracingFeature,
    camera: CameraDesc,
    frame_index: u32,
) -> (Option<FrameReport>, Vec<NullCommand>) {
    host.device.take_commands();

    let mut rg = RenderGraph::new();
    let mut frame = host.frame(&mut rg, camera, frame_index);

    add_gbuffer_pass(&mut rg, &mut frame);
    let report = feature.add_render_passes(&mut rg, &mut frame).unwrap();
    add_post_pass(&mut rg, &mut frame);

    rg.compile().execute(&*host.device).unwrap();

    (report, host.device.take_commands())
}

fn count<F: Fn(&NullCommand) -> bool>(commands: &[NullCommand], f: F) -> usize {
    commands.iter().filter(|cmd| f(cmd)).count()
}

fn traces(commands: &[NullCommand]) -> usize {
    count(commands, |cmd| matches!(cmd, NullCommand::TraceRays { .. }))
}

fn copies(commands: &[NullCommand]) -> usize {
    count(commands, |cmd| matches!(cmd, NullCommand::CopyImage { .. }))
}

#[test]
fn passes_are_ordered_between_gbuffer_and_post() {
    let host = TestHost::new([1280, 720]);
    let mut feature = host.feature(ALL_CHANNELS.to_vec());

    let mut rg = RenderGraph::new();
    let mut frame = host.frame(&mut rg, CameraDesc::new(1280, 720, 60.0), 0);
    add_gbuffer_pass(&mut rg, &mut frame);
    feature.add_render_passes(&mut rg, &mut frame).unwrap();
    add_post_pass(&mut rg, &mut frame);

    let compiled = rg.compile();
    assert!(compiled.is_ordered_before("gbuffer", "ray trace"));
    assert!(compiled.is_ordered_before("rebuild tlas", "ray trace"));
    assert!(compiled.is_ordered_before("ray trace", "ray tracing composite"));
    assert!(compiled.is_ordered_before("ray tracing composite", "post"));
    assert_eq!(
        compiled.execution_order(),
        vec!["gbuffer", "rebuild tlas", "ray trace", "ray tracing composite", "post"]
    );

    compiled.execute(&*host.device).unwrap();
}

#[test]
fn dispatch_covers_the_viewport() {
    let host = TestHost::new([1280, 720]);
    let mut feature = host.feature(ALL_CHANNELS.to_vec());

    let (report, commands) = run_frame(&host, &mut feature, CameraDesc::new(1280, 720, 60.0), 5);
    let report = report.unwrap();

    assert_eq!(
        report.states,
        vec![
            FrameState::Idle,
            FrameState::ViewportCheck,
            FrameState::StructureRefit,
            FrameState::ResourceBind,
            FrameState::Dispatch,
            FrameState::Composite,
            FrameState::Idle,
        ]
    );
    assert!(report.dispatched && report.composited);
    assert_eq!(report.skip, None);

    let (zoom, extent, frame_index, convergence_step, slot, inputs, output) = commands
        .iter()
        .find_map(|cmd| match cmd {
            NullCommand::TraceRays {
                zoom,
                extent,
                frame_index,
                convergence_step,
                acceleration_slot,
                inputs,
                output,
                ..
            } => Some((
                *zoom,
                *extent,
                *frame_index,
                *convergence_step,
                acceleration_slot.clone(),
                inputs.clone(),
                *output,
            )),
            _ => None,
        })
        .expect("no dispatch");

    assert!((zoom - 0.577_350_3).abs() < 1e-5);
    assert_eq!(extent, [1280, 720, 1]);
    assert_eq!(frame_index, 5);
    assert_eq!(convergence_step, 0);
    assert_eq!(slot, "g_SceneAccelStruct");
    assert_eq!(inputs.len(), 4);

    assert!(commands.contains(&NullCommand::CopyImage {
        src: output,
        dst: host.color.raw,
    }));
    assert_eq!(feature.output().map(|image| image.raw), Some(output));
}

#[test]
fn steady_viewport_allocates_output_once() {
    let host = TestHost::new([1920, 1080]);
    let mut feature = host.feature(ALL_CHANNELS.to_vec());

    let mut allocations = 0;
    let mut outputs = Vec::new();

    for frame_index in 0..10 {
        let (report, commands) = run_frame(
            &host,
            &mut feature,
            CameraDesc::new(1920, 1080, 60.0),
            frame_index,
        );

        let report = report.unwrap();
        assert_eq!(report.output_reallocated, frame_index == 0);
        assert_eq!(report.viewport_changed, frame_index == 0);

        allocations += count(&commands, |cmd| {
            matches!(cmd, NullCommand::CreateImage { .. })
        });
        outputs.push(host.output_id(&commands).unwrap());
    }

    assert_eq!(allocations, 1);
    assert!(outputs.windows(2).all(|w| w[0] == w[1]));
}

#[test]
fn zero_viewport_skips_without_disturbing_the_cache() {
    let host = TestHost::new([640, 480]);
    let mut feature = host.feature(ALL_CHANNELS.to_vec());

    let (_, commands) = run_frame(&host, &mut feature, CameraDesc::new(640, 480, 60.0), 0);
    let first_output = host.output_id(&commands).unwrap();

    let (report, commands) = run_frame(&host, &mut feature, CameraDesc::new(0, 0, 60.0), 1);
    let report = report.unwrap();
    assert_eq!(report.skip, Some(FrameSkip::DegenerateViewport));
    assert!(!report.visited(FrameState::StructureRefit));
    assert_eq!(report.states.last(), Some(&FrameState::Idle));
    assert!(commands.iter().all(|cmd| !matches!(
        cmd,
        NullCommand::CreateImage { .. }
            | NullCommand::ReleaseImage { .. }
            | NullCommand::RebuildAcceleration { .. }
            | NullCommand::TraceRays { .. }
            | NullCommand::CopyImage { .. }
    )));
    assert!(host.device.is_image_live(first_output));

    let (report, commands) = run_frame(&host, &mut feature, CameraDesc::new(640, 480, 60.0), 2);
    let report = report.unwrap();
    assert!(!report.output_reallocated);
    assert_eq!(host.output_id(&commands), Some(first_output));
}

#[test]
fn resize_keeps_a_single_live_output() {
    let host = TestHost::new([64, 64]);
    let mut feature = host.feature(Vec::new());
    let host_images = host.device.live_image_count();

    for (frame_index, extent) in [[64, 64], [32, 32], [0, 16], [64, 32], [64, 32]]
        .into_iter()
        .enumerate()
    {
        let camera = CameraDesc::new(extent[0], extent[1], 45.0).active(false);
        let (report, _) = run_frame(&host, &mut feature, camera, frame_index as u32);
        let report = report.unwrap();

        assert!(host.device.live_image_count() <= host_images + 1);
        if !extent.contains(&0) {
            let pass = feature.pass().unwrap();
            assert_eq!(pass.output_cache().extent(), Some(extent));
            assert_eq!(pass.viewport(), Some(extent));

            // Only the frame matching the 64x64 color target gets past the extent guard.
            let expected = if extent == [64, 64] {
                FrameSkip::InactiveCamera
            } else {
                FrameSkip::TargetExtentMismatch {
                    viewport: extent,
                    target: [64, 64],
                }
            };
            assert_eq!(report.skip, Some(expected));
        }
    }
}

#[test]
fn back_buffer_target_skips_all_ray_work() {
    let host = TestHost::new([800, 600]);
    let mut feature = host.feature(ALL_CHANNELS.to_vec());
    host.device.take_commands();

    let mut rg = RenderGraph::new();
    let mut frame = host.frame(&mut rg, CameraDesc::new(800, 600, 60.0), 0);
    frame.color_target = rg.import_swap_chain(host.color.clone());

    add_gbuffer_pass(&mut rg, &mut frame);
    let report = feature
        .add_render_passes(&mut rg, &mut frame)
        .unwrap()
        .unwrap();
    add_post_pass(&mut rg, &mut frame);

    assert_eq!(report.skip, Some(FrameSkip::BackBufferTarget));
    assert!(!report.refitted && !report.dispatched && !report.composited);
    assert!(report.dependencies.is_empty());
    assert_eq!(rg.pass_names(), vec!["gbuffer", "post"]);

    rg.compile().execute(&*host.device).unwrap();
    let commands = host.device.take_commands();
    assert_eq!(traces(&commands), 0);
    assert_eq!(copies(&commands), 0);
    assert!(feature.output().is_none());
}

#[test]
fn inactive_camera_composites_the_previous_output() {
    let host = TestHost::new([800, 600]);
    let mut feature = host.feature(ALL_CHANNELS.to_vec());

    let (_, commands) = run_frame(&host, &mut feature, CameraDesc::new(800, 600, 60.0), 0);
    let output = host.output_id(&commands).unwrap();

    let camera = CameraDesc::new(800, 600, 60.0).active(false);
    let (report, commands) = run_frame(&host, &mut feature, camera, 1);
    let report = report.unwrap();

    assert_eq!(report.skip, Some(FrameSkip::InactiveCamera));
    assert!(report.refitted);
    assert!(!report.dispatched);
    assert!(report.composited);
    assert_eq!(traces(&commands), 0);
    assert!(commands.contains(&NullCommand::CopyImage {
        src: output,
        dst: host.color.raw,
    }));
    assert_eq!(
        report.dependencies.access(FrameSurface::Output),
        Some(AccessMode::Read)
    );
}

#[test]
fn inactive_camera_without_output_skips_composite() {
    let host = TestHost::new([800, 600]);
    let mut feature = host.feature(ALL_CHANNELS.to_vec());

    let camera = CameraDesc::new(800, 600, 60.0).active(false);
    let (report, commands) = run_frame(&host, &mut feature, camera, 0);
    let report = report.unwrap();

    assert!(!report.dispatched && !report.composited);
    assert!(!report.visited(FrameState::Composite));
    assert_eq!(traces(&commands), 0);
    assert_eq!(copies(&commands), 0);
}

#[test]
fn dependencies_follow_the_kernel_inputs() {
    let host = TestHost::new([320, 240]);
    let mut feature = host.feature(vec![GbufferChannel::Albedo, GbufferChannel::Depth]);

    let (report, commands) = run_frame(&host, &mut feature, CameraDesc::new(320, 240, 60.0), 0);
    let deps = report.unwrap().dependencies;

    assert_eq!(deps.access(FrameSurface::Albedo), Some(AccessMode::Read));
    assert_eq!(deps.access(FrameSurface::Depth), Some(AccessMode::Read));
    assert_eq!(deps.access(FrameSurface::NormalSmoothness), None);
    assert_eq!(deps.access(FrameSurface::Motion), None);
    assert_eq!(
        deps.access(FrameSurface::AccelerationStructure),
        Some(AccessMode::Read)
    );
    assert_eq!(deps.access(FrameSurface::Output), Some(AccessMode::ReadWrite));
    assert_eq!(deps.access(FrameSurface::ColorTarget), Some(AccessMode::Write));

    let inputs = commands
        .iter()
        .find_map(|cmd| match cmd {
            NullCommand::TraceRays { inputs, .. } => Some(inputs.clone()),
            _ => None,
        })
        .unwrap();
    assert_eq!(inputs.len(), 2);
}

#[test]
fn dispatch_pass_declares_its_accesses() {
    let host = TestHost::new([320, 240]);
    let mut feature = host.feature(vec![GbufferChannel::NormalSmoothness]);

    let mut rg = RenderGraph::new();
    let mut frame = host.frame(&mut rg, CameraDesc::new(320, 240, 60.0), 0);
    let normal = frame.gbuffer.normal_smoothness.as_ref().unwrap().id();
    feature.add_render_passes(&mut rg, &mut frame).unwrap();

    let accesses: Vec<AccessType> = rg
        .pass_resource_accesses("ray trace")
        .unwrap()
        .iter()
        .map(|access| access.access_type)
        .collect();
    assert_eq!(
        accesses,
        vec![
            AccessType::AnyShaderReadSampledImageOrUniformTexelBuffer,
            AccessType::AnyShaderReadOther,
            AccessType::General,
        ]
    );

    let trace = rg.pass_resource_accesses("ray trace").unwrap();
    assert_eq!(trace[0].resource, normal);

    let composite = rg.pass_resource_accesses("ray tracing composite").unwrap();
    assert_eq!(composite[0].access_type, AccessType::TransferRead);
    assert_eq!(composite[1].resource, frame.color_target.id());
    assert_eq!(composite[1].access_type, AccessType::TransferWrite);
}

#[test]
fn projection_scale_tracks_the_camera() {
    let host = TestHost::new([320, 240]);
    let mut feature = host.feature(Vec::new());

    for (frame_index, fov) in [60.0f32, 90.0, 60.0].into_iter().enumerate() {
        let (report, _) = run_frame(
            &host,
            &mut feature,
            CameraDesc::new(320, 240, fov),
            frame_index as u32,
        );
        let zoom = report.unwrap().constants.unwrap().zoom;
        assert!((zoom - (fov.to_radians() * 0.5).tan()).abs() < 1e-6);
    }
}

#[test]
fn moving_instances_are_refit_every_frame() {
    let mut host = TestHost::new([320, 240]);
    let mut feature = host.feature(Vec::new());

    for frame_index in 0..3u32 {
        for (id, xform) in host.scene.iter_mut() {
            *xform = Affine3A::from_translation(Vec3::new(
                id.0 as f32,
                frame_index as f32,
                -4.0,
            ));
        }

        let (_, commands) = run_frame(&host, &mut feature, CameraDesc::new(320, 240, 60.0), frame_index);

        let rebuilt = commands
            .iter()
            .find_map(|cmd| match cmd {
                NullCommand::RebuildAcceleration { instances, .. } => Some(instances.clone()),
                _ => None,
            })
            .unwrap();

        let ids: Vec<u64> = rebuilt.iter().map(|inst| inst.instance_id).collect();
        assert_eq!(ids, vec![1, 2, 3, 4]);

        for inst in &rebuilt {
            assert_eq!(inst.transformation, host.scene[&InstanceId(inst.instance_id)]);
            assert_eq!(inst.material_index, 1);
        }
    }
}

#[test]
fn rebuilding_membership_rebinds_the_kernel() {
    let host = TestHost::new([320, 240]);
    let mut feature = host.feature(Vec::new());
    let camera = CameraDesc::new(320, 240, 60.0);

    let (report, _) = run_frame(&host, &mut feature, camera, 0);
    assert!(report.unwrap().rebound);
    let (report, _) = run_frame(&host, &mut feature, camera, 1);
    assert!(!report.unwrap().rebound);

    feature
        .pass_mut()
        .unwrap()
        .accel_mut()
        .rebuild_membership(&[InstanceId(2), InstanceId(4)], &host.scene)
        .unwrap();
    let accel = feature.pass().unwrap().accel().acceleration().unwrap().raw;

    let (report, commands) = run_frame(&host, &mut feature, camera, 2);
    assert!(report.unwrap().rebound);

    let traced = commands
        .iter()
        .find_map(|cmd| match cmd {
            NullCommand::TraceRays { accel, .. } => Some(*accel),
            _ => None,
        })
        .unwrap();
    assert_eq!(traced, accel);
    assert_eq!(host.device.live_acceleration_count(), 1);
}

#[test]
fn non_game_cameras_are_passed_through() {
    let host = TestHost::new([320, 240]);
    let mut feature = host.feature(Vec::new());

    for kind in [CameraKind::SceneView, CameraKind::Preview, CameraKind::Reflection] {
        let camera = CameraDesc::new(320, 240, 60.0).kind(kind);
        let (report, commands) = run_frame(&host, &mut feature, camera, 0);

        assert!(report.is_none());
        assert_eq!(traces(&commands), 0);
    }
}

#[test]
fn missing_kernel_disables_the_feature() {
    let host = TestHost::new([320, 240]);
    let mut feature = RayTracingFeature::create(
        &RayTracingConfig::default(),
        host.device.clone(),
        &host.instances(),
        &host.scene,
    )
    .unwrap();

    assert!(!feature.is_enabled());
    assert!(feature.disabled_reason().is_some());
    assert_eq!(host.device.live_acceleration_count(), 0);

    let (report, commands) = run_frame(&host, &mut feature, CameraDesc::new(320, 240, 60.0), 0);
    assert!(report.is_none());
    assert!(commands.iter().all(|cmd| !matches!(
        cmd,
        NullCommand::TraceRays { .. } | NullCommand::CopyImage { .. }
    )));
}

#[test]
fn missing_gbuffer_input_skips_the_frame() {
    let host = TestHost::new([320, 240]);
    let mut feature = host.feature(vec![GbufferChannel::Motion]);
    host.device.take_commands();

    let mut rg = RenderGraph::new();
    let mut frame = host.frame(&mut rg, CameraDesc::new(320, 240, 60.0), 0);
    frame.gbuffer.motion = None;

    add_gbuffer_pass(&mut rg, &mut frame);
    let report = feature
        .add_render_passes(&mut rg, &mut frame)
        .unwrap()
        .unwrap();

    assert_eq!(
        report.skip,
        Some(FrameSkip::MissingGbufferInput(GbufferChannel::Motion))
    );
    assert!(!report.visited(FrameState::StructureRefit));
    assert!(!report.refitted && !report.dispatched && !report.composited);
    assert_eq!(rg.pass_names(), vec!["gbuffer"]);

    rg.compile().execute(&*host.device).unwrap();
    let commands = host.device.take_commands();
    assert_eq!(
        count(&commands, |cmd| matches!(cmd, NullCommand::RebuildAcceleration { .. })),
        0
    );
    assert_eq!(traces(&commands), 0);
}

#[test]
fn missing_gbuffer_input_is_ignored_without_a_dispatch() {
    let host = TestHost::new([320, 240]);
    let mut feature = host.feature(vec![GbufferChannel::Motion]);

    let mut rg = RenderGraph::new();
    let camera = CameraDesc::new(320, 240, 60.0).active(false);
    let mut frame = host.frame(&mut rg, camera, 0);
    frame.gbuffer.motion = None;

    let report = feature
        .add_render_passes(&mut rg, &mut frame)
        .unwrap()
        .unwrap();

    assert_eq!(report.skip, Some(FrameSkip::InactiveCamera));
    assert!(report.refitted);
}

#[test]
fn mismatched_color_target_skips_the_frame() {
    let host = TestHost::new([320, 240]);
    let mut feature = host.feature(ALL_CHANNELS.to_vec());

    let (report, commands) = run_frame(&host, &mut feature, CameraDesc::new(640, 480, 60.0), 0);
    let report = report.unwrap();

    assert_eq!(
        report.skip,
        Some(FrameSkip::TargetExtentMismatch {
            viewport: [640, 480],
            target: [320, 240],
        })
    );
    assert!(!report.visited(FrameState::StructureRefit));
    assert!(!report.composited);
    assert!(report.dependencies.is_empty());
    assert_eq!(traces(&commands), 0);
    assert_eq!(copies(&commands), 0);
    assert!(feature.output().is_none());

    let (report, commands) = run_frame(&host, &mut feature, CameraDesc::new(320, 240, 60.0), 1);
    let report = report.unwrap();
    assert!(report.dispatched && report.composited);
    assert!(commands.contains(&NullCommand::CopyImage {
        src: host.output_id(&commands).unwrap(),
        dst: host.color.raw,
    }));
}

struct GbufferHook;

impl RenderPassHook for GbufferHook {
    fn name(&self) -> &str {
        "gbuffer"
    }

    fn insertion_point(&self) -> RenderPassEvent {
        RenderPassEvent::BeforeGbuffer
    }

    fn record(&mut self, rg: &mut RenderGraph, frame: &mut FrameContext) -> anyhow::Result<()> {
        add_gbuffer_pass(rg, frame);
        Ok(())
    }
}

struct PostHook;

impl RenderPassHook for PostHook {
    fn name(&self) -> &str {
        "post"
    }

    fn insertion_point(&self) -> RenderPassEvent {
        RenderPassEvent::BeforePostProcessing
    }

    fn record(&mut self, rg: &mut RenderGraph, frame: &mut FrameContext) -> anyhow::Result<()> {
        add_post_pass(rg, frame);
        Ok(())
    }
}

#[test]
fn hooks_are_recorded_by_insertion_point() {
    let host = TestHost::new([320, 240]);
    let feature = host.feature(ALL_CHANNELS.to_vec());

    let mut hooks: Vec<Box<dyn RenderPassHook>> =
        vec![Box::new(PostHook), Box::new(feature), Box::new(GbufferHook)];

    let mut rg = RenderGraph::new();
    let mut frame = host.frame(&mut rg, CameraDesc::new(320, 240, 60.0), 0);
    record_hooks(&mut hooks, &mut rg, &mut frame).unwrap();

    assert_eq!(
        rg.pass_names(),
        vec!["gbuffer", "rebuild tlas", "ray trace", "ray tracing composite", "post"]
    );

    rg.compile().execute(&*host.device).unwrap();
}
