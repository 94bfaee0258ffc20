mod opt;

use std::{collections::HashMap, fs::File, sync::Arc};

use anyhow::Context;
use opt::Opt;
use raycomp::{
    backend::{
        access::AccessType,
        ash::vk,
        image::{Image, ImageDesc},
        null_device::NullCommand,
        Device, NullDevice,
    },
    camera::CameraDesc,
    config::RayTracingConfig,
    feature::RayTracingFeature,
    frame::{FrameContext, Gbuffer},
    glam::{Affine3A, Quat, Vec3},
    params::GbufferChannel,
    rg::{imageops, RenderGraph},
    scene::InstanceId,
};
use structopt::StructOpt;

#[allow(unused_imports)]
use log::{debug, error, info, trace, warn};

#[derive(serde::Deserialize)]
struct SceneDesc {
    instances: Vec<SceneInstanceDesc>,
}

#[derive(serde::Deserialize)]
struct SceneInstanceDesc {
    id: u64,
    position: [f32; 3],
    #[serde(default)]
    velocity: [f32; 3],
    #[serde(default)]
    spin: f32,
}

impl SceneInstanceDesc {
    fn transform_at(&self, time: f32) -> Affine3A {
        Affine3A::from_rotation_translation(
            Quat::from_rotation_y(self.spin * time),
            Vec3::from(self.position) + Vec3::from(self.velocity) * time,
        )
    }
}

/// Stand-ins for the rasterizer's targets and the presentation image.
struct HostTargets {
    color: Arc<Image>,
    swap_chain: Arc<Image>,
    gbuffer: Vec<(GbufferChannel, Arc<Image>)>,
}

impl HostTargets {
    fn new(device: &dyn Device, extent: [u32; 2]) -> anyhow::Result<Self> {
        let image = |format| -> anyhow::Result<Arc<Image>> {
            Ok(Arc::new(device.create_image(
                ImageDesc::new_2d(format, extent).usage(
                    vk::ImageUsageFlags::SAMPLED
                        | vk::ImageUsageFlags::COLOR_ATTACHMENT
                        | vk::ImageUsageFlags::TRANSFER_SRC
                        | vk::ImageUsageFlags::TRANSFER_DST,
                ),
            )?))
        };

        Ok(Self {
            color: image(vk::Format::R16G16B16A16_SFLOAT)?,
            swap_chain: image(vk::Format::R16G16B16A16_SFLOAT)?,
            gbuffer: vec![
                (GbufferChannel::Albedo, image(vk::Format::R8G8B8A8_UNORM)?),
                (
                    GbufferChannel::NormalSmoothness,
                    image(vk::Format::R16G16B16A16_SFLOAT)?,
                ),
                (GbufferChannel::Depth, image(vk::Format::D32_SFLOAT)?),
                (GbufferChannel::Motion, image(vk::Format::R16G16_SFLOAT)?),
            ],
        })
    }

    fn import_gbuffer(&self, rg: &mut RenderGraph) -> Gbuffer {
        let mut gbuffer = Gbuffer::default();
        for (channel, image) in &self.gbuffer {
            let handle = rg.import(image.clone(), AccessType::Nothing);
            match channel {
                GbufferChannel::Albedo => gbuffer.albedo = Some(handle),
                GbufferChannel::NormalSmoothness => gbuffer.normal_smoothness = Some(handle),
                GbufferChannel::Depth => gbuffer.depth = Some(handle),
                GbufferChannel::Motion => gbuffer.motion = Some(handle),
            }
        }
        gbuffer
    }
}

/// Takes the device's recorded commands and counts the image allocations among them.
fn drain_image_allocations(device: &NullDevice) -> usize {
    device
        .take_commands()
        .iter()
        .filter(|cmd| matches!(cmd, NullCommand::CreateImage { .. }))
        .count()
}

fn add_gbuffer_pass(rg: &mut RenderGraph, frame: &mut FrameContext) {
    let mut pass = rg.add_pass("gbuffer");
    for channel in [
        GbufferChannel::Albedo,
        GbufferChannel::NormalSmoothness,
        GbufferChannel::Depth,
        GbufferChannel::Motion,
    ] {
        if let Some(handle) = frame.gbuffer.channel_mut(channel) {
            pass.write(handle, AccessType::ColorAttachmentWrite);
        }
    }
    pass.write(&mut frame.color_target, AccessType::ColorAttachmentWrite);
    pass.render(|_| Ok(()));
}

fn main() -> anyhow::Result<()> {
    let opt = Opt::from_args();
    raycomp::logging::set_up_logging(if opt.verbose {
        log::LevelFilter::Debug
    } else {
        log::LevelFilter::Info
    })?;

    let scene_desc: SceneDesc = ron::de::from_reader(
        File::open(&opt.scene).with_context(|| format!("Opening scene file {:?}", opt.scene))?,
    )
    .with_context(|| format!("Parsing scene file {:?}", opt.scene))?;

    let config = match &opt.config {
        Some(path) => RayTracingConfig::load(path)?,
        None => RayTracingConfig::default(),
    };

    let device = Arc::new(NullDevice::new());
    let extent = [opt.width, opt.height];
    let targets = HostTargets::new(&*device, extent)?;

    let mut transforms: HashMap<InstanceId, Affine3A> = scene_desc
        .instances
        .iter()
        .map(|inst| (InstanceId(inst.id), inst.transform_at(0.0)))
        .collect();
    let instances: Vec<InstanceId> = transforms.keys().copied().collect();

    let mut feature =
        RayTracingFeature::create(&config, device.clone(), &instances, &transforms)?;

    if let Some(environment) = &config.environment_map {
        info!("Using a placeholder for environment map {:?}", environment);
        let image = device.create_image(
            ImageDesc::new_cube(vk::Format::R16G16B16A16_SFLOAT, 64)
                .usage(vk::ImageUsageFlags::SAMPLED),
        )?;
        feature.set_environment(Some(Arc::new(image)));
    }

    // Setup allocations are not counted against the frames.
    device.take_commands();

    let mut dispatched = 0;
    let mut composited = 0;
    let mut allocations = 0;

    for frame_index in 0..opt.frames {
        let time = frame_index as f32 / 60.0;
        for inst in &scene_desc.instances {
            transforms.insert(InstanceId(inst.id), inst.transform_at(time));
        }

        let is_active = opt
            .inactive_every
            .map_or(true, |n| n == 0 || (frame_index + 1) % n != 0);
        let camera = CameraDesc::new(opt.width, opt.height, opt.fov).active(is_active);

        let mut rg = RenderGraph::new();
        let mut frame = FrameContext {
            camera,
            frame_index,
            scene: &transforms,
            gbuffer: targets.import_gbuffer(&mut rg),
            color_target: rg.import(targets.color.clone(), AccessType::Nothing),
        };

        add_gbuffer_pass(&mut rg, &mut frame);

        if let Some(report) = feature.add_render_passes(&mut rg, &mut frame)? {
            debug!("Frame {}: {:?}", frame_index, report.states);
            dispatched += report.dispatched as u32;
            composited += report.composited as u32;
        }

        let mut swap_chain = rg.import_swap_chain(targets.swap_chain.clone());
        imageops::copy_image_named(&mut rg, "present", &frame.color_target, &mut swap_chain);

        rg.compile()
            .execute(&*device)
            .with_context(|| format!("Executing frame {}", frame_index))?;

        allocations += drain_image_allocations(&device);
    }

    info!(
        "{} frames: {} dispatches, {} composites, {} image allocations, {} live images",
        opt.frames,
        dispatched,
        composited,
        allocations,
        device.live_image_count()
    );

    if let Some(output) = feature.output() {
        info!("Final output {:?} at {:?}", output.raw, output.extent_2d());
    }

    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn allocations_are_drained_per_frame() {
        let device = NullDevice::new();
        let targets = HostTargets::new(&device, [16, 16]).unwrap();
        assert_eq!(drain_image_allocations(&device), 6);

        let scene: HashMap<InstanceId, Affine3A> = HashMap::new();
        let mut allocations = 0;
        for frame_index in 0..3 {
            let mut rg = RenderGraph::new();
            let mut frame = FrameContext {
                camera: CameraDesc::new(16, 16, 60.0),
                frame_index,
                scene: &scene,
                gbuffer: targets.import_gbuffer(&mut rg),
                color_target: rg.import(targets.color.clone(), AccessType::Nothing),
            };
            add_gbuffer_pass(&mut rg, &mut frame);
            rg.compile().execute(&device).unwrap();

            allocations += drain_image_allocations(&device);
            assert!(device.take_commands().is_empty());
        }
        assert_eq!(allocations, 0);
    }
}
