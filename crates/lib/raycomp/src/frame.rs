use raycomp_backend::image::Image;
use raycomp_rg as rg;

use crate::{camera::CameraDesc, params::GbufferChannel, scene::SceneTransforms};

/// G-buffer surfaces produced by rasterization, as imported into this frame's graph.
#[derive(Default)]
pub struct Gbuffer {
    pub albedo: Option<rg::Handle<Image>>,
    pub normal_smoothness: Option<rg::Handle<Image>>,
    pub depth: Option<rg::Handle<Image>>,
    pub motion: Option<rg::Handle<Image>>,
}

impl Gbuffer {
    pub fn channel(&self, channel: GbufferChannel) -> Option<&rg::Handle<Image>> {
        match channel {
            GbufferChannel::Albedo => self.albedo.as_ref(),
            GbufferChannel::NormalSmoothness => self.normal_smoothness.as_ref(),
            GbufferChannel::Depth => self.depth.as_ref(),
            GbufferChannel::Motion => self.motion.as_ref(),
        }
    }

    pub fn channel_mut(&mut self, channel: GbufferChannel) -> Option<&mut rg::Handle<Image>> {
        match channel {
            GbufferChannel::Albedo => self.albedo.as_mut(),
            GbufferChannel::NormalSmoothness => self.normal_smoothness.as_mut(),
            GbufferChannel::Depth => self.depth.as_mut(),
            GbufferChannel::Motion => self.motion.as_mut(),
        }
    }
}

/// Everything the host hands to its render pass hooks for one frame.
pub struct FrameContext<'a> {
    pub camera: CameraDesc,
    /// Monotonically increasing across the session.
    pub frame_index: u32,
    pub scene: &'a dyn SceneTransforms,
    pub gbuffer: Gbuffer,
    /// The active color target; hooks write it in place.
    pub color_target: rg::Handle<Image>,
}
