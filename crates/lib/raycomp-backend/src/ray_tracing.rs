use glam::Affine3A;

use crate::image::Image;

/// Who decides which instances end up in a top-level acceleration structure.
#[derive(Clone, Copy, Debug, Hash, PartialEq, Eq)]
pub enum ManagementMode {
    /// Instances are added, removed and updated explicitly by the caller.
    Manual,
    /// The structure discovers scene changes on its own.
    Automatic,
}

/// Which kinds of renderers participate. Used as the per-instance visibility mask.
#[derive(Clone, Copy, Debug, Hash, PartialEq, Eq)]
pub struct RayTracingModeMask(pub u8);

impl RayTracingModeMask {
    pub const NOTHING: Self = Self(0);
    pub const STATIC: Self = Self(1);
    pub const DYNAMIC_TRANSFORM: Self = Self(2);
    pub const DYNAMIC_GEOMETRY: Self = Self(4);
    pub const EVERYTHING: Self = Self(0xff);

    pub fn contains(self, other: Self) -> bool {
        self.0 & other.0 == other.0
    }
}

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct AccelerationStructureSettings {
    pub management_mode: ManagementMode,
    pub ray_tracing_mode_mask: RayTracingModeMask,
}

impl Default for AccelerationStructureSettings {
    fn default() -> Self {
        Self {
            management_mode: ManagementMode::Manual,
            ray_tracing_mode_mask: RayTracingModeMask::EVERYTHING,
        }
    }
}

#[derive(Clone, Copy, Debug, PartialEq)]
pub struct RayTracingInstanceDesc {
    pub instance_id: u64,
    pub transformation: Affine3A,
    pub material_index: u32,
    pub mask: u8,
}

#[derive(Clone, Debug)]
pub struct RayTracingTopAccelerationDesc {
    pub instances: Vec<RayTracingInstanceDesc>,
}

#[derive(Clone, Copy, Debug, Hash, PartialEq, Eq, PartialOrd, Ord)]
pub struct AccelerationId(pub u64);

#[derive(Debug)]
pub struct RayTracingAcceleration {
    pub raw: AccelerationId,
    pub instance_count: usize,
}

/// The opaque ray generation + hit shading unit invoked by a dispatch.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct RayTracingKernelDesc {
    pub name: String,
    pub raygen_entry: String,
    pub shader_pass: String,
}

/// Fully resolved parameter record for a single ray dispatch.
#[derive(Clone, Copy, Debug)]
pub struct TraceRaysParams<'a> {
    pub acceleration_slot: &'a str,
    pub acceleration: &'a RayTracingAcceleration,
    pub output: &'a Image,
    pub zoom: f32,
    pub frame_index: u32,
    pub convergence_step: u32,
    pub color: Option<&'a Image>,
    pub normal_smoothness: Option<&'a Image>,
    pub depth: Option<&'a Image>,
    pub motion: Option<&'a Image>,
    pub environment: Option<&'a Image>,
}

impl<'a> TraceRaysParams<'a> {
    pub fn input_images(&self) -> impl Iterator<Item = &'a Image> {
        [
            self.color,
            self.normal_smoothness,
            self.depth,
            self.motion,
            self.environment,
        ]
        .into_iter()
        .flatten()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn default_settings_are_manual() {
        let settings = AccelerationStructureSettings::default();
        assert_eq!(settings.management_mode, ManagementMode::Manual);
        assert!(settings
            .ray_tracing_mode_mask
            .contains(RayTracingModeMask::DYNAMIC_TRANSFORM));
    }

    #[test]
    fn mode_mask_contains() {
        assert!(RayTracingModeMask::EVERYTHING.contains(RayTracingModeMask::STATIC));
        assert!(!RayTracingModeMask::STATIC.contains(RayTracingModeMask::DYNAMIC_GEOMETRY));
        assert!(RayTracingModeMask::STATIC.contains(RayTracingModeMask::NOTHING));
    }
}
