use std::{fs::File, path::Path};

use anyhow::Context;
use raycomp_backend::{ash::vk, ray_tracing::RayTracingKernelDesc};
use serde::{Deserialize, Serialize};

use crate::{error::RayTracingError, params::GbufferChannel};

/// The ray generation kernel and the G-buffer surfaces its shading variant consumes.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct KernelConfig {
    pub name: String,
    #[serde(default = "KernelConfig::default_raygen_entry")]
    pub raygen_entry: String,
    #[serde(default = "KernelConfig::default_shader_pass")]
    pub shader_pass: String,
    #[serde(default)]
    pub inputs: Vec<GbufferChannel>,
}

impl KernelConfig {
    fn default_raygen_entry() -> String {
        "MainRayGenShader".to_owned()
    }

    fn default_shader_pass() -> String {
        "RayTracingPass".to_owned()
    }

    pub fn kernel_desc(&self) -> RayTracingKernelDesc {
        RayTracingKernelDesc {
            name: self.name.clone(),
            raygen_entry: self.raygen_entry.clone(),
            shader_pass: self.shader_pass.clone(),
        }
    }
}

#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub enum OutputFormat {
    Rgba8Unorm,
    Rgba16Float,
    Rgba32Float,
}

impl OutputFormat {
    pub fn vk_format(self) -> vk::Format {
        match self {
            OutputFormat::Rgba8Unorm => vk::Format::R8G8B8A8_UNORM,
            OutputFormat::Rgba16Float => vk::Format::R16G16B16A16_SFLOAT,
            OutputFormat::Rgba32Float => vk::Format::R32G32B32A32_SFLOAT,
        }
    }
}

#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct RayTracingConfig {
    pub kernel: Option<KernelConfig>,
    /// Material index assigned to every participating instance at initialization.
    pub default_material: Option<u32>,
    pub require_default_material: bool,
    /// Background image sampled by rays that escape the scene.
    pub environment_map: Option<String>,
    pub output_format: OutputFormat,
    pub acceleration_slot: String,
}

impl Default for RayTracingConfig {
    fn default() -> Self {
        Self {
            kernel: None,
            default_material: None,
            require_default_material: false,
            environment_map: None,
            output_format: OutputFormat::Rgba16Float,
            acceleration_slot: "g_SceneAccelStruct".to_owned(),
        }
    }
}

impl RayTracingConfig {
    pub fn from_ron_str(text: &str) -> anyhow::Result<Self> {
        ron::de::from_str(text).context("Parsing ray tracing config")
    }

    pub fn load(path: impl AsRef<Path>) -> anyhow::Result<Self> {
        let path = path.as_ref();
        let file =
            File::open(path).with_context(|| format!("Opening ray tracing config {:?}", path))?;

        ron::de::from_reader(file).with_context(|| format!("Parsing ray tracing config {:?}", path))
    }

    /// Checks the references the feature cannot run without.
    pub fn validate(&self) -> Result<&KernelConfig, RayTracingError> {
        let kernel = self
            .kernel
            .as_ref()
            .ok_or(RayTracingError::ConfigurationMissing("ray tracing kernel"))?;

        if self.require_default_material && self.default_material.is_none() {
            return Err(RayTracingError::ConfigurationMissing("default material"));
        }

        Ok(kernel)
    }
}
