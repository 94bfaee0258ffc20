//! Scene acceleration structure with fixed membership and per-frame refit.
//!
//! Membership is decided once by [`SceneAccelerationStructure::initialize`] and only
//! changes through the explicit [`SceneAccelerationStructure::rebuild_membership`].
//! Every frame, [`SceneAccelerationStructure::refit`] samples the current transform
//! of each registered instance and records a rebuild of the top level structure
//! into the render graph.

use std::{collections::HashSet, sync::Arc};

use glam::Affine3A;
use raycomp_backend::{
    access::AccessType,
    ray_tracing::{
        AccelerationId, AccelerationStructureSettings, ManagementMode, RayTracingAcceleration,
        RayTracingInstanceDesc, RayTracingTopAccelerationDesc,
    },
    Device,
};
use raycomp_rg::{self as rg, RenderGraph};

use crate::{
    error::AccelError,
    scene::{InstanceId, SceneTransforms},
};

#[allow(unused_imports)]
use log::{debug, error, info, trace, warn};

/// Visible to every ray type.
pub const INSTANCE_MASK_ALL: u8 = 0xff;

/// Where the kernel finds the structure, and which build of it that was.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct AccelerationStructureBinding {
    pub slot: String,
    pub acceleration: AccelerationId,
    pub generation: u64,
}

pub struct SceneAccelerationStructure {
    device: Arc<dyn Device>,
    settings: AccelerationStructureSettings,
    default_material: u32,
    instances: Vec<RayTracingInstanceDesc>,
    tlas: Option<Arc<RayTracingAcceleration>>,
    generation: u64,
}

impl SceneAccelerationStructure {
    pub fn new(device: Arc<dyn Device>, settings: AccelerationStructureSettings) -> Self {
        Self {
            device,
            settings,
            default_material: 0,
            instances: Vec::new(),
            tlas: None,
            generation: 0,
        }
    }

    /// Material assigned to every instance registered after this call.
    pub fn with_default_material(mut self, material_index: u32) -> Self {
        self.default_material = material_index;
        self
    }

    pub fn settings(&self) -> &AccelerationStructureSettings {
        &self.settings
    }

    /// Builds the structure over exactly `instances`, in the given order.
    pub fn initialize(
        &mut self,
        instances: &[InstanceId],
        scene: &dyn SceneTransforms,
    ) -> Result<(), AccelError> {
        if self.settings.management_mode != ManagementMode::Manual {
            return Err(AccelError::UnsupportedManagementMode(
                self.settings.management_mode,
            ));
        }

        if self.tlas.is_some() {
            return Err(AccelError::AlreadyInitialized);
        }

        self.build(instances, scene)
    }

    /// Explicit reconstruction with a new instance set.
    ///
    /// The previous structure is released and the new one gets a new identity,
    /// so any kernel binding must be refreshed.
    pub fn rebuild_membership(
        &mut self,
        instances: &[InstanceId],
        scene: &dyn SceneTransforms,
    ) -> Result<(), AccelError> {
        if self.tlas.is_none() {
            return Err(AccelError::NotInitialized);
        }

        self.build(instances, scene)
    }

    fn build(
        &mut self,
        instances: &[InstanceId],
        scene: &dyn SceneTransforms,
    ) -> Result<(), AccelError> {
        let mut seen = HashSet::with_capacity(instances.len());
        let mut descs = Vec::with_capacity(instances.len());

        for &id in instances {
            if !seen.insert(id) {
                return Err(AccelError::DuplicateInstance(id));
            }

            descs.push(RayTracingInstanceDesc {
                instance_id: id.0,
                transformation: scene
                    .instance_transform(id)
                    .ok_or(AccelError::MissingTransform(id))?,
                material_index: self.default_material,
                mask: INSTANCE_MASK_ALL,
            });
        }

        let tlas = self
            .device
            .create_ray_tracing_top_acceleration(&RayTracingTopAccelerationDesc {
                instances: descs.clone(),
            })?;

        if let Some(prev) = self.tlas.take() {
            self.device.release_ray_tracing_acceleration(&prev);
        }

        info!(
            "Built scene acceleration structure {:?} with {} instances",
            tlas.raw,
            descs.len()
        );

        self.instances = descs;
        self.tlas = Some(Arc::new(tlas));
        self.generation += 1;

        Ok(())
    }

    /// Samples every registered transform and records a rebuild of the structure.
    ///
    /// The returned handle is the structure as written by the rebuild; passes that
    /// trace against it must read through this handle to be ordered after it.
    pub fn refit(
        &mut self,
        rg: &mut RenderGraph,
        scene: &dyn SceneTransforms,
    ) -> Result<rg::Handle<RayTracingAcceleration>, AccelError> {
        puffin::profile_function!();

        let tlas = self.tlas.clone().ok_or(AccelError::NotInitialized)?;

        // Sample everything first so a missing transform leaves all placements untouched.
        let transforms = self
            .instances
            .iter()
            .map(|inst| {
                let id = InstanceId(inst.instance_id);
                scene
                    .instance_transform(id)
                    .ok_or(AccelError::MissingTransform(id))
            })
            .collect::<Result<Vec<_>, _>>()?;

        for (inst, transformation) in self.instances.iter_mut().zip(transforms) {
            inst.transformation = transformation;
        }

        let mut tlas = rg.import(tlas, AccessType::AnyShaderReadOther);
        let instances = self.instances.clone();

        let mut pass = rg.add_pass("rebuild tlas");
        let tlas_ref = pass.write(&mut tlas, AccessType::TransferWrite);

        pass.render(move |api| {
            let tlas = api.resources.rt_acceleration(tlas_ref)?;
            api.device()
                .rebuild_ray_tracing_top_acceleration(tlas, &instances)
        });

        Ok(tlas)
    }

    /// Exposes the current structure under `slot`.
    pub fn bind(&self, slot: &str) -> Result<AccelerationStructureBinding, AccelError> {
        let tlas = self.tlas.as_ref().ok_or(AccelError::NotInitialized)?;

        Ok(AccelerationStructureBinding {
            slot: slot.to_owned(),
            acceleration: tlas.raw,
            generation: self.generation,
        })
    }

    /// Bumped on every build; a binding from an older generation is stale.
    pub fn generation(&self) -> u64 {
        self.generation
    }

    pub fn is_initialized(&self) -> bool {
        self.tlas.is_some()
    }

    pub fn acceleration(&self) -> Option<&Arc<RayTracingAcceleration>> {
        self.tlas.as_ref()
    }

    pub fn instance_count(&self) -> usize {
        self.instances.len()
    }

    pub fn instance_ids(&self) -> impl Iterator<Item = InstanceId> + '_ {
        self.instances.iter().map(|inst| InstanceId(inst.instance_id))
    }

    /// Placement of `id` as of the most recent refit.
    pub fn placement(&self, id: InstanceId) -> Option<Affine3A> {
        self.instances
            .iter()
            .find(|inst| inst.instance_id == id.0)
            .map(|inst| inst.transformation)
    }
}

impl Drop for SceneAccelerationStructure {
    fn drop(&mut self) {
        if let Some(tlas) = self.tlas.take() {
            self.device.release_ray_tracing_acceleration(&tlas);
        }
    }
}
