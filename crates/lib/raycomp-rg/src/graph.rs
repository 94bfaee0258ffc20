use super::{
    pass_builder::PassBuilder,
    resource::*,
    resource_registry::{AnyRenderResource, RegistryResource, ResourceRegistry},
    RenderPassApi,
};

use anyhow::Context;
use raycomp_backend::{
    access::{is_read_access, is_write_access, AccessType},
    device::BarrierTarget,
    BackendError, Device,
};
use std::{collections::HashMap, marker::PhantomData, sync::Arc};

#[derive(Clone)]
pub(crate) enum GraphResourceImportInfo {
    Image {
        resource: Arc<Image>,
        access_type: AccessType,
    },
    RayTracingAcceleration {
        resource: Arc<RayTracingAcceleration>,
        access_type: AccessType,
    },
    SwapchainImage {
        resource: Arc<Image>,
    },
}

pub trait ImportToRenderGraph
where
    Self: Resource + Sized,
{
    fn import(
        self: Arc<Self>,
        rg: &mut RenderGraph,
        access_type_at_import_time: AccessType,
    ) -> Handle<Self>;
}

impl ImportToRenderGraph for Image {
    fn import(
        self: Arc<Self>,
        rg: &mut RenderGraph,
        access_type_at_import_time: AccessType,
    ) -> Handle<Self> {
        let desc = self.desc;
        let raw = rg.push_resource(GraphResourceImportInfo::Image {
            resource: self,
            access_type: access_type_at_import_time,
        });

        Handle {
            raw,
            desc,
            marker: PhantomData,
        }
    }
}

impl ImportToRenderGraph for RayTracingAcceleration {
    fn import(
        self: Arc<Self>,
        rg: &mut RenderGraph,
        access_type_at_import_time: AccessType,
    ) -> Handle<Self> {
        let desc = RayTracingAccelerationDesc {
            instance_count: self.instance_count,
        };
        let raw = rg.push_resource(GraphResourceImportInfo::RayTracingAcceleration {
            resource: self,
            access_type: access_type_at_import_time,
        });

        Handle {
            raw,
            desc,
            marker: PhantomData,
        }
    }
}

#[derive(Default)]
pub struct RenderGraph {
    passes: Vec<RecordedPass>,
    resources: Vec<GraphResourceImportInfo>,
}

impl RenderGraph {
    pub fn new() -> Self {
        Self::default()
    }

    fn push_resource(&mut self, info: GraphResourceImportInfo) -> GraphRawResourceHandle {
        let res = GraphRawResourceHandle {
            id: self.resources.len() as u32,
            version: 0,
        };

        self.resources.push(info);
        res
    }

    pub fn import<Res: ImportToRenderGraph>(
        &mut self,
        resource: Arc<Res>,
        access_type_at_import_time: AccessType,
    ) -> Handle<Res> {
        ImportToRenderGraph::import(resource, self, access_type_at_import_time)
    }

    /// Imports the image that will be presented at the end of the frame.
    pub fn import_swap_chain(&mut self, image: Arc<Image>) -> Handle<Image> {
        let desc = image.desc;
        let raw = self.push_resource(GraphResourceImportInfo::SwapchainImage { resource: image });

        Handle {
            raw,
            desc,
            marker: PhantomData,
        }
    }

    pub fn is_swap_chain(&self, handle: &Handle<Image>) -> bool {
        matches!(
            self.resources.get(handle.raw.id as usize),
            Some(GraphResourceImportInfo::SwapchainImage { .. })
        )
    }

    pub fn add_pass<'s>(&'s mut self, name: &str) -> PassBuilder<'s> {
        PassBuilder {
            rg: self,
            pass: Some(RecordedPass::new(name)),
        }
    }

    pub(crate) fn record_pass(&mut self, pass: RecordedPass) {
        self.passes.push(pass);
    }

    pub fn pass_count(&self) -> usize {
        self.passes.len()
    }

    pub fn pass_names(&self) -> Vec<&str> {
        self.passes.iter().map(|pass| pass.name.as_str()).collect()
    }

    /// Every resource access declared by the first pass called `pass_name`, reads first.
    pub fn pass_resource_accesses(&self, pass_name: &str) -> Option<Vec<ResourceAccess>> {
        let pass = self.passes.iter().find(|pass| pass.name == pass_name)?;

        Some(
            pass.read
                .iter()
                .chain(pass.write.iter())
                .map(|res| ResourceAccess {
                    resource: ResourceId(res.handle.id),
                    access_type: res.access_type,
                })
                .collect(),
        )
    }

    fn calculate_dependencies(&self) -> Vec<PassDependency> {
        #[derive(Default)]
        struct ResourceState {
            last_writer: Option<usize>,
            readers_since_write: Vec<usize>,
        }

        let mut states: HashMap<u32, ResourceState> = HashMap::new();
        let mut dependencies: Vec<PassDependency> = Vec::new();

        let add_dependency = |dependencies: &mut Vec<PassDependency>, dep: PassDependency| {
            if dep.from != dep.to && !dependencies.contains(&dep) {
                dependencies.push(dep);
            }
        };

        for (pass_idx, pass) in self.passes.iter().enumerate() {
            for res in &pass.read {
                let state = states.entry(res.handle.id).or_default();
                if let Some(writer) = state.last_writer {
                    add_dependency(
                        &mut dependencies,
                        PassDependency {
                            from: writer,
                            to: pass_idx,
                            resource: ResourceId(res.handle.id),
                            hazard: Hazard::ReadAfterWrite,
                        },
                    );
                }
                state.readers_since_write.push(pass_idx);
            }

            for res in &pass.write {
                let state = states.entry(res.handle.id).or_default();

                if is_read_access(res.access_type) {
                    if let Some(writer) = state.last_writer {
                        add_dependency(
                            &mut dependencies,
                            PassDependency {
                                from: writer,
                                to: pass_idx,
                                resource: ResourceId(res.handle.id),
                                hazard: Hazard::ReadAfterWrite,
                            },
                        );
                    }
                }

                for &reader in &state.readers_since_write {
                    add_dependency(
                        &mut dependencies,
                        PassDependency {
                            from: reader,
                            to: pass_idx,
                            resource: ResourceId(res.handle.id),
                            hazard: Hazard::WriteAfterRead,
                        },
                    );
                }

                if let Some(writer) = state.last_writer {
                    if state.readers_since_write.is_empty() && !is_read_access(res.access_type) {
                        add_dependency(
                            &mut dependencies,
                            PassDependency {
                                from: writer,
                                to: pass_idx,
                                resource: ResourceId(res.handle.id),
                                hazard: Hazard::WriteAfterWrite,
                            },
                        );
                    }
                }

                state.last_writer = Some(pass_idx);
                state.readers_since_write.clear();
            }
        }

        dependencies
    }

    pub fn compile(self) -> CompiledRenderGraph {
        puffin::profile_function!();

        let dependencies = self.calculate_dependencies();
        let order = topological_order(self.passes.len(), &dependencies);

        CompiledRenderGraph {
            rg: self,
            dependencies,
            order,
        }
    }
}

/// Kahn's algorithm, picking the earliest recorded pass among the ready ones.
fn topological_order(pass_count: usize, dependencies: &[PassDependency]) -> Vec<usize> {
    let mut in_degree = vec![0usize; pass_count];
    let mut outgoing: Vec<Vec<usize>> = vec![Vec::new(); pass_count];

    for dep in dependencies {
        in_degree[dep.to] += 1;
        outgoing[dep.from].push(dep.to);
    }

    let mut ready: std::collections::BTreeSet<usize> =
        (0..pass_count).filter(|&idx| in_degree[idx] == 0).collect();
    let mut order = Vec::with_capacity(pass_count);

    while let Some(idx) = ready.pop_first() {
        order.push(idx);
        for &next in &outgoing[idx] {
            in_degree[next] -= 1;
            if in_degree[next] == 0 {
                ready.insert(next);
            }
        }
    }

    order
}

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum Hazard {
    ReadAfterWrite,
    WriteAfterRead,
    WriteAfterWrite,
}

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct PassDependency {
    pub from: usize,
    pub to: usize,
    pub resource: ResourceId,
    pub hazard: Hazard,
}

#[derive(Clone, Copy, Debug, PartialEq)]
pub struct ResourceAccess {
    pub resource: ResourceId,
    pub access_type: AccessType,
}

pub struct CompiledRenderGraph {
    rg: RenderGraph,
    dependencies: Vec<PassDependency>,
    order: Vec<usize>,
}

impl CompiledRenderGraph {
    pub fn dependencies(&self) -> &[PassDependency] {
        &self.dependencies
    }

    pub fn pass_name(&self, pass_idx: usize) -> &str {
        &self.rg.passes[pass_idx].name
    }

    /// `true` if `before` must execute before `after`, directly or transitively.
    pub fn is_ordered_before(&self, before: &str, after: &str) -> bool {
        let position = |name: &str| {
            self.order
                .iter()
                .position(|&idx| self.rg.passes[idx].name == name)
        };

        let (Some(before_idx), Some(after_idx)) = (
            self.rg.passes.iter().position(|pass| pass.name == before),
            self.rg.passes.iter().position(|pass| pass.name == after),
        ) else {
            return false;
        };

        let mut reachable = vec![false; self.rg.passes.len()];
        let mut stack = vec![before_idx];
        while let Some(idx) = stack.pop() {
            for dep in self.dependencies.iter().filter(|dep| dep.from == idx) {
                if !reachable[dep.to] {
                    reachable[dep.to] = true;
                    stack.push(dep.to);
                }
            }
        }

        reachable[after_idx] && position(before) < position(after)
    }

    pub fn execution_order(&self) -> Vec<&str> {
        self.order
            .iter()
            .map(|&idx| self.rg.passes[idx].name.as_str())
            .collect()
    }

    pub fn execute(self, device: &dyn Device) -> anyhow::Result<RetiredRenderGraph> {
        puffin::profile_function!();

        let mut registry = ResourceRegistry {
            resources: self
                .rg
                .resources
                .iter()
                .map(|info| match info {
                    GraphResourceImportInfo::Image {
                        resource,
                        access_type,
                    } => RegistryResource {
                        resource: AnyRenderResource::ImportedImage(resource.clone()),
                        access_type: *access_type,
                    },
                    GraphResourceImportInfo::RayTracingAcceleration {
                        resource,
                        access_type,
                    } => RegistryResource {
                        resource: AnyRenderResource::ImportedRayTracingAcceleration(
                            resource.clone(),
                        ),
                        access_type: *access_type,
                    },
                    GraphResourceImportInfo::SwapchainImage { resource } => RegistryResource {
                        resource: AnyRenderResource::ImportedImage(resource.clone()),
                        access_type: AccessType::Nothing,
                    },
                })
                .collect(),
        };

        let mut passes: Vec<Option<RecordedPass>> = self.rg.passes.into_iter().map(Some).collect();

        for idx in self.order {
            if let Some(pass) = passes[idx].take() {
                Self::record_pass(pass, &mut registry, device)?;
            }
        }

        Ok(RetiredRenderGraph {
            resources: registry.resources,
        })
    }

    fn record_pass(
        pass: RecordedPass,
        registry: &mut ResourceRegistry,
        device: &dyn Device,
    ) -> anyhow::Result<()> {
        puffin::profile_scope!("rg pass", &pass.name);
        log::trace!("Recording render pass {:?}", pass.name);

        for resource_ref in pass.read.iter().chain(pass.write.iter()) {
            let resource = &mut registry.resources[resource_ref.handle.id as usize];
            Self::transition_resource(device, resource, resource_ref.access_type);
        }

        let mut api = RenderPassApi {
            device,
            resources: registry,
        };

        if let Some(render_fn) = pass.render_fn {
            render_fn(&mut api).with_context(|| format!("Pass {:?} failed to render", pass.name))?;
        }

        Ok(())
    }

    fn transition_resource(
        device: &dyn Device,
        resource: &mut RegistryResource,
        access_type: AccessType,
    ) {
        // Back-to-back reads of the same kind need no synchronization.
        if resource.access_type == access_type && !is_write_access(access_type) {
            return;
        }

        let target = match &resource.resource {
            AnyRenderResource::ImportedImage(image) => BarrierTarget::Image(image),
            AnyRenderResource::ImportedRayTracingAcceleration(accel) => {
                BarrierTarget::RayTracingAcceleration(accel)
            }
        };

        device.record_barrier(target, resource.access_type, access_type);
        resource.access_type = access_type;
    }
}

pub struct RetiredRenderGraph {
    resources: Vec<RegistryResource>,
}

impl RetiredRenderGraph {
    /// Access type the resource was left in after the last pass that touched it.
    pub fn final_access_type<Res: Resource>(&self, handle: &Handle<Res>) -> AccessType {
        self.resources[handle.raw.id as usize].access_type
    }
}

type DynRenderFn = dyn FnOnce(&mut RenderPassApi) -> Result<(), BackendError>;

pub(crate) struct PassResourceRef {
    pub handle: GraphRawResourceHandle,
    pub access_type: AccessType,
}

pub(crate) struct RecordedPass {
    pub read: Vec<PassResourceRef>,
    pub write: Vec<PassResourceRef>,
    pub render_fn: Option<Box<DynRenderFn>>,
    pub name: String,
}

impl RecordedPass {
    fn new(name: &str) -> Self {
        Self {
            read: Default::default(),
            write: Default::default(),
            render_fn: Default::default(),
            name: name.to_owned(),
        }
    }
}
