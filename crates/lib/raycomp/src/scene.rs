use std::collections::HashMap;

use glam::Affine3A;

/// Identity of a renderable owned by the host scene graph.
#[derive(Clone, Copy, Debug, Hash, PartialEq, Eq, PartialOrd, Ord, serde::Serialize, serde::Deserialize)]
pub struct InstanceId(pub u64);

/// Read-only view of the host's current world transforms, sampled once per frame.
pub trait SceneTransforms {
    fn instance_transform(&self, id: InstanceId) -> Option<Affine3A>;
}

impl SceneTransforms for HashMap<InstanceId, Affine3A> {
    fn instance_transform(&self, id: InstanceId) -> Option<Affine3A> {
        self.get(&id).copied()
    }
}
