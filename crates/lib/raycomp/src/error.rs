use raycomp_backend::{ray_tracing::ManagementMode, BackendError};

use crate::{params::GbufferChannel, scene::InstanceId};

#[derive(thiserror::Error, Debug)]
pub enum AccelError {
    #[error("The acceleration structure has not been initialized")]
    NotInitialized,

    #[error("The acceleration structure is already initialized; use rebuild_membership")]
    AlreadyInitialized,

    #[error("Management mode {0:?} does not allow manual membership control")]
    UnsupportedManagementMode(ManagementMode),

    #[error("Instance {0:?} is registered more than once")]
    DuplicateInstance(InstanceId),

    #[error("Instance {0:?} has no current transform")]
    MissingTransform(InstanceId),

    #[error("Backend error {0:?}")]
    Backend(#[from] BackendError),
}

#[derive(thiserror::Error, Debug)]
pub enum RayTracingError {
    #[error("Configuration missing: {0}")]
    ConfigurationMissing(&'static str),

    #[error("The kernel consumes {0:?} but the frame provides no such G-buffer surface")]
    MissingGbufferInput(GbufferChannel),

    #[error(transparent)]
    Accel(#[from] AccelError),

    #[error("Backend error {0:?}")]
    Backend(#[from] BackendError),
}
