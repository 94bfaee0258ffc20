#[derive(Debug, thiserror::Error)]
pub enum BackendError {
    #[error("Allocation failed for {name:?}: {reason}")]
    Allocation { name: String, reason: String },

    #[error("Invalid resource access: {info:?}")]
    ResourceAccess { info: String },

    #[error("Invalid acceleration structure update: {info:?}")]
    AccelerationUpdate { info: String },
}
