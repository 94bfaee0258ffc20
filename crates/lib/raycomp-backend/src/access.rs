pub use vk_sync::AccessType;

/// Access mode of a resource in a frame dependency declaration.
#[derive(Clone, Copy, Debug, Hash, PartialEq, Eq)]
pub enum AccessMode {
    Read,
    Write,
    ReadWrite,
}

impl AccessMode {
    /// Combines two declarations of the same resource into the widest mode.
    pub fn merge(self, other: AccessMode) -> AccessMode {
        if self == other {
            self
        } else {
            AccessMode::ReadWrite
        }
    }
}

/// Classifies a barrier access type as a read, a write, or both.
/// `Nothing` touches no memory and yields `None`.
pub fn access_mode(access_type: AccessType) -> Option<AccessMode> {
    match access_type {
        AccessType::Nothing => None,

        AccessType::ColorAttachmentReadWrite | AccessType::General => Some(AccessMode::ReadWrite),

        AccessType::CommandBufferWriteNVX
        | AccessType::VertexShaderWrite
        | AccessType::TessellationControlShaderWrite
        | AccessType::TessellationEvaluationShaderWrite
        | AccessType::GeometryShaderWrite
        | AccessType::FragmentShaderWrite
        | AccessType::ColorAttachmentWrite
        | AccessType::DepthStencilAttachmentWrite
        | AccessType::DepthAttachmentWriteStencilReadOnly
        | AccessType::StencilAttachmentWriteDepthReadOnly
        | AccessType::ComputeShaderWrite
        | AccessType::AnyShaderWrite
        | AccessType::TransferWrite
        | AccessType::HostWrite => Some(AccessMode::Write),

        _ => Some(AccessMode::Read),
    }
}

pub fn is_write_access(access_type: AccessType) -> bool {
    matches!(
        access_mode(access_type),
        Some(AccessMode::Write) | Some(AccessMode::ReadWrite)
    )
}

pub fn is_read_access(access_type: AccessType) -> bool {
    matches!(
        access_mode(access_type),
        Some(AccessMode::Read) | Some(AccessMode::ReadWrite)
    )
}
