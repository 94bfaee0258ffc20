pub mod access;
pub mod device;
pub mod error;
pub mod image;
pub mod null_device;
pub mod ray_tracing;

pub use ash;
pub use device::Device;
pub use error::BackendError;
pub use image::*;
pub use null_device::NullDevice;
