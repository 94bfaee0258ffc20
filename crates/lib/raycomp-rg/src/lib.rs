mod graph;
mod pass_api;
mod pass_builder;
mod resource;
mod resource_registry;

pub mod imageops;

pub use graph::*;
pub use pass_api::*;
pub use pass_builder::*;
pub use resource::*;
pub use resource_registry::ResourceRegistry;
