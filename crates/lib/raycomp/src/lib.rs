pub mod accel;
pub mod camera;
pub mod config;
pub mod dependencies;
pub mod error;
pub mod feature;
pub mod frame;
pub mod logging;
pub mod orchestrator;
pub mod output_cache;
pub mod params;
pub mod render_pass;
pub mod scene;

pub use glam;
pub use raycomp_backend as backend;
pub use raycomp_rg as rg;
