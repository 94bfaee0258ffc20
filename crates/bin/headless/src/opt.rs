use std::path::PathBuf;

use structopt::StructOpt;

#[derive(Debug, StructOpt)]
#[structopt(name = "headless", about = "Runs the ray tracing compositor without a GPU.")]
pub struct Opt {
    #[structopt(long, default_value = "1280")]
    pub width: u32,

    #[structopt(long, default_value = "720")]
    pub height: u32,

    #[structopt(long, default_value = "60")]
    pub frames: u32,

    #[structopt(long, default_value = "60.0")]
    pub fov: f32,

    #[structopt(long, parse(from_os_str))]
    pub scene: PathBuf,

    #[structopt(long, parse(from_os_str))]
    pub config: Option<PathBuf>,

    /// Disable the camera on every n-th frame.
    #[structopt(long)]
    pub inactive_every: Option<u32>,

    #[structopt(long)]
    pub verbose: bool,
}
