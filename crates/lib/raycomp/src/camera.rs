/// Which kind of view a camera renders. Only game views receive ray traced output.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, serde::Serialize, serde::Deserialize)]
pub enum CameraKind {
    Game,
    SceneView,
    Preview,
    Reflection,
}

/// Camera state sampled once at the start of a frame.
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct CameraDesc {
    pub pixel_width: u32,
    pub pixel_height: u32,
    pub vertical_fov_degrees: f32,
    pub is_active: bool,
    pub kind: CameraKind,
}

impl CameraDesc {
    pub fn new(pixel_width: u32, pixel_height: u32, vertical_fov_degrees: f32) -> Self {
        Self {
            pixel_width,
            pixel_height,
            vertical_fov_degrees,
            is_active: true,
            kind: CameraKind::Game,
        }
    }

    pub fn active(mut self, is_active: bool) -> Self {
        self.is_active = is_active;
        self
    }

    pub fn kind(mut self, kind: CameraKind) -> Self {
        self.kind = kind;
        self
    }

    pub fn viewport(&self) -> [u32; 2] {
        [self.pixel_width, self.pixel_height]
    }

    pub fn projection_scale(&self) -> f32 {
        projection_scale(self.vertical_fov_degrees)
    }
}

/// Half-height of the image plane at unit distance: `tan(fov / 2)`.
pub fn projection_scale(vertical_fov_degrees: f32) -> f32 {
    (vertical_fov_degrees.to_radians() * 0.5).tan()
}
