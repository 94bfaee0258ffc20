use raycomp_backend::access::AccessMode;

/// External surfaces a frame of ray tracing work can touch.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub enum FrameSurface {
    Albedo,
    NormalSmoothness,
    Depth,
    Motion,
    Environment,
    AccelerationStructure,
    Output,
    ColorTarget,
}

/// Accesses this frame's work performs on external surfaces.
///
/// Built fresh every frame. Declaring a surface twice widens its mode,
/// so a read followed by a write becomes `ReadWrite`.
#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub struct FrameDependencyDeclaration {
    entries: Vec<(FrameSurface, AccessMode)>,
}

impl FrameDependencyDeclaration {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn declare(&mut self, surface: FrameSurface, mode: AccessMode) {
        if let Some(entry) = self.entries.iter_mut().find(|(s, _)| *s == surface) {
            entry.1 = entry.1.merge(mode);
        } else {
            self.entries.push((surface, mode));
        }
    }

    pub fn access(&self, surface: FrameSurface) -> Option<AccessMode> {
        self.entries
            .iter()
            .find(|(s, _)| *s == surface)
            .map(|(_, mode)| *mode)
    }

    pub fn entries(&self) -> &[(FrameSurface, AccessMode)] {
        &self.entries
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }
}
