use crate::shared::rect::Rect;

/// A landmark in source-image pixels. `z` is relative depth, left unscaled.
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct Landmark {
    pub x: f32,
    pub y: f32,
    pub z: f32,
}

impl Landmark {
    pub fn new(x: f32, y: f32, z: f32) -> Self {
        Self { x, y, z }
    }
}

/// Decoded face mesh for one frame.
#[derive(Clone, Debug, PartialEq)]
pub struct FaceMesh {
    /// Mesh face confidence.
    pub probability: f32,
    pub landmarks: Vec<Landmark>,
    /// Landmark bounding box, tagged with `probability`. Seeds the next
    /// frame's search region.
    pub approximate_rect: Rect,
    /// Region the mesh input was cropped from.
    pub crop_rect: Rect,
}
