use ndarray::ArrayView4;

use crate::shared::error::PortError;

/// Raw output of the face mesh network.
#[derive(Clone, Debug, PartialEq)]
pub struct MeshOutput {
    /// Face presence, already a probability in `[0, 1]`.
    pub confidence: f32,
    /// `3 * K` values: `x, y, z` per landmark in mesh-input pixels.
    pub landmarks: Vec<f32>,
}

/// Domain interface for the face mesh network.
///
/// Input is a `1 × MESH_SIZE × MESH_SIZE × 3` tensor in `[0, 1]`.
/// Adapters are responsible for turning a logit face flag into a
/// probability before returning it.
pub trait MeshNetwork: Send {
    fn infer(&mut self, input: ArrayView4<'_, f32>) -> Result<MeshOutput, PortError>;
}
