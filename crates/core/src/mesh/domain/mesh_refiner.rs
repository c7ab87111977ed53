use crate::mesh::domain::face_mesh::FaceMesh;
use crate::mesh::domain::mesh_network::MeshNetwork;
use crate::mesh::domain::mesh_postprocessor::decode_mesh;
use crate::mesh::domain::mesh_preprocessor::MeshPreprocessor;
use crate::shared::error::TrackingError;
use crate::shared::frame::Frame;
use crate::shared::rect::Rect;

/// Refines a face region into landmarks: crop, infer, map back.
pub struct MeshRefiner {
    network: Box<dyn MeshNetwork>,
    preprocessor: MeshPreprocessor,
}

impl MeshRefiner {
    pub fn new(network: Box<dyn MeshNetwork>) -> Self {
        Self {
            network,
            preprocessor: MeshPreprocessor::new(),
        }
    }

    /// `region` should already be padded. Fails with `DegenerateRegion`
    /// before inference if it has no area inside the frame.
    pub fn refine(&mut self, frame: &Frame, region: &Rect) -> Result<FaceMesh, TrackingError> {
        let (input, crop) = self.preprocessor.prepare(frame, region)?;
        let output = self
            .network
            .infer(input)
            .map_err(|e| TrackingError::inference("mesh", e))?;
        decode_mesh(output, crop)
    }
}
