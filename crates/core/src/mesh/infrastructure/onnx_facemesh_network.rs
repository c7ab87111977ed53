//! Face mesh network using ONNX Runtime via `ort`.
//!
//! Expects two outputs: landmarks (`[1, 1, 1, 1404]` or any shape holding
//! `3 * K` values) first, then the face flag.
use std::path::Path;

use ndarray::{ArrayView4, ArrayViewD};

use crate::detection::infrastructure::execution_provider::open_session;
use crate::mesh::domain::mesh_network::{MeshNetwork, MeshOutput};
use crate::shared::error::PortError;
use crate::shared::math::sigmoid;

pub struct OnnxFaceMeshNetwork {
    session: ort::session::Session,
    confidence_is_logit: bool,
}

impl OnnxFaceMeshNetwork {
    /// `confidence_is_logit` should be true for the MediaPipe export, whose
    /// face flag is a raw logit.
    pub fn new(
        model_path: &Path,
        backend: &str,
        confidence_is_logit: bool,
    ) -> Result<Self, Box<dyn std::error::Error>> {
        Ok(Self {
            session: open_session(model_path, backend)?,
            confidence_is_logit,
        })
    }
}

impl MeshNetwork for OnnxFaceMeshNetwork {
    fn infer(&mut self, input: ArrayView4<'_, f32>) -> Result<MeshOutput, PortError> {
        let input_value = ort::value::Tensor::from_array(input.to_owned())?;
        let outputs = self.session.run(ort::inputs![input_value])?;
        if outputs.len() < 2 {
            return Err(format!("face mesh model produced {} outputs, expected 2", outputs.len()).into());
        }

        let landmarks = outputs[0].try_extract_array::<f32>()?.iter().copied().collect();
        let flag = first_value(outputs[1].try_extract_array::<f32>()?)?;
        Ok(MeshOutput {
            confidence: activate(flag, self.confidence_is_logit),
            landmarks,
        })
    }
}

fn first_value(tensor: ArrayViewD<'_, f32>) -> Result<f32, PortError> {
    tensor
        .iter()
        .next()
        .copied()
        .ok_or_else(|| "face mesh confidence output is empty".into())
}

fn activate(flag: f32, is_logit: bool) -> f32 {
    if is_logit {
        sigmoid(flag)
    } else {
        flag
    }
}
