//! BlazeFace detector network using ONNX Runtime via `ort`.
//!
//! Exports of the front-camera model come in two shapes: a single
//! `[1, N, 17]` output, or regressors `[1, N, 16]` and scores `[1, N, 1]`
//! as separate outputs. Both are normalized into `N × C` rows of
//! `[score_logit, dx, dy, dw, dh, keypoints...]`.
use std::path::Path;

use ndarray::{concatenate, Array2, ArrayView4, ArrayViewD, Axis};

use crate::detection::domain::detector_network::DetectorNetwork;
use crate::detection::infrastructure::execution_provider::open_session;
use crate::shared::error::PortError;

pub struct OnnxBlazefaceNetwork {
    session: ort::session::Session,
}

impl OnnxBlazefaceNetwork {
    pub fn new(model_path: &Path, backend: &str) -> Result<Self, Box<dyn std::error::Error>> {
        Ok(Self {
            session: open_session(model_path, backend)?,
        })
    }
}

impl DetectorNetwork for OnnxBlazefaceNetwork {
    fn infer(&mut self, input: ArrayView4<'_, f32>) -> Result<Array2<f32>, PortError> {
        let input_value = ort::value::Tensor::from_array(input.to_owned())?;
        let outputs = self.session.run(ort::inputs![input_value])?;

        match outputs.len() {
            0 => Err("BlazeFace model produced no outputs".into()),
            1 => rows(outputs[0].try_extract_array::<f32>()?),
            _ => {
                let a = rows(outputs[0].try_extract_array::<f32>()?)?;
                let b = rows(outputs[1].try_extract_array::<f32>()?)?;
                merge_scores(a, b)
            }
        }
    }
}

/// Flattens a `[1, N, C]` (or `[N, C]`) tensor into `N × C` rows.
fn rows(tensor: ArrayViewD<'_, f32>) -> Result<Array2<f32>, PortError> {
    let cols = *tensor.shape().last().ok_or("BlazeFace output is a scalar")?;
    if cols == 0 {
        return Err("BlazeFace output has no columns".into());
    }
    let n = tensor.len() / cols;
    Ok(Array2::from_shape_vec((n, cols), tensor.iter().copied().collect())?)
}

/// Puts the single-column score output in front of the regressors.
fn merge_scores(a: Array2<f32>, b: Array2<f32>) -> Result<Array2<f32>, PortError> {
    let (scores, regressors) = if a.ncols() == 1 { (a, b) } else { (b, a) };
    if scores.ncols() != 1 || scores.nrows() != regressors.nrows() {
        return Err(format!(
            "cannot pair BlazeFace outputs {:?} and {:?}",
            scores.dim(),
            regressors.dim()
        )
        .into());
    }
    Ok(concatenate(Axis(1), &[scores.view(), regressors.view()])?)
}
