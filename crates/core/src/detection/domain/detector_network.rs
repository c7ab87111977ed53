use ndarray::{Array2, ArrayView4};

use crate::shared::error::PortError;

/// Domain interface for the face detector network.
///
/// Input is a `1 × DETECT_SIZE × DETECT_SIZE × 3` tensor normalized to
/// `[-1, 1]`. Output holds one row per anchor, in anchor-table order:
/// `[confidence_logit, dx, dy, dw, dh, ...]`. Extra columns are ignored.
///
/// Implementations may keep session state, hence `&mut self`.
pub trait DetectorNetwork: Send {
    fn infer(&mut self, input: ArrayView4<'_, f32>) -> Result<Array2<f32>, PortError>;
}
