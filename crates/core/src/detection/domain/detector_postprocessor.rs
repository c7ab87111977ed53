use ndarray::ArrayView2;

use crate::detection::domain::anchor::AnchorTable;
use crate::detection::domain::detector_preprocessor::Letterbox;
use crate::shared::constants::{DETECTION_FIELDS, DETECT_SIZE};
use crate::shared::error::TrackingError;
use crate::shared::math::sigmoid;
use crate::shared::rect::Rect;

/// Index of the row with the highest confidence logit.
///
/// Ties resolve to the first row in anchor-table order; NaN logits never win.
pub fn best_prediction(predictions: ArrayView2<'_, f32>) -> Option<usize> {
    let mut best: Option<(usize, f32)> = None;
    for (i, &logit) in predictions.column(0).iter().enumerate() {
        if logit.is_nan() {
            continue;
        }
        match best {
            Some((_, top)) if logit <= top => {}
            _ => best = Some((i, logit)),
        }
    }
    best.map(|(i, _)| i)
}

/// Decodes the single best face rect from raw detector output.
///
/// Order matters: anchor offsets and padding are applied in letterboxed
/// input pixels, then everything is scaled to source pixels, then the
/// centre/size box becomes corners, which are rounded and clamped.
pub fn decode_best_rect(
    predictions: ArrayView2<'_, f32>,
    anchors: &AnchorTable,
    letterbox: &Letterbox,
) -> Result<Rect, TrackingError> {
    let (rows, cols) = predictions.dim();
    if rows != anchors.len() || cols < DETECTION_FIELDS {
        return Err(TrackingError::inference(
            "detector",
            format!(
                "expected {}x{DETECTION_FIELDS}+ predictions, got {rows}x{cols}",
                anchors.len()
            ),
        ));
    }

    let index = best_prediction(predictions)
        .ok_or_else(|| TrackingError::inference("detector", "all confidence logits are NaN"))?;
    let row = predictions.row(index);
    let anchor = anchors.as_slice()[index];
    let size = DETECT_SIZE as f32;

    let probability = sigmoid(row[0]);
    let cx = row[1] + anchor.cx * size - letterbox.pad_left as f32;
    let cy = row[2] + anchor.cy * size - letterbox.pad_top as f32;
    let w = row[3] * anchor.sx;
    let h = row[4] * anchor.sy;

    let scale = letterbox.scale();
    let rect = Rect::from_center_size(probability, cx * scale, cy * scale, w * scale, h * scale);

    log::trace!("Best anchor {index}: p={probability:.3} {rect:?}");
    Ok(rect
        .rounded()
        .clamped(letterbox.source_width, letterbox.source_height))
}
