use crate::detection::domain::anchor::AnchorTable;
use crate::detection::domain::detector_network::DetectorNetwork;
use crate::detection::domain::detector_postprocessor::decode_best_rect;
use crate::detection::domain::detector_preprocessor::DetectorPreprocessor;
use crate::shared::error::TrackingError;
use crate::shared::frame::Frame;
use crate::shared::rect::Rect;

/// Full-frame face detection: letterbox, infer, decode the best anchor.
pub struct FaceDetector {
    network: Box<dyn DetectorNetwork>,
    anchors: AnchorTable,
    preprocessor: DetectorPreprocessor,
}

impl FaceDetector {
    pub fn new(network: Box<dyn DetectorNetwork>, anchors: AnchorTable) -> Self {
        Self {
            network,
            anchors,
            preprocessor: DetectorPreprocessor::new(),
        }
    }

    /// Best face rect in source pixels, rounded and clamped to the frame.
    /// The probability is sigmoid-activated but not thresholded.
    pub fn detect(&mut self, frame: &Frame) -> Result<Rect, TrackingError> {
        let (input, letterbox) = self.preprocessor.prepare(frame)?;
        let predictions = self
            .network
            .infer(input)
            .map_err(|e| TrackingError::inference("detector", e))?;
        decode_best_rect(predictions.view(), &self.anchors, &letterbox)
    }

    pub fn anchors(&self) -> &AnchorTable {
        &self.anchors
    }
}
