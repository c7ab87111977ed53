use std::time::Instant;

use crate::detection::domain::face_detector::FaceDetector;
use crate::mesh::domain::face_mesh::FaceMesh;
use crate::mesh::domain::mesh_refiner::MeshRefiner;
use crate::pipeline::tracker_config::TrackerConfig;
use crate::pipeline::tracking_state::{TrackingPhase, TrackingState};
use crate::shared::error::TrackingError;
use crate::shared::frame::Frame;
use crate::shared::rect::Rect;

/// Why nothing was tracked on a frame.
#[derive(Debug)]
pub enum NoFaceReason {
    /// Best detection was at or below the detect threshold.
    BelowDetectThreshold(f32),
    /// A per-frame failure: degenerate region or inference error.
    Failed(TrackingError),
}

#[derive(Debug)]
pub enum TrackOutcome {
    NoFace(NoFaceReason),
    /// Detector-only result.
    Detected(Rect),
    /// Mesh result. Low-confidence meshes are still reported here; the
    /// next phase tells whether tracking locked on.
    Mesh(FaceMesh),
}

/// Wall-clock time spent in each stage that ran.
#[derive(Clone, Copy, Debug, Default, PartialEq)]
pub struct StageTimings {
    pub detect_ms: Option<f64>,
    pub mesh_ms: Option<f64>,
}

/// Outcome of one [`FaceTracker::step`].
#[derive(Debug)]
pub struct TrackResult {
    pub frame_index: usize,
    /// Phase the frame was processed in.
    pub phase: TrackingPhase,
    /// Phase the next frame will be processed in.
    pub next_phase: TrackingPhase,
    /// Padded region handed to the mesh stage, if it got that far.
    pub search_region: Option<Rect>,
    pub outcome: TrackOutcome,
    pub timings: StageTimings,
}

/// Detect → track → re-detect state machine.
///
/// Runs full detection only while searching; once a mesh is confident,
/// its padded landmark extent becomes the next frame's search region.
/// Per-frame failures drop back to searching and never escape [`step`].
///
/// [`step`]: FaceTracker::step
pub struct FaceTracker {
    config: TrackerConfig,
    detector: Option<FaceDetector>,
    refiner: Option<MeshRefiner>,
    state: TrackingState,
}

impl FaceTracker {
    /// Validates `config` and checks that the enabled stages were supplied.
    /// Stages supplied for a disabled step are dropped.
    pub fn new(
        config: TrackerConfig,
        detector: Option<FaceDetector>,
        refiner: Option<MeshRefiner>,
    ) -> Result<Self, TrackingError> {
        config.validate()?;
        let detector = match (config.use_detector, detector) {
            (true, None) => {
                return Err(TrackingError::InvalidConfiguration(
                    "detector enabled but no detector network supplied".into(),
                ))
            }
            (true, d) => d,
            (false, _) => None,
        };
        let refiner = match (config.mesh_enabled, refiner) {
            (true, None) => {
                return Err(TrackingError::InvalidConfiguration(
                    "mesh enabled but no mesh network supplied".into(),
                ))
            }
            (true, r) => r,
            (false, _) => None,
        };

        log::info!(
            "Tracker ready (detector: {}, mesh: {}, tracking: {})",
            detector.is_some(),
            refiner.is_some(),
            config.tracking_enabled && refiner.is_some()
        );
        Ok(Self {
            config,
            detector,
            refiner,
            state: TrackingState::Searching,
        })
    }

    pub fn config(&self) -> &TrackerConfig {
        &self.config
    }

    pub fn phase(&self) -> TrackingPhase {
        self.state.phase()
    }

    /// Drops any tracking lock.
    pub fn reset(&mut self) {
        self.state = TrackingState::Searching;
    }

    pub fn step(&mut self, frame: &Frame) -> TrackResult {
        let carried = self.state.take();
        let phase = carried.phase();
        let mut timings = StageTimings::default();
        let mut search_region = None;

        let outcome = match self.track(frame, carried, &mut timings, &mut search_region) {
            Ok((outcome, next)) => {
                self.state = next;
                outcome
            }
            Err(e) => {
                log::warn!("Frame {}: {e}; searching again", frame.index());
                TrackOutcome::NoFace(NoFaceReason::Failed(e))
            }
        };

        let next_phase = self.state.phase();
        if next_phase != phase {
            log::debug!("Frame {}: {phase} -> {next_phase}", frame.index());
        }
        TrackResult {
            frame_index: frame.index(),
            phase,
            next_phase,
            search_region,
            outcome,
            timings,
        }
    }

    fn track(
        &mut self,
        frame: &Frame,
        carried: TrackingState,
        timings: &mut StageTimings,
        search_region: &mut Option<Rect>,
    ) -> Result<(TrackOutcome, TrackingState), TrackingError> {
        let (w, h) = (frame.width(), frame.height());
        let pad = self.config.pad_fraction;

        let region = match carried {
            TrackingState::Tracking(region) => region,
            TrackingState::Searching => {
                let found = match self.search(frame, timings)? {
                    Ok(rect) => rect,
                    Err(probability) => {
                        let reason = NoFaceReason::BelowDetectThreshold(probability);
                        return Ok((TrackOutcome::NoFace(reason), TrackingState::Searching));
                    }
                };
                if self.refiner.is_none() {
                    return Ok((TrackOutcome::Detected(found), TrackingState::Searching));
                }
                found.padded(pad, w, h)
            }
        };
        *search_region = Some(region);

        let Some(refiner) = self.refiner.as_mut() else {
            return Ok((TrackOutcome::Detected(region), TrackingState::Searching));
        };
        let start = Instant::now();
        let mesh = refiner.refine(frame, &region)?;
        timings.mesh_ms = Some(start.elapsed().as_secs_f64() * 1000.0);

        let next = if self.config.tracking_enabled && mesh.probability > self.config.mesh_threshold
        {
            TrackingState::Tracking(mesh.approximate_rect.padded(pad, w, h))
        } else {
            TrackingState::Searching
        };
        Ok((TrackOutcome::Mesh(mesh), next))
    }

    /// Region to refine when searching. Without a detector the whole
    /// frame is searched. `Err(probability)` when the detection is too weak.
    fn search(
        &mut self,
        frame: &Frame,
        timings: &mut StageTimings,
    ) -> Result<Result<Rect, f32>, TrackingError> {
        let Some(detector) = self.detector.as_mut() else {
            return Ok(Ok(Rect::full_frame(frame.width(), frame.height())));
        };

        let start = Instant::now();
        let rect = detector.detect(frame)?;
        timings.detect_ms = Some(start.elapsed().as_secs_f64() * 1000.0);

        if rect.probability > self.config.detect_threshold {
            Ok(Ok(rect))
        } else {
            log::trace!(
                "Frame {}: best detection {:.3} below threshold",
                frame.index(),
                rect.probability
            );
            Ok(Err(rect.probability))
        }
    }
}
