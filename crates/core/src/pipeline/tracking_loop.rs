use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;
use std::time::Instant;

use crate::pipeline::face_tracker::{FaceTracker, NoFaceReason, TrackOutcome, TrackResult};
use crate::pipeline::metric_smoother::{Ema, FpsSmoother};
use crate::pipeline::pipeline_logger::PipelineLogger;
use crate::shared::error::{PortError, TrackingError};
use crate::shared::frame::Frame;
use crate::video::domain::frame_source::FrameSource;
use crate::video::domain::renderer::Renderer;

/// Millisecond timestamps for frame timing.
pub trait Clock: Send {
    fn now_ms(&mut self) -> f64;
}

/// Wall clock based on [`Instant`], starting at zero.
pub struct MonotonicClock {
    start: Instant,
}

impl MonotonicClock {
    pub fn new() -> Self {
        Self {
            start: Instant::now(),
        }
    }
}

impl Default for MonotonicClock {
    fn default() -> Self {
        Self::new()
    }
}

impl Clock for MonotonicClock {
    fn now_ms(&mut self) -> f64 {
        self.start.elapsed().as_secs_f64() * 1000.0
    }
}

/// One processed frame as seen by the caller of the loop.
#[derive(Debug)]
pub struct FrameResult {
    pub track: TrackResult,
    /// Smoothed frame rate; `None` on the first frame.
    pub fps: Option<f64>,
    /// Smoothed time from capture to rendered, in milliseconds.
    pub latency_ms: f64,
}

/// Totals returned by [`TrackingLoop::run`].
#[derive(Clone, Copy, Debug, Default, PartialEq)]
pub struct LoopSummary {
    pub frames: usize,
    /// Frames with a detection or mesh result.
    pub faces: usize,
    /// Frames lost to a per-frame failure.
    pub failures: usize,
    pub fps: Option<f64>,
    pub cancelled: bool,
}

/// Capture → track → render → smooth, one frame per `next()`.
///
/// Frames are processed strictly in order; nothing from a frame outlives
/// its iteration except the tracker state and the smoothers. Iteration
/// ends when the source is exhausted, the stop flag is set, or a fatal
/// error has been yielded.
pub struct TrackingLoop {
    source: Box<dyn FrameSource>,
    tracker: FaceTracker,
    renderer: Box<dyn Renderer>,
    clock: Box<dyn Clock>,
    logger: Box<dyn PipelineLogger>,
    fps: FpsSmoother,
    latency: Ema,
    previous_ms: Option<f64>,
    processed: usize,
    max_frames: Option<usize>,
    cancelled: Arc<AtomicBool>,
    finished: bool,
}

impl TrackingLoop {
    pub fn new(
        source: Box<dyn FrameSource>,
        tracker: FaceTracker,
        renderer: Box<dyn Renderer>,
        logger: Box<dyn PipelineLogger>,
    ) -> Self {
        Self::with_clock(source, tracker, renderer, logger, Box::new(MonotonicClock::new()))
    }

    pub fn with_clock(
        source: Box<dyn FrameSource>,
        tracker: FaceTracker,
        renderer: Box<dyn Renderer>,
        logger: Box<dyn PipelineLogger>,
        clock: Box<dyn Clock>,
    ) -> Self {
        let factor = tracker.config().ema_factor;
        Self {
            source,
            tracker,
            renderer,
            clock,
            logger,
            fps: FpsSmoother::new(factor),
            latency: Ema::new(factor),
            previous_ms: None,
            processed: 0,
            max_frames: None,
            cancelled: Arc::new(AtomicBool::new(false)),
            finished: false,
        }
    }

    /// Ends iteration after `max_frames` frames.
    pub fn with_max_frames(mut self, max_frames: usize) -> Self {
        self.max_frames = Some(max_frames);
        self
    }

    /// Flag that stops the loop before its next capture when set.
    pub fn stop_handle(&self) -> Arc<AtomicBool> {
        self.cancelled.clone()
    }

    pub fn tracker(&self) -> &FaceTracker {
        &self.tracker
    }

    /// Drives the loop to completion. Per-frame failures are counted;
    /// the first fatal error is returned.
    pub fn run(&mut self) -> Result<LoopSummary, TrackingError> {
        self.logger.info("Tracking started");
        let mut summary = LoopSummary::default();

        while let Some(result) = self.next() {
            let result = result?;
            summary.frames += 1;
            match result.track.outcome {
                TrackOutcome::Detected(_) | TrackOutcome::Mesh(_) => summary.faces += 1,
                TrackOutcome::NoFace(NoFaceReason::Failed(_)) => summary.failures += 1,
                TrackOutcome::NoFace(_) => {}
            }
            summary.fps = result.fps;
        }

        summary.cancelled = self.cancelled.load(Ordering::Relaxed);
        self.logger.summary();
        Ok(summary)
    }

    fn process(&mut self, frame: Frame) -> Result<FrameResult, TrackingError> {
        let start_ms = self.clock.now_ms();
        let fps = match self.previous_ms.replace(start_ms) {
            Some(previous) => Some(self.fps.update(previous, start_ms)?),
            None => None,
        };

        let track = self.tracker.step(&frame);

        let render_start = self.clock.now_ms();
        self.render(&frame, &track, fps)
            .map_err(TrackingError::Render)?;
        let end_ms = self.clock.now_ms();
        let latency_ms = self.latency.update(end_ms - start_ms);

        self.processed += 1;
        self.report(&track, fps, latency_ms, end_ms - render_start);
        Ok(FrameResult {
            track,
            fps,
            latency_ms,
        })
    }

    fn render(&mut self, frame: &Frame, track: &TrackResult, fps: Option<f64>) -> Result<(), PortError> {
        let config = self.tracker.config();
        self.renderer.begin_frame(frame)?;
        match &track.outcome {
            TrackOutcome::Detected(rect) => self.renderer.draw_rect(rect),
            TrackOutcome::Mesh(mesh) if mesh.probability > config.mesh_threshold => {
                if config.bounding_box {
                    self.renderer.draw_rect(&mesh.approximate_rect);
                }
                self.renderer.draw_landmarks(&mesh.landmarks);
            }
            TrackOutcome::Mesh(_) | TrackOutcome::NoFace(_) => {}
        }
        if let Some(fps) = fps {
            self.renderer.draw_fps(fps);
        }
        self.renderer.finish_frame()
    }

    fn report(&mut self, track: &TrackResult, fps: Option<f64>, latency_ms: f64, render_ms: f64) {
        if let Some(ms) = track.timings.detect_ms {
            self.logger.timing("detect", ms);
        }
        if let Some(ms) = track.timings.mesh_ms {
            self.logger.timing("mesh", ms);
        }
        self.logger.timing("render", render_ms);
        self.logger.count(&track.phase.to_string());
        if let TrackOutcome::NoFace(_) = track.outcome {
            self.logger.count("no_face");
        }
        if let Some(fps) = fps {
            self.logger.metric("fps", fps);
        }
        self.logger.metric("latency_ms", latency_ms);

        let total = self.source.remaining().map(|left| self.processed + left);
        self.logger.progress(self.processed, total);
    }
}

impl Iterator for TrackingLoop {
    type Item = Result<FrameResult, TrackingError>;

    fn next(&mut self) -> Option<Self::Item> {
        if self.finished {
            return None;
        }
        let limit_reached = self.max_frames.is_some_and(|max| self.processed >= max);
        if limit_reached || self.cancelled.load(Ordering::Relaxed) {
            log::info!("Tracking stopped after {} frames", self.processed);
            self.finished = true;
            return None;
        }

        let frame = match self.source.capture() {
            Ok(Some(frame)) => frame,
            Ok(None) => {
                log::info!("Frame source exhausted after {} frames", self.processed);
                self.finished = true;
                return None;
            }
            Err(e) => {
                self.finished = true;
                return Some(Err(TrackingError::Source(e)));
            }
        };

        let result = self.process(frame);
        if result.is_err() {
            self.finished = true;
        }
        Some(result)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::detection::domain::anchor::{Anchor, AnchorTable};
    use crate::detection::domain::detector_network::DetectorNetwork;
    use crate::detection::domain::face_detector::FaceDetector;
    use crate::mesh::domain::face_mesh::Landmark;
    use crate::mesh::domain::mesh_network::{MeshNetwork, MeshOutput};
    use crate::mesh::domain::mesh_refiner::MeshRefiner;
    use crate::pipeline::pipeline_logger::NullPipelineLogger;
    use crate::pipeline::tracker_config::TrackerConfig;
    use crate::pipeline::tracking_state::TrackingPhase;
    use crate::shared::rect::Rect;
    use approx::assert_relative_eq;
    use ndarray::{array, Array2, ArrayView4};
    use std::sync::Mutex;

    struct CountedSource {
        left: usize,
        fail_at: Option<usize>,
        index: usize,
    }

    impl FrameSource for CountedSource {
        fn capture(&mut self) -> Result<Option<Frame>, PortError> {
            if self.fail_at == Some(self.index) {
                return Err("camera unplugged".into());
            }
            if self.left == 0 {
                return Ok(None);
            }
            self.left -= 1;
            self.index += 1;
            Ok(Some(Frame::new(vec![0; 64 * 64 * 3], 64, 64, self.index - 1)))
        }

        fn remaining(&self) -> Option<usize> {
            Some(self.left)
        }
    }

    fn source(frames: usize) -> Box<CountedSource> {
        Box::new(CountedSource {
            left: frames,
            fail_at: None,
            index: 0,
        })
    }

    /// Advances a fixed step on every reading.
    struct StepClock {
        now: f64,
        step: f64,
    }

    impl Clock for StepClock {
        fn now_ms(&mut self) -> f64 {
            self.now += self.step;
            self.now
        }
    }

    struct ConfidentDetector;

    impl DetectorNetwork for ConfidentDetector {
        fn infer(&mut self, _input: ArrayView4<'_, f32>) -> Result<Array2<f32>, PortError> {
            Ok(array![[6.0, 0.0, 0.0, 20.0, 20.0]])
        }
    }

    struct FixedMesh(f32);

    impl MeshNetwork for FixedMesh {
        fn infer(&mut self, _input: ArrayView4<'_, f32>) -> Result<MeshOutput, PortError> {
            Ok(MeshOutput {
                confidence: self.0,
                landmarks: vec![40.0, 40.0, 0.0, 150.0, 150.0, 0.0],
            })
        }
    }

    #[derive(Default)]
    struct Recorded {
        rects: Vec<Rect>,
        landmarks: Vec<Vec<Landmark>>,
        fps: Vec<f64>,
        finished: usize,
    }

    struct RecordingRenderer(Arc<Mutex<Recorded>>);

    impl Renderer for RecordingRenderer {
        fn begin_frame(&mut self, _frame: &Frame) -> Result<(), PortError> {
            Ok(())
        }
        fn draw_rect(&mut self, rect: &Rect) {
            self.0.lock().unwrap().rects.push(*rect);
        }
        fn draw_landmarks(&mut self, landmarks: &[Landmark]) {
            self.0.lock().unwrap().landmarks.push(landmarks.to_vec());
        }
        fn draw_fps(&mut self, fps: f64) {
            self.0.lock().unwrap().fps.push(fps);
        }
        fn finish_frame(&mut self) -> Result<(), PortError> {
            self.0.lock().unwrap().finished += 1;
            Ok(())
        }
    }

    fn face_tracker(config: TrackerConfig, mesh_confidence: f32) -> FaceTracker {
        let anchors = AnchorTable::new(vec![Anchor::new(0.5, 0.5, 1.0, 1.0)]).unwrap();
        FaceTracker::new(
            config,
            Some(FaceDetector::new(Box::new(ConfidentDetector), anchors)),
            Some(MeshRefiner::new(Box::new(FixedMesh(mesh_confidence)))),
        )
        .unwrap()
    }

    fn tracking_loop(
        frames: usize,
        config: TrackerConfig,
        mesh_confidence: f32,
    ) -> (TrackingLoop, Arc<Mutex<Recorded>>) {
        let recorded = Arc::new(Mutex::new(Recorded::default()));
        let lp = TrackingLoop::with_clock(
            source(frames),
            face_tracker(config, mesh_confidence),
            Box::new(RecordingRenderer(recorded.clone())),
            Box::new(NullPipelineLogger),
            Box::new(StepClock { now: 0.0, step: 5.0 }),
        );
        (lp, recorded)
    }

    #[test]
    fn test_yields_one_result_per_frame_then_ends() {
        let (lp, recorded) = tracking_loop(3, TrackerConfig::default(), 0.9);
        let results: Vec<_> = lp.collect::<Result<_, _>>().unwrap();

        assert_eq!(results.len(), 3);
        assert_eq!(results[0].track.phase, TrackingPhase::Searching);
        assert_eq!(results[1].track.phase, TrackingPhase::Tracking);
        assert_eq!(recorded.lock().unwrap().finished, 3);
        assert_eq!(recorded.lock().unwrap().landmarks.len(), 3);
    }

    #[test]
    fn test_fps_from_frame_start_interval() {
        // Three clock reads per frame, 5ms apart: frames start 15ms apart.
        let (lp, recorded) = tracking_loop(3, TrackerConfig::default(), 0.9);
        let results: Vec<_> = lp.collect::<Result<_, _>>().unwrap();

        assert_eq!(results[0].fps, None);
        assert_relative_eq!(results[1].fps.unwrap(), 1000.0 / 15.0);
        assert_relative_eq!(results[2].fps.unwrap(), 1000.0 / 15.0);
        assert_relative_eq!(results[2].latency_ms, 10.0);
        assert_eq!(recorded.lock().unwrap().fps.len(), 2);
    }

    #[test]
    fn test_bounding_box_flag_draws_mesh_extent() {
        let config = TrackerConfig {
            bounding_box: true,
            ..Default::default()
        };
        let (mut lp, recorded) = tracking_loop(1, config, 0.9);
        lp.next().unwrap().unwrap();
        assert_eq!(recorded.lock().unwrap().rects.len(), 1);

        let (mut lp, recorded) = tracking_loop(1, TrackerConfig::default(), 0.9);
        lp.next().unwrap().unwrap();
        assert!(recorded.lock().unwrap().rects.is_empty());
    }

    #[test]
    fn test_low_confidence_mesh_is_not_drawn() {
        let (lp, recorded) = tracking_loop(2, TrackerConfig::default(), 0.2);
        let results: Vec<_> = lp.collect::<Result<_, _>>().unwrap();
        assert!(results
            .iter()
            .all(|r| r.track.phase == TrackingPhase::Searching));
        assert!(recorded.lock().unwrap().landmarks.is_empty());
    }

    #[test]
    fn test_stop_handle_ends_iteration() {
        let (mut lp, _) = tracking_loop(10, TrackerConfig::default(), 0.9);
        let stop = lp.stop_handle();
        lp.next().unwrap().unwrap();
        stop.store(true, Ordering::Relaxed);
        assert!(lp.next().is_none());
        assert!(lp.next().is_none());
    }

    #[test]
    fn test_max_frames_limits_iteration() {
        let (lp, recorded) = tracking_loop(10, TrackerConfig::default(), 0.9);
        let mut lp = lp.with_max_frames(2);
        assert_eq!(lp.run().unwrap().frames, 2);
        assert_eq!(recorded.lock().unwrap().finished, 2);
    }

    #[test]
    fn test_run_summarizes() {
        let (mut lp, _) = tracking_loop(4, TrackerConfig::default(), 0.9);
        let summary = lp.run().unwrap();
        assert_eq!(summary.frames, 4);
        assert_eq!(summary.faces, 4);
        assert_eq!(summary.failures, 0);
        assert!(!summary.cancelled);
        assert!(summary.fps.is_some());
    }

    /// Fails exactly once, on the `fail_on`-th call.
    struct FlakyMesh {
        calls: usize,
        fail_on: usize,
    }

    impl MeshNetwork for FlakyMesh {
        fn infer(&mut self, input: ArrayView4<'_, f32>) -> Result<MeshOutput, PortError> {
            self.calls += 1;
            if self.calls == self.fail_on {
                return Err("mesh session timed out".into());
            }
            FixedMesh(0.9).infer(input)
        }
    }

    #[test]
    fn test_mesh_failure_is_counted_and_loop_continues() {
        let anchors = AnchorTable::new(vec![Anchor::new(0.5, 0.5, 1.0, 1.0)]).unwrap();
        let tracker = FaceTracker::new(
            TrackerConfig::default(),
            Some(FaceDetector::new(Box::new(ConfidentDetector), anchors)),
            Some(MeshRefiner::new(Box::new(FlakyMesh { calls: 0, fail_on: 2 }))),
        )
        .unwrap();
        let recorded = Arc::new(Mutex::new(Recorded::default()));
        let mut lp = TrackingLoop::with_clock(
            source(3),
            tracker,
            Box::new(RecordingRenderer(recorded.clone())),
            Box::new(NullPipelineLogger),
            Box::new(StepClock { now: 0.0, step: 5.0 }),
        );

        let summary = lp.run().unwrap();
        assert_eq!(summary.frames, 3);
        assert_eq!(summary.failures, 1);
        assert_eq!(summary.faces, 2);
        assert_eq!(recorded.lock().unwrap().finished, 3);
        // Frame 1 lost tracking; frame 2 re-detected and locked again.
        assert_eq!(lp.tracker().phase(), TrackingPhase::Tracking);
    }

    #[test]
    fn test_source_failure_is_fatal() {
        let recorded = Arc::new(Mutex::new(Recorded::default()));
        let mut lp = TrackingLoop::new(
            Box::new(CountedSource {
                left: 5,
                fail_at: Some(1),
                index: 0,
            }),
            face_tracker(TrackerConfig::default(), 0.9),
            Box::new(RecordingRenderer(recorded)),
            Box::new(NullPipelineLogger),
        );
        assert!(lp.next().unwrap().is_ok());
        assert!(matches!(lp.next(), Some(Err(TrackingError::Source(_)))));
        assert!(lp.next().is_none());
    }

    #[test]
    fn test_non_monotonic_clock_is_fatal() {
        struct FrozenClock;
        impl Clock for FrozenClock {
            fn now_ms(&mut self) -> f64 {
                42.0
            }
        }

        let mut lp = TrackingLoop::with_clock(
            source(3),
            face_tracker(TrackerConfig::default(), 0.9),
            Box::new(crate::video::domain::renderer::NullRenderer),
            Box::new(NullPipelineLogger),
            Box::new(FrozenClock),
        );
        assert!(lp.next().unwrap().is_ok());
        assert!(matches!(
            lp.next(),
            Some(Err(TrackingError::NonMonotonicTimestamp { .. }))
        ));
        assert!(lp.next().is_none());
    }
}
