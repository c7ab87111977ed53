use std::collections::BTreeMap;
use std::time::Instant;

/// Observer for tracking loop events.
///
/// Keeps reporting out of the loop itself so embedders can route it to
/// stdout, a UI, or nowhere.
pub trait PipelineLogger: Send {
    /// `total` is known only for finite sources.
    fn progress(&mut self, current: usize, total: Option<usize>);

    /// Duration of one stage (`detect`, `mesh`, `render`) for one frame.
    fn timing(&mut self, stage: &str, duration_ms: f64);

    /// Point-in-time value, e.g. smoothed `fps` or `latency_ms`.
    fn metric(&mut self, name: &str, value: f64);

    /// Counts one occurrence of a named event, e.g. a phase or outcome.
    fn count(&mut self, event: &str);

    fn info(&mut self, message: &str);

    fn summary(&self) {}
}

/// Discards all events.
pub struct NullPipelineLogger;

impl PipelineLogger for NullPipelineLogger {
    fn progress(&mut self, _current: usize, _total: Option<usize>) {}
    fn timing(&mut self, _stage: &str, _duration_ms: f64) {}
    fn metric(&mut self, _name: &str, _value: f64) {}
    fn count(&mut self, _event: &str) {}
    fn info(&mut self, _message: &str) {}
}

/// Aggregates stage timings, metrics and event counts for an end-of-run
/// summary printed through `log`.
///
/// Progress lines are throttled to every `throttle_frames` frames.
pub struct StdoutPipelineLogger {
    throttle_frames: usize,
    timings: BTreeMap<String, Vec<f64>>,
    metrics: BTreeMap<String, f64>,
    counts: BTreeMap<String, usize>,
    start_time: Instant,
    frames: usize,
}

impl StdoutPipelineLogger {
    pub fn new(throttle_frames: usize) -> Self {
        Self {
            throttle_frames: throttle_frames.max(1),
            timings: BTreeMap::new(),
            metrics: BTreeMap::new(),
            counts: BTreeMap::new(),
            start_time: Instant::now(),
            frames: 0,
        }
    }

    /// Formatted summary, or `None` before any frame was recorded.
    pub fn summary_string(&self) -> Option<String> {
        if self.frames == 0 && self.timings.is_empty() {
            return None;
        }

        let elapsed_s = self.start_time.elapsed().as_secs_f64();
        let mut lines = vec![format!(
            "Tracking summary ({} frames, {elapsed_s:.1}s):",
            self.frames
        )];

        for (stage, durations) in &self.timings {
            let total_ms: f64 = durations.iter().sum();
            let avg_ms = total_ms / durations.len().max(1) as f64;
            lines.push(format!(
                "  {stage:8}: avg {avg_ms:6.1}ms over {:5} frames",
                durations.len()
            ));
        }
        for (event, n) in &self.counts {
            lines.push(format!("  {event}: {n}"));
        }
        // Smoothed values: the last one reported is the one that matters.
        for (name, value) in &self.metrics {
            lines.push(format!("  {name}: {value:.1}"));
        }

        Some(lines.join("\n"))
    }

    pub fn timings_for(&self, stage: &str) -> Option<&[f64]> {
        self.timings.get(stage).map(|v| v.as_slice())
    }

    pub fn latest_metric(&self, name: &str) -> Option<f64> {
        self.metrics.get(name).copied()
    }

    pub fn count_of(&self, event: &str) -> usize {
        self.counts.get(event).copied().unwrap_or(0)
    }
}

impl Default for StdoutPipelineLogger {
    fn default() -> Self {
        Self::new(30)
    }
}

impl PipelineLogger for StdoutPipelineLogger {
    fn progress(&mut self, current: usize, total: Option<usize>) {
        self.frames = self.frames.max(current);
        match total {
            Some(total) if current % self.throttle_frames == 0 || current == total => {
                let pct = current as f64 / total.max(1) as f64 * 100.0;
                log::info!("Processing: {current}/{total} frames ({pct:.1}%)");
            }
            None if current % self.throttle_frames == 0 => {
                log::info!("Processing: {current} frames");
            }
            _ => {}
        }
    }

    fn timing(&mut self, stage: &str, duration_ms: f64) {
        self.timings
            .entry(stage.to_string())
            .or_default()
            .push(duration_ms);
    }

    fn metric(&mut self, name: &str, value: f64) {
        self.metrics.insert(name.to_string(), value);
    }

    fn count(&mut self, event: &str) {
        *self.counts.entry(event.to_string()).or_default() += 1;
    }

    fn info(&mut self, message: &str) {
        log::info!("{message}");
    }

    fn summary(&self) {
        if let Some(text) = self.summary_string() {
            log::info!("\n\n{text}");
        }
    }
}
