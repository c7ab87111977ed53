use crate::shared::error::TrackingError;

/// Exponential moving average: `value = k * sample + (1 - k) * value`.
///
/// The first sample initializes the value directly.
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct Ema {
    factor: f64,
    value: f64,
    initialized: bool,
}

impl Ema {
    pub fn new(factor: f64) -> Self {
        Self {
            factor,
            value: 0.0,
            initialized: false,
        }
    }

    pub fn update(&mut self, sample: f64) -> f64 {
        if self.initialized {
            self.value = self.factor * sample + (1.0 - self.factor) * self.value;
        } else {
            self.value = sample;
            self.initialized = true;
        }
        self.value
    }

    /// Current value, or `None` before the first sample.
    pub fn value(&self) -> Option<f64> {
        self.initialized.then_some(self.value)
    }
}

/// Frames-per-second smoothing from consecutive frame timestamps.
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct FpsSmoother {
    ema: Ema,
}

impl FpsSmoother {
    pub fn new(factor: f64) -> Self {
        Self {
            ema: Ema::new(factor),
        }
    }

    /// Folds in the instantaneous rate `1000 / (current - previous)`.
    ///
    /// Timestamps are in milliseconds and must strictly increase; otherwise
    /// the state is left untouched and `NonMonotonicTimestamp` is returned.
    pub fn update(&mut self, previous_ms: f64, current_ms: f64) -> Result<f64, TrackingError> {
        let delta = current_ms - previous_ms;
        if !(delta > 0.0) {
            return Err(TrackingError::NonMonotonicTimestamp {
                previous: previous_ms,
                current: current_ms,
            });
        }
        Ok(self.ema.update(1000.0 / delta))
    }

    pub fn value(&self) -> Option<f64> {
        self.ema.value()
    }
}
