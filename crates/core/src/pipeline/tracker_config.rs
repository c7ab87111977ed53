use serde::{Deserialize, Serialize};

use crate::shared::constants::{
    BACKENDS, DEFAULT_DETECT_THRESHOLD, DEFAULT_EMA_FACTOR, DEFAULT_MESH_THRESHOLD,
    DEFAULT_PAD_FRACTION,
};
use crate::shared::error::TrackingError;

/// Options passed into the tracker at construction.
///
/// Keys use the camelCase names of the configuration surface, so a JSON
/// file like `{"padFraction": 0.3, "boundingBox": true}` deserializes
/// directly. Missing keys take their defaults.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(default, rename_all = "camelCase", deny_unknown_fields)]
pub struct TrackerConfig {
    /// Inference backend, opaque to the tracker. See [`BACKENDS`].
    pub backend: String,
    /// Requested capture width.
    pub width: Option<u32>,
    /// Requested capture height.
    pub height: Option<u32>,
    /// Whether to render the face rectangle.
    pub bounding_box: bool,
    pub pad_fraction: f32,
    pub detect_threshold: f32,
    pub mesh_threshold: f32,
    pub ema_factor: f64,
    /// When false, the mesh searches the whole frame.
    pub use_detector: bool,
    /// When false, only the detector runs.
    pub mesh_enabled: bool,
    /// When false, detection runs on every frame.
    pub tracking_enabled: bool,
}

impl Default for TrackerConfig {
    fn default() -> Self {
        Self {
            backend: "cpu".into(),
            width: None,
            height: None,
            bounding_box: false,
            pad_fraction: DEFAULT_PAD_FRACTION,
            detect_threshold: DEFAULT_DETECT_THRESHOLD,
            mesh_threshold: DEFAULT_MESH_THRESHOLD,
            ema_factor: DEFAULT_EMA_FACTOR,
            use_detector: true,
            mesh_enabled: true,
            tracking_enabled: true,
        }
    }
}

impl TrackerConfig {
    pub fn from_json_str(json: &str) -> Result<Self, TrackingError> {
        serde_json::from_str(json).map_err(|e| TrackingError::InvalidConfiguration(e.to_string()))
    }

    /// Rejects values the tracker cannot run with.
    pub fn validate(&self) -> Result<(), TrackingError> {
        let invalid = |msg: String| Err(TrackingError::InvalidConfiguration(msg));

        if !BACKENDS.contains(&self.backend.as_str()) {
            return invalid(format!(
                "backend '{}' is not one of: {}",
                self.backend,
                BACKENDS.join(", ")
            ));
        }
        if !(self.pad_fraction.is_finite() && self.pad_fraction > 0.0) {
            return invalid(format!("padFraction must be positive, got {}", self.pad_fraction));
        }
        for (name, value) in [
            ("detectThreshold", self.detect_threshold),
            ("meshThreshold", self.mesh_threshold),
        ] {
            if !(0.0..=1.0).contains(&value) {
                return invalid(format!("{name} must be within [0, 1], got {value}"));
            }
        }
        if !(self.ema_factor > 0.0 && self.ema_factor <= 1.0) {
            return invalid(format!("emaFactor must be within (0, 1], got {}", self.ema_factor));
        }
        match (self.width, self.height) {
            (Some(0), _) | (_, Some(0)) => return invalid("width and height must be positive".into()),
            (Some(_), None) | (None, Some(_)) => {
                return invalid("width and height must be given together".into())
            }
            _ => {}
        }
        if !self.use_detector && !self.mesh_enabled {
            return invalid("at least one of the detector and the mesh must be enabled".into());
        }
        Ok(())
    }

    /// Requested capture resolution, if both sides are set.
    pub fn capture_size(&self) -> Option<(u32, u32)> {
        self.width.zip(self.height)
    }
}
