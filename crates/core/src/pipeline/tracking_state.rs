use std::fmt;

use crate::shared::rect::Rect;

/// Which path the tracker takes for a frame.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum TrackingPhase {
    /// No trusted prior region; run full detection.
    Searching,
    /// Reuse the region carried from the previous frame's mesh.
    Tracking,
}

impl fmt::Display for TrackingPhase {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            TrackingPhase::Searching => write!(f, "searching"),
            TrackingPhase::Tracking => write!(f, "tracking"),
        }
    }
}

/// The single slot carried between frames.
///
/// A tracked region is stored already padded and clamped, ready to crop.
#[derive(Clone, Copy, Debug, Default, PartialEq)]
pub enum TrackingState {
    #[default]
    Searching,
    Tracking(Rect),
}

impl TrackingState {
    pub fn phase(&self) -> TrackingPhase {
        match self {
            TrackingState::Searching => TrackingPhase::Searching,
            TrackingState::Tracking(_) => TrackingPhase::Tracking,
        }
    }

    /// Takes the carried state, leaving `Searching` behind so that any
    /// failure before a new state is stored falls back to detection.
    pub fn take(&mut self) -> TrackingState {
        std::mem::take(self)
    }
}
