use thiserror::Error;

/// Error type returned by collaborator ports (networks, frame sources,
/// renderers). Adapters can `?` any library error into it.
pub type PortError = Box<dyn std::error::Error + Send + Sync>;

#[derive(Error, Debug)]
pub enum TrackingError {
    #[error("region has no area after clamping ({width}x{height})")]
    DegenerateRegion { width: f32, height: f32 },
    #[error("{stage} inference failed: {source}")]
    Inference {
        stage: &'static str,
        #[source]
        source: PortError,
    },
    #[error("frame source exhausted")]
    SourceExhausted,
    #[error("invalid configuration: {0}")]
    InvalidConfiguration(String),
    #[error("timestamps must strictly increase (previous {previous} ms, current {current} ms)")]
    NonMonotonicTimestamp { previous: f64, current: f64 },
    #[error("frame source failed: {0}")]
    Source(#[source] PortError),
    #[error("renderer failed: {0}")]
    Render(#[source] PortError),
    #[error("invalid anchor table: {0}")]
    Anchors(String),
}

impl TrackingError {
    pub(crate) fn inference(stage: &'static str, source: impl Into<PortError>) -> Self {
        TrackingError::Inference {
            stage,
            source: source.into(),
        }
    }

    /// Per-frame failures reset tracking and let the loop continue.
    pub fn is_per_frame(&self) -> bool {
        matches!(
            self,
            TrackingError::DegenerateRegion { .. } | TrackingError::Inference { .. }
        )
    }
}
