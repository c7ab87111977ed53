use crate::shared::error::PortError;
use crate::shared::frame::Frame;

/// Supplies frames to the tracking loop, one per call.
///
/// `capture` may block until a frame is available. `Ok(None)` means the
/// source is exhausted and the loop should end.
pub trait FrameSource: Send {
    fn capture(&mut self) -> Result<Option<Frame>, PortError>;

    /// Frames left, when the source knows. Used for progress reporting.
    fn remaining(&self) -> Option<usize> {
        None
    }
}
