use crate::mesh::domain::face_mesh::Landmark;
use crate::shared::error::PortError;
use crate::shared::frame::Frame;
use crate::shared::rect::Rect;

/// Consumes tracking results for display.
///
/// Called once per frame as `begin_frame`, any number of draws, then
/// `finish_frame`.
pub trait Renderer: Send {
    fn begin_frame(&mut self, frame: &Frame) -> Result<(), PortError>;

    /// Rectangle outline in source pixels.
    fn draw_rect(&mut self, rect: &Rect);

    /// Point markers in source pixels.
    fn draw_landmarks(&mut self, landmarks: &[Landmark]);

    /// Smoothed frame rate for on-screen text.
    fn draw_fps(&mut self, fps: f64);

    fn finish_frame(&mut self) -> Result<(), PortError>;
}

/// Renderer that draws nothing, for headless runs.
pub struct NullRenderer;

impl Renderer for NullRenderer {
    fn begin_frame(&mut self, _frame: &Frame) -> Result<(), PortError> {
        Ok(())
    }
    fn draw_rect(&mut self, _rect: &Rect) {}
    fn draw_landmarks(&mut self, _landmarks: &[Landmark]) {}
    fn draw_fps(&mut self, _fps: f64) {}
    fn finish_frame(&mut self) -> Result<(), PortError> {
        Ok(())
    }
}
