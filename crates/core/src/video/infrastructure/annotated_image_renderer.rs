use std::path::{Path, PathBuf};

use ndarray::ArrayViewMut3;

use crate::mesh::domain::face_mesh::Landmark;
use crate::shared::error::PortError;
use crate::shared::frame::Frame;
use crate::shared::rect::Rect;
use crate::video::domain::renderer::Renderer;

const RECT_COLOR: [u8; 3] = [0, 255, 0];
const LANDMARK_COLOR: [u8; 3] = [255, 64, 64];

/// Draws results onto a copy of each frame and saves it as
/// `frame_NNNNN.png` in an output directory.
pub struct AnnotatedImageRenderer {
    output_dir: PathBuf,
    canvas: Option<Frame>,
    fps: Option<f64>,
    written: usize,
}

impl AnnotatedImageRenderer {
    pub fn new(output_dir: &Path) -> Result<Self, Box<dyn std::error::Error>> {
        std::fs::create_dir_all(output_dir)?;
        Ok(Self {
            output_dir: output_dir.to_path_buf(),
            canvas: None,
            fps: None,
            written: 0,
        })
    }

    pub fn written(&self) -> usize {
        self.written
    }

    pub fn path_for(&self, index: usize) -> PathBuf {
        self.output_dir.join(format!("frame_{index:05}.png"))
    }
}

impl Renderer for AnnotatedImageRenderer {
    fn begin_frame(&mut self, frame: &Frame) -> Result<(), PortError> {
        self.canvas = Some(frame.clone());
        self.fps = None;
        Ok(())
    }

    fn draw_rect(&mut self, rect: &Rect) {
        if let Some(canvas) = self.canvas.as_mut() {
            outline(&mut canvas.as_ndarray_mut(), rect, RECT_COLOR);
        }
    }

    fn draw_landmarks(&mut self, landmarks: &[Landmark]) {
        if let Some(canvas) = self.canvas.as_mut() {
            let mut pixels = canvas.as_ndarray_mut();
            for l in landmarks {
                // 3x3 marker
                for dy in -1..=1 {
                    for dx in -1..=1 {
                        put(&mut pixels, l.x.round() as i64 + dx, l.y.round() as i64 + dy, LANDMARK_COLOR);
                    }
                }
            }
        }
    }

    fn draw_fps(&mut self, fps: f64) {
        self.fps = Some(fps);
    }

    fn finish_frame(&mut self) -> Result<(), PortError> {
        let canvas = self.canvas.take().ok_or("finish_frame called without begin_frame")?;
        let path = self.path_for(canvas.index());
        let img = image::RgbImage::from_raw(canvas.width(), canvas.height(), canvas.data().to_vec())
            .ok_or("Failed to create image from frame data")?;
        img.save(&path)?;
        self.written += 1;

        match self.fps.take() {
            Some(fps) => log::debug!("Wrote {} ({fps:.1} fps)", path.display()),
            None => log::debug!("Wrote {}", path.display()),
        }
        Ok(())
    }
}

fn put(pixels: &mut ArrayViewMut3<'_, u8>, x: i64, y: i64, color: [u8; 3]) {
    let (h, w, _) = pixels.dim();
    if x < 0 || y < 0 || x >= w as i64 || y >= h as i64 {
        return;
    }
    for (c, &v) in color.iter().enumerate() {
        pixels[[y as usize, x as usize, c]] = v;
    }
}

fn edge(v: f32, extent: i64) -> i64 {
    (v.round() as i64).clamp(-1, extent)
}

fn outline(pixels: &mut ArrayViewMut3<'_, u8>, rect: &Rect, color: [u8; 3]) {
    if !(rect.left.is_finite() && rect.top.is_finite() && rect.right.is_finite() && rect.bottom.is_finite()) {
        return;
    }
    // Edges beyond the canvas collapse to one pixel outside it, so the
    // loops stay bounded by the canvas size.
    let (h, w, _) = pixels.dim();
    let (w, h) = (w as i64, h as i64);
    let (l, r) = (edge(rect.left, w), edge(rect.right, w));
    let (t, b) = (edge(rect.top, h), edge(rect.bottom, h));
    for x in l..=r {
        put(pixels, x, t, color);
        put(pixels, x, b, color);
    }
    for y in t..=b {
        put(pixels, l, y, color);
        put(pixels, r, y, color);
    }
}
