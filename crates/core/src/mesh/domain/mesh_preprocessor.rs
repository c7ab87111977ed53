use image::imageops::{self, FilterType};
use image::RgbImage;
use ndarray::{Array4, ArrayView4};

use crate::shared::constants::MESH_SIZE;
use crate::shared::error::TrackingError;
use crate::shared::frame::Frame;
use crate::shared::rect::Rect;

/// Crops a face region out of a frame into the mesh network's input tensor.
///
/// Owns the input buffer and refills it every frame.
pub struct MeshPreprocessor {
    input: Array4<f32>,
}

impl MeshPreprocessor {
    pub fn new() -> Self {
        let s = MESH_SIZE as usize;
        Self {
            input: Array4::zeros((1, s, s, 3)),
        }
    }

    /// Slices `region` out of `frame`, resizes it to `MESH_SIZE²` and maps
    /// pixels to `[0, 1]`.
    ///
    /// The region is snapped to whole pixels inside the frame first; the
    /// snapped rect is returned so landmarks can be mapped back through
    /// exactly the crop that was used. Regions without area are refused.
    pub fn prepare(
        &mut self,
        frame: &Frame,
        region: &Rect,
    ) -> Result<(ArrayView4<'_, f32>, Rect), TrackingError> {
        let crop = region
            .rounded()
            .clamped(frame.width(), frame.height())
            .non_degenerate()?;

        let view = frame.as_image();
        let (x0, y0) = (crop.left as u32, crop.top as u32);
        let patch = RgbImage::from_fn(crop.width() as u32, crop.height() as u32, |x, y| {
            *view.get_pixel(x0 + x, y0 + y)
        });
        let resized = imageops::resize(&patch, MESH_SIZE, MESH_SIZE, FilterType::Triangle);

        for (x, y, px) in resized.enumerate_pixels() {
            for (c, &v) in px.0.iter().enumerate() {
                self.input[[0, y as usize, x as usize, c]] = v as f32 / 255.0;
            }
        }

        Ok((self.input.view(), crop))
    }
}

impl Default for MeshPreprocessor {
    fn default() -> Self {
        Self::new()
    }
}
