use image::imageops::{self, FilterType};
use ndarray::{Array4, ArrayView4};

use crate::shared::constants::DETECT_SIZE;
use crate::shared::error::TrackingError;
use crate::shared::frame::Frame;

/// Aspect-preserving fit of a source size into the square detector input.
///
/// Depends only on the source size, so it is computed once per size change.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct Letterbox {
    pub source_width: u32,
    pub source_height: u32,
    pub target_width: u32,
    pub target_height: u32,
    pub pad_top: u32,
    pub pad_bottom: u32,
    pub pad_left: u32,
    pub pad_right: u32,
}

impl Letterbox {
    pub fn new(source_width: u32, source_height: u32) -> Self {
        let size = DETECT_SIZE;
        let minor = |short: u32, long: u32| {
            ((short as f64 * size as f64 / long.max(1) as f64).round() as u32).clamp(1, size)
        };
        let (target_height, target_width) = if source_height > source_width {
            (size, minor(source_width, source_height))
        } else if source_width > source_height {
            (minor(source_height, source_width), size)
        } else {
            (size, size)
        };

        let split = |free: u32| (free.div_ceil(2), free / 2);
        let (pad_top, pad_bottom) = split(size - target_height);
        let (pad_left, pad_right) = split(size - target_width);

        Self {
            source_width,
            source_height,
            target_width,
            target_height,
            pad_top,
            pad_bottom,
            pad_left,
            pad_right,
        }
    }

    /// Uniform factor from letterboxed-input pixels back to source pixels.
    pub fn scale(&self) -> f32 {
        self.source_height as f32 / self.target_height as f32
    }

    /// True when the short side of the source rounds to zero input rows
    /// or columns. The 1-pixel target then no longer reflects the source
    /// aspect, so `scale()` would decode to the wrong place.
    pub fn is_degenerate(&self) -> bool {
        let (short, long) = if self.source_width < self.source_height {
            (self.source_width, self.source_height)
        } else {
            (self.source_height, self.source_width)
        };
        short == 0 || (short as f64 * DETECT_SIZE as f64 / long as f64).round() < 1.0
    }

    pub fn matches(&self, width: u32, height: u32) -> bool {
        self.source_width == width && self.source_height == height
    }
}

/// Converts frames into the detector's letterboxed input tensor.
///
/// Owns the input buffer and refills it every frame.
pub struct DetectorPreprocessor {
    input: Array4<f32>,
    letterbox: Option<Letterbox>,
}

impl DetectorPreprocessor {
    pub fn new() -> Self {
        let s = DETECT_SIZE as usize;
        Self {
            input: Array4::zeros((1, s, s, 3)),
            letterbox: None,
        }
    }

    /// Letterbox for `frame`'s size, recomputed only when the size changes.
    pub fn letterbox_for(&mut self, frame: &Frame) -> Letterbox {
        match self.letterbox {
            Some(lb) if lb.matches(frame.width(), frame.height()) => lb,
            _ => {
                let lb = Letterbox::new(frame.width(), frame.height());
                log::debug!(
                    "Detector letterbox for {}x{}: target {}x{}, pad t{} b{} l{} r{}",
                    frame.width(),
                    frame.height(),
                    lb.target_width,
                    lb.target_height,
                    lb.pad_top,
                    lb.pad_bottom,
                    lb.pad_left,
                    lb.pad_right
                );
                self.letterbox = Some(lb);
                lb
            }
        }
    }

    /// Bilinear resize to the letterbox target, map `[0,255]` to `[-1,1]`,
    /// zero-pad to `DETECT_SIZE²`, NHWC with batch dimension.
    ///
    /// Frames too elongated to keep a whole row or column after the fit
    /// are refused with `DegenerateRegion`.
    pub fn prepare(
        &mut self,
        frame: &Frame,
    ) -> Result<(ArrayView4<'_, f32>, Letterbox), TrackingError> {
        let lb = self.letterbox_for(frame);
        if lb.is_degenerate() {
            return Err(TrackingError::DegenerateRegion {
                width: frame.width() as f32,
                height: frame.height() as f32,
            });
        }
        let resized = imageops::resize(
            &frame.as_image(),
            lb.target_width,
            lb.target_height,
            FilterType::Triangle,
        );

        self.input.fill(0.0);
        let (top, left) = (lb.pad_top as usize, lb.pad_left as usize);
        for (x, y, px) in resized.enumerate_pixels() {
            for (c, &v) in px.0.iter().enumerate() {
                self.input[[0, top + y as usize, left + x as usize, c]] = v as f32 / 127.5 - 1.0;
            }
        }

        Ok((self.input.view(), lb))
    }
}

impl Default for DetectorPreprocessor {
    fn default() -> Self {
        Self::new()
    }
}
