use std::collections::VecDeque;
use std::path::{Path, PathBuf};

use image::imageops::FilterType;

use crate::shared::constants::IMAGE_EXTENSIONS;
use crate::shared::error::PortError;
use crate::shared::frame::Frame;
use crate::video::domain::frame_source::FrameSource;

/// Plays back a single image or a directory of images as frames.
///
/// Directory entries are filtered by extension and played in file-name
/// order. Each file is decoded lazily on `capture`.
pub struct ImageSequenceSource {
    paths: VecDeque<PathBuf>,
    size: Option<(u32, u32)>,
    next_index: usize,
}

impl ImageSequenceSource {
    /// `size` resizes every frame to `width × height`, standing in for a
    /// requested capture resolution.
    pub fn open(path: &Path, size: Option<(u32, u32)>) -> Result<Self, Box<dyn std::error::Error>> {
        let paths = if path.is_dir() {
            let mut files: Vec<PathBuf> = std::fs::read_dir(path)?
                .filter_map(|entry| entry.ok().map(|e| e.path()))
                .filter(|p| p.is_file() && is_image_path(p))
                .collect();
            files.sort();
            if files.is_empty() {
                return Err(format!("no images found in {}", path.display()).into());
            }
            files
        } else if path.is_file() {
            vec![path.to_path_buf()]
        } else {
            return Err(format!("input not found: {}", path.display()).into());
        };

        log::info!("Frame source: {} image(s) from {}", paths.len(), path.display());
        Ok(Self {
            paths: paths.into(),
            size,
            next_index: 0,
        })
    }
}

pub fn is_image_path(path: &Path) -> bool {
    path.extension()
        .and_then(|e| e.to_str())
        .map(|e| IMAGE_EXTENSIONS.contains(&e.to_lowercase().as_str()))
        .unwrap_or(false)
}

impl FrameSource for ImageSequenceSource {
    fn capture(&mut self) -> Result<Option<Frame>, PortError> {
        let Some(path) = self.paths.pop_front() else {
            return Ok(None);
        };
        let decoded = image::open(&path)
            .map_err(|e| format!("{}: {e}", path.display()))?
            .to_rgb8();
        let img = match self.size {
            Some((w, h)) if decoded.dimensions() != (w, h) => {
                image::imageops::resize(&decoded, w, h, FilterType::Triangle)
            }
            _ => decoded,
        };

        let frame = Frame::from_image(img, self.next_index);
        self.next_index += 1;
        Ok(Some(frame))
    }

    fn remaining(&self) -> Option<usize> {
        Some(self.paths.len())
    }
}
