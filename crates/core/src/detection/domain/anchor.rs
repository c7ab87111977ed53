//! Detector anchor table.
//!
//! Each detector output slot is paired with one anchor: a reference box
//! centre in normalized `[0,1]` input coordinates and per-axis scale
//! factors. The table is fixed by the detector architecture and loaded
//! once at startup.

use std::path::Path;

use crate::shared::constants::DETECT_SIZE;
use crate::shared::error::TrackingError;

/// Anchor-per-slot count of the 128×128 front-camera BlazeFace model.
pub const BLAZEFACE_FRONT_ANCHORS: usize = 896;

#[derive(Clone, Copy, Debug, PartialEq)]
pub struct Anchor {
    pub cx: f32,
    pub cy: f32,
    pub sx: f32,
    pub sy: f32,
}

impl Anchor {
    pub fn new(cx: f32, cy: f32, sx: f32, sy: f32) -> Self {
        Self { cx, cy, sx, sy }
    }
}

/// Immutable, ordered anchor table. Order matches the detector's output rows.
#[derive(Clone, Debug)]
pub struct AnchorTable {
    anchors: Vec<Anchor>,
}

impl AnchorTable {
    pub fn new(anchors: Vec<Anchor>) -> Result<Self, TrackingError> {
        if anchors.is_empty() {
            return Err(TrackingError::Anchors("table is empty".into()));
        }
        Ok(Self { anchors })
    }

    /// Parses a JSON array of `[cx, cy, sx, sy]` rows.
    pub fn from_json_str(json: &str) -> Result<Self, TrackingError> {
        let rows: Vec<Vec<f32>> =
            serde_json::from_str(json).map_err(|e| TrackingError::Anchors(e.to_string()))?;
        let anchors = rows
            .iter()
            .enumerate()
            .map(|(i, row)| match row.as_slice() {
                &[cx, cy, sx, sy] => Ok(Anchor::new(cx, cy, sx, sy)),
                other => Err(TrackingError::Anchors(format!(
                    "row {i} has {} values, expected 4",
                    other.len()
                ))),
            })
            .collect::<Result<Vec<_>, _>>()?;
        Self::new(anchors)
    }

    pub fn load(path: &Path) -> Result<Self, TrackingError> {
        let json = std::fs::read_to_string(path)
            .map_err(|e| TrackingError::Anchors(format!("{}: {e}", path.display())))?;
        let table = Self::from_json_str(&json)?;
        log::info!("Loaded {} anchors from {}", table.len(), path.display());
        Ok(table)
    }

    /// Anchors of the front-camera BlazeFace model.
    ///
    /// Two feature maps: 16×16 with 2 anchors per cell, then 8×8 with 6.
    /// Anchor sizes are fixed, so both scales are 1.
    pub fn blazeface_front() -> Self {
        let layers = [(8usize, 2usize), (16, 6)]; // (stride, anchors per cell)
        let mut anchors = Vec::with_capacity(BLAZEFACE_FRONT_ANCHORS);

        for &(stride, per_cell) in &layers {
            let grid = DETECT_SIZE as usize / stride;
            for y in 0..grid {
                for x in 0..grid {
                    let cx = (x as f32 + 0.5) / grid as f32;
                    let cy = (y as f32 + 0.5) / grid as f32;
                    anchors.extend(std::iter::repeat(Anchor::new(cx, cy, 1.0, 1.0)).take(per_cell));
                }
            }
        }

        Self { anchors }
    }

    pub fn len(&self) -> usize {
        self.anchors.len()
    }

    pub fn is_empty(&self) -> bool {
        self.anchors.is_empty()
    }

    pub fn get(&self, index: usize) -> Option<&Anchor> {
        self.anchors.get(index)
    }

    pub fn as_slice(&self) -> &[Anchor] {
        &self.anchors
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_blazeface_front_count() {
        // 16×16 grid × 2 anchors + 8×8 grid × 6 anchors = 512 + 384 = 896
        assert_eq!(AnchorTable::blazeface_front().len(), BLAZEFACE_FRONT_ANCHORS);
    }

    #[test]
    fn test_blazeface_front_in_unit_range_with_unit_scale() {
        for a in AnchorTable::blazeface_front().as_slice() {
            assert!(a.cx > 0.0 && a.cx < 1.0);
            assert!(a.cy > 0.0 && a.cy < 1.0);
            assert_eq!((a.sx, a.sy), (1.0, 1.0));
        }
    }

    #[test]
    fn test_blazeface_front_order() {
        let table = AnchorTable::blazeface_front();
        // First two slots share the top-left 16×16 cell.
        assert_eq!(table.get(0), Some(&Anchor::new(0.5 / 16.0, 0.5 / 16.0, 1.0, 1.0)));
        assert_eq!(table.get(0), table.get(1));
        assert_eq!(table.get(2).unwrap().cx, 1.5 / 16.0);
        // The 8×8 layer starts after 512 slots.
        assert_eq!(table.get(512).unwrap().cx, 0.5 / 8.0);
    }

    #[test]
    fn test_from_json_str() {
        let table = AnchorTable::from_json_str("[[0.5, 0.25, 1.0, 2.0], [0.1, 0.2, 0.3, 0.4]]")
            .unwrap();
        assert_eq!(table.len(), 2);
        assert_eq!(table.get(0), Some(&Anchor::new(0.5, 0.25, 1.0, 2.0)));
    }

    #[test]
    fn test_from_json_str_rejects_short_rows() {
        let err = AnchorTable::from_json_str("[[0.5, 0.25, 1.0]]").unwrap_err();
        assert!(err.to_string().contains("row 0 has 3 values"));
    }

    #[test]
    fn test_from_json_str_rejects_empty_table() {
        assert!(AnchorTable::from_json_str("[]").is_err());
    }

    #[test]
    fn test_from_json_str_rejects_malformed_json() {
        assert!(matches!(
            AnchorTable::from_json_str("{\"cx\": 1}"),
            Err(TrackingError::Anchors(_))
        ));
    }

    #[test]
    fn test_load_from_file() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("anchors.json");
        std::fs::write(&path, "[[0.5, 0.5, 1.0, 1.0]]").unwrap();
        let table = AnchorTable::load(&path).unwrap();
        assert_eq!(table.len(), 1);
    }

    #[test]
    fn test_load_missing_file() {
        assert!(AnchorTable::load(Path::new("/nonexistent/anchors.json")).is_err());
    }
}
