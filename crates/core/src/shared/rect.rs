use crate::shared::error::TrackingError;

/// A face region candidate in source-image pixel space.
///
/// `probability` is the sigmoid-activated detector confidence or the mesh
/// face confidence, depending on where the rect came from.
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct Rect {
    pub probability: f32,
    pub left: f32,
    pub top: f32,
    pub right: f32,
    pub bottom: f32,
}

impl Rect {
    pub fn new(probability: f32, left: f32, top: f32, right: f32, bottom: f32) -> Self {
        Self {
            probability,
            left,
            top,
            right,
            bottom,
        }
    }

    /// The whole `width × height` image as a region with full confidence.
    pub fn full_frame(width: u32, height: u32) -> Self {
        Self::new(
            1.0,
            0.0,
            0.0,
            width.saturating_sub(1) as f32,
            height.saturating_sub(1) as f32,
        )
    }

    pub fn from_center_size(probability: f32, cx: f32, cy: f32, width: f32, height: f32) -> Self {
        let left = cx - width / 2.0;
        let top = cy - height / 2.0;
        Self::new(probability, left, top, left + width, top + height)
    }

    /// Axis-aligned bounding box of `points`, or `None` when there are none.
    pub fn bounding<I>(probability: f32, points: I) -> Option<Self>
    where
        I: IntoIterator<Item = (f32, f32)>,
    {
        let mut iter = points.into_iter();
        let (x0, y0) = iter.next()?;
        let init = Self::new(probability, x0, y0, x0, y0);
        Some(iter.fold(init, |r, (x, y)| Self {
            left: r.left.min(x),
            top: r.top.min(y),
            right: r.right.max(x),
            bottom: r.bottom.max(y),
            ..r
        }))
    }

    pub fn width(&self) -> f32 {
        self.right - self.left
    }

    pub fn height(&self) -> f32 {
        self.bottom - self.top
    }

    pub fn center(&self) -> (f32, f32) {
        (
            (self.left + self.right) / 2.0,
            (self.top + self.bottom) / 2.0,
        )
    }

    /// True when the rect has no area (or non-finite bounds).
    pub fn is_degenerate(&self) -> bool {
        !(self.width() > 0.0 && self.height() > 0.0)
    }

    pub fn rounded(self) -> Self {
        Self {
            left: self.left.round(),
            top: self.top.round(),
            right: self.right.round(),
            bottom: self.bottom.round(),
            ..self
        }
    }

    /// Orders the bounds so `left <= right`, `top <= bottom`, then clamps
    /// them into `[0, width-1] × [0, height-1]`.
    ///
    /// Non-finite bounds collapse to 0.
    pub fn clamped(self, width: u32, height: u32) -> Self {
        let max_x = width.saturating_sub(1) as f32;
        let max_y = height.saturating_sub(1) as f32;
        let fix = |v: f32, max: f32| if v.is_finite() { v.clamp(0.0, max) } else { 0.0 };
        let (left, right) = (self.left.min(self.right), self.left.max(self.right));
        let (top, bottom) = (self.top.min(self.bottom), self.top.max(self.bottom));
        Self {
            left: fix(left, max_x),
            top: fix(top, max_y),
            right: fix(right, max_x),
            bottom: fix(bottom, max_y),
            ..self
        }
    }

    /// Grows the rect by `fraction` of its own width/height on every side,
    /// rounds to whole pixels and clamps to the image.
    ///
    /// Padding is not additive at the image border: padding twice by `f`
    /// differs from padding once by `2f` once a side has been clamped.
    pub fn padded(self, fraction: f32, width: u32, height: u32) -> Self {
        let dx = self.width() * fraction;
        let dy = self.height() * fraction;
        Self {
            left: self.left - dx,
            top: self.top - dy,
            right: self.right + dx,
            bottom: self.bottom + dy,
            ..self
        }
        .rounded()
        .clamped(width, height)
    }

    /// Returns the rect unchanged if it has area, else `DegenerateRegion`.
    pub fn non_degenerate(self) -> Result<Self, TrackingError> {
        if self.is_degenerate() {
            Err(TrackingError::DegenerateRegion {
                width: self.width(),
                height: self.height(),
            })
        } else {
            Ok(self)
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use approx::assert_relative_eq;
    use rstest::rstest;

    fn rect(left: f32, top: f32, right: f32, bottom: f32) -> Rect {
        Rect::new(0.95, left, top, right, bottom)
    }

    #[test]
    fn test_from_center_size() {
        let r = Rect::from_center_size(0.5, 50.0, 40.0, 20.0, 10.0);
        assert_eq!(r, Rect::new(0.5, 40.0, 35.0, 60.0, 45.0));
        assert_eq!(r.center(), (50.0, 40.0));
    }

    #[test]
    fn test_bounding_of_points() {
        let r = Rect::bounding(0.7, [(5.0, 9.0), (1.0, 12.0), (3.0, 2.0)]).unwrap();
        assert_eq!(r, Rect::new(0.7, 1.0, 2.0, 5.0, 12.0));
    }

    #[test]
    fn test_bounding_of_nothing_is_none() {
        assert!(Rect::bounding(0.7, std::iter::empty()).is_none());
    }

    #[test]
    fn test_full_frame() {
        assert_eq!(Rect::full_frame(640, 480), Rect::new(1.0, 0.0, 0.0, 639.0, 479.0));
    }

    #[rstest]
    #[case::inside(rect(10.0, 10.0, 20.0, 20.0), rect(10.0, 10.0, 20.0, 20.0))]
    #[case::negative(rect(-30.0, -5.0, 20.0, 20.0), rect(0.0, 0.0, 20.0, 20.0))]
    #[case::overflowing(rect(90.0, 40.0, 150.0, 80.0), rect(90.0, 40.0, 99.0, 49.0))]
    #[case::entirely_outside(rect(200.0, 300.0, 250.0, 350.0), rect(99.0, 49.0, 99.0, 49.0))]
    #[case::inverted(rect(30.0, 20.0, 10.0, 5.0), rect(10.0, 5.0, 30.0, 20.0))]
    #[case::not_finite(rect(f32::NAN, 1.0, f32::INFINITY, 2.0), rect(0.0, 1.0, 0.0, 2.0))]
    fn test_clamped(#[case] input: Rect, #[case] expected: Rect) {
        assert_eq!(input.clamped(100, 50), expected);
    }

    #[test]
    fn test_clamped_keeps_probability() {
        let r = Rect::new(0.3, -1.0, -1.0, 5.0, 5.0).clamped(10, 10);
        assert_relative_eq!(r.probability, 0.3);
    }

    #[test]
    fn test_padded_grows_each_side_by_fraction() {
        let r = rect(100.0, 100.0, 200.0, 180.0).padded(0.25, 640, 480);
        assert_eq!(r, rect(75.0, 80.0, 225.0, 200.0));
    }

    #[test]
    fn test_padded_clamps_at_border() {
        let r = rect(0.0, 10.0, 100.0, 90.0).padded(0.25, 120, 100);
        assert_eq!(r, rect(0.0, 0.0, 119.0, 99.0));
    }

    #[test]
    fn test_padding_twice_differs_from_double_padding_at_border() {
        // Touches the left border, so the left growth is lost on each pass.
        let start = rect(0.0, 100.0, 100.0, 200.0);
        let twice = start.padded(0.25, 1000, 1000).padded(0.25, 1000, 1000);
        let once = start.padded(0.5, 1000, 1000);

        // pass 1: right 125; pass 2: width 125 → right 125 + 31.25 → 156
        assert_eq!(twice.right, 156.0);
        assert_eq!(once.right, 150.0);
        assert_ne!(twice, once);
    }

    #[rstest]
    #[case::zero_width(rect(5.0, 5.0, 5.0, 10.0), true)]
    #[case::zero_height(rect(5.0, 5.0, 10.0, 5.0), true)]
    #[case::nan(rect(f32::NAN, 5.0, 10.0, 10.0), true)]
    #[case::valid(rect(5.0, 5.0, 6.0, 6.0), false)]
    fn test_is_degenerate(#[case] r: Rect, #[case] expected: bool) {
        assert_eq!(r.is_degenerate(), expected);
    }

    #[test]
    fn test_non_degenerate_reports_size() {
        let err = rect(5.0, 5.0, 5.0, 9.0).non_degenerate().unwrap_err();
        assert!(matches!(
            err,
            TrackingError::DegenerateRegion { width, height } if width == 0.0 && height == 4.0
        ));
    }
}
