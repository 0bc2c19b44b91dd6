//! Pixel-space geometry for placement and hit-testing.

use nalgebra::Point2;
use serde::{Deserialize, Serialize};

/// Normalized reference point on a marker's bounding box.
///
/// `(0, 0)` is the top-left corner, `(1, 1)` the bottom-right one.
#[derive(Clone, Copy, Debug, PartialEq, Serialize, Deserialize)]
pub struct Anchor {
    pub ax: f64,
    pub ay: f64,
}

impl Default for Anchor {
    fn default() -> Self {
        Self::TOP_LEFT
    }
}

impl Anchor {
    pub const TOP_LEFT: Anchor = Anchor { ax: 0.0, ay: 0.0 };
    pub const CENTER: Anchor = Anchor { ax: 0.5, ay: 0.5 };
    pub const BOTTOM_RIGHT: Anchor = Anchor { ax: 1.0, ay: 1.0 };

    /// Validated anchor; both components must be finite and in `[0, 1]`.
    pub fn new(ax: f64, ay: f64) -> Option<Self> {
        let valid = |v: f64| v.is_finite() && (0.0..=1.0).contains(&v);
        (valid(ax) && valid(ay)).then_some(Self { ax, ay })
    }

    /// Offset of the anchor point from the top-left corner of a `size × size` box.
    #[inline]
    pub fn offset(self, size: f64) -> (f64, f64) {
        (self.ax * size, self.ay * size)
    }
}

/// Axis-aligned rectangle in canvas pixels.
#[derive(Clone, Copy, Debug, PartialEq, Serialize, Deserialize)]
pub struct PixelRect {
    pub x: f64,
    pub y: f64,
    pub width: f64,
    pub height: f64,
}

impl PixelRect {
    pub fn new(x: f64, y: f64, width: f64, height: f64) -> Self {
        Self {
            x,
            y,
            width,
            height,
        }
    }

    pub fn square(origin: Point2<f64>, side: f64) -> Self {
        Self::new(origin.x, origin.y, side, side)
    }

    /// Closed containment test: points on the right and bottom edges count.
    pub fn contains(&self, p: Point2<f64>) -> bool {
        p.x >= self.x && p.x <= self.x + self.width && p.y >= self.y && p.y <= self.y + self.height
    }
}
