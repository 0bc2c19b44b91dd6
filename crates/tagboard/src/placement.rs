//! Anchor-relative marker placement.
//!
//! Storage is always the top-left corner. The anchor only changes what the
//! user sees as "the" position: `displayed = top_left + anchor * size`.
//! Resizing keeps the displayed point fixed; changing the anchor does not
//! move the marker at all, it only relabels the displayed coordinate.
//!
//! The top-left is kept as `f64` so that repeated resizes around a centre
//! anchor stay exact. Whole pixels are produced at the edges: on drag end
//! ([`MarkerPlacement::round`]), when rendering, and in layout export.

use nalgebra::Point2;
use tagboard_core::{Anchor, PixelRect};

use crate::PlacementError;

/// Largest marker side in pixels.
pub const MAX_MARKER_PX: u32 = 8192;

/// Snap `requested` to the nearest multiple of `unit`, never below one unit.
///
/// Fails with [`PlacementError::TooLarge`] when the snapped side would exceed
/// [`MAX_MARKER_PX`].
pub fn snap_size(requested: f64, unit: u32) -> Result<u32, PlacementError> {
    if unit == 0 {
        return Err(PlacementError::ZeroUnit);
    }
    if !requested.is_finite() {
        return Err(PlacementError::NonFinite("size"));
    }
    let k = (requested / f64::from(unit)).round().max(1.0);
    let snapped = k * f64::from(unit);
    if snapped > f64::from(MAX_MARKER_PX) {
        return Err(PlacementError::TooLarge {
            requested,
            max: MAX_MARKER_PX,
        });
    }
    Ok(snapped as u32)
}

/// Position, quantized size and anchor of one marker.
///
/// The stored top-left may be fractional between edits; see the module docs.
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct MarkerPlacement {
    top_left: Point2<f64>,
    size_px: u32,
    anchor: Anchor,
    unit: u32,
}

impl MarkerPlacement {
    /// Placement with `requested_size` snapped to `unit`.
    pub fn new(
        top_left: Point2<f64>,
        requested_size: f64,
        anchor: Anchor,
        unit: u32,
    ) -> Result<Self, PlacementError> {
        check_point(top_left)?;
        Ok(Self {
            top_left,
            size_px: snap_size(requested_size, unit)?,
            anchor,
            unit,
        })
    }

    #[inline]
    pub fn top_left(&self) -> Point2<f64> {
        self.top_left
    }

    #[inline]
    pub fn size_px(&self) -> u32 {
        self.size_px
    }

    #[inline]
    pub fn anchor(&self) -> Anchor {
        self.anchor
    }

    /// Cell count the size is quantized to.
    #[inline]
    pub fn unit(&self) -> u32 {
        self.unit
    }

    pub fn bounds(&self) -> PixelRect {
        PixelRect::square(self.top_left, f64::from(self.size_px))
    }

    /// Resize around the anchor point and return the stored (snapped) size.
    pub fn set_size(&mut self, requested: f64) -> Result<u32, PlacementError> {
        let new_size = snap_size(requested, self.unit)?;
        let delta = f64::from(new_size) - f64::from(self.size_px);
        let (dx, dy) = self.anchor.offset(delta);
        self.top_left.x -= dx;
        self.top_left.y -= dy;
        self.size_px = new_size;
        Ok(new_size)
    }

    /// Switch to a new size unit and re-snap the current size around the anchor.
    pub fn set_unit(&mut self, unit: u32) -> Result<u32, PlacementError> {
        if unit == 0 {
            return Err(PlacementError::ZeroUnit);
        }
        let previous = self.unit;
        self.unit = unit;
        self.set_size(f64::from(self.size_px)).inspect_err(|_| {
            self.unit = previous;
        })
    }

    /// Screen coordinate of the anchor point.
    pub fn displayed_position(&self) -> Point2<f64> {
        let (dx, dy) = self.anchor.offset(f64::from(self.size_px));
        Point2::new(self.top_left.x + dx, self.top_left.y + dy)
    }

    /// Place the marker so that its anchor point lands on `displayed`.
    pub fn set_displayed_position(&mut self, displayed: Point2<f64>) -> Result<(), PlacementError> {
        check_point(displayed)?;
        let (dx, dy) = self.anchor.offset(f64::from(self.size_px));
        self.top_left = Point2::new(displayed.x - dx, displayed.y - dy);
        Ok(())
    }

    pub fn set_top_left(&mut self, top_left: Point2<f64>) -> Result<(), PlacementError> {
        check_point(top_left)?;
        self.top_left = top_left;
        Ok(())
    }

    /// Change the reference point for future edits. The marker does not move.
    pub fn set_anchor(&mut self, anchor: Anchor) {
        self.anchor = anchor;
    }

    /// Round the stored position to whole pixels.
    pub fn round(&mut self) {
        self.top_left = Point2::new(self.top_left.x.round(), self.top_left.y.round());
    }
}

fn check_point(p: Point2<f64>) -> Result<(), PlacementError> {
    if !p.x.is_finite() {
        return Err(PlacementError::NonFinite("x"));
    }
    if !p.y.is_finite() {
        return Err(PlacementError::NonFinite("y"));
    }
    Ok(())
}
