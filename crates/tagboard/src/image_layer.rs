//! Raster image layers drawn beneath the markers.

use std::fmt;
use std::sync::Arc;

use image::RgbaImage;
use nalgebra::Point2;
use tagboard_core::PixelRect;

use crate::scene::{fits_canvas_limits, MAX_CANVAS_SIDE};
use crate::EditorError;

#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct ImageId(pub u64);

impl fmt::Display for ImageId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "image#{}", self.0)
    }
}

/// An uploaded image and its on-canvas bounds.
#[derive(Clone, Debug)]
pub struct ImageLayer {
    id: ImageId,
    image: Arc<RgbaImage>,
    pub(crate) position: Point2<f64>,
    width: u32,
    height: u32,
}

impl ImageLayer {
    pub(crate) fn new(id: ImageId, image: Arc<RgbaImage>, position: Point2<f64>) -> Self {
        let (width, height) = image.dimensions();
        Self {
            id,
            image,
            position,
            width: width.max(1),
            height: height.max(1),
        }
    }

    #[inline]
    pub fn id(&self) -> ImageId {
        self.id
    }

    #[inline]
    pub fn image(&self) -> &Arc<RgbaImage> {
        &self.image
    }

    #[inline]
    pub fn position(&self) -> Point2<f64> {
        self.position
    }

    #[inline]
    pub fn width(&self) -> u32 {
        self.width
    }

    #[inline]
    pub fn height(&self) -> u32 {
        self.height
    }

    pub fn bounds(&self) -> PixelRect {
        PixelRect::new(
            self.position.x,
            self.position.y,
            f64::from(self.width),
            f64::from(self.height),
        )
    }

    pub(crate) fn set_position(&mut self, position: Point2<f64>) -> Result<(), EditorError> {
        if !position.x.is_finite() || !position.y.is_finite() {
            return Err(EditorError::invalid("image position", "non-finite"));
        }
        self.position = position;
        Ok(())
    }

    /// Set the width and scale the height to keep the aspect ratio.
    pub(crate) fn set_width_linked(&mut self, width: f64) -> Result<(), EditorError> {
        let width = positive_px("image width", width)?;
        let aspect = f64::from(self.height) / f64::from(self.width);
        let height = round_px(f64::from(width) * aspect);
        self.resize_to(width, height)
    }

    /// Set the height and scale the width to keep the aspect ratio.
    pub(crate) fn set_height_linked(&mut self, height: f64) -> Result<(), EditorError> {
        let height = positive_px("image height", height)?;
        let aspect = f64::from(self.width) / f64::from(self.height);
        let width = round_px(f64::from(height) * aspect);
        self.resize_to(width, height)
    }

    /// Set both dimensions independently.
    pub(crate) fn set_size(&mut self, width: f64, height: f64) -> Result<(), EditorError> {
        let width = positive_px("image width", width)?;
        let height = positive_px("image height", height)?;
        self.resize_to(width, height)
    }

    fn resize_to(&mut self, width: u32, height: u32) -> Result<(), EditorError> {
        if !fits_canvas_limits(width, height) {
            return Err(EditorError::invalid(
                "image size",
                format!("{width}x{height} is too large"),
            ));
        }
        self.width = width;
        self.height = height;
        Ok(())
    }

    pub(crate) fn round(&mut self) {
        self.position = Point2::new(self.position.x.round(), self.position.y.round());
    }
}

fn positive_px(field: &'static str, v: f64) -> Result<u32, EditorError> {
    if !v.is_finite() {
        return Err(EditorError::invalid(field, "non-finite"));
    }
    let px = v.round();
    if px < 1.0 || px > f64::from(MAX_CANVAS_SIDE) {
        return Err(EditorError::invalid(
            field,
            format!("{v} is not a positive size up to {MAX_CANVAS_SIDE} px"),
        ));
    }
    Ok(px as u32)
}

fn round_px(v: f64) -> u32 {
    v.round().clamp(1.0, f64::from(u32::MAX)) as u32
}

#[cfg(test)]
mod tests {
    use super::*;

    fn layer() -> ImageLayer {
        ImageLayer::new(
            ImageId(7),
            Arc::new(RgbaImage::new(400, 300)),
            Point2::new(10.0, 10.0),
        )
    }

    #[test]
    fn linked_edits_keep_aspect_ratio() {
        let mut l = layer();
        l.set_width_linked(200.0).expect("width");
        assert_eq!((l.width(), l.height()), (200, 150));
        l.set_height_linked(75.0).expect("height");
        assert_eq!((l.width(), l.height()), (100, 75));
    }

    #[test]
    fn independent_edits_ignore_aspect_ratio() {
        let mut l = layer();
        l.set_size(50.0, 500.0).expect("size");
        assert_eq!((l.width(), l.height()), (50, 500));
    }

    #[test]
    fn invalid_sizes_keep_previous_state() {
        let mut l = layer();
        assert!(l.set_width_linked(0.0).is_err());
        assert!(l.set_height_linked(f64::NAN).is_err());
        assert!(l.set_size(10.0, -4.0).is_err());
        assert_eq!((l.width(), l.height()), (400, 300));
    }

    #[test]
    fn oversized_targets_are_rejected() {
        let mut l = layer();
        // 16000 x 12000 is within the edge limit but over the pixel budget.
        assert!(l.set_width_linked(16_000.0).is_err());
        assert!(l.set_size(1e9, 10.0).is_err());
        assert_eq!((l.width(), l.height()), (400, 300));
        l.set_size(f64::from(MAX_CANVAS_SIDE), 100.0).expect("wide strip");
        assert_eq!(l.width(), MAX_CANVAS_SIDE);
    }
}
