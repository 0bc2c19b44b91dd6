//! Back-to-front compositing and pointer hit-testing.

use image::imageops::{self, FilterType};
use image::{DynamicImage, Rgba, RgbaImage};
use log::debug;
use nalgebra::Point2;
use tagboard_core::{parse_css_color, GrayImage, Rgba8};

#[cfg(feature = "tracing")]
use tracing::instrument;

use crate::{EditorError, ImageId, ImageLayer, Marker, MarkerId};

/// Largest canvas edge in pixels.
pub const MAX_CANVAS_SIDE: u32 = 16_384;
/// Largest canvas area in pixels.
pub const MAX_CANVAS_PIXELS: u64 = 64 * 1024 * 1024;

/// Whether a `width × height` raster fits the canvas limits.
pub(crate) fn fits_canvas_limits(width: u32, height: u32) -> bool {
    width <= MAX_CANVAS_SIDE
        && height <= MAX_CANVAS_SIDE
        && u64::from(width) * u64::from(height) <= MAX_CANVAS_PIXELS
}

/// Canvas size and background.
#[derive(Clone, Debug, PartialEq)]
pub struct Canvas {
    width: u32,
    height: u32,
    background: String,
    fill: Rgba8,
}

impl Canvas {
    pub fn new(width: u32, height: u32, background: &str) -> Result<Self, EditorError> {
        let mut canvas = Self {
            width: 1,
            height: 1,
            background: String::new(),
            fill: Rgba8::WHITE,
        };
        canvas.resize(f64::from(width), f64::from(height))?;
        canvas.set_background(background)?;
        Ok(canvas)
    }

    #[inline]
    pub fn width(&self) -> u32 {
        self.width
    }

    #[inline]
    pub fn height(&self) -> u32 {
        self.height
    }

    /// Background color exactly as the user supplied it.
    #[inline]
    pub fn background(&self) -> &str {
        &self.background
    }

    #[inline]
    pub fn fill(&self) -> Rgba8 {
        self.fill
    }

    /// Set the size in whole pixels. Both edges must be positive and the
    /// result must fit [`MAX_CANVAS_SIDE`] and [`MAX_CANVAS_PIXELS`].
    pub(crate) fn resize(&mut self, width: f64, height: f64) -> Result<(), EditorError> {
        let valid = |v: f64| v.is_finite() && v.round() >= 1.0 && v.round() <= f64::from(MAX_CANVAS_SIDE);
        if !valid(width) || !valid(height) {
            return Err(EditorError::invalid(
                "canvas size",
                format!("{width}x{height} is not a positive size up to {MAX_CANVAS_SIDE} px"),
            ));
        }
        let (w, h) = (width.round() as u32, height.round() as u32);
        if !fits_canvas_limits(w, h) {
            return Err(EditorError::invalid(
                "canvas size",
                format!("{w}x{h} exceeds {MAX_CANVAS_PIXELS} pixels"),
            ));
        }
        self.width = w;
        self.height = h;
        Ok(())
    }

    pub(crate) fn set_background(&mut self, color: &str) -> Result<(), EditorError> {
        self.fill = parse_css_color(color)?;
        self.background = color.trim().to_string();
        Ok(())
    }
}

/// A marker or image on the canvas.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub enum EntityId {
    Marker(MarkerId),
    Image(ImageId),
}

/// Topmost marker under `p`, else topmost image, else `None`.
///
/// Markers always win over images because they are always drawn on top.
pub fn hit_test(markers: &[Marker], images: &[ImageLayer], p: Point2<f64>) -> Option<EntityId> {
    if let Some(m) = markers
        .iter()
        .rev()
        .find(|m| m.placement().bounds().contains(p))
    {
        return Some(EntityId::Marker(m.id()));
    }
    images
        .iter()
        .rev()
        .find(|l| l.bounds().contains(p))
        .map(|l| EntityId::Image(l.id()))
}

/// Flatten background, images and markers into one raster.
///
/// Drawing is plain overwrite in order: images by insertion, then markers by
/// insertion. Markers without a bitmap yet are skipped.
#[cfg_attr(
    feature = "tracing",
    instrument(level = "debug", skip_all, fields(width = canvas.width, height = canvas.height, markers = markers.len(), images = images.len()))
)]
pub fn render(canvas: &Canvas, images: &[ImageLayer], markers: &[Marker]) -> RgbaImage {
    let mut out = RgbaImage::from_pixel(canvas.width, canvas.height, Rgba(canvas.fill.to_array()));

    for layer in images {
        let src = layer.image();
        let (x, y) = pixel_origin(layer.position());
        if src.dimensions() == (layer.width(), layer.height()) {
            imageops::replace(&mut out, src.as_ref(), x, y);
        } else {
            // Nearest keeps hard edges, like a canvas with smoothing disabled.
            let scaled = imageops::resize(src.as_ref(), layer.width(), layer.height(), FilterType::Nearest);
            imageops::replace(&mut out, &scaled, x, y);
        }
    }

    for marker in markers {
        let Some(bitmap) = marker.bitmap() else {
            continue;
        };
        let Some(rgba) = marker_rgba(bitmap) else {
            debug!("skipping {}: bitmap buffer does not match its size", marker.id());
            continue;
        };
        let (x, y) = pixel_origin(marker.placement().top_left());
        imageops::replace(&mut out, &rgba, x, y);
    }
    out
}

fn pixel_origin(p: Point2<f64>) -> (i64, i64) {
    (p.x.round() as i64, p.y.round() as i64)
}

fn marker_rgba(src: &GrayImage) -> Option<RgbaImage> {
    let width = u32::try_from(src.width).ok()?;
    let height = u32::try_from(src.height).ok()?;
    let luma = image::GrayImage::from_raw(width, height, src.data.clone())?;
    Some(DynamicImage::ImageLuma8(luma).to_rgba8())
}
