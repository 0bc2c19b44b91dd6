//! Core types shared by the `tagboard-*` crates.
//!
//! This crate is intentionally small. It knows nothing about dictionaries or
//! markers; it only provides the monochrome raster used for marker bitmaps,
//! the pixel geometry used for placement and hit-testing, CSS color parsing,
//! and the process logger.

mod color;
mod geometry;
mod image;
mod logger;

pub use color::{parse_css_color, ColorParseError, Rgba8};
pub use geometry::{Anchor, PixelRect};
pub use image::{GrayImage, GrayImageView, BLACK, WHITE};

#[cfg(feature = "tracing")]
pub use logger::init_tracing;

pub use logger::init_with_level;
