//! Fiducial marker layout engine.
//!
//! This crate focuses on:
//! - generating marker bitmaps from dictionary codes or text codes, with
//!   sizes quantized to whole cells,
//! - anchor-relative placement that keeps the chosen reference point fixed
//!   while a marker is resized,
//! - compositing markers and image layers into one raster, with hit-testing,
//! - looking hand-edited bit grids up in one or many dictionaries,
//! - exporting and importing marker layouts as JSON.
//!
//! It does **not** ship dictionary tables or a QR encoder; both come in
//! through [`tagboard_dict::DictionaryRegistry`].
//!
//! ## Quickstart
//!
//! ```no_run
//! use std::sync::Arc;
//! use tagboard::{EditorConfig, EditorState};
//!
//! # fn main() -> Result<(), Box<dyn std::error::Error>> {
//! let config = EditorConfig::load_json("editor.json")?;
//! let registry = Arc::new(config.build_registry()?);
//! let mut editor = EditorState::new(registry, config)?;
//! let id = editor.add_default_marker()?;
//! editor.set_marker_anchor(id, 0.5, 0.5)?;
//! editor.set_marker_size(id, 240.0)?;
//! let scene = editor.render();
//! tagboard::raster::write(&scene, tagboard::RasterFormat::Png, "scene.png")?;
//! # Ok(())
//! # }
//! ```

pub mod bitmap;
mod config;
mod editor;
mod error;
pub mod finder;
mod image_layer;
pub mod layout_io;
mod marker;
mod placement;
pub mod raster;
pub mod scene;

pub use config::EditorConfig;
pub use editor::{EditorEvent, EditorState};
pub use error::{
    BitmapError, ConfigError, EditorError, FinderError, GenerateError, LayoutError, PlacementError,
    RasterError,
};
pub use finder::{FinderMatch, FinderSelection, FinderState, FinderTool, MarkerGrid, MatchOutcome};
pub use image_layer::{ImageId, ImageLayer};
pub use layout_io::{ImportReport, LayoutDocument};
pub use marker::{BitmapJob, Marker, MarkerCode, MarkerId};
pub use placement::{snap_size, MarkerPlacement, MAX_MARKER_PX};
pub use raster::RasterFormat;
pub use scene::{Canvas, EntityId};

pub use tagboard_core as core;
pub use tagboard_dict as dict;
