//! Editor defaults, loaded from JSON.

use std::fs;
use std::path::{Path, PathBuf};

use log::info;
use serde::{Deserialize, Serialize};
use tagboard_dict::DictionaryRegistry;

use crate::raster::DEFAULT_JPEG_QUALITY;
use crate::ConfigError;

fn default_canvas_width() -> u32 {
    1920
}

fn default_canvas_height() -> u32 {
    1080
}

fn default_background() -> String {
    "#ffffff".to_string()
}

fn default_dictionary() -> String {
    "ARUCO_MIP_36h12".to_string()
}

fn default_marker_position() -> [f64; 2] {
    [50.0, 50.0]
}

fn default_marker_size() -> f64 {
    100.0
}

fn default_jpeg_quality() -> u8 {
    DEFAULT_JPEG_QUALITY
}

/// Defaults applied to new canvases and markers.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct EditorConfig {
    #[serde(default = "default_canvas_width")]
    pub canvas_width: u32,
    #[serde(default = "default_canvas_height")]
    pub canvas_height: u32,
    #[serde(default = "default_background")]
    pub background_color: String,
    /// Dictionary used by "add marker" when none is given.
    #[serde(default = "default_dictionary")]
    pub default_dictionary: String,
    /// Top-left corner of newly added markers.
    #[serde(default = "default_marker_position")]
    pub marker_position: [f64; 2],
    /// Requested side of newly added markers, before snapping.
    #[serde(default = "default_marker_size")]
    pub marker_size: f64,
    #[serde(default = "default_jpeg_quality")]
    pub jpeg_quality: u8,
    /// Dictionary JSON files loaded into the registry.
    #[serde(default)]
    pub dictionaries: Vec<PathBuf>,
}

impl Default for EditorConfig {
    fn default() -> Self {
        Self {
            canvas_width: default_canvas_width(),
            canvas_height: default_canvas_height(),
            background_color: default_background(),
            default_dictionary: default_dictionary(),
            marker_position: default_marker_position(),
            marker_size: default_marker_size(),
            jpeg_quality: default_jpeg_quality(),
            dictionaries: Vec::new(),
        }
    }
}

impl EditorConfig {
    /// Load a JSON config from disk.
    pub fn load_json(path: impl AsRef<Path>) -> Result<Self, ConfigError> {
        let raw = fs::read_to_string(path)?;
        Ok(serde_json::from_str(&raw)?)
    }

    /// Write this config to disk as pretty JSON.
    pub fn write_json(&self, path: impl AsRef<Path>) -> Result<(), ConfigError> {
        let json = serde_json::to_string_pretty(self)?;
        fs::write(path, json)?;
        Ok(())
    }

    /// Load every configured dictionary file into `registry`.
    pub fn load_dictionaries(&self, registry: &mut DictionaryRegistry) -> Result<usize, ConfigError> {
        let mut total = 0;
        for path in &self.dictionaries {
            total += registry
                .load_json_file(path)
                .map_err(|source| ConfigError::Dictionaries {
                    path: path.display().to_string(),
                    source,
                })?;
        }
        info!(
            "loaded {total} dictionaries from {} files",
            self.dictionaries.len()
        );
        Ok(total)
    }

    /// Fresh registry holding the configured dictionaries.
    pub fn build_registry(&self) -> Result<DictionaryRegistry, ConfigError> {
        let mut registry = DictionaryRegistry::new();
        self.load_dictionaries(&mut registry)?;
        Ok(registry)
    }
}
