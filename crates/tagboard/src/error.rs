use tagboard_core::ColorParseError;
use tagboard_dict::DictError;

/// Errors from the marker bitmap generator.
#[derive(thiserror::Error, Debug, PartialEq, Eq)]
pub enum BitmapError {
    #[error("pixel size {pixel_size} is not a multiple of {cells} cells")]
    NotAMultiple { pixel_size: u32, cells: usize },
    #[error("pixel size {pixel_size} is smaller than {cells} cells")]
    TooSmall { pixel_size: u32, cells: usize },
    #[error("payload side {got} does not fit mark size {mark_size}")]
    PayloadSide { mark_size: usize, got: usize },
    #[error("raster side {side} exceeds the {max_pixels} pixel limit")]
    TooLarge { side: usize, max_pixels: usize },
}

/// Errors from marker placement edits.
#[derive(thiserror::Error, Debug, PartialEq)]
pub enum PlacementError {
    #[error("non-finite value for {0}")]
    NonFinite(&'static str),
    #[error("size unit must be positive")]
    ZeroUnit,
    #[error("size {requested} is above the {max} px limit")]
    TooLarge { requested: f64, max: u32 },
}

/// Errors while producing a marker bitmap from its code.
#[derive(thiserror::Error, Debug)]
pub enum GenerateError {
    #[error(transparent)]
    Dict(#[from] DictError),
    #[error(transparent)]
    Bitmap(#[from] BitmapError),
}

/// Errors returned by editor operations.
///
/// An operation that fails leaves the editor state as it was.
#[derive(thiserror::Error, Debug)]
pub enum EditorError {
    #[error("unknown marker {0}")]
    UnknownMarker(u64),
    #[error("unknown image {0}")]
    UnknownImage(u64),
    #[error("invalid input for {field}: {reason}")]
    InvalidInput {
        field: &'static str,
        reason: String,
    },
    #[error(transparent)]
    Placement(#[from] PlacementError),
    #[error(transparent)]
    Color(#[from] ColorParseError),
    #[error("marker generation failed: {0}")]
    Generate(#[from] GenerateError),
}

impl EditorError {
    pub(crate) fn invalid(field: &'static str, reason: impl Into<String>) -> Self {
        Self::InvalidInput {
            field,
            reason: reason.into(),
        }
    }
}

impl From<DictError> for EditorError {
    fn from(err: DictError) -> Self {
        Self::Generate(GenerateError::Dict(err))
    }
}

/// Errors from the grid finder tool.
#[derive(thiserror::Error, Debug)]
pub enum FinderError {
    #[error("no dictionary or size class selected")]
    NoSelection,
    #[error("unsupported grid size {0}")]
    UnsupportedSize(usize),
    #[error("cell ({row}, {col}) is outside the grid")]
    OutOfRange { row: usize, col: usize },
    #[error(transparent)]
    Dict(#[from] DictError),
}

/// Errors while reading or writing layout documents.
#[derive(thiserror::Error, Debug)]
pub enum LayoutError {
    #[error("invalid layout document: {0}")]
    Malformed(String),
    #[error(transparent)]
    Json(#[from] serde_json::Error),
    #[error(transparent)]
    Io(#[from] std::io::Error),
}

/// Errors while encoding the flattened raster.
#[derive(thiserror::Error, Debug)]
pub enum RasterError {
    #[error(transparent)]
    Image(#[from] image::ImageError),
    #[error(transparent)]
    Io(#[from] std::io::Error),
}

/// Errors while loading the editor configuration.
#[derive(thiserror::Error, Debug)]
pub enum ConfigError {
    #[error(transparent)]
    Io(#[from] std::io::Error),
    #[error(transparent)]
    Json(#[from] serde_json::Error),
    #[error("failed to load dictionaries from {path}: {source}")]
    Dictionaries {
        path: String,
        #[source]
        source: DictError,
    },
}
