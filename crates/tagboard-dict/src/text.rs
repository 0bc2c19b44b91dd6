//! Text-payload codes (QR) as seen by the layout engine.

use crate::DictError;

/// Square module matrix produced by a text encoder.
///
/// Unlike dictionary codes there is no implied border: quiet zone and finder
/// patterns, if any, are part of the matrix.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct ModuleMatrix {
    size: usize,
    dark: Vec<bool>,
}

impl ModuleMatrix {
    /// `dark` is row-major with `size * size` entries.
    pub fn new(size: usize, dark: Vec<bool>) -> Result<Self, DictError> {
        let expected = size * size;
        if size == 0 || dark.len() != expected {
            return Err(DictError::ModuleCount {
                size,
                expected,
                got: dark.len(),
            });
        }
        Ok(Self { size, dark })
    }

    /// Module count per side.
    #[inline]
    pub fn size(&self) -> usize {
        self.size
    }

    /// # Panics
    /// If `row` or `col` is not below `size`.
    #[inline]
    pub fn is_dark(&self, row: usize, col: usize) -> bool {
        assert!(row < self.size && col < self.size, "module index out of range");
        self.dark[row * self.size + col]
    }
}

/// Encodes arbitrary text into a module matrix (for example a QR encoder).
///
/// The module count depends on the payload, so it doubles as the size unit
/// for text markers.
pub trait TextEncoder: std::fmt::Debug + Send + Sync {
    fn encode(&self, payload: &str) -> Result<ModuleMatrix, DictError>;
}
