//! Markers: code, placement and cached bitmap.

use std::fmt;
use std::sync::Arc;

use tagboard_core::GrayImage;
use tagboard_dict::{DictError, DictionaryProvider, DictionaryRegistry, TEXT_CODE_DICTIONARY};

use crate::bitmap::{fixed_grid_bitmap, module_bitmap};
use crate::{GenerateError, MarkerPlacement};

/// Stable handle of a marker inside an editor.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct MarkerId(pub u64);

impl fmt::Display for MarkerId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "marker#{}", self.0)
    }
}

/// What a marker encodes.
#[derive(Clone, Debug, PartialEq, Eq)]
pub enum MarkerCode {
    /// Numeric id in a named dictionary with a fixed cell grid.
    FixedGrid { dictionary: String, id: u32 },
    /// Arbitrary text rendered by the registry's text encoder.
    Text { payload: String },
}

impl MarkerCode {
    pub fn fixed(dictionary: impl Into<String>, id: u32) -> Self {
        Self::FixedGrid {
            dictionary: dictionary.into(),
            id,
        }
    }

    pub fn text(payload: impl Into<String>) -> Self {
        Self::Text {
            payload: payload.into(),
        }
    }

    /// Name written to layout files.
    pub fn dictionary_name(&self) -> &str {
        match self {
            Self::FixedGrid { dictionary, .. } => dictionary,
            Self::Text { .. } => TEXT_CODE_DICTIONARY,
        }
    }

    /// Cell count the marker's pixel size must be a multiple of.
    pub fn size_unit(&self, registry: &DictionaryRegistry) -> Result<u32, GenerateError> {
        let cells = match self {
            Self::FixedGrid { dictionary, .. } => registry.get(dictionary)?.mark_size(),
            Self::Text { payload } => registry.text_encoder()?.encode(payload)?.size(),
        };
        Ok(u32::try_from(cells).unwrap_or(u32::MAX))
    }

    /// Clamp a dictionary id to the dictionary's largest valid id.
    ///
    /// Returns true if the id changed.
    pub fn clamp_id(&mut self, registry: &DictionaryRegistry) -> Result<bool, GenerateError> {
        let Self::FixedGrid { dictionary, id } = self else {
            return Ok(false);
        };
        let dict = registry.get(dictionary)?;
        let max = dict
            .max_id()
            .ok_or_else(|| DictError::EmptyDictionary(dict.name.clone()))?;
        if *id > max {
            *id = max;
            return Ok(true);
        }
        Ok(false)
    }

    /// Render at `size_px` pixels.
    pub fn render(
        &self,
        registry: &DictionaryRegistry,
        size_px: u32,
    ) -> Result<GrayImage, GenerateError> {
        match self {
            Self::FixedGrid { dictionary, id } => {
                let dict = registry.get(dictionary)?;
                let code = dict.code(*id).ok_or_else(|| DictError::UnknownId {
                    dictionary: dictionary.clone(),
                    id: *id,
                })?;
                Ok(fixed_grid_bitmap(&code, dict.mark_size(), size_px)?)
            }
            Self::Text { payload } => {
                let modules = registry.text_encoder()?.encode(payload)?;
                Ok(module_bitmap(&modules, size_px)?)
            }
        }
    }
}

/// Self-contained request to (re)generate one marker bitmap.
///
/// Jobs carry the marker's generation number at the time they were issued;
/// a completed job only applies if the marker has not changed since.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct BitmapJob {
    pub marker: MarkerId,
    pub generation: u64,
    pub code: MarkerCode,
    pub size_px: u32,
}

impl BitmapJob {
    pub fn run(&self, registry: &DictionaryRegistry) -> Result<GrayImage, GenerateError> {
        self.code.render(registry, self.size_px)
    }
}

/// A marker on the canvas.
#[derive(Clone, Debug)]
pub struct Marker {
    id: MarkerId,
    code: MarkerCode,
    pub(crate) placement: MarkerPlacement,
    bitmap: Option<Arc<GrayImage>>,
    generation: u64,
    dirty: bool,
}

impl Marker {
    pub(crate) fn new(id: MarkerId, code: MarkerCode, placement: MarkerPlacement) -> Self {
        Self {
            id,
            code,
            placement,
            bitmap: None,
            generation: 0,
            dirty: true,
        }
    }

    #[inline]
    pub fn id(&self) -> MarkerId {
        self.id
    }

    #[inline]
    pub fn code(&self) -> &MarkerCode {
        &self.code
    }

    #[inline]
    pub fn placement(&self) -> &MarkerPlacement {
        &self.placement
    }

    #[inline]
    pub fn dictionary_name(&self) -> &str {
        self.code.dictionary_name()
    }

    /// Last successfully generated bitmap, possibly stale while dirty.
    #[inline]
    pub fn bitmap(&self) -> Option<&Arc<GrayImage>> {
        self.bitmap.as_ref()
    }

    /// True if code or size changed since the bitmap was generated.
    #[inline]
    pub fn is_dirty(&self) -> bool {
        self.dirty
    }

    #[inline]
    pub fn generation(&self) -> u64 {
        self.generation
    }

    pub(crate) fn set_code(&mut self, code: MarkerCode) {
        self.code = code;
        self.invalidate();
    }

    /// Mark the bitmap stale; outstanding jobs become obsolete.
    pub(crate) fn invalidate(&mut self) {
        self.generation += 1;
        self.dirty = true;
    }

    pub(crate) fn job(&self) -> BitmapJob {
        BitmapJob {
            marker: self.id,
            generation: self.generation,
            code: self.code.clone(),
            size_px: self.placement.size_px(),
        }
    }

    /// Store a finished bitmap if it still matches the current parameters.
    pub(crate) fn apply_bitmap(&mut self, generation: u64, bitmap: GrayImage) -> bool {
        if generation != self.generation {
            return false;
        }
        self.bitmap = Some(Arc::new(bitmap));
        self.dirty = false;
        true
    }

    /// Give up on the current generation and keep the previous bitmap.
    pub(crate) fn abandon_generation(&mut self, generation: u64) -> bool {
        if generation != self.generation {
            return false;
        }
        self.dirty = false;
        true
    }
}
