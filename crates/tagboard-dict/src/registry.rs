//! Catalogue of the dictionaries and the text encoder known to an editor.

use std::fs;
use std::path::Path;
use std::sync::Arc;

use log::{debug, warn};
use serde::Deserialize;

#[cfg(feature = "tracing")]
use tracing::instrument;

use crate::{DictError, Dictionary, DictionaryProvider, TextEncoder};

/// Reserved dictionary name for text (QR) markers.
pub const TEXT_CODE_DICTIONARY: &str = "QR";

#[derive(Deserialize)]
#[serde(untagged)]
enum DictionarySet {
    Many(Vec<Dictionary>),
    One(Dictionary),
}

/// Named dictionaries in insertion order, plus an optional text encoder.
#[derive(Clone, Debug, Default)]
pub struct DictionaryRegistry {
    dictionaries: Vec<Dictionary>,
    text_encoder: Option<Arc<dyn TextEncoder>>,
}

impl DictionaryRegistry {
    pub fn new() -> Self {
        Self::default()
    }

    /// Add a dictionary, replacing any previous one with the same name.
    ///
    /// Returns the replaced dictionary.
    pub fn insert(&mut self, dict: Dictionary) -> Option<Dictionary> {
        if dict.name == TEXT_CODE_DICTIONARY {
            warn!("dictionary name {TEXT_CODE_DICTIONARY:?} is reserved for text codes; ignoring");
            return None;
        }
        match self.dictionaries.iter_mut().find(|d| d.name == dict.name) {
            Some(slot) => {
                warn!("dictionary {:?} redefined; keeping the last definition", dict.name);
                Some(std::mem::replace(slot, dict))
            }
            None => {
                self.dictionaries.push(dict);
                None
            }
        }
    }

    /// Builder-style [`DictionaryRegistry::set_text_encoder`].
    pub fn with_text_encoder(mut self, encoder: Arc<dyn TextEncoder>) -> Self {
        self.set_text_encoder(encoder);
        self
    }

    pub fn set_text_encoder(&mut self, encoder: Arc<dyn TextEncoder>) {
        self.text_encoder = Some(encoder);
    }

    pub fn text_encoder(&self) -> Result<&dyn TextEncoder, DictError> {
        self.text_encoder.as_deref().ok_or(DictError::NoTextEncoder)
    }

    /// True if `name` refers to the text-code variant.
    #[inline]
    pub fn is_text_code(name: &str) -> bool {
        name == TEXT_CODE_DICTIONARY
    }

    /// Look up a dictionary by name.
    pub fn get(&self, name: &str) -> Result<&Dictionary, DictError> {
        self.dictionaries
            .iter()
            .find(|d| d.name == name)
            .ok_or_else(|| DictError::UnknownDictionary(name.to_string()))
    }

    /// True if markers can be generated for `name`.
    pub fn contains(&self, name: &str) -> bool {
        if Self::is_text_code(name) {
            return self.text_encoder.is_some();
        }
        self.get(name).is_ok()
    }

    pub fn iter(&self) -> impl Iterator<Item = &Dictionary> {
        self.dictionaries.iter()
    }

    pub fn names(&self) -> impl Iterator<Item = &str> {
        self.dictionaries.iter().map(|d| d.name.as_str())
    }

    pub fn len(&self) -> usize {
        self.dictionaries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.dictionaries.is_empty()
    }

    /// Dictionaries whose payload is `interior × interior` cells.
    pub fn by_interior_size(&self, interior: usize) -> impl Iterator<Item = &Dictionary> {
        self.dictionaries
            .iter()
            .filter(move |d| d.interior_size() == interior)
    }

    /// Distinct interior sizes present, ascending.
    pub fn size_classes(&self) -> Vec<usize> {
        let mut sizes: Vec<usize> = self.dictionaries.iter().map(|d| d.interior_size()).collect();
        sizes.sort_unstable();
        sizes.dedup();
        sizes
    }

    /// Load one dictionary object or an array of them from a JSON string.
    ///
    /// Returns the number of dictionaries read.
    pub fn load_json_str(&mut self, json: &str) -> Result<usize, DictError> {
        let dicts = match serde_json::from_str::<DictionarySet>(json)? {
            DictionarySet::Many(v) => v,
            DictionarySet::One(d) => vec![d],
        };
        let n = dicts.len();
        for d in dicts {
            debug!(
                "loaded dictionary {:?} ({} codes, mark size {})",
                d.name,
                d.code_count(),
                d.mark_size
            );
            self.insert(d);
        }
        Ok(n)
    }

    #[cfg_attr(feature = "tracing", instrument(level = "debug", skip(self, path), fields(path = %path.as_ref().display())))]
    pub fn load_json_file(&mut self, path: impl AsRef<Path>) -> Result<usize, DictError> {
        let raw = fs::read_to_string(path)?;
        self.load_json_str(&raw)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::ModuleMatrix;
    use std::io::Write;

    #[derive(Debug)]
    struct Checker;

    impl TextEncoder for Checker {
        fn encode(&self, payload: &str) -> Result<ModuleMatrix, DictError> {
            let size = payload.len().max(1);
            let dark = (0..size * size).map(|i| (i / size + i % size) % 2 == 0).collect();
            ModuleMatrix::new(size, dark)
        }
    }

    const DICTS: &str = r#"[
        {"name": "A_4X4", "mark_size": 6, "codes": ["0110011101001010", "1110010101001111"]},
        {"name": "B_4X4", "mark_size": 6, "max_correction_bits": 1, "codes": ["0111100101100100"]},
        {"name": "C_5X5", "mark_size": 7, "codes": ["0000100001111110001001011"]}
    ]"#;

    #[test]
    fn loads_arrays_and_groups_by_size() {
        let mut reg = DictionaryRegistry::new();
        assert_eq!(reg.load_json_str(DICTS).expect("load"), 3);
        assert_eq!(reg.size_classes(), vec![4, 5]);
        let names: Vec<&str> = reg.by_interior_size(4).map(|d| d.name.as_str()).collect();
        assert_eq!(names, ["A_4X4", "B_4X4"]);
        assert!(matches!(
            reg.get("nope"),
            Err(DictError::UnknownDictionary(_))
        ));
    }

    #[test]
    fn redefinition_replaces_in_place() {
        let mut reg = DictionaryRegistry::new();
        reg.load_json_str(DICTS).expect("load");
        let single = r#"{"name": "A_4X4", "mark_size": 6, "codes": ["0011101000110000"]}"#;
        assert_eq!(reg.load_json_str(single).expect("load"), 1);
        assert_eq!(reg.len(), 3);
        assert_eq!(reg.get("A_4X4").expect("dict").code_count(), 1);
        assert_eq!(reg.names().next(), Some("A_4X4"));
    }

    #[test]
    fn text_code_needs_an_encoder() {
        let reg = DictionaryRegistry::new();
        assert!(!reg.contains(TEXT_CODE_DICTIONARY));
        assert!(matches!(reg.text_encoder(), Err(DictError::NoTextEncoder)));

        let reg = reg.with_text_encoder(Arc::new(Checker));
        assert!(reg.contains(TEXT_CODE_DICTIONARY));
        let m = reg.text_encoder().expect("encoder").encode("abc").expect("matrix");
        assert_eq!(m.size(), 3);
    }

    #[test]
    fn loads_from_file() {
        let mut file = tempfile::NamedTempFile::new().expect("tempfile");
        file.write_all(DICTS.as_bytes()).expect("write");
        let mut reg = DictionaryRegistry::new();
        assert_eq!(reg.load_json_file(file.path()).expect("load"), 3);

        let mut bad = tempfile::NamedTempFile::new().expect("tempfile");
        bad.write_all(b"{\"name\": 3}").expect("write");
        assert!(matches!(
            reg.load_json_file(bad.path()),
            Err(DictError::Json(_))
        ));
    }
}
