//! Dictionary metadata, packed codes and the provider contract.

use std::collections::HashMap;

use serde::{Deserialize, Serialize};

use crate::{BitMatrix, DictError};

/// Result of a nearest-code lookup.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct Lookup {
    /// Index of the code in the dictionary's code list.
    pub id: u32,
    /// Number of mismatching bits; `0` means an exact match.
    pub distance: u32,
}

impl Lookup {
    #[inline]
    pub fn is_exact(&self) -> bool {
        self.distance == 0
    }
}

/// Lookup contract between the layout engine and a code catalogue.
pub trait DictionaryProvider {
    /// Dictionary name as shown to the user and written to layout files.
    fn name(&self) -> &str;

    /// Marker edge length in cells, including the one-cell border ring.
    fn mark_size(&self) -> usize;

    /// Number of codes; valid ids are `0..code_count()`.
    fn code_count(&self) -> usize;

    /// Payload bits for `id`.
    fn code(&self, id: u32) -> Option<BitMatrix>;

    /// Nearest code to `bits`, without rotating.
    ///
    /// Returns `None` when the grid side does not match the dictionary's
    /// interior size.
    fn find(&self, bits: &BitMatrix) -> Option<Lookup>;

    /// Interior (payload) edge length in cells.
    fn interior_size(&self) -> usize {
        self.mark_size().saturating_sub(2)
    }

    /// Largest valid id, `None` for an empty dictionary.
    fn max_id(&self) -> Option<u32> {
        self.code_count().checked_sub(1).map(|v| v as u32)
    }
}

/// On-disk form of a dictionary: codes are row-major bit strings.
#[derive(Clone, Debug, Serialize, Deserialize)]
pub struct DictionaryFile {
    pub name: String,
    pub mark_size: usize,
    #[serde(default)]
    pub max_correction_bits: u8,
    pub codes: Vec<String>,
}

/// A named ArUco/AprilTag-style dictionary.
#[derive(Clone, Debug, Serialize, Deserialize)]
#[serde(try_from = "DictionaryFile", into = "DictionaryFile")]
pub struct Dictionary {
    /// Human-readable name, unique within a registry.
    pub name: String,
    /// Marker side length in cells, border included.
    pub mark_size: usize,
    /// Maximum error-correcting Hamming distance supported by the dictionary.
    pub max_correction_bits: u8,
    /// One `u64` per marker id, row-major, **white = 1**.
    codes: Vec<u64>,
    code_to_id: HashMap<u64, u32>,
}

impl Dictionary {
    /// Build a dictionary from packed codes.
    pub fn new(
        name: impl Into<String>,
        mark_size: usize,
        max_correction_bits: u8,
        codes: Vec<u64>,
    ) -> Result<Self, DictError> {
        let name = name.into();
        if mark_size < 3 || mark_size - 2 > BitMatrix::MAX_SIDE {
            return Err(DictError::UnsupportedMarkSize(mark_size));
        }
        if codes.is_empty() {
            return Err(DictError::EmptyDictionary(name));
        }

        let side = mark_size - 2;
        let codes: Vec<u64> = codes
            .into_iter()
            .map(|c| BitMatrix::from_code(side, c).map(|m| m.code()))
            .collect::<Result<_, _>>()?;

        // First id wins when a table lists the same code twice.
        let mut code_to_id = HashMap::with_capacity(codes.len());
        for (id, &code) in codes.iter().enumerate() {
            code_to_id.entry(code).or_insert(id as u32);
        }

        Ok(Self {
            name,
            mark_size,
            max_correction_bits,
            codes,
            code_to_id,
        })
    }

    /// Build a dictionary from row-major `'0'`/`'1'` strings.
    pub fn from_bit_strings<S: AsRef<str>>(
        name: impl Into<String>,
        mark_size: usize,
        max_correction_bits: u8,
        codes: &[S],
    ) -> Result<Self, DictError> {
        let side = mark_size.saturating_sub(2);
        let packed = codes
            .iter()
            .map(|s| {
                let m = BitMatrix::from_bit_str(s.as_ref())?;
                if m.side() != side {
                    return Err(DictError::SideMismatch {
                        expected: side,
                        got: m.side(),
                    });
                }
                Ok(m.code())
            })
            .collect::<Result<Vec<_>, _>>()?;
        Self::new(name, mark_size, max_correction_bits, packed)
    }

    /// Packed codes in id order.
    #[inline]
    pub fn codes(&self) -> &[u64] {
        &self.codes
    }

    /// Total number of payload bits per marker.
    #[inline]
    pub fn bit_count(&self) -> usize {
        let side = self.mark_size - 2;
        side * side
    }
}

impl DictionaryProvider for Dictionary {
    fn name(&self) -> &str {
        &self.name
    }

    fn mark_size(&self) -> usize {
        self.mark_size
    }

    fn code_count(&self) -> usize {
        self.codes.len()
    }

    fn code(&self, id: u32) -> Option<BitMatrix> {
        let code = *self.codes.get(id as usize)?;
        BitMatrix::from_code(self.interior_size(), code).ok()
    }

    fn find(&self, bits: &BitMatrix) -> Option<Lookup> {
        if bits.side() != self.interior_size() {
            return None;
        }
        let observed = bits.code();
        if let Some(&id) = self.code_to_id.get(&observed) {
            return Some(Lookup { id, distance: 0 });
        }

        // `min_by_key` keeps the first minimum, so the lowest id wins ties.
        self.codes
            .iter()
            .enumerate()
            .map(|(id, &code)| Lookup {
                id: id as u32,
                distance: (observed ^ code).count_ones(),
            })
            .min_by_key(|l| l.distance)
    }
}

impl TryFrom<DictionaryFile> for Dictionary {
    type Error = DictError;

    fn try_from(file: DictionaryFile) -> Result<Self, Self::Error> {
        Self::from_bit_strings(
            file.name,
            file.mark_size,
            file.max_correction_bits,
            &file.codes,
        )
    }
}

impl From<Dictionary> for DictionaryFile {
    fn from(dict: Dictionary) -> Self {
        let side = dict.mark_size - 2;
        let codes = dict
            .codes
            .iter()
            .filter_map(|&c| BitMatrix::from_code(side, c).ok())
            .map(|m| m.to_bit_string())
            .collect();
        Self {
            name: dict.name,
            mark_size: dict.mark_size,
            max_correction_bits: dict.max_correction_bits,
            codes,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    const CODES: [&str; 4] = [
        "0110011101001010",
        "1110010101001111",
        "0111100101100100",
        "1100010101100101",
    ];

    fn dict() -> Dictionary {
        Dictionary::from_bit_strings("TEST_4X4_4", 6, 1, &CODES).expect("dict")
    }

    #[test]
    fn exact_lookup_returns_id_with_zero_distance() {
        let d = dict();
        for (k, s) in CODES.iter().enumerate() {
            let bits = BitMatrix::from_bit_str(s).expect("bits");
            assert_eq!(
                d.find(&bits),
                Some(Lookup {
                    id: k as u32,
                    distance: 0
                })
            );
        }
    }

    #[test]
    fn single_flip_reports_nonzero_distance() {
        let d = dict();
        let mut bits = d.code(2).expect("code");
        bits.set_white(1, 1, !bits.is_white(1, 1));
        let found = d.find(&bits).expect("nearest");
        assert_eq!(found.id, 2);
        assert_eq!(found.distance, 1);
        assert!(!found.is_exact());
    }

    #[test]
    fn mismatched_side_is_not_looked_up() {
        let d = dict();
        let bits = BitMatrix::filled(5, false).expect("bits");
        assert!(d.find(&bits).is_none());
    }

    #[test]
    fn rejects_bad_definitions() {
        assert!(matches!(
            Dictionary::from_bit_strings("E", 6, 0, &[] as &[&str]),
            Err(DictError::EmptyDictionary(_))
        ));
        assert!(matches!(
            Dictionary::from_bit_strings("S", 7, 0, &CODES),
            Err(DictError::SideMismatch {
                expected: 5,
                got: 4
            })
        ));
        assert!(matches!(
            Dictionary::new("B", 11, 0, vec![1]),
            Err(DictError::UnsupportedMarkSize(11))
        ));
    }

    #[test]
    fn json_round_trip_keeps_codes() {
        let d = dict();
        let json = serde_json::to_string(&d).expect("serialize");
        assert!(json.contains("\"mark_size\":6"));
        let back: Dictionary = serde_json::from_str(&json).expect("deserialize");
        assert_eq!(back.codes(), d.codes());
        assert_eq!(back.max_id(), Some(3));
    }
}
