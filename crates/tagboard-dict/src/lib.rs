//! Marker dictionaries and bit-grid lookup.
//!
//! This crate is the dictionary side of the marker layout engine:
//! - [`BitMatrix`]: a square payload grid (`1` = white, `0` = black),
//! - [`Dictionary`]: a named, ordered code list loaded from JSON,
//! - [`DictionaryProvider`]: the lookup contract the engine consumes,
//! - [`Matcher`]: rotation-aware matching on top of a dictionary,
//! - [`TextEncoder`]: the text (QR) code boundary,
//! - [`DictionaryRegistry`]: all known providers, by name and by size class.
//!
//! It does **not** embed the code tables of any dictionary standard; they are
//! supplied as data files.

mod bits;
mod dictionary;
mod error;
mod matcher;
mod registry;
mod text;

pub use bits::BitMatrix;
pub use dictionary::{Dictionary, DictionaryFile, DictionaryProvider, Lookup};
pub use error::DictError;
pub use matcher::{rotate_code_u64, Match, Matcher};
pub use registry::{DictionaryRegistry, TEXT_CODE_DICTIONARY};
pub use text::{ModuleMatrix, TextEncoder};
