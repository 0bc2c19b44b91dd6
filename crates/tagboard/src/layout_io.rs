//! JSON layout documents: canvas settings plus marker list.
//!
//! Export is strict and typed. Import is lenient: each marker entry is
//! validated on its own and bad entries are dropped, while a document that is
//! not a JSON object fails as a whole.

use std::fs;
use std::path::Path;

use log::warn;
use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};
use tagboard_core::Anchor;
use tagboard_dict::DictionaryRegistry;

use crate::{LayoutError, Marker, MarkerCode};

/// Marker code as written to layout files.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum CodeValue {
    Id(u32),
    Text(String),
}

/// One exported marker. `x`/`y` are the top-left corner, `scale` the side.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct MarkerRecord {
    pub dictionary_name: String,
    pub aruco_id: CodeValue,
    pub x: i64,
    pub y: i64,
    pub scale: u32,
    #[serde(default)]
    pub anchor_x: f64,
    #[serde(default)]
    pub anchor_y: f64,
}

impl MarkerRecord {
    pub fn from_marker(marker: &Marker) -> Self {
        let placement = marker.placement();
        let top_left = placement.top_left();
        let anchor = placement.anchor();
        let aruco_id = match marker.code() {
            MarkerCode::FixedGrid { id, .. } => CodeValue::Id(*id),
            MarkerCode::Text { payload } => CodeValue::Text(payload.clone()),
        };
        Self {
            dictionary_name: marker.dictionary_name().to_string(),
            aruco_id,
            x: top_left.x.round() as i64,
            y: top_left.y.round() as i64,
            scale: placement.size_px(),
            anchor_x: anchor.ax,
            anchor_y: anchor.ay,
        }
    }
}

/// Exported layout. Image layers are not part of the format.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct LayoutDocument {
    pub canvas_width: u32,
    pub canvas_height: u32,
    pub background_color: String,
    pub markers: Vec<MarkerRecord>,
}

impl LayoutDocument {
    pub fn to_json_string(&self) -> Result<String, LayoutError> {
        Ok(serde_json::to_string_pretty(self)?)
    }

    /// Write this layout to disk as pretty JSON.
    pub fn write_json(&self, path: impl AsRef<Path>) -> Result<(), LayoutError> {
        fs::write(path, self.to_json_string()?)?;
        Ok(())
    }
}

/// A marker entry that passed validation, not yet bound to a dictionary.
#[derive(Clone, Debug, PartialEq)]
pub struct ImportedMarker {
    pub code: MarkerCode,
    pub x: f64,
    pub y: f64,
    pub scale: f64,
    pub anchor: Anchor,
}

/// Everything usable from a layout document.
#[derive(Clone, Debug, Default, PartialEq)]
pub struct ParsedLayout {
    /// Present only when both dimensions are numbers.
    pub canvas_size: Option<(f64, f64)>,
    pub background_color: Option<String>,
    pub markers: Vec<ImportedMarker>,
    /// Entries dropped during validation.
    pub skipped: usize,
}

/// Counts reported back after an import.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub struct ImportReport {
    pub imported: usize,
    pub skipped: usize,
}

/// Read a layout file from disk.
pub fn read_layout(path: impl AsRef<Path>) -> Result<ParsedLayout, LayoutError> {
    let raw = fs::read_to_string(path)?;
    parse_layout(&raw)
}

/// Parse a layout document, validating each marker entry independently.
pub fn parse_layout(json: &str) -> Result<ParsedLayout, LayoutError> {
    let root: Value = serde_json::from_str(json)?;
    let Value::Object(doc) = root else {
        return Err(LayoutError::Malformed("top level is not an object".into()));
    };

    let canvas_size = match (number(&doc, "canvasWidth"), number(&doc, "canvasHeight")) {
        (Some(w), Some(h)) => Some((w, h)),
        _ => None,
    };
    let background_color = match doc.get("backgroundColor") {
        Some(Value::String(s)) if !s.is_empty() => Some(s.clone()),
        _ => None,
    };

    let mut parsed = ParsedLayout {
        canvas_size,
        background_color,
        ..ParsedLayout::default()
    };
    let Some(Value::Array(entries)) = doc.get("markers") else {
        return Ok(parsed);
    };
    for (index, entry) in entries.iter().enumerate() {
        match parse_marker(entry) {
            Ok(marker) => parsed.markers.push(marker),
            Err(reason) => {
                warn!("skipping marker entry {index}: {reason}");
                parsed.skipped += 1;
            }
        }
    }
    Ok(parsed)
}

fn number(obj: &Map<String, Value>, key: &str) -> Option<f64> {
    obj.get(key).and_then(Value::as_f64).filter(|v| v.is_finite())
}

fn parse_marker(entry: &Value) -> Result<ImportedMarker, String> {
    let Value::Object(obj) = entry else {
        return Err("not an object".into());
    };
    let dictionary = match obj.get("dictionaryName") {
        Some(Value::String(s)) if !s.is_empty() => s.as_str(),
        _ => return Err("missing dictionaryName".into()),
    };

    let raw_id = obj.get("arucoId").ok_or("missing arucoId")?;
    let code = if DictionaryRegistry::is_text_code(dictionary) {
        match raw_id {
            Value::String(s) => MarkerCode::text(s.clone()),
            Value::Number(n) => MarkerCode::text(n.to_string()),
            _ => return Err("arucoId must be a string or number".into()),
        }
    } else {
        let id = raw_id
            .as_f64()
            .filter(|v| v.is_finite())
            .ok_or("arucoId must be a number")?
            .round();
        if id < 0.0 {
            return Err(format!("negative arucoId {id}"));
        }
        MarkerCode::fixed(dictionary, id.min(f64::from(u32::MAX)) as u32)
    };

    let x = number(obj, "x").ok_or("x must be a number")?.round();
    let y = number(obj, "y").ok_or("y must be a number")?.round();
    let scale = number(obj, "scale").ok_or("scale must be a number")?.round();
    let anchor = Anchor {
        ax: anchor_component(obj, "anchorX"),
        ay: anchor_component(obj, "anchorY"),
    };

    Ok(ImportedMarker {
        code,
        x,
        y,
        scale,
        anchor,
    })
}

/// Absent means 0; numbers are clamped into `[0, 1]`.
fn anchor_component(obj: &Map<String, Value>, key: &str) -> f64 {
    match obj.get(key) {
        None | Some(Value::Null) => 0.0,
        Some(v) => match v.as_f64().filter(|a| a.is_finite()) {
            Some(a) => a.clamp(0.0, 1.0),
            None => {
                warn!("{key} is not a number, using 0");
                0.0
            }
        },
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn lenient_import_skips_bad_entries() {
        let json = r##"{
            "canvasWidth": 800, "canvasHeight": 600, "backgroundColor": "#112233",
            "markers": [
                {"dictionaryName": "ARUCO_4X4", "arucoId": 3, "x": 10.4, "y": 20.6, "scale": 60},
                {"dictionaryName": "", "arucoId": 1, "x": 0, "y": 0, "scale": 60},
                {"dictionaryName": "ARUCO_4X4", "arucoId": "7", "x": 0, "y": 0, "scale": 60},
                {"dictionaryName": "ARUCO_4X4", "arucoId": 1, "x": "0", "y": 0, "scale": 60},
                {"dictionaryName": "QR", "arucoId": 42, "x": 5, "y": 5, "scale": 100, "anchorX": 0.5, "anchorY": 3},
                7
            ]
        }"##;
        let parsed = parse_layout(json).expect("parse");
        assert_eq!(parsed.canvas_size, Some((800.0, 600.0)));
        assert_eq!(parsed.background_color.as_deref(), Some("#112233"));
        assert_eq!(parsed.skipped, 4);
        assert_eq!(parsed.markers.len(), 2);

        let first = &parsed.markers[0];
        assert_eq!(first.code, MarkerCode::fixed("ARUCO_4X4", 3));
        assert_eq!((first.x, first.y, first.scale), (10.0, 21.0, 60.0));
        assert_eq!(first.anchor, Anchor::TOP_LEFT);

        let qr = &parsed.markers[1];
        assert_eq!(qr.code, MarkerCode::text("42"));
        assert_eq!(qr.anchor, Anchor { ax: 0.5, ay: 1.0 });
    }

    #[test]
    fn canvas_needs_both_dimensions() {
        let parsed = parse_layout(r#"{"canvasWidth": 800, "markers": []}"#).expect("parse");
        assert_eq!(parsed.canvas_size, None);
        assert_eq!(parsed.background_color, None);
    }

    #[test]
    fn structural_errors_fail_the_whole_document() {
        assert!(matches!(parse_layout("{not json"), Err(LayoutError::Json(_))));
        assert!(matches!(parse_layout("[1, 2]"), Err(LayoutError::Malformed(_))));
    }

    #[test]
    fn export_uses_camel_case_keys() {
        let doc = LayoutDocument {
            canvas_width: 100,
            canvas_height: 50,
            background_color: "#ffffff".into(),
            markers: vec![MarkerRecord {
                dictionary_name: "QR".into(),
                aruco_id: CodeValue::Text("hi".into()),
                x: 1,
                y: 2,
                scale: 21,
                anchor_x: 0.0,
                anchor_y: 1.0,
            }],
        };
        let value: Value = serde_json::from_str(&doc.to_json_string().expect("json")).expect("value");
        assert_eq!(value["canvasWidth"], 100);
        assert_eq!(value["markers"][0]["dictionaryName"], "QR");
        assert_eq!(value["markers"][0]["arucoId"], "hi");
        assert_eq!(value["markers"][0]["anchorY"], 1.0);
    }
}
