//! CSS hex color parsing for canvas backgrounds.

use serde::{Deserialize, Serialize};

#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct Rgba8 {
    pub r: u8,
    pub g: u8,
    pub b: u8,
    pub a: u8,
}

impl Rgba8 {
    pub const WHITE: Rgba8 = Rgba8::opaque(255, 255, 255);
    pub const BLACK: Rgba8 = Rgba8::opaque(0, 0, 0);

    pub const fn opaque(r: u8, g: u8, b: u8) -> Self {
        Self { r, g, b, a: 255 }
    }

    #[inline]
    pub fn to_array(self) -> [u8; 4] {
        [self.r, self.g, self.b, self.a]
    }
}

#[derive(thiserror::Error, Debug, PartialEq, Eq)]
pub enum ColorParseError {
    #[error("color must start with '#': {0:?}")]
    MissingHash(String),
    #[error("color must have 3, 4, 6 or 8 hex digits: {0:?}")]
    InvalidLength(String),
    #[error("invalid hex digit in color {0:?}")]
    InvalidDigit(String),
}

/// Parse `#rgb`, `#rgba`, `#rrggbb` or `#rrggbbaa`.
///
/// These are the forms an HTML color input produces; named colors are not
/// accepted.
pub fn parse_css_color(s: &str) -> Result<Rgba8, ColorParseError> {
    let trimmed = s.trim();
    let Some(hex) = trimmed.strip_prefix('#') else {
        return Err(ColorParseError::MissingHash(s.to_string()));
    };
    if !hex.chars().all(|c| c.is_ascii_hexdigit()) {
        return Err(ColorParseError::InvalidDigit(s.to_string()));
    }

    let nibble = |i: usize| u8::from_str_radix(&hex[i..=i], 16).map(|v| v * 17);
    let byte = |i: usize| u8::from_str_radix(&hex[i..i + 2], 16);
    let invalid = |_| ColorParseError::InvalidDigit(s.to_string());

    let channels: Vec<u8> = match hex.len() {
        3 | 4 => (0..hex.len()).map(nibble).collect::<Result<_, _>>(),
        6 | 8 => (0..hex.len()).step_by(2).map(byte).collect::<Result<_, _>>(),
        _ => return Err(ColorParseError::InvalidLength(s.to_string())),
    }
    .map_err(invalid)?;

    Ok(Rgba8 {
        r: channels[0],
        g: channels[1],
        b: channels[2],
        a: channels.get(3).copied().unwrap_or(255),
    })
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn parses_short_and_long_forms() {
        assert_eq!(parse_css_color("#fff"), Ok(Rgba8::WHITE));
        assert_eq!(
            parse_css_color("#1a2B3c"),
            Ok(Rgba8::opaque(0x1a, 0x2b, 0x3c))
        );
        assert_eq!(
            parse_css_color("#00000080"),
            Ok(Rgba8 {
                r: 0,
                g: 0,
                b: 0,
                a: 0x80
            })
        );
    }

    #[test]
    fn rejects_malformed() {
        assert!(matches!(
            parse_css_color("white"),
            Err(ColorParseError::MissingHash(_))
        ));
        assert!(matches!(
            parse_css_color("#12345"),
            Err(ColorParseError::InvalidLength(_))
        ));
        assert!(matches!(
            parse_css_color("#ggg"),
            Err(ColorParseError::InvalidDigit(_))
        ));
    }
}
