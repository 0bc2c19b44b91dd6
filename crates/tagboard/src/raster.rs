//! Encoding of the flattened scene and decoding of uploaded images.

use std::fs;
use std::io::Cursor;
use std::path::Path;

use image::codecs::jpeg::JpegEncoder;
use image::codecs::png::PngEncoder;
use image::{DynamicImage, ExtendedColorType, ImageEncoder, ImageReader, RgbaImage};

use crate::RasterError;

pub const DEFAULT_JPEG_QUALITY: u8 = 92;

#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub enum RasterFormat {
    #[default]
    Png,
    /// Lossy; alpha is dropped.
    Jpeg { quality: u8 },
}

impl RasterFormat {
    pub fn jpeg() -> Self {
        Self::Jpeg {
            quality: DEFAULT_JPEG_QUALITY,
        }
    }

    /// Guess the format from a file extension (`png`, `jpg`, `jpeg`).
    pub fn from_extension(path: impl AsRef<Path>) -> Option<Self> {
        let ext = path.as_ref().extension()?.to_str()?.to_ascii_lowercase();
        match ext.as_str() {
            "png" => Some(Self::Png),
            "jpg" | "jpeg" => Some(Self::jpeg()),
            _ => None,
        }
    }

    pub fn extension(&self) -> &'static str {
        match self {
            Self::Png => "png",
            Self::Jpeg { .. } => "jpg",
        }
    }
}

/// Encode `img` into an in-memory file.
pub fn encode(img: &RgbaImage, format: RasterFormat) -> Result<Vec<u8>, RasterError> {
    let mut buf = Cursor::new(Vec::new());
    let (width, height) = img.dimensions();
    match format {
        RasterFormat::Png => {
            PngEncoder::new(&mut buf).write_image(img.as_raw(), width, height, ExtendedColorType::Rgba8)?;
        }
        RasterFormat::Jpeg { quality } => {
            let rgb = DynamicImage::ImageRgba8(img.clone()).to_rgb8();
            JpegEncoder::new_with_quality(&mut buf, quality.clamp(1, 100)).write_image(
                rgb.as_raw(),
                width,
                height,
                ExtendedColorType::Rgb8,
            )?;
        }
    }
    Ok(buf.into_inner())
}

/// Encode and write to `path`.
pub fn write(img: &RgbaImage, format: RasterFormat, path: impl AsRef<Path>) -> Result<(), RasterError> {
    fs::write(path, encode(img, format)?)?;
    Ok(())
}

/// Decode any supported image file into RGBA.
pub fn load_rgba(path: impl AsRef<Path>) -> Result<RgbaImage, RasterError> {
    Ok(ImageReader::open(path)?.with_guessed_format()?.decode()?.to_rgba8())
}

#[cfg(test)]
mod tests {
    use super::*;
    use image::Rgba;

    fn sample() -> RgbaImage {
        RgbaImage::from_fn(8, 4, |x, _| {
            if x < 4 {
                Rgba([0, 0, 0, 255])
            } else {
                Rgba([255, 255, 255, 255])
            }
        })
    }

    #[test]
    fn png_is_lossless() {
        let img = sample();
        let bytes = encode(&img, RasterFormat::Png).expect("encode");
        let decoded = image::load_from_memory(&bytes).expect("decode").to_rgba8();
        assert_eq!(decoded, img);
    }

    #[test]
    fn jpeg_has_expected_dimensions() {
        let bytes = encode(&sample(), RasterFormat::jpeg()).expect("encode");
        assert_eq!(&bytes[..2], &[0xFF, 0xD8]);
        let decoded = image::load_from_memory(&bytes).expect("decode");
        assert_eq!((decoded.width(), decoded.height()), (8, 4));
    }

    #[test]
    fn format_from_extension() {
        assert_eq!(RasterFormat::from_extension("out.PNG"), Some(RasterFormat::Png));
        assert_eq!(
            RasterFormat::from_extension("a/b.jpeg"),
            Some(RasterFormat::Jpeg { quality: 92 })
        );
        assert_eq!(RasterFormat::from_extension("scene.bmp"), None);
        assert_eq!(RasterFormat::from_extension("noext"), None);
    }

    #[test]
    fn written_file_round_trips_through_loader() {
        let dir = tempfile::tempdir().expect("tempdir");
        let path = dir.path().join("scene.png");
        write(&sample(), RasterFormat::Png, &path).expect("write");
        assert_eq!(load_rgba(&path).expect("load"), sample());
    }
}
