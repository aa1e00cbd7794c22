// SPDX-License-Identifier: MIT

// crates/formats/src/codec.rs

use std::path::Path;

use image::{ImageFormat, RgbImage};
use thiserror::Error;

/// Errors produced while resolving or decoding an image file.
#[derive(Debug, Error)]
pub enum FormatError {
    /// The file extension does not map to a known codec.
    #[error("unsupported image extension '{0}' (expected one of: png, jpg, jpeg)")]
    UnsupportedExtension(String),

    /// The file has no extension at all.
    #[error("file '{0}' has no extension to derive a codec from")]
    MissingExtension(String),

    /// The bytes could not be decoded with the resolved codec.
    #[error("failed to decode {codec} image: {source}")]
    Decode {
        codec: ImageCodec,
        #[source]
        source: image::ImageError,
    },
}

/// The closed set of codecs the pipeline decodes.
///
/// Extension resolution is a single exhaustive mapping: there is no default
/// branch that silently guesses a codec for unknown extensions.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ImageCodec {
    Png,
    Jpeg,
}

impl ImageCodec {
    /// Resolve a codec from a file extension (case-insensitive).
    pub fn from_extension(ext: &str) -> Result<Self, FormatError> {
        match ext.to_ascii_lowercase().as_str() {
            "png" => Ok(Self::Png),
            "jpg" | "jpeg" => Ok(Self::Jpeg),
            other => Err(FormatError::UnsupportedExtension(other.to_string())),
        }
    }

    /// Resolve a codec from a file path's extension.
    pub fn from_path(path: &Path) -> Result<Self, FormatError> {
        let ext = path
            .extension()
            .and_then(|e| e.to_str())
            .ok_or_else(|| FormatError::MissingExtension(path.display().to_string()))?;
        Self::from_extension(ext)
    }

    /// Decode raw bytes into a 3-channel RGB image.
    pub fn decode(&self, bytes: &[u8]) -> Result<RgbImage, FormatError> {
        let format = match self {
            Self::Png => ImageFormat::Png,
            Self::Jpeg => ImageFormat::Jpeg,
        };
        image::load_from_memory_with_format(bytes, format)
            .map(|img| img.to_rgb8())
            .map_err(|source| FormatError::Decode {
                codec: *self,
                source,
            })
    }

    /// The extensions this codec claims.
    pub fn extensions(&self) -> &'static [&'static str] {
        match self {
            Self::Png => &["png"],
            Self::Jpeg => &["jpg", "jpeg"],
        }
    }
}

impl std::fmt::Display for ImageCodec {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Png => write!(f, "png"),
            Self::Jpeg => write!(f, "jpeg"),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Cursor;

    fn encoded_rgb(format: ImageFormat) -> Vec<u8> {
        let img = RgbImage::from_fn(8, 8, |x, y| image::Rgb([x as u8 * 16, y as u8 * 16, 128]));
        let mut buf = Vec::new();
        img.write_to(&mut Cursor::new(&mut buf), format).unwrap();
        buf
    }

    #[test]
    fn resolves_known_extensions() {
        assert_eq!(ImageCodec::from_extension("png").unwrap(), ImageCodec::Png);
        assert_eq!(ImageCodec::from_extension("PNG").unwrap(), ImageCodec::Png);
        assert_eq!(ImageCodec::from_extension("jpg").unwrap(), ImageCodec::Jpeg);
        assert_eq!(ImageCodec::from_extension("jpeg").unwrap(), ImageCodec::Jpeg);
    }

    #[test]
    fn unknown_extension_is_an_error_not_a_png_guess() {
        let err = ImageCodec::from_extension("bmp").unwrap_err();
        assert!(matches!(err, FormatError::UnsupportedExtension(ref e) if e == "bmp"));
    }

    #[test]
    fn claimed_extensions_resolve_back_to_their_codec() {
        for codec in [ImageCodec::Png, ImageCodec::Jpeg] {
            for ext in codec.extensions() {
                assert_eq!(ImageCodec::from_extension(ext).unwrap(), codec);
            }
        }
    }

    #[test]
    fn missing_extension_is_rejected() {
        let err = ImageCodec::from_path(Path::new("/data/cat/img")).unwrap_err();
        assert!(matches!(err, FormatError::MissingExtension(_)));
    }

    #[test]
    fn decodes_png_bytes() {
        let bytes = encoded_rgb(ImageFormat::Png);
        let img = ImageCodec::Png.decode(&bytes).unwrap();
        assert_eq!(img.dimensions(), (8, 8));
    }

    #[test]
    fn decodes_jpeg_bytes() {
        let bytes = encoded_rgb(ImageFormat::Jpeg);
        let img = ImageCodec::Jpeg.decode(&bytes).unwrap();
        assert_eq!(img.dimensions(), (8, 8));
    }

    #[test]
    fn garbage_bytes_fail_with_decode_error() {
        let err = ImageCodec::Png.decode(b"not an image").unwrap_err();
        assert!(matches!(err, FormatError::Decode { codec: ImageCodec::Png, .. }));
    }
}
