//! Lossless byte codec for pixel buffers.
//!
//! # Responsibility
//! - Encode `PixelBuffer` into a self-describing PNG (RGBA8) payload.
//! - Decode payloads back into pixel-exact buffers.
//!
//! # Invariants
//! - `decode(&encode(b)?)? == b` for every valid buffer, transparent ones included.
//! - Malformed input returns `CodecError`; no partial pixels are ever returned.
//! - Both functions are pure and safe to call from any thread.

use super::PixelBuffer;
use image::codecs::png::{CompressionType, FilterType, PngEncoder};
use image::{ExtendedColorType, ImageEncoder, ImageFormat};
use std::error::Error;
use std::fmt::{Display, Formatter};

const PNG_SIGNATURE: [u8; 8] = [0x89, b'P', b'N', b'G', b'\r', b'\n', 0x1A, b'\n'];

/// Errors from raster encode/decode.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum CodecError {
    /// Payload has no bytes.
    Empty,
    /// Payload does not start with the PNG signature.
    NotPng,
    /// Payload is truncated or otherwise corrupt.
    Malformed(String),
    /// Dimensions are zero or too large to address.
    InvalidDimensions { width: u32, height: u32 },
    /// Encoder backend failure.
    Encode(String),
}

impl Display for CodecError {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Empty => write!(f, "image payload is empty"),
            Self::NotPng => write!(f, "image payload is not a PNG stream"),
            Self::Malformed(details) => write!(f, "malformed image payload: {details}"),
            Self::InvalidDimensions { width, height } => {
                write!(f, "invalid image dimensions {width}x{height}")
            }
            Self::Encode(details) => write!(f, "failed to encode image: {details}"),
        }
    }
}

impl Error for CodecError {}

/// Encodes a buffer into PNG bytes.
pub fn encode(buffer: &PixelBuffer) -> Result<Vec<u8>, CodecError> {
    let mut out = Vec::new();
    PngEncoder::new_with_quality(&mut out, CompressionType::Default, FilterType::Adaptive)
        .write_image(
            buffer.data(),
            buffer.width(),
            buffer.height(),
            ExtendedColorType::Rgba8,
        )
        .map_err(|err| CodecError::Encode(err.to_string()))?;
    Ok(out)
}

/// Decodes PNG bytes into a buffer.
///
/// Non-RGBA PNGs (grayscale, palette, RGB) are widened to RGBA8.
pub fn decode(bytes: &[u8]) -> Result<PixelBuffer, CodecError> {
    if bytes.is_empty() {
        return Err(CodecError::Empty);
    }
    if !bytes.starts_with(&PNG_SIGNATURE) {
        return Err(CodecError::NotPng);
    }

    let image = image::load_from_memory_with_format(bytes, ImageFormat::Png)
        .map_err(|err| CodecError::Malformed(err.to_string()))?
        .into_rgba8();
    let (width, height) = image.dimensions();
    if width == 0 || height == 0 {
        return Err(CodecError::InvalidDimensions { width, height });
    }
    PixelBuffer::from_rgba(width, height, image.into_raw())
}
