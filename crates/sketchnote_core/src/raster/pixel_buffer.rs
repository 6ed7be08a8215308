use super::{CodecError, Rgba};

const BYTES_PER_PIXEL: usize = 4;

/// Owned grid of straight RGBA8 pixels.
///
/// Cloning copies the pixel data, so a buffer handed to a note never observes
/// later edits made to the canvas it came from.
#[derive(Clone, PartialEq, Eq)]
pub struct PixelBuffer {
    width: u32,
    height: u32,
    data: Vec<u8>,
}

impl PixelBuffer {
    /// Creates a fully transparent buffer.
    ///
    /// Returns `None` when either dimension is zero or the byte length would
    /// overflow `usize`.
    pub fn new(width: u32, height: u32) -> Option<Self> {
        let len = byte_len(width, height)?;
        Some(Self {
            width,
            height,
            data: vec![0; len],
        })
    }

    /// Wraps raw row-major RGBA8 bytes.
    pub fn from_rgba(width: u32, height: u32, data: Vec<u8>) -> Result<Self, CodecError> {
        let expected = byte_len(width, height)
            .ok_or(CodecError::InvalidDimensions { width, height })?;
        if data.len() != expected {
            return Err(CodecError::Malformed(format!(
                "pixel data has {} bytes, expected {expected} for {width}x{height}",
                data.len()
            )));
        }
        Ok(Self {
            width,
            height,
            data,
        })
    }

    pub fn width(&self) -> u32 {
        self.width
    }

    pub fn height(&self) -> u32 {
        self.height
    }

    /// Raw row-major RGBA8 bytes.
    pub fn data(&self) -> &[u8] {
        &self.data
    }

    pub(crate) fn data_mut(&mut self) -> &mut [u8] {
        &mut self.data
    }

    pub fn into_data(self) -> Vec<u8> {
        self.data
    }

    /// Returns the pixel at `(x, y)`, or `None` when out of bounds.
    pub fn pixel(&self, x: u32, y: u32) -> Option<Rgba> {
        let offset = self.offset(x, y)?;
        let px = &self.data[offset..offset + BYTES_PER_PIXEL];
        Some(Rgba::new(px[0], px[1], px[2], px[3]))
    }

    /// Writes one pixel. Out-of-bounds writes are ignored and return `false`.
    pub fn set_pixel(&mut self, x: u32, y: u32, color: Rgba) -> bool {
        let Some(offset) = self.offset(x, y) else {
            return false;
        };
        self.data[offset..offset + BYTES_PER_PIXEL]
            .copy_from_slice(&[color.r, color.g, color.b, color.a]);
        true
    }

    /// Sets every pixel to `color`.
    pub fn fill(&mut self, color: Rgba) {
        for px in self.data.chunks_exact_mut(BYTES_PER_PIXEL) {
            px.copy_from_slice(&[color.r, color.g, color.b, color.a]);
        }
    }

    /// Whether every pixel has zero alpha.
    pub fn is_fully_transparent(&self) -> bool {
        self.data
            .chunks_exact(BYTES_PER_PIXEL)
            .all(|px| px[3] == 0)
    }

    fn offset(&self, x: u32, y: u32) -> Option<usize> {
        if x >= self.width || y >= self.height {
            return None;
        }
        Some((y as usize * self.width as usize + x as usize) * BYTES_PER_PIXEL)
    }
}

impl std::fmt::Debug for PixelBuffer {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("PixelBuffer")
            .field("width", &self.width)
            .field("height", &self.height)
            .field("bytes", &self.data.len())
            .finish()
    }
}

fn byte_len(width: u32, height: u32) -> Option<usize> {
    if width == 0 || height == 0 {
        return None;
    }
    (width as usize)
        .checked_mul(height as usize)?
        .checked_mul(BYTES_PER_PIXEL)
}
