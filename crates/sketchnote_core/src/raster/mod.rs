//! Raster primitives shared by the canvas and the persistence pipeline.
//!
//! # Responsibility
//! - Define the portable pixel grid (`PixelBuffer`) handed between layers.
//! - Provide the lossless byte codec used at the storage boundary.
//!
//! # Invariants
//! - `PixelBuffer` pixels are straight (non-premultiplied) RGBA8, row-major.
//! - Width and height are always >= 1.

pub mod codec;
mod pixel_buffer;

pub use codec::{decode, encode, CodecError};
pub use pixel_buffer::PixelBuffer;

use serde::{Deserialize, Serialize};

/// 32-bit straight-alpha color.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct Rgba {
    pub r: u8,
    pub g: u8,
    pub b: u8,
    pub a: u8,
}

impl Rgba {
    pub const TRANSPARENT: Self = Self::new(0, 0, 0, 0);
    pub const BLACK: Self = Self::opaque(0, 0, 0);
    pub const RED: Self = Self::opaque(0xFF, 0, 0);
    pub const GREEN: Self = Self::opaque(0, 0xFF, 0);
    pub const BLUE: Self = Self::opaque(0, 0, 0xFF);
    pub const YELLOW: Self = Self::opaque(0xFF, 0xFF, 0);

    pub const fn new(r: u8, g: u8, b: u8, a: u8) -> Self {
        Self { r, g, b, a }
    }

    pub const fn opaque(r: u8, g: u8, b: u8) -> Self {
        Self::new(r, g, b, 0xFF)
    }

    /// Builds a color from a packed `0xAARRGGBB` value.
    pub const fn from_argb(value: u32) -> Self {
        Self::new(
            (value >> 16) as u8,
            (value >> 8) as u8,
            value as u8,
            (value >> 24) as u8,
        )
    }

    /// Packs this color as `0xAARRGGBB`.
    pub const fn to_argb(self) -> u32 {
        ((self.a as u32) << 24) | ((self.r as u32) << 16) | ((self.g as u32) << 8) | self.b as u32
    }

    pub const fn is_opaque(self) -> bool {
        self.a == 0xFF
    }
}

#[cfg(test)]
mod tests {
    use super::Rgba;

    #[test]
    fn argb_packing_matches_channel_layout() {
        let color = Rgba::from_argb(0x80FF_2010);
        assert_eq!(color, Rgba::new(0xFF, 0x20, 0x10, 0x80));
        assert_eq!(color.to_argb(), 0x80FF_2010);
        assert!(Rgba::YELLOW.is_opaque());
    }
}
