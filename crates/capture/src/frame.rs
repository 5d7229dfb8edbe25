//! Pixel buffers produced by capture and consumed by the compositor

use image::{Rgba, RgbaImage};

/// Top-down, 32-bit-per-pixel RGBA buffer (straight alpha)
#[derive(Debug, Clone, PartialEq)]
pub struct PixelBuffer {
    image: RgbaImage,
}

impl PixelBuffer {
    /// Create a buffer filled with one color
    pub fn filled(width: u32, height: u32, rgba: [u8; 4]) -> Self {
        Self {
            image: RgbaImage::from_pixel(width, height, Rgba(rgba)),
        }
    }

    /// Wrap RGBA bytes; `None` when the length does not match the size
    pub fn from_rgba(width: u32, height: u32, data: Vec<u8>) -> Option<Self> {
        RgbaImage::from_raw(width, height, data).map(|image| Self { image })
    }

    /// Convert BGRA bytes (GDI/DXGI layout) to an opaque RGBA buffer
    pub fn from_bgra(width: u32, height: u32, mut data: Vec<u8>) -> Option<Self> {
        for chunk in data.chunks_exact_mut(4) {
            chunk.swap(0, 2);
            // Screen DCs leave the alpha byte undefined
            chunk[3] = 0xFF;
        }
        Self::from_rgba(width, height, data)
    }

    pub fn width(&self) -> u32 {
        self.image.width()
    }

    pub fn height(&self) -> u32 {
        self.image.height()
    }

    pub fn is_empty(&self) -> bool {
        self.image.width() == 0 || self.image.height() == 0
    }

    /// Pixel at (x, y), `None` outside the buffer
    pub fn pixel(&self, x: u32, y: u32) -> Option<[u8; 4]> {
        if x < self.width() && y < self.height() {
            Some(self.image.get_pixel(x, y).0)
        } else {
            None
        }
    }

    pub fn as_raw(&self) -> &[u8] {
        self.image.as_raw()
    }

    pub fn as_rgba_image(&self) -> &RgbaImage {
        &self.image
    }
}
