//! Screen capture module for ScreenCapture
//!
//! Provides rectangle capture of the virtual screen and the top-level
//! window under a point, behind the `ScreenSource` platform boundary.

pub mod frame;
#[cfg(windows)]
pub mod gdi;
pub mod region;

pub use frame::PixelBuffer;
#[cfg(windows)]
pub use gdi::GdiScreen;
pub use region::{capture_region, capture_window_at, ScreenSource, WindowHandle, MIN_CAPTURE_SIZE};

use thiserror::Error;

#[derive(Error, Debug)]
pub enum CaptureError {
    #[cfg(windows)]
    #[error("Windows API error: {0}")]
    Windows(#[from] windows::core::Error),

    #[error("Invalid capture region {width}x{height}")]
    InvalidRegion { width: u32, height: u32 },

    #[error("Screen capture unavailable: {0}")]
    CaptureUnavailable(String),

    #[error("No capturable window under the cursor")]
    WindowResolutionFailed,

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("Image error: {0}")]
    Image(#[from] image::ImageError),
}

pub type CaptureResult<T> = Result<T, CaptureError>;

/// Rectangle in virtual-screen pixels
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct Rect {
    pub x: i32,
    pub y: i32,
    pub width: u32,
    pub height: u32,
}

impl Rect {
    pub fn new(x: i32, y: i32, width: u32, height: u32) -> Self {
        Self { x, y, width, height }
    }

    /// Build from left/top/right/bottom edges, as window managers report them
    pub fn from_edges(left: i32, top: i32, right: i32, bottom: i32) -> Self {
        Self {
            x: left,
            y: top,
            width: (right - left).max(0) as u32,
            height: (bottom - top).max(0) as u32,
        }
    }

    pub fn right(&self) -> i32 {
        self.x + self.width as i32
    }

    pub fn bottom(&self) -> i32 {
        self.y + self.height as i32
    }

    pub fn contains(&self, x: i32, y: i32) -> bool {
        x >= self.x && x < self.right() && y >= self.y && y < self.bottom()
    }

    /// Both sides at least `min` pixels
    pub fn is_at_least(&self, min: u32) -> bool {
        self.width >= min && self.height >= min
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn from_edges_clamps_inverted_rect() {
        let rect = Rect::from_edges(10, 10, 5, 40);
        assert_eq!(rect.width, 0);
        assert_eq!(rect.height, 30);
    }

    #[test]
    fn contains_excludes_right_and_bottom_edges() {
        let rect = Rect::new(-100, 0, 50, 20);
        assert!(rect.contains(-100, 0));
        assert!(rect.contains(-51, 19));
        assert!(!rect.contains(-50, 0));
        assert!(!rect.contains(-60, 20));
    }
}
