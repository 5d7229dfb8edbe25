//! Export module for ScreenCapture
//!
//! Flattens an annotation scene into one bitmap and hands it to the
//! clipboard or a PNG file.

mod clipboard;
mod compositor;
pub mod png;

pub use clipboard::{ImageClipboard, SystemClipboard};
pub use compositor::{load_font, Compositor};
pub use png::{encode_png, save_png};

use thiserror::Error;

#[derive(Error, Debug)]
pub enum ExportError {
    #[error("Clipboard unavailable: {0}")]
    ClipboardUnavailable(String),

    #[error("Nothing to export: image is empty")]
    EmptyImage,

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("Image error: {0}")]
    Image(#[from] image::ImageError),
}

pub type ExportResult<T> = Result<T, ExportError>;
