//! Image clipboard boundary

use crate::{ExportError, ExportResult};
use capture::PixelBuffer;
use std::borrow::Cow;

/// Where composites go and pasted images come from
pub trait ImageClipboard {
    fn write_image(&mut self, pixels: &PixelBuffer) -> ExportResult<()>;

    /// `Ok(None)` when the clipboard holds no image
    fn read_image(&mut self) -> ExportResult<Option<PixelBuffer>>;
}

/// OS clipboard via arboard
pub struct SystemClipboard {
    inner: arboard::Clipboard,
}

impl SystemClipboard {
    pub fn new() -> ExportResult<Self> {
        let inner = arboard::Clipboard::new()
            .map_err(|e| ExportError::ClipboardUnavailable(e.to_string()))?;
        Ok(Self { inner })
    }
}

impl ImageClipboard for SystemClipboard {
    fn write_image(&mut self, pixels: &PixelBuffer) -> ExportResult<()> {
        if pixels.is_empty() {
            return Err(ExportError::EmptyImage);
        }
        // arboard wants RGBA bytes, straight alpha
        let data = arboard::ImageData {
            width: pixels.width() as usize,
            height: pixels.height() as usize,
            bytes: Cow::Borrowed(pixels.as_raw()),
        };
        self.inner
            .set_image(data)
            .map_err(|e| ExportError::ClipboardUnavailable(e.to_string()))?;
        log::info!("[EXPORT] Copied {}x{} image to clipboard", pixels.width(), pixels.height());
        Ok(())
    }

    fn read_image(&mut self) -> ExportResult<Option<PixelBuffer>> {
        match self.inner.get_image() {
            Ok(data) => {
                let pixels =
                    PixelBuffer::from_rgba(data.width as u32, data.height as u32, data.bytes.into_owned());
                if pixels.is_none() {
                    log::warn!("[EXPORT] Clipboard image has inconsistent size, ignoring");
                }
                Ok(pixels)
            }
            Err(arboard::Error::ContentNotAvailable) => Ok(None),
            Err(e) => Err(ExportError::ClipboardUnavailable(e.to_string())),
        }
    }
}
