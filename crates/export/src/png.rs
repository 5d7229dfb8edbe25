//! PNG export

use crate::{ExportError, ExportResult};
use capture::PixelBuffer;
use image::ImageFormat;
use std::fs;
use std::io::Cursor;
use std::path::Path;

/// Encode a bitmap as PNG bytes
pub fn encode_png(pixels: &PixelBuffer) -> ExportResult<Vec<u8>> {
    if pixels.is_empty() {
        return Err(ExportError::EmptyImage);
    }
    let mut bytes = Vec::new();
    pixels
        .as_rgba_image()
        .write_to(&mut Cursor::new(&mut bytes), ImageFormat::Png)?;
    Ok(bytes)
}

/// Write a bitmap to `path`, creating parent directories
pub fn save_png(pixels: &PixelBuffer, path: &Path) -> ExportResult<()> {
    let bytes = encode_png(pixels)?;
    if let Some(parent) = path.parent().filter(|p| !p.as_os_str().is_empty()) {
        fs::create_dir_all(parent)?;
    }
    fs::write(path, bytes)?;
    log::info!("[EXPORT] Saved {}x{} PNG to {:?}", pixels.width(), pixels.height(), path);
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn encoded_bytes_decode_to_same_pixels() {
        let mut data = [10, 20, 30, 255].repeat(6);
        data[16..20].copy_from_slice(&[200, 100, 50, 128]);
        let pixels = PixelBuffer::from_rgba(3, 2, data).unwrap();
        let bytes = encode_png(&pixels).unwrap();
        assert_eq!(&bytes[1..4], b"PNG");

        let decoded = image::load_from_memory_with_format(&bytes, ImageFormat::Png)
            .unwrap()
            .to_rgba8();
        assert_eq!(decoded.as_raw(), pixels.as_raw());
    }

    #[test]
    fn empty_bitmap_is_rejected() {
        let empty = PixelBuffer::filled(0, 0, [0, 0, 0, 0]);
        assert!(matches!(encode_png(&empty), Err(ExportError::EmptyImage)));
    }
}
