//! Region and window capture against a platform screen source

use crate::{CaptureError, CaptureResult, PixelBuffer, Rect};

/// Smallest width/height accepted for a capture
pub const MIN_CAPTURE_SIZE: u32 = 2;

/// Opaque native window handle
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct WindowHandle(pub isize);

/// Platform boundary for raw pixel copies and window lookup.
///
/// Implementations must not apply any policy: validation of rectangles and
/// the walk from a point to a capture lives in this module.
pub trait ScreenSource {
    /// Copy the screen pixels inside `rect` (virtual-screen coordinates)
    fn capture_screen_rect(&self, rect: Rect) -> CaptureResult<PixelBuffer>;

    /// Top-level (root ancestor) window under a virtual-screen point
    fn top_window_at(&self, x: i32, y: i32) -> Option<WindowHandle>;

    /// Bounding rectangle of a window in virtual-screen coordinates
    fn window_bounds(&self, handle: WindowHandle) -> Option<Rect>;
}

/// Capture a rectangle of the virtual screen.
///
/// The caller must have hidden any selection chrome and let one frame
/// present before calling, or the chrome ends up in the pixels.
pub fn capture_region<S: ScreenSource + ?Sized>(source: &S, rect: Rect) -> CaptureResult<PixelBuffer> {
    if !rect.is_at_least(MIN_CAPTURE_SIZE) {
        log::debug!("[CAPTURE] Rejected region {}x{}", rect.width, rect.height);
        return Err(CaptureError::InvalidRegion {
            width: rect.width,
            height: rect.height,
        });
    }

    let pixels = source.capture_screen_rect(rect)?;
    if pixels.width() != rect.width || pixels.height() != rect.height {
        return Err(CaptureError::CaptureUnavailable(format!(
            "expected {}x{} pixels, got {}x{}",
            rect.width,
            rect.height,
            pixels.width(),
            pixels.height()
        )));
    }

    log::info!(
        "[CAPTURE] Captured {}x{} at ({}, {})",
        rect.width,
        rect.height,
        rect.x,
        rect.y
    );
    Ok(pixels)
}

/// Capture the top-level window under a virtual-screen point.
///
/// Returns the capture together with the window rectangle, which becomes
/// the origin of the annotation scene.
pub fn capture_window_at<S: ScreenSource + ?Sized>(
    source: &S,
    x: i32,
    y: i32,
) -> CaptureResult<(Rect, PixelBuffer)> {
    let handle = source
        .top_window_at(x, y)
        .ok_or(CaptureError::WindowResolutionFailed)?;
    let rect = source
        .window_bounds(handle)
        .ok_or(CaptureError::WindowResolutionFailed)?;

    if !rect.is_at_least(MIN_CAPTURE_SIZE) {
        log::debug!("[CAPTURE] Window {:?} has degenerate bounds {:?}", handle, rect);
        return Err(CaptureError::WindowResolutionFailed);
    }

    let pixels = capture_region(source, rect)?;
    Ok((rect, pixels))
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::cell::Cell;

    struct FakeScreen {
        window: Option<Rect>,
        calls: Cell<usize>,
    }

    impl ScreenSource for FakeScreen {
        fn capture_screen_rect(&self, rect: Rect) -> CaptureResult<PixelBuffer> {
            self.calls.set(self.calls.get() + 1);
            Ok(PixelBuffer::filled(rect.width, rect.height, [0, 0, 255, 255]))
        }

        fn top_window_at(&self, _x: i32, _y: i32) -> Option<WindowHandle> {
            self.window.map(|_| WindowHandle(7))
        }

        fn window_bounds(&self, handle: WindowHandle) -> Option<Rect> {
            assert_eq!(handle, WindowHandle(7));
            self.window
        }
    }

    fn screen(window: Option<Rect>) -> FakeScreen {
        FakeScreen {
            window,
            calls: Cell::new(0),
        }
    }

    #[test]
    fn rejects_thin_regions_without_touching_the_screen() {
        let source = screen(None);
        for rect in [Rect::new(0, 0, 1, 100), Rect::new(0, 0, 100, 1), Rect::new(0, 0, 0, 0)] {
            let result = capture_region(&source, rect);
            assert!(matches!(result, Err(CaptureError::InvalidRegion { .. })));
        }
        assert_eq!(source.calls.get(), 0);
    }

    #[test]
    fn accepts_minimum_region() {
        let source = screen(None);
        let pixels = capture_region(&source, Rect::new(-5, 3, 2, 2)).unwrap();
        assert_eq!((pixels.width(), pixels.height()), (2, 2));
        assert_eq!(source.calls.get(), 1);
    }

    #[test]
    fn window_capture_uses_window_bounds() {
        let source = screen(Some(Rect::new(100, 50, 40, 30)));
        let (rect, pixels) = capture_window_at(&source, 120, 60).unwrap();
        assert_eq!(rect, Rect::new(100, 50, 40, 30));
        assert_eq!((pixels.width(), pixels.height()), (40, 30));
    }

    #[test]
    fn window_capture_fails_without_window() {
        let source = screen(None);
        assert!(matches!(
            capture_window_at(&source, 0, 0),
            Err(CaptureError::WindowResolutionFailed)
        ));
    }

    #[test]
    fn window_capture_fails_on_degenerate_bounds() {
        let source = screen(Some(Rect::new(0, 0, 1, 300)));
        assert!(matches!(
            capture_window_at(&source, 0, 0),
            Err(CaptureError::WindowResolutionFailed)
        ));
        assert_eq!(source.calls.get(), 0);
    }
}
