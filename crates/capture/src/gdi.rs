//! Virtual desktop capture and window lookup using GDI

use crate::{CaptureError, CaptureResult, PixelBuffer, Rect, ScreenSource, WindowHandle};
use windows::Win32::Foundation::{HWND, POINT, RECT};
use windows::Win32::Graphics::Gdi::{
    BitBlt, CreateCompatibleBitmap, CreateCompatibleDC, DeleteDC, DeleteObject,
    GetDC, GetDIBits, ReleaseDC, SelectObject, BITMAPINFO, BITMAPINFOHEADER,
    BI_RGB, DIB_RGB_COLORS, SRCCOPY,
};
use windows::Win32::UI::WindowsAndMessaging::{
    GetAncestor, GetSystemMetrics, GetWindowRect, WindowFromPoint, GA_ROOT,
    SM_CXVIRTUALSCREEN, SM_CYVIRTUALSCREEN, SM_XVIRTUALSCREEN, SM_YVIRTUALSCREEN,
};

/// Screen source backed by the desktop device context
#[derive(Debug, Default, Clone, Copy)]
pub struct GdiScreen;

impl GdiScreen {
    pub fn new() -> Self {
        Self
    }
}

impl ScreenSource for GdiScreen {
    fn capture_screen_rect(&self, rect: Rect) -> CaptureResult<PixelBuffer> {
        let width = rect.width as i32;
        let height = rect.height as i32;

        unsafe {
            let screen_dc = GetDC(None);
            if screen_dc.is_invalid() {
                return Err(CaptureError::CaptureUnavailable("Failed to get screen DC".into()));
            }

            let mem_dc = CreateCompatibleDC(screen_dc);
            let bitmap = CreateCompatibleBitmap(screen_dc, width, height);
            let old_bitmap = SelectObject(mem_dc, bitmap);

            let blit = BitBlt(mem_dc, 0, 0, width, height, screen_dc, rect.x, rect.y, SRCCOPY);

            let mut bmi = BITMAPINFO {
                bmiHeader: BITMAPINFOHEADER {
                    biSize: std::mem::size_of::<BITMAPINFOHEADER>() as u32,
                    biWidth: width,
                    biHeight: -height, // Top-down DIB
                    biPlanes: 1,
                    biBitCount: 32,
                    biCompression: BI_RGB.0,
                    ..Default::default()
                },
                bmiColors: [Default::default()],
            };

            let mut data = vec![0u8; rect.width as usize * rect.height as usize * 4];
            let lines = if blit.is_ok() {
                GetDIBits(
                    mem_dc,
                    bitmap,
                    0,
                    rect.height,
                    Some(data.as_mut_ptr() as *mut _),
                    &mut bmi,
                    DIB_RGB_COLORS,
                )
            } else {
                0
            };

            SelectObject(mem_dc, old_bitmap);
            let _ = DeleteObject(bitmap);
            let _ = DeleteDC(mem_dc);
            ReleaseDC(None, screen_dc);

            blit?;
            if lines != height {
                return Err(CaptureError::CaptureUnavailable(format!(
                    "GetDIBits copied {} of {} lines",
                    lines, height
                )));
            }

            PixelBuffer::from_bgra(rect.width, rect.height, data)
                .ok_or_else(|| CaptureError::CaptureUnavailable("Pixel buffer size mismatch".into()))
        }
    }

    fn top_window_at(&self, x: i32, y: i32) -> Option<WindowHandle> {
        unsafe {
            let hwnd = WindowFromPoint(POINT { x, y });
            if hwnd.is_invalid() {
                return None;
            }
            let root = GetAncestor(hwnd, GA_ROOT);
            if root.is_invalid() {
                return None;
            }
            Some(WindowHandle(root.0 as isize))
        }
    }

    fn window_bounds(&self, handle: WindowHandle) -> Option<Rect> {
        unsafe {
            let hwnd = HWND(handle.0 as *mut std::ffi::c_void);
            let mut rect = RECT::default();
            GetWindowRect(hwnd, &mut rect).ok()?;
            Some(Rect::from_edges(rect.left, rect.top, rect.right, rect.bottom))
        }
    }
}

/// Get virtual desktop bounds
pub fn virtual_screen_rect() -> Rect {
    unsafe {
        Rect::new(
            GetSystemMetrics(SM_XVIRTUALSCREEN),
            GetSystemMetrics(SM_YVIRTUALSCREEN),
            GetSystemMetrics(SM_CXVIRTUALSCREEN).max(0) as u32,
            GetSystemMetrics(SM_CYVIRTUALSCREEN).max(0) as u32,
        )
    }
}
