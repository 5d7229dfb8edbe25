//! Selection logic for region and window selection

use capture::{Rect, MIN_CAPTURE_SIZE};
use scene::{normalize_rect, Point};

/// Selection mode
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SelectionMode {
    Region,
    Window,
}

/// Minimum selection size
pub const MIN_SELECTION_SIZE: u32 = MIN_CAPTURE_SIZE;

/// Calculate selection rectangle from drag points
pub fn calc_selection_rect(start_x: i32, start_y: i32, end_x: i32, end_y: i32) -> Rect {
    let bounds = normalize_rect(
        Point::new(start_x as f64, start_y as f64),
        Point::new(end_x as f64, end_y as f64),
    );
    Rect::new(
        bounds.x as i32,
        bounds.y as i32,
        bounds.width as u32,
        bounds.height as u32,
    )
}

/// Check if selection is valid
pub fn is_valid_selection(rect: &Rect) -> bool {
    rect.is_at_least(MIN_SELECTION_SIZE)
}
