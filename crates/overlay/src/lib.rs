//! Overlay module for ScreenCapture
//!
//! Provides the full-screen region/window selection gesture.

pub mod gesture;
pub mod selection;

pub use gesture::{SelectionGesture, VirtualScreen};
pub use selection::{calc_selection_rect, is_valid_selection, SelectionMode, MIN_SELECTION_SIZE};

use capture::Rect;

/// Selection outcome
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SelectionOutcome {
    /// User dragged a region (virtual-screen pixels)
    Region(Rect),
    /// User Ctrl+clicked; capture the top-level window under this point
    WindowAt { x: i32, y: i32 },
    /// User cancelled
    Cancelled,
}
