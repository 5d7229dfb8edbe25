//! Annotation scene for ScreenCapture
//!
//! Holds the captured base image with its z-ordered overlays (text, pasted
//! images, strokes and arrows), the bounded undo/redo log and the
//! manipulation controller that turns pointer and keyboard input into
//! scene edits.

pub mod controller;
pub mod geometry;
pub mod history;
pub mod input;
pub mod object;
pub mod scene;
pub mod style;

pub use controller::{
    ColorPicker, Controller, ControllerState, Effect, SelectionSnapshot, PASTE_POSITION,
};
pub use geometry::{normalize_rect, AxisLock, Bounds, Point, Size};
pub use history::{EditAction, UndoRedoLog};
pub use input::{Key, KeyEvent, Modifiers, PointerEvent};
pub use object::{
    BorderTier, Capability, ImageOverlay, Overlay, Segment, StrokeMode, StrokeOverlay,
    TextOverlay, TextStyle,
};
pub use scene::{BaseImage, OverlayId, Scene};
pub use style::{Color, MemorySettings, SettingsStore, StyleSettings};
