//! Colors and persisted style preferences

use parking_lot::Mutex;
use serde::{Deserialize, Serialize};
use std::path::PathBuf;
use std::sync::Arc;

/// 8-bit RGBA color, persisted as a 32-bit ARGB integer
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(from = "u32", into = "u32")]
pub struct Color {
    pub r: u8,
    pub g: u8,
    pub b: u8,
    pub a: u8,
}

impl Color {
    pub const TRANSPARENT: Color = Color::rgba(0, 0, 0, 0);
    pub const BLACK: Color = Color::rgb(0, 0, 0);
    pub const WHITE: Color = Color::rgb(255, 255, 255);
    pub const RED: Color = Color::rgb(255, 0, 0);
    pub const YELLOW: Color = Color::rgb(255, 255, 0);
    pub const LIME: Color = Color::rgb(0, 255, 0);
    pub const BLUE: Color = Color::rgb(0, 0, 255);

    pub const fn rgb(r: u8, g: u8, b: u8) -> Self {
        Self { r, g, b, a: 255 }
    }

    pub const fn rgba(r: u8, g: u8, b: u8, a: u8) -> Self {
        Self { r, g, b, a }
    }

    pub const fn from_argb(argb: u32) -> Self {
        Self {
            a: (argb >> 24) as u8,
            r: (argb >> 16) as u8,
            g: (argb >> 8) as u8,
            b: argb as u8,
        }
    }

    pub const fn to_argb(self) -> u32 {
        ((self.a as u32) << 24) | ((self.r as u32) << 16) | ((self.g as u32) << 8) | self.b as u32
    }

    pub fn is_transparent(self) -> bool {
        self.a == 0
    }

    pub fn to_rgba_array(self) -> [u8; 4] {
        [self.r, self.g, self.b, self.a]
    }
}

impl From<u32> for Color {
    fn from(argb: u32) -> Self {
        Color::from_argb(argb)
    }
}

impl From<Color> for u32 {
    fn from(color: Color) -> Self {
        color.to_argb()
    }
}

pub const MIN_FONT_SIZE: f64 = 8.0;
pub const MAX_FONT_SIZE: f64 = 200.0;
pub const DEFAULT_FONT_SIZE: f64 = 24.0;

/// Thicknesses offered by the paint toolbar
pub const PAINT_THICKNESS_CHOICES: [f64; 4] = [1.0, 3.0, 5.0, 10.0];
pub const DEFAULT_PAINT_THICKNESS: f64 = 3.0;
pub const DEFAULT_UNDO_LIMIT: usize = 50;

pub fn clamp_font_size(size: f64) -> f64 {
    if size.is_nan() {
        return DEFAULT_FONT_SIZE;
    }
    size.clamp(MIN_FONT_SIZE, MAX_FONT_SIZE)
}

/// Snap to a toolbar thickness, falling back to the default
pub fn paint_thickness_choice(thickness: f64) -> f64 {
    PAINT_THICKNESS_CHOICES
        .iter()
        .copied()
        .find(|choice| *choice == thickness)
        .unwrap_or(DEFAULT_PAINT_THICKNESS)
}

/// User preferences read at scene/overlay creation and written back on change
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default, rename_all = "camelCase")]
pub struct StyleSettings {
    pub text_color: Color,
    pub text_background: Color,
    pub text_font_size: f64,
    pub paint_color: Color,
    pub paint_thickness: f64,
    pub image_border_color: Color,
    pub undo_limit: usize,
    pub font_path: Option<PathBuf>,
}

impl Default for StyleSettings {
    fn default() -> Self {
        Self {
            text_color: Color::RED,
            text_background: Color::TRANSPARENT,
            text_font_size: DEFAULT_FONT_SIZE,
            paint_color: Color::RED,
            paint_thickness: DEFAULT_PAINT_THICKNESS,
            image_border_color: Color::WHITE,
            undo_limit: DEFAULT_UNDO_LIMIT,
            font_path: None,
        }
    }
}

impl StyleSettings {
    /// Clamp persisted values into their valid ranges
    pub fn sanitized(mut self) -> Self {
        self.text_font_size = clamp_font_size(self.text_font_size);
        self.paint_thickness = paint_thickness_choice(self.paint_thickness);
        self.undo_limit = self.undo_limit.max(1);
        self
    }
}

/// Persistence collaborator for style preferences
pub trait SettingsStore {
    fn load(&self) -> StyleSettings;
    fn save(&self, settings: &StyleSettings);
}

/// Settings kept in memory; clones share the same state
#[derive(Debug, Clone, Default)]
pub struct MemorySettings {
    inner: Arc<Mutex<MemoryState>>,
}

#[derive(Debug, Default)]
struct MemoryState {
    settings: StyleSettings,
    saves: usize,
}

impl MemorySettings {
    pub fn new(settings: StyleSettings) -> Self {
        Self {
            inner: Arc::new(Mutex::new(MemoryState { settings, saves: 0 })),
        }
    }

    pub fn current(&self) -> StyleSettings {
        self.inner.lock().settings.clone()
    }

    /// Number of `save` calls so far
    pub fn save_count(&self) -> usize {
        self.inner.lock().saves
    }
}

impl SettingsStore for MemorySettings {
    fn load(&self) -> StyleSettings {
        self.current()
    }

    fn save(&self, settings: &StyleSettings) {
        let mut state = self.inner.lock();
        state.settings = settings.clone();
        state.saves += 1;
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn argb_round_trip_keeps_channels() {
        let color = Color::rgba(0x12, 0x34, 0x56, 0x78);
        assert_eq!(color.to_argb(), 0x7812_3456);
        assert_eq!(Color::from_argb(0x7812_3456), color);
    }

    #[test]
    fn defaults_match_original_preferences() {
        let settings = StyleSettings::default();
        assert_eq!(settings.text_color.to_argb(), 0xFFFF_0000);
        assert_eq!(settings.text_background.to_argb(), 0x0000_0000);
        assert_eq!(settings.image_border_color.to_argb(), 0xFFFF_FFFF);
        assert_eq!(settings.paint_thickness, 3.0);
        assert_eq!(settings.undo_limit, 50);
    }

    #[test]
    fn sanitized_clamps_out_of_range_values() {
        let settings = StyleSettings {
            text_font_size: 2.0,
            paint_thickness: 7.0,
            undo_limit: 0,
            ..StyleSettings::default()
        }
        .sanitized();
        assert_eq!(settings.text_font_size, MIN_FONT_SIZE);
        assert_eq!(settings.paint_thickness, DEFAULT_PAINT_THICKNESS);
        assert_eq!(settings.undo_limit, 1);
    }

    #[test]
    fn memory_settings_clones_share_state() {
        let store = MemorySettings::default();
        let other = store.clone();
        let mut settings = store.load();
        settings.paint_color = Color::BLUE;
        other.save(&settings);
        assert_eq!(store.current().paint_color, Color::BLUE);
        assert_eq!(store.save_count(), 1);
    }
}
