//! Style preferences persisted as JSON in the user config directory

use scene::{SettingsStore, StyleSettings};
use std::fs;
use std::path::{Path, PathBuf};
use thiserror::Error;

const APP_DIR: &str = "ScreenCapture";
const FILE_NAME: &str = "text-style.json";

#[derive(Error, Debug)]
pub enum SettingsError {
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("Malformed settings: {0}")]
    Json(#[from] serde_json::Error),
}

pub type SettingsResult<T> = Result<T, SettingsError>;

/// Settings file store.
///
/// Reading never fails from the controller's point of view: a missing or
/// unreadable file yields defaults, and write failures are only logged.
#[derive(Debug, Clone)]
pub struct JsonSettingsStore {
    path: PathBuf,
}

impl JsonSettingsStore {
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self { path: path.into() }
    }

    /// `<config dir>/ScreenCapture/text-style.json`, or the working
    /// directory when the platform has no config dir
    pub fn default_location() -> Self {
        let dir = dirs::config_dir()
            .map(|d| d.join(APP_DIR))
            .unwrap_or_else(|| PathBuf::from("."));
        Self::new(dir.join(FILE_NAME))
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    /// `Ok(None)` when no settings have been saved yet
    pub fn try_load(&self) -> SettingsResult<Option<StyleSettings>> {
        if !self.path.exists() {
            return Ok(None);
        }
        let content = fs::read_to_string(&self.path)?;
        let settings: StyleSettings = serde_json::from_str(&content)?;
        Ok(Some(settings.sanitized()))
    }

    pub fn try_save(&self, settings: &StyleSettings) -> SettingsResult<()> {
        if let Some(parent) = self.path.parent() {
            fs::create_dir_all(parent)?;
        }
        let json = serde_json::to_string_pretty(settings)?;
        fs::write(&self.path, json)?;
        Ok(())
    }
}

impl SettingsStore for JsonSettingsStore {
    fn load(&self) -> StyleSettings {
        match self.try_load() {
            Ok(Some(settings)) => {
                log::info!("[SETTINGS] Loaded from {:?}", self.path);
                settings
            }
            Ok(None) => StyleSettings::default(),
            Err(e) => {
                log::warn!("[SETTINGS] Ignoring {:?}: {}", self.path, e);
                StyleSettings::default()
            }
        }
    }

    fn save(&self, settings: &StyleSettings) {
        match self.try_save(settings) {
            Ok(()) => log::debug!("[SETTINGS] Saved to {:?}", self.path),
            Err(e) => log::warn!("[SETTINGS] Could not save {:?}: {}", self.path, e),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use scene::Color;

    fn temp_store() -> (PathBuf, JsonSettingsStore) {
        let dir = std::env::temp_dir().join(format!("screencapture-settings-{}", uuid::Uuid::new_v4()));
        let store = JsonSettingsStore::new(dir.join(FILE_NAME));
        (dir, store)
    }

    #[test]
    fn missing_file_loads_defaults() {
        let (_dir, store) = temp_store();
        assert_eq!(store.try_load().unwrap(), None);
        assert_eq!(store.load(), StyleSettings::default());
    }

    #[test]
    fn saved_settings_load_back() {
        let (dir, store) = temp_store();
        let settings = StyleSettings {
            text_color: Color::BLUE,
            text_font_size: 40.0,
            paint_thickness: 10.0,
            undo_limit: 7,
            ..StyleSettings::default()
        };
        store.save(&settings);
        assert_eq!(store.load(), settings);
        fs::remove_dir_all(dir).unwrap();
    }

    #[test]
    fn corrupt_file_falls_back_to_defaults() {
        let (dir, store) = temp_store();
        fs::create_dir_all(&dir).unwrap();
        fs::write(store.path(), "{ not json").unwrap();

        assert!(matches!(store.try_load(), Err(SettingsError::Json(_))));
        assert_eq!(store.load(), StyleSettings::default());
        fs::remove_dir_all(dir).unwrap();
    }

    #[test]
    fn out_of_range_values_are_clamped_on_load() {
        let (dir, store) = temp_store();
        fs::create_dir_all(&dir).unwrap();
        fs::write(store.path(), r#"{ "textFontSize": 2.0, "undoLimit": 0 }"#).unwrap();

        let loaded = store.load();
        assert_eq!(loaded.text_font_size, scene::style::MIN_FONT_SIZE);
        assert_eq!(loaded.undo_limit, 1);
        assert_eq!(loaded.paint_color, StyleSettings::default().paint_color);
        fs::remove_dir_all(dir).unwrap();
    }
}
