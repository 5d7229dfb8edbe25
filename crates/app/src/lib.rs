//! ScreenCapture application layer
//!
//! Wires the selection outcome, screen capture, annotation controller and
//! export into one capture session.

pub mod chrome;
pub mod session;
pub mod settings;

pub use chrome::HeadlessChrome;
pub use session::{CaptureSession, Chrome, SessionEvent, SessionState};
pub use settings::{JsonSettingsStore, SettingsError, SettingsResult};
