//! Windowless chrome used by the command-line driver

use crate::session::{Chrome, SessionEvent};
use crossbeam_channel::Sender;
use parking_lot::Mutex;
use scene::Scene;
use std::sync::Arc;

/// Presents frames immediately and collects error notices.
///
/// With no window to hide, a requested frame is "presented" by posting
/// `FramePresented` straight back onto the session's event queue.
pub struct HeadlessChrome {
    events: Sender<SessionEvent>,
    notices: Arc<Mutex<Vec<String>>>,
}

impl HeadlessChrome {
    pub fn new(events: Sender<SessionEvent>) -> Self {
        Self {
            events,
            notices: Arc::new(Mutex::new(Vec::new())),
        }
    }

    /// Shared view of the error notices shown so far
    pub fn notices(&self) -> Arc<Mutex<Vec<String>>> {
        self.notices.clone()
    }
}

impl Chrome for HeadlessChrome {
    fn request_frame(&mut self) {
        if self.events.send(SessionEvent::FramePresented).is_err() {
            log::warn!("[SESSION] Event queue closed before frame was presented");
        }
    }

    fn open_scene(&mut self, scene: &Scene) {
        let size = scene.size();
        log::debug!("[SESSION] Scene opened ({}x{})", size.width, size.height);
    }

    fn redraw(&mut self) {}

    fn restore_chrome(&mut self) {}

    fn move_window(&mut self, dx: f64, dy: f64) {
        log::debug!("[SESSION] Window moved by ({}, {})", dx, dy);
    }

    fn show_error(&mut self, message: &str) {
        log::error!("[SESSION] {}", message);
        self.notices.lock().push(message.to_string());
    }

    fn close(&mut self) {}
}
