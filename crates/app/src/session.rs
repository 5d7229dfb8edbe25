//! Capture session coordinator
//!
//! Drives one capture from selection to export:
//! selection → hide chrome, wait a frame → capture → annotate →
//! hide handles, wait a frame → composite → clipboard.
//! Waiting for a frame is a yield: the session asks the chrome for a
//! frame and resumes when `SessionEvent::FramePresented` arrives. Input
//! that arrives during the composite wait is held and replayed afterwards;
//! before capture there is no capture window for it to reach.

use capture::{capture_region, capture_window_at, CaptureResult, PixelBuffer, Rect, ScreenSource};
use crossbeam_channel::Receiver;
use export::{Compositor, ExportResult, ImageClipboard};
use overlay::SelectionOutcome;
use scene::{
    BaseImage, Controller, Effect, KeyEvent, MemorySettings, PointerEvent, Scene,
    SelectionSnapshot, SettingsStore, PASTE_POSITION,
};
use std::collections::VecDeque;

/// Session state
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SessionState {
    /// Selection overlay is up
    Selecting,
    /// Selection chrome hidden, waiting for a frame before sampling
    AwaitingCapture,
    /// Capture window open, controller receives input
    Annotating,
    /// Handles hidden, waiting for a frame before compositing
    AwaitingComposite,
    Closed,
}

impl SessionState {
    pub fn accepts_input(&self) -> bool {
        matches!(self, SessionState::Annotating)
    }

    pub fn is_waiting_for_frame(&self) -> bool {
        matches!(self, SessionState::AwaitingCapture | SessionState::AwaitingComposite)
    }
}

/// Events delivered to the session by the window layer
#[derive(Debug, Clone, PartialEq)]
pub enum SessionEvent {
    Selection(SelectionOutcome),
    /// The frame requested through `Chrome::request_frame` is on screen
    FramePresented,
    PointerDown(PointerEvent),
    PointerMove(PointerEvent),
    PointerUp(PointerEvent),
    KeyDown(KeyEvent),
    KeyUp(KeyEvent),
    /// Composite and copy to the clipboard
    Export,
    Close,
}

impl SessionEvent {
    /// Pointer, key and export requests aimed at the capture window
    pub fn is_input(&self) -> bool {
        matches!(
            self,
            SessionEvent::PointerDown(_)
                | SessionEvent::PointerMove(_)
                | SessionEvent::PointerUp(_)
                | SessionEvent::KeyDown(_)
                | SessionEvent::KeyUp(_)
                | SessionEvent::Export
        )
    }
}

/// Window layer as seen by the session
pub trait Chrome {
    /// Hide selection UI or handles and deliver `FramePresented` once the
    /// next frame is on screen
    fn request_frame(&mut self);

    /// Open the capture window for a new scene
    fn open_scene(&mut self, scene: &Scene);

    fn redraw(&mut self);

    /// Show handles again after an export
    fn restore_chrome(&mut self);

    /// Offset from where the window drag began
    fn move_window(&mut self, dx: f64, dy: f64);

    /// User-visible error notice
    fn show_error(&mut self, message: &str);

    fn close(&mut self);
}

#[derive(Debug, Clone, Copy)]
enum CaptureTarget {
    Region(Rect),
    WindowAt { x: i32, y: i32 },
}

/// One capture, from selection to close
pub struct CaptureSession<S, C, U> {
    state: SessionState,
    screen: S,
    clipboard: C,
    chrome: U,
    compositor: Compositor,
    settings: Option<Box<dyn SettingsStore>>,
    target: Option<CaptureTarget>,
    controller: Option<Controller>,
    saved_selection: Option<SelectionSnapshot>,
    // Input that arrived while waiting for the composite frame
    held_input: VecDeque<SessionEvent>,
    last_export: Option<PixelBuffer>,
}

impl<S, C, U> CaptureSession<S, C, U>
where
    S: ScreenSource,
    C: ImageClipboard,
    U: Chrome,
{
    pub fn new(
        screen: S,
        clipboard: C,
        chrome: U,
        compositor: Compositor,
        settings: Box<dyn SettingsStore>,
    ) -> Self {
        Self {
            state: SessionState::Selecting,
            screen,
            clipboard,
            chrome,
            compositor,
            settings: Some(settings),
            target: None,
            controller: None,
            saved_selection: None,
            held_input: VecDeque::new(),
            last_export: None,
        }
    }

    pub fn state(&self) -> SessionState {
        self.state
    }

    pub fn controller(&self) -> Option<&Controller> {
        self.controller.as_ref()
    }

    /// For context-menu operations issued by the window layer
    pub fn controller_mut(&mut self) -> Option<&mut Controller> {
        self.controller.as_mut()
    }

    pub fn chrome(&self) -> &U {
        &self.chrome
    }

    pub fn clipboard(&self) -> &C {
        &self.clipboard
    }

    /// Most recent successful composite
    pub fn last_export(&self) -> Option<&PixelBuffer> {
        self.last_export.as_ref()
    }

    /// Process events until the session closes or the channel disconnects
    pub fn run(&mut self, events: &Receiver<SessionEvent>) -> SessionState {
        while self.state != SessionState::Closed {
            match events.recv() {
                Ok(event) => {
                    self.handle(event);
                }
                Err(_) => {
                    log::debug!("[SESSION] Event channel closed");
                    self.close();
                }
            }
        }
        self.state
    }

    /// Process whatever is queued without blocking
    pub fn drain(&mut self, events: &Receiver<SessionEvent>) -> SessionState {
        while self.state != SessionState::Closed {
            match events.try_recv() {
                Ok(event) => {
                    self.handle(event);
                }
                Err(_) => break,
            }
        }
        self.state
    }

    pub fn handle(&mut self, event: SessionEvent) -> SessionState {
        match (self.state, event) {
            (SessionState::Closed, _) => {}
            (_, SessionEvent::Close) => self.close(),

            (SessionState::Selecting, SessionEvent::Selection(outcome)) => self.select(outcome),

            (SessionState::AwaitingCapture, SessionEvent::FramePresented) => self.capture(),

            (SessionState::AwaitingComposite, SessionEvent::FramePresented) => {
                self.finish_export()
            }

            (SessionState::Annotating, SessionEvent::Export) => self.begin_export(),

            (SessionState::AwaitingComposite, event) if event.is_input() => {
                self.held_input.push_back(event);
            }

            (SessionState::Annotating, event) => {
                let effect = match (self.controller.as_mut(), event) {
                    (Some(c), SessionEvent::PointerDown(e)) => c.on_pointer_down(e),
                    (Some(c), SessionEvent::PointerMove(e)) => c.on_pointer_move(e),
                    (Some(c), SessionEvent::PointerUp(e)) => c.on_pointer_up(e),
                    (Some(c), SessionEvent::KeyDown(e)) => c.on_key_down(e),
                    (Some(c), SessionEvent::KeyUp(e)) => c.on_key_up(e),
                    _ => Effect::None,
                };
                self.apply(effect);
            }

            (state, event) => {
                log::debug!("[SESSION] Ignoring {:?} while {:?}", event, state);
            }
        }
        self.state
    }

    fn select(&mut self, outcome: SelectionOutcome) {
        self.target = match outcome {
            SelectionOutcome::Region(rect) => Some(CaptureTarget::Region(rect)),
            SelectionOutcome::WindowAt { x, y } => Some(CaptureTarget::WindowAt { x, y }),
            SelectionOutcome::Cancelled => None,
        };

        if self.target.is_some() {
            self.state = SessionState::AwaitingCapture;
            self.chrome.request_frame();
        } else {
            log::info!("[SESSION] Selection cancelled");
            self.close();
        }
    }

    fn capture(&mut self) {
        let captured: CaptureResult<(Rect, PixelBuffer)> = match self.target.take() {
            Some(CaptureTarget::Region(rect)) => {
                capture_region(&self.screen, rect).map(|pixels| (rect, pixels))
            }
            Some(CaptureTarget::WindowAt { x, y }) => capture_window_at(&self.screen, x, y),
            None => {
                self.close();
                return;
            }
        };

        let (rect, pixels) = match captured {
            Ok(captured) => captured,
            Err(e) => {
                log::warn!("[SESSION] Capture aborted: {}", e);
                self.close();
                return;
            }
        };

        // The raw capture goes to the clipboard before annotation starts
        if let Err(e) = self.clipboard.write_image(&pixels) {
            log::warn!("[SESSION] Could not copy capture to clipboard: {}", e);
        }

        let settings = match self.settings.take() {
            Some(settings) => settings,
            None => Box::new(MemorySettings::default()),
        };
        let scene = Scene::new(BaseImage::new(pixels, (rect.x, rect.y)));
        let controller = Controller::new(scene, settings);
        self.chrome.open_scene(controller.scene());
        self.controller = Some(controller);
        self.state = SessionState::Annotating;
        log::info!("[SESSION] Annotating {}x{} capture", rect.width, rect.height);
    }

    fn apply(&mut self, effect: Effect) {
        match effect {
            Effect::None => {}
            Effect::Redraw => self.chrome.redraw(),
            Effect::MoveWindow { dx, dy } => self.chrome.move_window(dx, dy),
            Effect::CopyRequested => self.begin_export(),
            Effect::PasteRequested => self.paste(),
            Effect::CloseRequested => self.close(),
        }
    }

    fn paste(&mut self) {
        let Some(controller) = self.controller.as_mut() else {
            return;
        };
        match self.clipboard.read_image() {
            Ok(Some(pixels)) => {
                let id = controller.add_image(pixels, PASTE_POSITION);
                log::debug!("[SESSION] Pasted image as {}", id);
                self.chrome.redraw();
            }
            Ok(None) => log::debug!("[SESSION] Clipboard has no image"),
            Err(e) => log::warn!("[SESSION] Paste failed: {}", e),
        }
    }

    fn begin_export(&mut self) {
        let Some(controller) = self.controller.as_mut() else {
            return;
        };
        // A stroke still being drawn is committed so its release is not needed
        controller.commit_gesture();
        self.saved_selection = Some(controller.suspend_selection());
        self.state = SessionState::AwaitingComposite;
        self.chrome.request_frame();
    }

    fn finish_export(&mut self) {
        let result = self.composite_to_clipboard();

        if let (Some(controller), Some(selection)) =
            (self.controller.as_mut(), self.saved_selection.take())
        {
            controller.restore_selection(selection);
        }
        self.chrome.restore_chrome();
        self.state = SessionState::Annotating;

        match result {
            Ok(pixels) => {
                log::info!("[SESSION] Exported {}x{} composite", pixels.width(), pixels.height());
                self.last_export = Some(pixels);
            }
            Err(e) => {
                log::warn!("[SESSION] Export failed: {}", e);
                self.chrome.show_error(&format!("Could not copy the image: {}", e));
            }
        }

        self.replay_held_input();
    }

    fn replay_held_input(&mut self) {
        while self.state == SessionState::Annotating {
            let Some(event) = self.held_input.pop_front() else {
                break;
            };
            self.handle(event);
        }
    }

    fn composite_to_clipboard(&mut self) -> ExportResult<PixelBuffer> {
        let Some(controller) = self.controller.as_ref() else {
            return Err(export::ExportError::EmptyImage);
        };
        let pixels = self.compositor.composite(controller.scene())?;
        self.clipboard.write_image(&pixels)?;
        Ok(pixels)
    }

    fn close(&mut self) {
        if self.state == SessionState::Closed {
            return;
        }
        if let Some(controller) = self.controller.as_mut() {
            controller.close();
        }
        self.chrome.close();
        self.state = SessionState::Closed;
        log::debug!("[SESSION] Closed");
    }
}
