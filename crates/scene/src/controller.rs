//! Pointer/keyboard state machine that edits a scene
//!
//! The controller owns the scene and its undo log and is the only place
//! that records history. The window layer feeds it events and acts on
//! the returned [`Effect`].

use crate::geometry::{arrow_head, AxisLock, Bounds, Point};
use crate::history::{EditAction, UndoRedoLog};
use crate::input::{Key, KeyEvent, PointerEvent};
use crate::object::{
    resize_bounds, rotated_angle, BorderTier, Capability, Corner, Handle, ImageOverlay, Overlay,
    Segment, StrokeMode, StrokeOverlay, TextOverlay, TextStyle,
};
use crate::scene::{OverlayId, Scene};
use crate::style::{paint_thickness_choice, Color, SettingsStore, StyleSettings};
use capture::PixelBuffer;

/// Font size step of the grow/shrink commands
pub const FONT_SIZE_STEP: f64 = 2.0;

/// Where pasted images land
pub const PASTE_POSITION: Point = Point::new(50.0, 50.0);

/// Observable controller state
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ControllerState {
    Idle,
    Selecting,
    EditingText,
    Dragging,
    Resizing,
    Rotating,
    PaintingStroke,
    DrawingArrow,
}

/// What the window layer has to do after an event
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum Effect {
    None,
    Redraw,
    /// Move the capture window by this offset from where the drag began
    MoveWindow { dx: f64, dy: f64 },
    CopyRequested,
    PasteRequested,
    CloseRequested,
}

/// Modal color chooser; `None` when cancelled
pub trait ColorPicker {
    fn pick(&mut self, initial: Color) -> Option<Color>;
}

/// Selection saved while chrome is hidden for export
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct SelectionSnapshot(Option<OverlayId>);

#[derive(Debug, Clone, Copy)]
enum Gesture {
    None,
    WindowDrag {
        start: Point,
    },
    /// Pressed on a movable body but not moved yet
    PendingDrag {
        id: OverlayId,
        start: Point,
        origin: Point,
    },
    Drag {
        id: OverlayId,
        start: Point,
        origin: Point,
        lock: AxisLock,
    },
    Resize {
        id: OverlayId,
        corner: Corner,
        start: Point,
        initial: Bounds,
    },
    Rotate {
        id: OverlayId,
        center: Point,
        start: Point,
        initial_angle: f64,
    },
    Stroke {
        id: Option<OverlayId>,
        start: Point,
        last: Point,
        color: Color,
        thickness: f64,
        lock: AxisLock,
    },
    Arrow {
        id: Option<OverlayId>,
        start: Point,
        color: Color,
        thickness: f64,
    },
}

/// Manipulation controller for one capture scene
pub struct Controller {
    scene: Scene,
    history: UndoRedoLog,
    settings: Box<dyn SettingsStore>,
    style: StyleSettings,
    gesture: Gesture,
    editing: Option<OverlayId>,
    last_text_style: Option<TextStyle>,
    paint_mode: bool,
    arrow_mode: bool,
    // Modifier pressed with no other key yet; toggles a mode on release
    modifier_tap: Option<Key>,
    closed: bool,
}

impl Controller {
    pub fn new(scene: Scene, settings: Box<dyn SettingsStore>) -> Self {
        let style = settings.load().sanitized();
        Self {
            scene,
            history: UndoRedoLog::new(style.undo_limit),
            settings,
            style,
            gesture: Gesture::None,
            editing: None,
            last_text_style: None,
            paint_mode: false,
            arrow_mode: false,
            modifier_tap: None,
            closed: false,
        }
    }

    pub fn scene(&self) -> &Scene {
        &self.scene
    }

    pub fn history(&self) -> &UndoRedoLog {
        &self.history
    }

    pub fn style(&self) -> &StyleSettings {
        &self.style
    }

    pub fn paint_mode(&self) -> bool {
        self.paint_mode
    }

    pub fn arrow_mode(&self) -> bool {
        self.arrow_mode
    }

    pub fn editing(&self) -> Option<OverlayId> {
        self.editing
    }

    pub fn is_closed(&self) -> bool {
        self.closed
    }

    pub fn state(&self) -> ControllerState {
        match self.gesture {
            Gesture::Stroke { .. } => ControllerState::PaintingStroke,
            Gesture::Arrow { .. } => ControllerState::DrawingArrow,
            Gesture::Drag { .. } => ControllerState::Dragging,
            Gesture::Resize { .. } => ControllerState::Resizing,
            Gesture::Rotate { .. } => ControllerState::Rotating,
            Gesture::None | Gesture::WindowDrag { .. } | Gesture::PendingDrag { .. } => {
                if self.editing.is_some() {
                    ControllerState::EditingText
                } else if self.scene.selected().is_some() {
                    ControllerState::Selecting
                } else {
                    ControllerState::Idle
                }
            }
        }
    }

    // ----- pointer -----

    pub fn on_pointer_down(&mut self, event: PointerEvent) -> Effect {
        if self.closed || !matches!(self.gesture, Gesture::None) {
            return Effect::None;
        }
        let p = event.position;

        if self.paint_mode {
            self.end_text_edit();
            self.scene.deselect_all();
            self.gesture = if self.arrow_mode {
                Gesture::Arrow {
                    id: None,
                    start: p,
                    color: self.style.paint_color,
                    thickness: self.style.paint_thickness,
                }
            } else {
                Gesture::Stroke {
                    id: None,
                    start: p,
                    last: p,
                    color: self.style.paint_color,
                    thickness: self.style.paint_thickness,
                    lock: AxisLock::new(),
                }
            };
            return Effect::Redraw;
        }

        if let Some(gesture) = self.handle_gesture_at(p) {
            self.gesture = gesture;
            return Effect::Redraw;
        }

        let Some(id) = self.scene.hit_test(p) else {
            self.end_text_edit();
            self.scene.deselect_all();
            self.gesture = Gesture::WindowDrag { start: p };
            return Effect::Redraw;
        };

        if self.editing == Some(id) {
            // Clicks inside the edited text only move the caret
            return Effect::None;
        }

        self.end_text_edit();
        self.select_overlay(id);

        let Some(overlay) = self.scene.get(id) else {
            return Effect::Redraw;
        };
        if event.click_count >= 2 && overlay.can(Capability::Editable) {
            self.begin_text_edit(id);
        } else if let (true, Some(origin)) = (overlay.can(Capability::Movable), overlay.position()) {
            self.gesture = Gesture::PendingDrag { id, start: p, origin };
        }
        Effect::Redraw
    }

    pub fn on_pointer_move(&mut self, event: PointerEvent) -> Effect {
        let p = event.position;
        let lock_held = event.modifiers.shift;

        match self.gesture {
            Gesture::None => Effect::None,
            Gesture::WindowDrag { start } => Effect::MoveWindow {
                dx: p.x - start.x,
                dy: p.y - start.y,
            },
            Gesture::PendingDrag { id, start, origin } => {
                if p == start {
                    return Effect::None;
                }
                let mut lock = AxisLock::new();
                self.drag_to(id, start, origin, &mut lock, p, lock_held);
                self.gesture = Gesture::Drag { id, start, origin, lock };
                Effect::Redraw
            }
            Gesture::Drag { id, start, origin, mut lock } => {
                self.drag_to(id, start, origin, &mut lock, p, lock_held);
                self.gesture = Gesture::Drag { id, start, origin, lock };
                Effect::Redraw
            }
            Gesture::Resize { id, corner, start, initial } => {
                let bounds = resize_bounds(initial, corner, p - start, lock_held);
                if let Some(Overlay::Image(image)) = self.scene.get_mut(id) {
                    image.set_bounds(bounds);
                }
                Effect::Redraw
            }
            Gesture::Rotate { id, center, start, initial_angle } => {
                if let Some(Overlay::Image(image)) = self.scene.get_mut(id) {
                    image.rotation = rotated_angle(initial_angle, center, start, p);
                }
                Effect::Redraw
            }
            Gesture::Stroke { id, start, last, color, thickness, mut lock } => {
                let mut current = p;
                if lock_held {
                    if lock.update(p - start).is_none() {
                        return Effect::None;
                    }
                    current = lock.constrain(last, p);
                }
                if current == last {
                    return Effect::None;
                }

                let segment = Segment::new(last, current);
                let id = match id {
                    Some(id) => {
                        if let Some(Overlay::Stroke(stroke)) = self.scene.get_mut(id) {
                            stroke.push_segment(segment);
                        }
                        id
                    }
                    None => {
                        let mut stroke = StrokeOverlay::new(StrokeMode::Freehand, color, thickness);
                        stroke.push_segment(segment);
                        self.scene.add_overlay(Overlay::Stroke(stroke))
                    }
                };
                self.gesture = Gesture::Stroke {
                    id: Some(id),
                    start,
                    last: current,
                    color,
                    thickness,
                    lock,
                };
                Effect::Redraw
            }
            Gesture::Arrow { id, start, color, thickness } => {
                if id.is_none() && p == start {
                    return Effect::None;
                }
                let (left, right) = arrow_head(start, p, thickness);
                let segments = vec![
                    Segment::new(start, p),
                    Segment::new(p, left),
                    Segment::new(p, right),
                ];
                let id = match id {
                    Some(id) => {
                        if let Some(Overlay::Stroke(stroke)) = self.scene.get_mut(id) {
                            stroke.replace_segments(segments);
                        }
                        id
                    }
                    None => {
                        let mut arrow = StrokeOverlay::new(StrokeMode::Arrow, color, thickness);
                        arrow.replace_segments(segments);
                        self.scene.add_overlay(Overlay::Stroke(arrow))
                    }
                };
                self.gesture = Gesture::Arrow {
                    id: Some(id),
                    start,
                    color,
                    thickness,
                };
                Effect::Redraw
            }
        }
    }

    pub fn on_pointer_up(&mut self, _event: PointerEvent) -> Effect {
        match std::mem::replace(&mut self.gesture, Gesture::None) {
            Gesture::None | Gesture::WindowDrag { .. } => Effect::None,
            Gesture::Stroke { id, .. } | Gesture::Arrow { id, .. } => match id {
                Some(id) => {
                    self.history.record(EditAction::new(vec![id]), &mut self.scene);
                    Effect::Redraw
                }
                None => Effect::None,
            },
            Gesture::PendingDrag { .. }
            | Gesture::Drag { .. }
            | Gesture::Resize { .. }
            | Gesture::Rotate { .. } => Effect::Redraw,
        }
    }

    fn handle_gesture_at(&self, p: Point) -> Option<Gesture> {
        let id = self.scene.selected()?;
        let overlay = self.scene.get(id)?;
        let image = overlay.as_image()?;
        match image.handle_at(p)? {
            Handle::Resize(corner) if overlay.can(Capability::Resizable) => Some(Gesture::Resize {
                id,
                corner,
                start: p,
                initial: image.bounds(),
            }),
            Handle::Rotate if overlay.can(Capability::Rotatable) => Some(Gesture::Rotate {
                id,
                center: image.center(),
                start: p,
                initial_angle: image.rotation,
            }),
            _ => None,
        }
    }

    fn drag_to(
        &mut self,
        id: OverlayId,
        start: Point,
        origin: Point,
        lock: &mut AxisLock,
        p: Point,
        lock_held: bool,
    ) {
        let mut delta = p - start;
        if lock_held && lock.update(delta).is_some() {
            delta = lock.constrain(Point::default(), delta);
        }
        if let Some(overlay) = self.scene.get_mut(id) {
            overlay.set_position(origin + delta);
        }
    }

    // ----- keyboard -----

    pub fn on_key_down(&mut self, event: KeyEvent) -> Effect {
        if self.closed {
            return Effect::None;
        }
        match event.key {
            Key::Control | Key::Alt => {
                if !event.repeat {
                    self.modifier_tap = Some(event.key);
                }
                return Effect::None;
            }
            Key::Shift => return Effect::None,
            _ => self.modifier_tap = None,
        }

        if event.key == Key::Escape {
            return self.close();
        }

        if self.editing.is_some() && !event.modifiers.ctrl {
            return self.edit_text_key(event.key);
        }

        if event.is_ctrl_char('z') {
            return if self.undo() { Effect::Redraw } else { Effect::None };
        }
        if event.is_ctrl_char('y') {
            return if self.redo() { Effect::Redraw } else { Effect::None };
        }
        if event.is_ctrl_char('v') {
            return Effect::PasteRequested;
        }
        if event.is_ctrl_char('c') {
            return Effect::CopyRequested;
        }
        if event.key == Key::Delete && self.delete_selected() {
            return Effect::Redraw;
        }
        Effect::None
    }

    pub fn on_key_up(&mut self, event: KeyEvent) -> Effect {
        let tap = self.modifier_tap.take();
        if self.closed {
            return Effect::None;
        }
        match event.key {
            Key::Control if tap == Some(Key::Control) => {
                self.toggle_paint_mode();
                Effect::Redraw
            }
            Key::Alt if tap == Some(Key::Alt) => {
                self.toggle_arrow_mode();
                Effect::Redraw
            }
            _ => Effect::None,
        }
    }

    fn edit_text_key(&mut self, key: Key) -> Effect {
        let Some(Overlay::Text(text)) = self.editing.and_then(|id| self.scene.get_mut(id)) else {
            return Effect::None;
        };
        match key {
            Key::Char(c) => text.content.push(c),
            Key::Enter => text.content.push('\n'),
            Key::Backspace => {
                text.content.pop();
            }
            _ => return Effect::None,
        }
        Effect::Redraw
    }

    // ----- modes and lifecycle -----

    pub fn toggle_paint_mode(&mut self) {
        self.finish_paint_gesture();
        self.paint_mode = !self.paint_mode;
        if self.paint_mode {
            self.end_text_edit();
        }
        log::debug!("[CONTROLLER] Paint mode {}", self.paint_mode);
    }

    pub fn toggle_arrow_mode(&mut self) {
        self.finish_paint_gesture();
        self.arrow_mode = !self.arrow_mode;
    }

    /// Commit a half-drawn freehand stroke and drop an arrow preview
    fn finish_paint_gesture(&mut self) {
        match self.gesture {
            Gesture::Stroke { .. } => self.commit_gesture(),
            Gesture::Arrow { .. } => self.cancel_gesture(),
            _ => {}
        }
    }

    /// End the gesture in progress, keeping what it drew or moved.
    ///
    /// A stroke or arrow is recorded in history as if the button had been
    /// released.
    pub fn commit_gesture(&mut self) {
        match std::mem::replace(&mut self.gesture, Gesture::None) {
            Gesture::Stroke { id: Some(id), .. } | Gesture::Arrow { id: Some(id), .. } => {
                self.history.record(EditAction::new(vec![id]), &mut self.scene);
            }
            _ => {}
        }
    }

    /// Abandon the gesture in progress, restoring what it changed
    pub fn cancel_gesture(&mut self) {
        match std::mem::replace(&mut self.gesture, Gesture::None) {
            Gesture::Stroke { id: Some(id), .. } | Gesture::Arrow { id: Some(id), .. } => {
                self.scene.remove_overlay(id);
            }
            Gesture::Drag { id, origin, .. } => {
                if let Some(overlay) = self.scene.get_mut(id) {
                    overlay.set_position(origin);
                }
            }
            Gesture::Resize { id, initial, .. } => {
                if let Some(Overlay::Image(image)) = self.scene.get_mut(id) {
                    image.set_bounds(initial);
                }
            }
            Gesture::Rotate { id, initial_angle, .. } => {
                if let Some(Overlay::Image(image)) = self.scene.get_mut(id) {
                    image.rotation = initial_angle;
                }
            }
            _ => {}
        }
    }

    /// Escape or window close: drop uncommitted work and ask to close
    pub fn close(&mut self) -> Effect {
        self.cancel_gesture();
        self.end_text_edit();
        self.closed = true;
        Effect::CloseRequested
    }

    // ----- selection and text editing -----

    fn select_overlay(&mut self, id: OverlayId) {
        self.scene.deselect_all();
        if !self.scene.select(id) {
            return;
        }
        self.scene.bring_to_front(id);
        if let Some(Overlay::Text(text)) = self.scene.get(id) {
            self.last_text_style = Some(text.style());
        }
    }

    pub fn begin_text_edit(&mut self, id: OverlayId) -> bool {
        if !self.scene.get(id).is_some_and(|o| o.can(Capability::Editable)) {
            return false;
        }
        if self.editing != Some(id) {
            self.end_text_edit();
        }
        self.select_overlay(id);
        if let Some(Overlay::Text(text)) = self.scene.get_mut(id) {
            text.set_editing(true);
        }
        self.editing = Some(id);
        true
    }

    /// Focus left the text box; the text stays selected
    pub fn end_text_edit(&mut self) {
        if let Some(id) = self.editing.take() {
            if let Some(Overlay::Text(text)) = self.scene.get_mut(id) {
                text.set_editing(false);
            }
        }
    }

    /// Insert committed text (typing or IME) into the edited overlay
    pub fn insert_text(&mut self, s: &str) -> bool {
        match self.editing.and_then(|id| self.scene.get_mut(id)) {
            Some(Overlay::Text(text)) => {
                text.content.push_str(s);
                true
            }
            _ => false,
        }
    }

    pub fn suspend_selection(&mut self) -> SelectionSnapshot {
        let snapshot = SelectionSnapshot(self.scene.selected());
        self.scene.deselect_all();
        snapshot
    }

    pub fn restore_selection(&mut self, snapshot: SelectionSnapshot) {
        if let Some(id) = snapshot.0 {
            self.scene.select(id);
        }
    }

    // ----- creation and deletion -----

    /// Add an empty text box and start editing it
    pub fn add_text_at(&mut self, position: Point) -> OverlayId {
        self.end_text_edit();
        self.scene.deselect_all();
        let style = self.last_text_style.unwrap_or(TextStyle {
            font_size: self.style.text_font_size,
            foreground: self.style.text_color,
            background: self.style.text_background,
        });
        let id = self.scene.add_overlay(Overlay::Text(TextOverlay::new(position, style)));
        self.begin_text_edit(id);
        id
    }

    /// Add a pasted image, selected
    pub fn add_image(&mut self, pixels: PixelBuffer, position: Point) -> OverlayId {
        self.end_text_edit();
        self.scene.deselect_all();
        let image = ImageOverlay::new(pixels, position, self.style.image_border_color);
        let id = self.scene.add_overlay(Overlay::Image(image));
        self.scene.select(id);
        id
    }

    pub fn delete_selected(&mut self) -> bool {
        let Some(id) = self.scene.selected() else {
            return false;
        };
        if !self.scene.get(id).is_some_and(|o| o.can(Capability::Deletable)) {
            return false;
        }
        if self.editing == Some(id) {
            self.editing = None;
        }
        self.scene.remove_overlay(id);
        self.history.forget(id);
        true
    }

    // ----- history -----

    /// No-op while a stroke or arrow is being drawn
    pub fn undo(&mut self) -> bool {
        if self.is_painting() {
            return false;
        }
        self.history.undo(&mut self.scene)
    }

    pub fn redo(&mut self) -> bool {
        if self.is_painting() {
            return false;
        }
        self.history.redo(&mut self.scene)
    }

    pub fn set_undo_limit(&mut self, limit: usize) {
        self.history.set_limit(limit, &mut self.scene);
        self.style.undo_limit = self.history.limit();
        self.persist();
    }

    fn is_painting(&self) -> bool {
        matches!(self.gesture, Gesture::Stroke { .. } | Gesture::Arrow { .. })
    }

    // ----- styling -----

    fn selected_text_mut(&mut self) -> Option<&mut TextOverlay> {
        match self.scene.selected().and_then(|id| self.scene.get_mut(id)) {
            Some(Overlay::Text(text)) => Some(text),
            _ => None,
        }
    }

    fn selected_image_mut(&mut self) -> Option<&mut ImageOverlay> {
        match self.scene.selected().and_then(|id| self.scene.get_mut(id)) {
            Some(Overlay::Image(image)) => Some(image),
            _ => None,
        }
    }

    fn restyle_text(&mut self, f: impl FnOnce(&mut TextOverlay)) -> bool {
        let Some(text) = self.selected_text_mut() else {
            return false;
        };
        f(text);
        let style = text.style();
        self.last_text_style = Some(style);
        self.style.text_font_size = style.font_size;
        self.style.text_color = style.foreground;
        self.style.text_background = style.background;
        self.persist();
        true
    }

    pub fn increase_font_size(&mut self) -> bool {
        self.restyle_text(|t| t.set_font_size(t.font_size() + FONT_SIZE_STEP))
    }

    /// Shrink by one step, never below 8
    pub fn decrease_font_size(&mut self) -> bool {
        self.restyle_text(|t| t.set_font_size(t.font_size() - FONT_SIZE_STEP))
    }

    /// Recolor the selected text and make it the default
    pub fn set_text_color(&mut self, color: Color) -> bool {
        if self.restyle_text(|t| t.set_foreground(color)) {
            return true;
        }
        self.style.text_color = color;
        if let Some(style) = self.last_text_style.as_mut() {
            style.foreground = color;
        }
        self.persist();
        false
    }

    pub fn set_text_background(&mut self, color: Color) -> bool {
        if self.restyle_text(|t| t.set_background(color)) {
            return true;
        }
        self.style.text_background = color;
        if let Some(style) = self.last_text_style.as_mut() {
            style.background = color;
        }
        self.persist();
        false
    }

    pub fn pick_text_color(&mut self, picker: &mut dyn ColorPicker) -> bool {
        let initial = self
            .selected_text_mut()
            .map(|t| t.foreground())
            .unwrap_or(self.style.text_color);
        match picker.pick(initial) {
            Some(color) => {
                self.set_text_color(color);
                true
            }
            None => false,
        }
    }

    pub fn set_paint_color(&mut self, color: Color) {
        self.style.paint_color = color;
        self.persist();
    }

    pub fn pick_paint_color(&mut self, picker: &mut dyn ColorPicker) -> bool {
        match picker.pick(self.style.paint_color) {
            Some(color) => {
                self.set_paint_color(color);
                true
            }
            None => false,
        }
    }

    /// Accepts the toolbar thicknesses; anything else falls back to 3
    pub fn set_paint_thickness(&mut self, thickness: f64) {
        self.style.paint_thickness = paint_thickness_choice(thickness);
        self.persist();
    }

    pub fn toggle_image_border(&mut self) -> bool {
        match self.selected_image_mut() {
            Some(image) => {
                image.border.enabled = !image.border.enabled;
                true
            }
            None => false,
        }
    }

    pub fn set_image_border_tier(&mut self, tier: BorderTier) -> bool {
        match self.selected_image_mut() {
            Some(image) => {
                image.border.tier = tier;
                image.border.enabled = true;
                true
            }
            None => false,
        }
    }

    pub fn set_image_border_color(&mut self, color: Color) -> bool {
        let applied = match self.selected_image_mut() {
            Some(image) => {
                image.border.color = color;
                true
            }
            None => false,
        };
        self.style.image_border_color = color;
        self.persist();
        applied
    }

    pub fn pick_image_border_color(&mut self, picker: &mut dyn ColorPicker) -> bool {
        let initial = self
            .selected_image_mut()
            .map(|i| i.border.color)
            .unwrap_or(self.style.image_border_color);
        match picker.pick(initial) {
            Some(color) => {
                self.set_image_border_color(color);
                true
            }
            None => false,
        }
    }

    fn persist(&self) {
        self.settings.save(&self.style);
    }
}
