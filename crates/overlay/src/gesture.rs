//! Full-screen selection gesture
//!
//! The selection window reports pointer positions in its own client
//! coordinates. `SelectionGesture` turns them into virtual-screen pixels
//! and decides between a dragged region, a Ctrl+clicked window and a
//! cancel.

use crate::selection::{calc_selection_rect, is_valid_selection, SelectionMode};
use crate::SelectionOutcome;
use capture::Rect;
use scene::{Key, KeyEvent, Point, PointerEvent};

/// Placement of the selection window on the virtual screen
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct VirtualScreen {
    pub left: i32,
    pub top: i32,
    /// Physical pixels per window unit (DPI / 96)
    pub scale: f64,
}

impl Default for VirtualScreen {
    fn default() -> Self {
        Self {
            left: 0,
            top: 0,
            scale: 1.0,
        }
    }
}

impl VirtualScreen {
    pub fn new(left: i32, top: i32, scale: f64) -> Self {
        let scale = if scale.is_finite() && scale > 0.0 { scale } else { 1.0 };
        Self { left, top, scale }
    }

    pub fn from_rect(rect: Rect, scale: f64) -> Self {
        Self::new(rect.x, rect.y, scale)
    }

    /// Window-local point to virtual-screen pixels
    pub fn local_to_screen(&self, p: Point) -> (i32, i32) {
        (
            self.left + (p.x * self.scale).round() as i32,
            self.top + (p.y * self.scale).round() as i32,
        )
    }
}

/// Selection gesture state for one selection window
#[derive(Debug, Clone)]
pub struct SelectionGesture {
    screen: VirtualScreen,
    drag_start: Option<(i32, i32)>,
    is_dragging: bool,
    window_click: bool,
    mode: SelectionMode,
    selection: Option<Rect>,
    result: Option<SelectionOutcome>,
}

impl SelectionGesture {
    pub const DRAG_THRESHOLD: i32 = 4;

    pub fn new(screen: VirtualScreen) -> Self {
        Self {
            screen,
            drag_start: None,
            is_dragging: false,
            window_click: false,
            mode: SelectionMode::Region,
            selection: None,
            result: None,
        }
    }

    pub fn screen(&self) -> VirtualScreen {
        self.screen
    }

    pub fn mode(&self) -> SelectionMode {
        self.mode
    }

    /// Rubber-band rectangle to draw, in virtual-screen pixels
    pub fn selection(&self) -> Option<Rect> {
        self.selection
    }

    pub fn is_dragging(&self) -> bool {
        self.is_dragging
    }

    pub fn outcome(&self) -> Option<SelectionOutcome> {
        self.result
    }

    pub fn is_finished(&self) -> bool {
        self.result.is_some()
    }

    pub fn on_pointer_down(&mut self, event: PointerEvent) {
        if self.is_finished() {
            return;
        }
        self.drag_start = Some(self.screen.local_to_screen(event.position));
        self.is_dragging = false;
        self.window_click = event.modifiers.ctrl;
        self.mode = if self.window_click {
            SelectionMode::Window
        } else {
            SelectionMode::Region
        };
    }

    pub fn on_pointer_move(&mut self, event: PointerEvent) {
        let Some((start_x, start_y)) = self.drag_start else {
            return;
        };
        let (screen_x, screen_y) = self.screen.local_to_screen(event.position);

        if !self.is_dragging {
            let dx = (screen_x - start_x).abs();
            let dy = (screen_y - start_y).abs();
            if dx >= Self::DRAG_THRESHOLD || dy >= Self::DRAG_THRESHOLD {
                self.is_dragging = true;
                self.window_click = false;
                self.mode = SelectionMode::Region;
            }
        }

        if self.is_dragging {
            self.selection = Some(calc_selection_rect(start_x, start_y, screen_x, screen_y));
        }
    }

    /// Finish the gesture. Returns the outcome once one is decided.
    pub fn on_pointer_up(&mut self, event: PointerEvent) -> Option<SelectionOutcome> {
        let Some((start_x, start_y)) = self.drag_start.take() else {
            return self.result;
        };

        if self.is_dragging {
            self.is_dragging = false;
            let (screen_x, screen_y) = self.screen.local_to_screen(event.position);
            let rect = calc_selection_rect(start_x, start_y, screen_x, screen_y);
            self.selection = Some(rect);

            let outcome = if is_valid_selection(&rect) {
                SelectionOutcome::Region(rect)
            } else {
                log::debug!("[OVERLAY] Selection {}x{} too small", rect.width, rect.height);
                SelectionOutcome::Cancelled
            };
            self.result = Some(outcome);
        } else if self.window_click {
            // Ctrl+click = window selection
            self.result = Some(SelectionOutcome::WindowAt {
                x: start_x,
                y: start_y,
            });
        }

        self.result
    }

    pub fn on_key_down(&mut self, event: KeyEvent) -> Option<SelectionOutcome> {
        if event.key == Key::Escape && !self.is_finished() {
            self.drag_start = None;
            self.is_dragging = false;
            self.selection = None;
            self.result = Some(SelectionOutcome::Cancelled);
        }
        self.result
    }

    /// Window closed by the system
    pub fn close(&mut self) -> SelectionOutcome {
        *self.result.get_or_insert(SelectionOutcome::Cancelled)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use scene::Modifiers;

    fn gesture() -> SelectionGesture {
        SelectionGesture::new(VirtualScreen::new(-1920, 0, 1.0))
    }

    #[test]
    fn drag_produces_region_in_screen_coordinates() {
        let mut g = gesture();
        g.on_pointer_down(PointerEvent::at(100.0, 100.0));
        g.on_pointer_move(PointerEvent::at(300.0, 250.0));
        assert!(g.is_dragging());
        let outcome = g.on_pointer_up(PointerEvent::at(300.0, 250.0));
        assert_eq!(outcome, Some(SelectionOutcome::Region(Rect::new(-1820, 100, 200, 150))));
    }

    #[test]
    fn movement_below_threshold_is_not_a_drag() {
        let mut g = gesture();
        g.on_pointer_down(PointerEvent::at(100.0, 100.0));
        g.on_pointer_move(PointerEvent::at(103.0, 97.0));
        assert!(!g.is_dragging());
        assert_eq!(g.on_pointer_up(PointerEvent::at(103.0, 97.0)), None);
        assert!(!g.is_finished());
    }

    #[test]
    fn ctrl_click_selects_window_under_cursor() {
        let mut g = gesture();
        let ctrl = Modifiers::CTRL;
        g.on_pointer_down(PointerEvent::at(50.0, 60.0).with_modifiers(ctrl));
        assert_eq!(g.mode(), SelectionMode::Window);
        let outcome = g.on_pointer_up(PointerEvent::at(50.0, 60.0).with_modifiers(ctrl));
        assert_eq!(outcome, Some(SelectionOutcome::WindowAt { x: -1870, y: 60 }));
    }

    #[test]
    fn ctrl_drag_is_still_a_region() {
        let mut g = gesture();
        let ctrl = Modifiers::CTRL;
        g.on_pointer_down(PointerEvent::at(0.0, 0.0).with_modifiers(ctrl));
        g.on_pointer_move(PointerEvent::at(40.0, 40.0).with_modifiers(ctrl));
        let outcome = g.on_pointer_up(PointerEvent::at(40.0, 40.0));
        assert!(matches!(outcome, Some(SelectionOutcome::Region(_))));
    }

    #[test]
    fn thin_region_cancels() {
        let mut g = gesture();
        g.on_pointer_down(PointerEvent::at(10.0, 10.0));
        g.on_pointer_move(PointerEvent::at(11.0, 200.0));
        let outcome = g.on_pointer_up(PointerEvent::at(11.0, 200.0));
        assert_eq!(outcome, Some(SelectionOutcome::Cancelled));
    }

    #[test]
    fn escape_cancels_mid_drag() {
        let mut g = gesture();
        g.on_pointer_down(PointerEvent::at(10.0, 10.0));
        g.on_pointer_move(PointerEvent::at(100.0, 100.0));
        assert_eq!(
            g.on_key_down(KeyEvent::plain(Key::Escape)),
            Some(SelectionOutcome::Cancelled)
        );
        assert_eq!(g.selection(), None);
        assert_eq!(g.on_pointer_up(PointerEvent::at(100.0, 100.0)), Some(SelectionOutcome::Cancelled));
    }

    #[test]
    fn dpi_scale_converts_to_physical_pixels() {
        let screen = VirtualScreen::new(100, 50, 1.5);
        assert_eq!(screen.local_to_screen(Point::new(10.0, 20.0)), (115, 80));
        assert_eq!(VirtualScreen::new(0, 0, 0.0).scale, 1.0);
    }
}
