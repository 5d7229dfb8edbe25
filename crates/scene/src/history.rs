//! Bounded undo/redo history of stroke and arrow gestures

use crate::scene::{DetachedOverlay, OverlayId, Scene};
use crate::style::DEFAULT_UNDO_LIMIT;
use std::collections::VecDeque;

/// Overlays added by one completed gesture.
///
/// While the action sits on the redo stack its overlays are parked here,
/// detached from the scene.
#[derive(Debug, Clone)]
pub struct EditAction {
    members: Vec<OverlayId>,
    parked: Vec<DetachedOverlay>,
}

impl EditAction {
    pub fn new(members: Vec<OverlayId>) -> Self {
        Self {
            members,
            parked: Vec::new(),
        }
    }

    pub fn members(&self) -> &[OverlayId] {
        &self.members
    }

    pub fn is_empty(&self) -> bool {
        self.members.is_empty()
    }

    fn detach_from(&mut self, scene: &mut Scene) {
        for id in &self.members {
            if let Some(detached) = scene.remove_overlay(*id) {
                self.parked.push(detached);
            }
        }
    }

    fn reattach_to(&mut self, scene: &mut Scene) {
        for detached in self.parked.drain(..) {
            scene.restore_overlay(detached);
        }
    }

    fn discard_from(&self, scene: &mut Scene) {
        for id in &self.members {
            scene.remove_overlay(*id);
        }
    }
}

/// Two bounded stacks of edit actions.
///
/// Only stroke/arrow additions are recorded. Moving, resizing, rotating or
/// restyling text and images is not undoable.
#[derive(Debug, Clone)]
pub struct UndoRedoLog {
    // Front is the oldest action
    undo_stack: VecDeque<EditAction>,
    redo_stack: Vec<EditAction>,
    limit: usize,
}

impl Default for UndoRedoLog {
    fn default() -> Self {
        Self::new(DEFAULT_UNDO_LIMIT)
    }
}

impl UndoRedoLog {
    pub fn new(limit: usize) -> Self {
        Self {
            undo_stack: VecDeque::new(),
            redo_stack: Vec::new(),
            limit: limit.max(1),
        }
    }

    pub fn limit(&self) -> usize {
        self.limit
    }

    pub fn undo_depth(&self) -> usize {
        self.undo_stack.len()
    }

    pub fn redo_depth(&self) -> usize {
        self.redo_stack.len()
    }

    pub fn can_undo(&self) -> bool {
        !self.undo_stack.is_empty()
    }

    pub fn can_redo(&self) -> bool {
        !self.redo_stack.is_empty()
    }

    /// Undoable actions, oldest first
    pub fn undo_actions(&self) -> impl Iterator<Item = &EditAction> {
        self.undo_stack.iter()
    }

    /// Push a completed gesture. Overflow evicts the oldest action and
    /// removes its overlays from the scene for good; redo is cleared.
    pub fn record(&mut self, action: EditAction, scene: &mut Scene) {
        if action.is_empty() {
            return;
        }
        self.undo_stack.push_back(action);
        self.evict_over_limit(scene);
        if !self.redo_stack.is_empty() {
            log::debug!("[HISTORY] New edit cleared {} redo entries", self.redo_stack.len());
            self.redo_stack.clear();
        }
    }

    pub fn undo(&mut self, scene: &mut Scene) -> bool {
        let Some(mut action) = self.undo_stack.pop_back() else {
            return false;
        };
        action.detach_from(scene);
        self.redo_stack.push(action);
        true
    }

    /// Re-adds the overlays on top of the current z-order, not at their
    /// original depth.
    pub fn redo(&mut self, scene: &mut Scene) -> bool {
        let Some(mut action) = self.redo_stack.pop() else {
            return false;
        };
        action.reattach_to(scene);
        self.undo_stack.push_back(action);
        true
    }

    /// Change the bound, evicting the oldest actions irrevocably
    pub fn set_limit(&mut self, limit: usize, scene: &mut Scene) {
        self.limit = limit.max(1);
        self.evict_over_limit(scene);
    }

    /// Drop an overlay deleted outside the history from every action
    pub fn forget(&mut self, id: OverlayId) {
        for action in self.undo_stack.iter_mut().chain(self.redo_stack.iter_mut()) {
            action.members.retain(|m| *m != id);
            action.parked.retain(|p| p.id != id);
        }
        self.undo_stack.retain(|a| !a.is_empty());
        self.redo_stack.retain(|a| !a.is_empty());
    }

    fn evict_over_limit(&mut self, scene: &mut Scene) {
        while self.undo_stack.len() > self.limit {
            if let Some(oldest) = self.undo_stack.pop_front() {
                log::debug!(
                    "[HISTORY] Evicted oldest action with {} overlays",
                    oldest.members.len()
                );
                oldest.discard_from(scene);
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::geometry::Point;
    use crate::object::{Overlay, Segment, StrokeMode, StrokeOverlay};
    use crate::scene::BaseImage;
    use crate::style::Color;
    use capture::PixelBuffer;

    fn scene() -> Scene {
        Scene::new(BaseImage::new(PixelBuffer::filled(64, 64, [0, 0, 0, 255]), (0, 0)))
    }

    fn stroke(scene: &mut Scene, log: &mut UndoRedoLog) -> OverlayId {
        let mut stroke = StrokeOverlay::new(StrokeMode::Freehand, Color::RED, 3.0);
        stroke.push_segment(Segment::new(Point::new(0.0, 0.0), Point::new(5.0, 5.0)));
        let id = scene.add_overlay(Overlay::Stroke(stroke));
        log.record(EditAction::new(vec![id]), scene);
        id
    }

    #[test]
    fn empty_stacks_are_no_ops() {
        let mut scene = scene();
        let mut log = UndoRedoLog::new(5);
        assert!(!log.undo(&mut scene));
        assert!(!log.redo(&mut scene));
    }

    #[test]
    fn overflow_evicts_oldest_from_scene() {
        let mut scene = scene();
        let mut log = UndoRedoLog::new(3);
        let ids: Vec<_> = (0..5).map(|_| stroke(&mut scene, &mut log)).collect();
        assert_eq!(log.undo_depth(), 3);
        assert!(!scene.contains(ids[0]));
        assert!(!scene.contains(ids[1]));
        assert_eq!(scene.ids_in_z_order(), ids[2..].to_vec());
    }

    #[test]
    fn record_clears_redo() {
        let mut scene = scene();
        let mut log = UndoRedoLog::new(10);
        let first = stroke(&mut scene, &mut log);
        log.undo(&mut scene);
        assert!(log.can_redo());
        stroke(&mut scene, &mut log);
        assert!(!log.can_redo());
        assert!(!log.redo(&mut scene));
        assert!(!scene.contains(first));
    }

    #[test]
    fn redo_appends_on_top() {
        let mut scene = scene();
        let mut log = UndoRedoLog::new(10);
        let a = stroke(&mut scene, &mut log);
        let b = stroke(&mut scene, &mut log);
        log.undo(&mut scene);
        log.undo(&mut scene);
        let c = scene.add_overlay(Overlay::Stroke(StrokeOverlay::new(
            StrokeMode::Freehand,
            Color::RED,
            1.0,
        )));
        log.redo(&mut scene);
        assert_eq!(scene.ids_in_z_order(), vec![c, a]);
        log.redo(&mut scene);
        assert_eq!(scene.ids_in_z_order(), vec![c, a, b]);
    }

    #[test]
    fn shrinking_limit_evicts_oldest() {
        let mut scene = scene();
        let mut log = UndoRedoLog::new(10);
        let ids: Vec<_> = (0..4).map(|_| stroke(&mut scene, &mut log)).collect();
        log.set_limit(1, &mut scene);
        assert_eq!(log.undo_depth(), 1);
        assert_eq!(scene.ids_in_z_order(), vec![ids[3]]);
    }

    #[test]
    fn forget_drops_emptied_actions() {
        let mut scene = scene();
        let mut log = UndoRedoLog::new(10);
        let a = stroke(&mut scene, &mut log);
        stroke(&mut scene, &mut log);
        scene.remove_overlay(a);
        log.forget(a);
        assert_eq!(log.undo_depth(), 1);
    }
}
