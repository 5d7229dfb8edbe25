//! The capture scene: base image plus z-ordered overlays

use crate::geometry::{Point, Size};
use crate::object::Overlay;
use capture::PixelBuffer;
use std::fmt;
use std::sync::Arc;

/// Stable overlay identifier, never reused within a scene
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct OverlayId(u64);

impl fmt::Display for OverlayId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "#{}", self.0)
    }
}

/// Layer 0: the captured pixels and where they came from on screen
#[derive(Debug, Clone)]
pub struct BaseImage {
    pixels: Arc<PixelBuffer>,
    origin: (i32, i32),
}

impl BaseImage {
    pub fn new(pixels: PixelBuffer, origin: (i32, i32)) -> Self {
        Self {
            pixels: Arc::new(pixels),
            origin,
        }
    }

    pub fn pixels(&self) -> &PixelBuffer {
        &self.pixels
    }

    /// Virtual-screen position of the capture
    pub fn origin(&self) -> (i32, i32) {
        self.origin
    }

    pub fn size(&self) -> Size {
        Size::new(self.pixels.width() as f64, self.pixels.height() as f64)
    }
}

/// Overlay detached from a scene, carrying its id for re-insertion
#[derive(Debug, Clone)]
pub struct DetachedOverlay {
    pub id: OverlayId,
    pub overlay: Overlay,
}

/// One capture with its annotations.
///
/// Overlays are kept in painter's order: the last entry is topmost and is
/// hit first. The selection is an id, never a reference into the list.
#[derive(Debug, Clone)]
pub struct Scene {
    base: BaseImage,
    overlays: Vec<(OverlayId, Overlay)>,
    selected: Option<OverlayId>,
    next_id: u64,
}

impl Scene {
    pub fn new(base: BaseImage) -> Self {
        Self {
            base,
            overlays: Vec::new(),
            selected: None,
            next_id: 1,
        }
    }

    pub fn base(&self) -> &BaseImage {
        &self.base
    }

    /// Output size of a flattened scene
    pub fn size(&self) -> Size {
        self.base.size()
    }

    pub fn len(&self) -> usize {
        self.overlays.len()
    }

    pub fn is_empty(&self) -> bool {
        self.overlays.is_empty()
    }

    /// Append on top of the z-order
    pub fn add_overlay(&mut self, overlay: Overlay) -> OverlayId {
        let id = OverlayId(self.next_id);
        self.next_id += 1;
        self.overlays.push((id, overlay));
        id
    }

    /// Remove an overlay; clears the selection if it pointed at it
    pub fn remove_overlay(&mut self, id: OverlayId) -> Option<DetachedOverlay> {
        let index = self.index_of(id)?;
        let (id, overlay) = self.overlays.remove(index);
        if self.selected == Some(id) {
            self.selected = None;
        }
        Some(DetachedOverlay { id, overlay })
    }

    /// Put a detached overlay back on top of the z-order under its old id
    pub fn restore_overlay(&mut self, detached: DetachedOverlay) {
        if self.contains(detached.id) {
            return;
        }
        self.overlays.push((detached.id, detached.overlay));
    }

    /// Move to the end of the z-order; no-op if absent
    pub fn bring_to_front(&mut self, id: OverlayId) {
        if let Some(index) = self.index_of(id) {
            let entry = self.overlays.remove(index);
            self.overlays.push(entry);
        }
    }

    /// Select one overlay, deselecting all others
    pub fn select(&mut self, id: OverlayId) -> bool {
        if self.contains(id) {
            self.selected = Some(id);
            true
        } else {
            false
        }
    }

    pub fn deselect_all(&mut self) {
        self.selected = None;
    }

    pub fn selected(&self) -> Option<OverlayId> {
        self.selected
    }

    pub fn is_selected(&self, id: OverlayId) -> bool {
        self.selected == Some(id)
    }

    pub fn contains(&self, id: OverlayId) -> bool {
        self.index_of(id).is_some()
    }

    pub fn get(&self, id: OverlayId) -> Option<&Overlay> {
        self.overlays.iter().find(|(i, _)| *i == id).map(|(_, o)| o)
    }

    pub fn get_mut(&mut self, id: OverlayId) -> Option<&mut Overlay> {
        self.overlays.iter_mut().find(|(i, _)| *i == id).map(|(_, o)| o)
    }

    /// Bottom-to-top
    pub fn overlays_in_z_order(&self) -> impl DoubleEndedIterator<Item = (OverlayId, &Overlay)> {
        self.overlays.iter().map(|(id, overlay)| (*id, overlay))
    }

    pub fn ids_in_z_order(&self) -> Vec<OverlayId> {
        self.overlays.iter().map(|(id, _)| *id).collect()
    }

    /// Topmost overlay under a point
    pub fn hit_test(&self, p: Point) -> Option<OverlayId> {
        self.overlays
            .iter()
            .rev()
            .find(|(_, overlay)| overlay.contains(p))
            .map(|(id, _)| *id)
    }

    fn index_of(&self, id: OverlayId) -> Option<usize> {
        self.overlays.iter().position(|(i, _)| *i == id)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::object::{Segment, StrokeMode, StrokeOverlay, TextOverlay, TextStyle};
    use crate::style::Color;

    fn scene() -> Scene {
        Scene::new(BaseImage::new(PixelBuffer::filled(400, 300, [9, 9, 9, 255]), (0, 0)))
    }

    fn text_at(x: f64, y: f64) -> Overlay {
        Overlay::Text(
            TextOverlay::new(
                Point::new(x, y),
                TextStyle {
                    font_size: 20.0,
                    foreground: Color::RED,
                    background: Color::TRANSPARENT,
                },
            )
            .with_content("hello"),
        )
    }

    fn line(a: (f64, f64), b: (f64, f64)) -> Overlay {
        let mut stroke = StrokeOverlay::new(StrokeMode::Freehand, Color::RED, 3.0);
        stroke.push_segment(Segment::new(Point::new(a.0, a.1), Point::new(b.0, b.1)));
        Overlay::Stroke(stroke)
    }

    #[test]
    fn ids_are_unique_and_ordered_by_insertion() {
        let mut scene = scene();
        let a = scene.add_overlay(text_at(0.0, 0.0));
        let b = scene.add_overlay(text_at(10.0, 10.0));
        assert_ne!(a, b);
        assert_eq!(scene.ids_in_z_order(), vec![a, b]);
    }

    #[test]
    fn bring_to_front_reorders_and_ignores_unknown_ids() {
        let mut scene = scene();
        let a = scene.add_overlay(text_at(0.0, 0.0));
        let b = scene.add_overlay(text_at(10.0, 10.0));
        scene.bring_to_front(a);
        assert_eq!(scene.ids_in_z_order(), vec![b, a]);

        let gone = scene.remove_overlay(b).unwrap().id;
        scene.bring_to_front(gone);
        assert_eq!(scene.ids_in_z_order(), vec![a]);
    }

    #[test]
    fn selection_is_exclusive_and_cleared_on_removal() {
        let mut scene = scene();
        let a = scene.add_overlay(text_at(0.0, 0.0));
        let b = scene.add_overlay(text_at(50.0, 50.0));
        assert!(scene.select(a));
        assert!(scene.select(b));
        assert!(!scene.is_selected(a));
        scene.remove_overlay(b);
        assert_eq!(scene.selected(), None);
    }

    #[test]
    fn hit_test_prefers_topmost() {
        let mut scene = scene();
        let bottom = scene.add_overlay(line((0.0, 50.0), (200.0, 50.0)));
        let top = scene.add_overlay(line((100.0, 0.0), (100.0, 200.0)));
        assert_eq!(scene.hit_test(Point::new(100.0, 50.0)), Some(top));
        assert_eq!(scene.hit_test(Point::new(20.0, 50.0)), Some(bottom));
        assert_eq!(scene.hit_test(Point::new(300.0, 250.0)), None);
    }

    #[test]
    fn restore_appends_on_top_with_same_id() {
        let mut scene = scene();
        let a = scene.add_overlay(line((0.0, 0.0), (1.0, 1.0)));
        let b = scene.add_overlay(line((0.0, 0.0), (2.0, 2.0)));
        let detached = scene.remove_overlay(a).unwrap();
        scene.restore_overlay(detached);
        assert_eq!(scene.ids_in_z_order(), vec![b, a]);
    }
}
