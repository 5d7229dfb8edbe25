use capture::PixelBuffer;
use scene::object::{Corner, Handle};
use scene::{
    normalize_rect, BaseImage, Controller, Key, KeyEvent, MemorySettings, Modifiers, Overlay,
    OverlayId, Point, PointerEvent, Scene, StyleSettings,
};
use std::collections::BTreeSet;

fn controller_with_limit(limit: usize) -> Controller {
    let settings = MemorySettings::new(StyleSettings {
        undo_limit: limit,
        ..StyleSettings::default()
    });
    let base = BaseImage::new(PixelBuffer::filled(640, 480, [30, 30, 30, 255]), (100, 200));
    let mut controller = Controller::new(Scene::new(base), Box::new(settings));
    controller.toggle_paint_mode();
    controller
}

/// Freehand stroke along a row; returns the overlay it produced
fn stroke(c: &mut Controller, y: f64) -> OverlayId {
    c.on_pointer_down(PointerEvent::at(10.0, y));
    c.on_pointer_move(PointerEvent::at(60.0, y));
    c.on_pointer_move(PointerEvent::at(120.0, y));
    c.on_pointer_up(PointerEvent::at(120.0, y));
    *c.scene().ids_in_z_order().last().unwrap()
}

fn members(c: &Controller) -> BTreeSet<OverlayId> {
    c.scene().ids_in_z_order().into_iter().collect()
}

#[test]
fn strokes_beyond_limit_are_evicted_for_good() {
    let mut c = controller_with_limit(4);
    let ids: Vec<_> = (0..7).map(|i| stroke(&mut c, 20.0 + i as f64 * 10.0)).collect();

    assert_eq!(c.history().undo_depth(), 4);
    for evicted in &ids[..3] {
        assert!(!c.scene().contains(*evicted));
    }

    while c.undo() {}
    while c.redo() {}
    assert_eq!(members(&c), ids[3..].iter().copied().collect());
}

#[test]
fn undo_then_redo_keeps_membership() {
    let mut c = controller_with_limit(10);
    stroke(&mut c, 20.0);
    stroke(&mut c, 40.0);
    let before = members(&c);

    assert!(c.undo());
    assert!(c.redo());
    assert_eq!(members(&c), before);
}

#[test]
fn commit_after_undo_clears_redo() {
    let mut c = controller_with_limit(10);
    let first = stroke(&mut c, 20.0);
    c.undo();
    stroke(&mut c, 40.0);

    assert!(!c.history().can_redo());
    assert!(!c.redo());
    assert!(!c.scene().contains(first));
}

#[test]
fn three_strokes_with_limit_two() {
    let mut c = controller_with_limit(2);
    let s1 = stroke(&mut c, 20.0);
    let s2 = stroke(&mut c, 40.0);
    let s3 = stroke(&mut c, 60.0);

    let undoable: Vec<_> = c
        .history()
        .undo_actions()
        .map(|a| a.members().to_vec())
        .collect();
    assert_eq!(undoable, vec![vec![s2], vec![s3]]);
    assert!(!c.scene().contains(s1));

    assert!(c.undo());
    assert_eq!(c.scene().ids_in_z_order(), vec![s2]);

    assert!(c.redo());
    assert_eq!(c.scene().ids_in_z_order(), vec![s2, s3]);
}

#[test]
fn undo_keys_are_ignored_mid_stroke() {
    let mut c = controller_with_limit(10);
    stroke(&mut c, 20.0);
    c.on_pointer_down(PointerEvent::at(10.0, 80.0));
    c.on_pointer_move(PointerEvent::at(40.0, 80.0));
    c.on_key_down(KeyEvent::ctrl('z'));
    c.on_pointer_up(PointerEvent::at(40.0, 80.0));
    assert_eq!(c.history().undo_depth(), 2);
    assert_eq!(c.scene().len(), 2);
}

#[test]
fn font_size_never_drops_below_eight() {
    let settings = MemorySettings::new(StyleSettings {
        text_font_size: 12.0,
        ..StyleSettings::default()
    });
    let base = BaseImage::new(PixelBuffer::filled(200, 200, [0, 0, 0, 255]), (0, 0));
    let mut c = Controller::new(Scene::new(base), Box::new(settings));

    let id = c.add_text_at(Point::new(5.0, 5.0));
    for _ in 0..5 {
        c.decrease_font_size();
    }
    let text = c.scene().get(id).and_then(Overlay::as_text).unwrap();
    assert_eq!(text.font_size(), 8.0);
}

#[test]
fn rotation_past_full_turn_matches_small_angle() {
    let base = BaseImage::new(PixelBuffer::filled(400, 400, [0, 0, 0, 255]), (0, 0));
    let mut c = Controller::new(Scene::new(base), Box::new(MemorySettings::default()));
    let id = c.add_image(PixelBuffer::filled(120, 60, [200, 0, 0, 255]), Point::new(100.0, 100.0));

    // Walk the rotate handle a full turn plus 10 degrees around the center
    let center = Point::new(160.0, 130.0);
    let start = Point::new(160.0, 70.0);
    c.on_pointer_down(PointerEvent::at(start.x, start.y));
    for step in 1..=37 {
        let p = start.rotate_about(center, step as f64 * 10.0);
        c.on_pointer_move(PointerEvent::at(p.x, p.y));
    }
    c.on_pointer_up(PointerEvent::at(start.x, start.y));

    let dragged = c.scene().get(id).and_then(Overlay::as_image).unwrap().clone();
    assert!((dragged.rotation.rem_euclid(360.0) - 10.0).abs() < 1e-6);

    let mut wound = dragged.clone();
    wound.rotation = 370.0;
    let mut reference = dragged.clone();
    reference.rotation = 10.0;

    for handle in [Handle::Rotate, Handle::Resize(Corner::TOP_LEFT), Handle::Resize(Corner::BOTTOM_RIGHT)] {
        let a = wound.handle_position(handle);
        let b = reference.handle_position(handle);
        assert!(a.distance(b) < 1e-6);
    }
    let probe = Point::new(215.0, 150.0);
    assert_eq!(wound.contains(probe), reference.contains(probe));
}

#[test]
fn aspect_locked_resize_keeps_ratio() {
    let base = BaseImage::new(PixelBuffer::filled(800, 800, [0, 0, 0, 255]), (0, 0));
    let mut c = Controller::new(Scene::new(base), Box::new(MemorySettings::default()));
    let id = c.add_image(PixelBuffer::filled(300, 100, [0, 0, 200, 255]), Point::new(200.0, 200.0));

    c.on_pointer_down(PointerEvent::at(200.0, 300.0));
    c.on_pointer_move(PointerEvent::at(150.0, 330.0).with_modifiers(Modifiers::SHIFT));
    c.on_pointer_move(PointerEvent::at(120.0, 311.0).with_modifiers(Modifiers::SHIFT));
    c.on_pointer_up(PointerEvent::at(120.0, 311.0));

    let image = c.scene().get(id).and_then(Overlay::as_image).unwrap();
    assert!((image.size.width / image.size.height - 3.0).abs() < 1e-9);
    // the top-right corner is the fixed anchor
    assert_eq!(image.position.y, 200.0);
    assert_eq!(image.position.x + image.size.width, 500.0);
}

#[test]
fn escape_closes_without_committing() {
    let mut c = controller_with_limit(10);
    c.on_pointer_down(PointerEvent::at(0.0, 0.0));
    c.on_pointer_move(PointerEvent::at(30.0, 0.0));
    c.on_key_down(KeyEvent::plain(Key::Escape));
    assert!(c.is_closed());
    assert!(c.scene().is_empty());
}

#[test]
fn normalize_rect_is_symmetric() {
    let a = Point::new(-12.5, 40.0);
    let b = Point::new(7.0, -3.0);
    assert_eq!(normalize_rect(a, b), normalize_rect(b, a));
}
