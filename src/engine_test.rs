#![allow(clippy::float_cmp)]

use serde_json::json;

use super::*;
use crate::events::EventKind;
use crate::input::{Button, Tool};

// =============================================================
// Helpers
// =============================================================

fn pt(x: f64, y: f64) -> Point {
    Point::new(x, y)
}

/// 800x600 viewport showing an 800x600 image at scale 1, origin (0, 0).
fn setup() -> (EngineCore, FrameQueue) {
    setup_sized(800.0, 600.0)
}

fn setup_sized(vw: f64, vh: f64) -> (EngineCore, FrameQueue) {
    let frames = FrameQueue::new();
    let mut core = EngineCore::with_backends(Box::new(PixmapMask::default()), Box::new(frames.clone()));
    core.resize(vw, vh);
    core.set_image("bg.png");
    core.on_image_loaded(800.0, 600.0);
    core.take_events();
    (core, frames)
}

fn with_data(values: Vec<Value>) -> EngineCore {
    let (mut core, _) = setup();
    core.set_data(values);
    core.apply_pending_data();
    core.take_events();
    core
}

fn mouse(x: f64, y: f64) -> PointerInput {
    PointerInput::mouse(pt(x, y), Button::Primary)
}

fn down(core: &mut EngineCore, x: f64, y: f64) {
    core.on_pointer_down(&mouse(x, y));
}

fn move_to(core: &mut EngineCore, x: f64, y: f64) {
    core.on_pointer_move(&mouse(x, y));
}

fn up(core: &mut EngineCore, x: f64, y: f64) {
    core.on_pointer_up(&mouse(x, y));
}

fn drag(core: &mut EngineCore, from: (f64, f64), to: (f64, f64)) {
    down(core, from.0, from.1);
    move_to(core, to.0, to.1);
    up(core, to.0, to.1);
}

fn click(core: &mut EngineCore, x: f64, y: f64) {
    down(core, x, y);
    up(core, x, y);
}

fn count(events: &[Event], kind: EventKind) -> usize {
    events.iter().filter(|e| e.kind() == kind).count()
}

fn indices(core: &EngineCore) -> Vec<usize> {
    core.dataset().iter().map(|s| s.index).collect()
}

fn rect_json(x0: f64, y0: f64, x1: f64, y1: f64) -> Value {
    json!({ "type": 1, "coor": [[x0, y0], [x1, y1]] })
}

fn rect_coor(core: &EngineCore) -> Option<(Point, Point)> {
    match core.active()?.geometry {
        Geometry::Rect { min, max } => Some((min, max)),
        _ => None,
    }
}

// =============================================================
// Image load and data
// =============================================================

#[test]
fn image_load_emits_load_and_fits() {
    let frames = FrameQueue::new();
    let mut core = EngineCore::with_backends(Box::new(PixmapMask::default()), Box::new(frames));
    core.resize(400.0, 400.0);
    core.set_image("photo.jpg");
    core.on_image_loaded(800.0, 600.0);
    let events = core.take_events();
    assert_eq!(events.first(), Some(&Event::Load("photo.jpg".into())));
    assert_eq!(core.camera.image_width, 400.0);
    assert_eq!(core.camera.image_height, 300.0);
    assert_eq!(core.camera.origin_y, 50.0);
}

#[test]
fn set_data_is_deferred_until_applied() {
    let (mut core, _) = setup();
    core.set_data(vec![json!({ "type": 3, "coor": [5, 5] })]);
    assert!(core.dataset().is_empty());
    assert!(core.apply_pending_data());
    assert!(!core.apply_pending_data());
    assert_eq!(core.dataset().len(), 1);
}

#[test]
fn set_data_single_dot() {
    let core = with_data(vec![json!({ "type": 3, "coor": [5, 5] })]);
    let shape = core.dataset().get(0).unwrap();
    assert_eq!(shape.kind(), ShapeKind::Dot);
    assert_eq!(shape.index, 0);
    assert_eq!(shape.geometry, Geometry::Dot(pt(5.0, 5.0)));
}

#[test]
fn set_data_unknown_type_is_dropped_with_warning() {
    let (mut core, _) = setup();
    core.set_data(vec![json!({ "type": 99, "coor": [1, 1] })]);
    core.apply_pending_data();
    assert!(core.dataset().is_empty());
    assert_eq!(count(&core.take_events(), EventKind::Warn), 1);
}

#[test]
fn set_data_skips_bad_entries_and_keeps_the_rest() {
    let (mut core, _) = setup();
    core.set_data(vec![json!("nope"), rect_json(1.0, 1.0, 20.0, 20.0), json!({ "type": 2 })]);
    core.apply_pending_data();
    assert_eq!(core.dataset().len(), 1);
    assert_eq!(indices(&core), vec![0]);
    assert_eq!(count(&core.take_events(), EventKind::Warn), 2);
}

#[test]
fn later_set_data_wins() {
    let (mut core, _) = setup();
    core.set_data(vec![rect_json(1.0, 1.0, 20.0, 20.0)]);
    core.set_data(vec![json!({ "type": 3, "coor": [5, 5] }), json!({ "type": 3, "coor": [6, 6] })]);
    core.apply_pending_data();
    assert_eq!(core.dataset().len(), 2);
    assert!(core.dataset().iter().all(|s| s.kind() == ShapeKind::Dot));
}

#[test]
fn to_json_round_trips_through_set_data() {
    let core = with_data(vec![
        json!({ "type": 1, "coor": [[10, 10], [60, 80]], "label": "car", "strokeStyle": "blue" }),
        json!({ "type": 5, "coor": [200, 200], "radius": 25 }),
        json!({ "type": 4, "coor": [[0, 0], [50, 50], [90, 10]], "hide": true }),
    ]);
    let out = core.to_json();
    let mut again = with_data(Vec::new());
    again.set_data(out.as_array().cloned().unwrap());
    again.apply_pending_data();
    assert_eq!(again.dataset().shapes(), core.dataset().shapes());
}

// =============================================================
// Rect creation
// =============================================================

#[test]
fn small_rect_is_discarded_with_one_warning() {
    let (mut core, _) = setup();
    core.config.create_type = Tool::Rect;
    drag(&mut core, (10.0, 10.0), (14.0, 14.0));
    let events = core.take_events();
    assert!(core.dataset().is_empty());
    assert_eq!(count(&events, EventKind::Warn), 1);
    assert_eq!(count(&events, EventKind::Add), 0);
}

#[test]
fn rect_commits_with_normalized_coor() {
    let (mut core, _) = setup();
    core.config.create_type = Tool::Rect;
    drag(&mut core, (10.0, 10.0), (60.0, 80.0));
    let events = core.take_events();
    assert_eq!(count(&events, EventKind::Add), 1);
    assert_eq!(count(&events, EventKind::Warn), 0);
    assert_eq!(core.to_json()[0]["coor"], json!([[10.0, 10.0], [60.0, 80.0]]));
    let shape = core.active().unwrap();
    assert!(!shape.creating);
    assert_eq!(shape.index, 0);
}

#[test]
fn rect_dragged_backwards_is_normalized() {
    let (mut core, _) = setup();
    core.config.create_type = Tool::Rect;
    drag(&mut core, (60.0, 80.0), (10.0, 10.0));
    assert_eq!(core.to_json()[0]["coor"], json!([[10.0, 10.0], [60.0, 80.0]]));
}

#[test]
fn rect_creation_respects_configured_minimum() {
    let (mut core, _) = setup();
    core.config.create_type = Tool::Rect;
    core.config.min_width = 100.0;
    drag(&mut core, (10.0, 10.0), (60.0, 200.0));
    assert!(core.dataset().is_empty());
}

#[test]
fn rect_creation_clamps_to_image() {
    let (mut core, _) = setup();
    core.config.create_type = Tool::Rect;
    down(&mut core, 700.0, 500.0);
    core.on_pointer_move(&mouse(900.0, 900.0));
    up(&mut core, 900.0, 900.0);
    assert_eq!(rect_coor(&core), Some((pt(700.0, 500.0), pt(800.0, 600.0))));
}

#[test]
fn new_shape_deactivates_others() {
    let mut core = with_data(vec![rect_json(300.0, 300.0, 400.0, 400.0)]);
    click(&mut core, 350.0, 350.0);
    core.config.create_type = Tool::Rect;
    drag(&mut core, (10.0, 10.0), (60.0, 80.0));
    assert_eq!(core.dataset().iter().filter(|s| s.active).count(), 1);
    assert_eq!(core.active().unwrap().index, 1);
}

#[test]
fn pointer_down_outside_image_creates_nothing() {
    let (mut core, _) = setup_sized(1000.0, 600.0);
    assert_eq!(core.camera.origin_x, 100.0);
    core.config.create_type = Tool::Rect;
    drag(&mut core, (50.0, 50.0), (90.0, 90.0));
    assert!(core.dataset().is_empty());
}

// =============================================================
// Circle and Dot creation
// =============================================================

#[test]
fn circle_commits_with_dragged_radius() {
    let (mut core, _) = setup();
    core.config.create_type = Tool::Circle;
    drag(&mut core, (100.0, 100.0), (130.0, 140.0));
    assert_eq!(count(&core.take_events(), EventKind::Add), 1);
    assert_eq!(core.active().unwrap().geometry, Geometry::Circle { center: pt(100.0, 100.0), radius: 50.0 });
}

#[test]
fn small_circle_is_discarded() {
    let (mut core, _) = setup();
    core.config.create_type = Tool::Circle;
    drag(&mut core, (100.0, 100.0), (103.0, 100.0));
    assert!(core.dataset().is_empty());
    assert_eq!(count(&core.take_events(), EventKind::Warn), 1);
}

#[test]
fn dot_commits_on_pointer_down() {
    let (mut core, _) = setup();
    core.config.create_type = Tool::Dot;
    down(&mut core, 40.0, 50.0);
    let events = core.take_events();
    assert_eq!(count(&events, EventKind::Add), 1);
    let dot = core.active().unwrap();
    assert!(!dot.creating);
    assert_eq!(dot.geometry, Geometry::Dot(pt(40.0, 50.0)));
    up(&mut core, 40.0, 50.0);
    assert_eq!(count(&core.take_events(), EventKind::Add), 0);
}

// =============================================================
// Polygon and Line creation
// =============================================================

fn polygon_clicks(core: &mut EngineCore, points: &[(f64, f64)]) {
    for &(x, y) in points {
        click(core, x, y);
    }
}

#[test]
fn polygon_needs_three_vertices_to_commit() {
    let (mut core, _) = setup();
    core.config.create_type = Tool::Polygon;
    polygon_clicks(&mut core, &[(100.0, 100.0), (200.0, 100.0)]);
    core.on_double_click();
    assert_eq!(count(&core.take_events(), EventKind::Add), 0);
    assert!(core.active().unwrap().creating);

    polygon_clicks(&mut core, &[(150.0, 200.0)]);
    core.on_double_click();
    core.on_double_click();
    assert_eq!(count(&core.take_events(), EventKind::Add), 1);
    let shape = core.active().unwrap();
    assert!(!shape.creating);
    assert_eq!(shape.geometry.vertices().len(), 3);
}

#[test]
fn repeated_click_does_not_duplicate_vertex() {
    let (mut core, _) = setup();
    core.config.create_type = Tool::Polygon;
    polygon_clicks(&mut core, &[(100.0, 100.0), (100.0, 100.0), (200.0, 100.0), (200.0, 100.0)]);
    assert_eq!(core.active().unwrap().geometry.vertices().len(), 2);
}

#[test]
fn line_commits_with_two_vertices() {
    let (mut core, _) = setup();
    core.config.create_type = Tool::Line;
    polygon_clicks(&mut core, &[(100.0, 100.0)]);
    core.on_double_click();
    assert_eq!(count(&core.take_events(), EventKind::Add), 0);
    polygon_clicks(&mut core, &[(300.0, 120.0)]);
    core.on_double_click();
    assert_eq!(count(&core.take_events(), EventKind::Add), 1);
    assert_eq!(core.active().unwrap().kind(), ShapeKind::Line);
}

#[test]
fn rubber_band_tracks_pointer_without_touching_coor() {
    let (mut core, _) = setup();
    core.config.create_type = Tool::Polygon;
    polygon_clicks(&mut core, &[(100.0, 100.0), (200.0, 100.0)]);
    move_to(&mut core, 250.0, 260.0);
    assert_eq!(core.rubber_band(), Some(pt(250.0, 260.0)));
    assert_eq!(core.active().unwrap().geometry.vertices().len(), 2);

    polygon_clicks(&mut core, &[(150.0, 200.0)]);
    core.on_double_click();
    assert_eq!(core.rubber_band(), None);
}

#[test]
fn double_tap_completes_polygon() {
    let (mut core, _) = setup();
    core.config.create_type = Tool::Polygon;
    for (t, x, y) in [(0.0, 100.0, 100.0), (1000.0, 200.0, 100.0), (2000.0, 150.0, 200.0), (2100.0, 150.0, 200.0)] {
        let touch = PointerInput::touch(vec![pt(x, y)], t).unwrap();
        core.on_pointer_down(&touch);
        core.on_pointer_up(&touch);
    }
    assert_eq!(count(&core.take_events(), EventKind::Add), 1);
    assert!(!core.active().unwrap().creating);
}

#[test]
fn quick_taps_in_dot_mode_each_create_a_dot() {
    let (mut core, _) = setup();
    core.config.create_type = Tool::Dot;
    for (t, x, y) in [(0.0, 100.0, 100.0), (120.0, 300.0, 200.0)] {
        let touch = PointerInput::touch(vec![pt(x, y)], t).unwrap();
        core.on_pointer_down(&touch);
        core.on_pointer_up(&touch);
    }
    assert_eq!(count(&core.take_events(), EventKind::Add), 2);
    assert_eq!(core.dataset().len(), 2);
}

// =============================================================
// Interrupted rect/circle creation
// =============================================================

#[test]
fn second_finger_during_rect_creation_discards_on_release() {
    let (mut core, _) = setup();
    core.config.create_type = Tool::Rect;
    let one = PointerInput::touch(vec![pt(100.0, 100.0)], 0.0).unwrap();
    core.on_pointer_down(&one);
    let two = PointerInput::touch(vec![pt(100.0, 100.0), pt(300.0, 300.0)], 50.0).unwrap();
    core.on_pointer_down(&two);
    core.on_pointer_up(&two);
    let events = core.take_events();
    assert_eq!(count(&events, EventKind::Warn), 1);
    assert_eq!(count(&events, EventKind::Add), 0);
    assert!(core.dataset().is_empty());

    drag(&mut core, (400.0, 400.0), (500.0, 480.0));
    assert_eq!(count(&core.take_events(), EventKind::Add), 1);
    assert_eq!(rect_coor(&core), Some((pt(400.0, 400.0), pt(500.0, 480.0))));
    assert!(!core.active().unwrap().creating);
}

#[test]
fn secondary_press_during_rect_creation_does_not_wedge_the_engine() {
    let (mut core, _) = setup();
    core.config.create_type = Tool::Rect;
    down(&mut core, 10.0, 10.0);
    core.on_pointer_down(&PointerInput::mouse(pt(10.0, 10.0), Button::Secondary));
    up(&mut core, 10.0, 10.0);
    assert_eq!(count(&core.take_events(), EventKind::Warn), 1);
    assert!(core.dataset().is_empty());

    drag(&mut core, (200.0, 200.0), (300.0, 300.0));
    assert_eq!(count(&core.take_events(), EventKind::Add), 1);
    assert_eq!(core.dataset().len(), 1);
    assert!(!core.active().unwrap().creating);
}

#[test]
fn sized_rect_interrupted_by_pinch_commits_on_release() {
    let (mut core, _) = setup();
    core.config.create_type = Tool::Rect;
    down(&mut core, 100.0, 100.0);
    move_to(&mut core, 200.0, 180.0);
    let two = PointerInput::touch(vec![pt(200.0, 180.0), pt(300.0, 300.0)], 50.0).unwrap();
    core.on_pointer_down(&two);
    core.on_pointer_up(&two);
    assert_eq!(count(&core.take_events(), EventKind::Add), 1);
    assert_eq!(rect_coor(&core), Some((pt(100.0, 100.0), pt(200.0, 180.0))));
    assert!(!core.active().unwrap().creating);
}

// =============================================================
// Selection
// =============================================================

#[test]
fn click_selects_and_brings_to_front() {
    let mut core = with_data(vec![rect_json(10.0, 10.0, 100.0, 100.0), rect_json(200.0, 200.0, 300.0, 300.0)]);
    down(&mut core, 50.0, 50.0);
    let events = core.take_events();
    assert!(matches!(events.as_slice(), [Event::Select(Some(s))] if s.index == 0));
    assert_eq!(indices(&core), vec![1, 0]);
    assert!(core.active().unwrap().dragging);
    up(&mut core, 50.0, 50.0);
    assert!(!core.active().unwrap().dragging);
}

#[test]
fn click_on_background_deselects_and_restores_order() {
    let mut core = with_data(vec![rect_json(10.0, 10.0, 100.0, 100.0), rect_json(200.0, 200.0, 300.0, 300.0)]);
    click(&mut core, 50.0, 50.0);
    core.take_events();
    click(&mut core, 500.0, 500.0);
    assert_eq!(core.take_events(), vec![Event::Select(None)]);
    assert!(core.active().is_none());
    assert_eq!(indices(&core), vec![0, 1]);
}

#[test]
fn topmost_overlapping_shape_is_selected() {
    let mut core = with_data(vec![rect_json(10.0, 10.0, 100.0, 100.0), rect_json(50.0, 50.0, 150.0, 150.0)]);
    click(&mut core, 75.0, 75.0);
    assert_eq!(core.active().unwrap().index, 1);
}

#[test]
fn hidden_shape_cannot_be_selected() {
    let mut core = with_data(vec![json!({ "type": 1, "coor": [[10, 10], [100, 100]], "hide": true })]);
    click(&mut core, 50.0, 50.0);
    assert!(core.active().is_none());
}

#[test]
fn focus_mode_limits_hits_and_drawing_to_active() {
    let mut core = with_data(vec![rect_json(10.0, 10.0, 100.0, 100.0), rect_json(200.0, 200.0, 300.0, 300.0)]);
    click(&mut core, 50.0, 50.0);
    core.set_focus_mode(true);
    assert_eq!(core.visible_shapes().count(), 1);
    assert!(core.shape_at(pt(250.0, 250.0)).is_none());
    assert!(core.shape_at(pt(50.0, 50.0)).is_some());
    core.set_focus_mode(false);
    assert_eq!(core.shape_at(pt(250.0, 250.0)).map(|s| s.index), Some(1));
}

// =============================================================
// Move
// =============================================================

#[test]
fn body_drag_moves_every_vertex() {
    let mut core = with_data(vec![rect_json(10.0, 10.0, 60.0, 80.0)]);
    drag(&mut core, (30.0, 30.0), (40.0, 50.0));
    assert_eq!(rect_coor(&core), Some((pt(20.0, 30.0), pt(70.0, 100.0))));
}

#[test]
fn body_drag_out_of_bounds_is_rejected_wholesale() {
    let mut core = with_data(vec![rect_json(10.0, 10.0, 60.0, 80.0)]);
    down(&mut core, 30.0, 30.0);
    move_to(&mut core, 40.0, 50.0);
    move_to(&mut core, -100.0, 50.0);
    up(&mut core, -100.0, 50.0);
    assert_eq!(rect_coor(&core), Some((pt(20.0, 30.0), pt(70.0, 100.0))));
}

#[test]
fn polygon_body_drag() {
    let mut core = with_data(vec![json!({ "type": 2, "coor": [[100, 100], [200, 100], [150, 200]] })]);
    drag(&mut core, (150.0, 130.0), (160.0, 140.0));
    assert_eq!(
        core.active().unwrap().geometry,
        Geometry::Polygon(vec![pt(110.0, 110.0), pt(210.0, 110.0), pt(160.0, 210.0)])
    );
}

// =============================================================
// Resize
// =============================================================

#[test]
fn rect_corner_resize() {
    let mut core = with_data(vec![rect_json(10.0, 10.0, 60.0, 80.0)]);
    click(&mut core, 30.0, 30.0);
    drag(&mut core, (60.0, 80.0), (100.0, 120.0));
    assert_eq!(rect_coor(&core), Some((pt(10.0, 10.0), pt(100.0, 120.0))));
}

#[test]
fn rect_edge_resize_moves_one_edge() {
    let mut core = with_data(vec![rect_json(10.0, 10.0, 60.0, 80.0)]);
    click(&mut core, 30.0, 30.0);
    // Top-middle grip at (35, 10).
    drag(&mut core, (35.0, 10.0), (90.0, 0.0));
    assert_eq!(rect_coor(&core), Some((pt(10.0, 0.0), pt(60.0, 80.0))));
}

#[test]
fn rect_resize_keeps_grab_offset() {
    let mut core = with_data(vec![rect_json(10.0, 10.0, 60.0, 80.0)]);
    click(&mut core, 30.0, 30.0);
    // Grab 2px inside the bottom-right grip; the corner must not jump.
    drag(&mut core, (58.0, 78.0), (78.0, 98.0));
    assert_eq!(rect_coor(&core), Some((pt(10.0, 10.0), pt(80.0, 100.0))));
}

#[test]
fn rect_resize_floors_at_minimum_with_warning() {
    let mut core = with_data(vec![rect_json(10.0, 10.0, 60.0, 80.0)]);
    click(&mut core, 30.0, 30.0);
    core.take_events();
    drag(&mut core, (60.0, 80.0), (12.0, 12.0));
    assert_eq!(rect_coor(&core), Some((pt(10.0, 10.0), pt(20.0, 20.0))));
    assert_eq!(count(&core.take_events(), EventKind::Warn), 1);
}

#[test]
fn rect_resize_clamps_to_image_with_warning() {
    let mut core = with_data(vec![rect_json(10.0, 10.0, 60.0, 80.0)]);
    click(&mut core, 30.0, 30.0);
    core.take_events();
    drag(&mut core, (60.0, 80.0), (900.0, 700.0));
    assert_eq!(rect_coor(&core), Some((pt(10.0, 10.0), pt(800.0, 600.0))));
    assert_eq!(count(&core.take_events(), EventKind::Warn), 1);
}

#[test]
fn circle_radius_grip_resize_and_floor() {
    let mut core = with_data(vec![json!({ "type": 5, "coor": [100, 100], "radius": 30 })]);
    click(&mut core, 100.0, 110.0);
    down(&mut core, 130.0, 100.0);
    move_to(&mut core, 150.0, 100.0);
    assert_eq!(core.active().unwrap().geometry, Geometry::Circle { center: pt(100.0, 100.0), radius: 50.0 });
    core.take_events();
    move_to(&mut core, 102.0, 100.0);
    up(&mut core, 102.0, 100.0);
    assert_eq!(core.active().unwrap().geometry, Geometry::Circle { center: pt(100.0, 100.0), radius: 5.0 });
    assert_eq!(count(&core.take_events(), EventKind::Warn), 1);
}

#[test]
fn circle_center_grip_moves_center() {
    let mut core = with_data(vec![json!({ "type": 5, "coor": [100, 100], "radius": 30 })]);
    click(&mut core, 100.0, 110.0);
    drag(&mut core, (100.0, 100.0), (140.0, 120.0));
    assert_eq!(core.active().unwrap().geometry, Geometry::Circle { center: pt(140.0, 120.0), radius: 30.0 });
}

#[test]
fn polygon_vertex_grip_resize() {
    let mut core = with_data(vec![json!({ "type": 2, "coor": [[100, 100], [200, 100], [150, 200]] })]);
    click(&mut core, 150.0, 130.0);
    drag(&mut core, (200.0, 100.0), (250.0, 90.0));
    assert_eq!(
        core.active().unwrap().geometry,
        Geometry::Polygon(vec![pt(100.0, 100.0), pt(250.0, 90.0), pt(150.0, 200.0)])
    );
}

// =============================================================
// Readonly and lock
// =============================================================

#[test]
fn readonly_blocks_creation_but_allows_selection() {
    let mut core = with_data(vec![rect_json(10.0, 10.0, 60.0, 80.0)]);
    core.config.readonly = true;
    core.config.create_type = Tool::Rect;
    drag(&mut core, (300.0, 300.0), (400.0, 400.0));
    assert_eq!(core.dataset().len(), 1);

    drag(&mut core, (30.0, 30.0), (50.0, 50.0));
    let shape = core.active().unwrap();
    assert_eq!(shape.geometry, Geometry::rect(pt(10.0, 10.0), pt(60.0, 80.0)));
    assert!(!shape.dragging);
}

#[test]
fn readonly_blocks_resize() {
    let mut core = with_data(vec![rect_json(10.0, 10.0, 60.0, 80.0)]);
    click(&mut core, 30.0, 30.0);
    core.config.readonly = true;
    drag(&mut core, (60.0, 80.0), (100.0, 120.0));
    assert_eq!(rect_coor(&core), Some((pt(10.0, 10.0), pt(60.0, 80.0))));
}

#[test]
fn lock_ignores_pointer_and_zoom() {
    let mut core = with_data(vec![rect_json(10.0, 10.0, 60.0, 80.0)]);
    core.config.lock = true;
    click(&mut core, 30.0, 30.0);
    assert!(core.active().is_none());
    assert!(core.take_events().is_empty());
    assert!(!core.set_scale(true, false, false));
    core.on_wheel(pt(100.0, 100.0), WheelDelta { dx: 0.0, dy: -1.0 });
    assert_eq!(core.camera.scale_step, 0);
}

// =============================================================
// Delete and keys
// =============================================================

#[test]
fn delete_by_index_keeps_indices_contiguous() {
    let mut core = with_data(vec![
        rect_json(0.0, 0.0, 20.0, 20.0),
        rect_json(30.0, 30.0, 50.0, 50.0),
        rect_json(60.0, 60.0, 80.0, 80.0),
        rect_json(90.0, 90.0, 120.0, 120.0),
    ]);
    let removed = core.delete_by_index(1).unwrap();
    assert_eq!(removed.index, 1);
    assert_eq!(indices(&core), vec![0, 1, 2]);
    assert_eq!(count(&core.take_events(), EventKind::Delete), 1);
    assert!(core.delete_by_index(7).is_none());
    core.delete_by_index(0);
    assert_eq!(indices(&core), vec![0, 1]);
}

#[test]
fn delete_after_reorder_renumbers_in_paint_order() {
    let mut core = with_data(vec![
        rect_json(0.0, 0.0, 20.0, 20.0),
        rect_json(30.0, 30.0, 50.0, 50.0),
        rect_json(60.0, 60.0, 80.0, 80.0),
    ]);
    click(&mut core, 10.0, 10.0);
    core.delete_by_index(1);
    assert_eq!(indices(&core), vec![0, 1]);
}

#[test]
fn backspace_deletes_active() {
    let mut core = with_data(vec![rect_json(10.0, 10.0, 60.0, 80.0)]);
    click(&mut core, 30.0, 30.0);
    core.take_events();
    core.on_key(&Key("Backspace".into()), true);
    assert!(core.dataset().is_empty());
    assert_eq!(count(&core.take_events(), EventKind::Delete), 1);
}

#[test]
fn escape_pops_vertices_then_discards() {
    let (mut core, _) = setup();
    core.config.create_type = Tool::Polygon;
    polygon_clicks(&mut core, &[(100.0, 100.0), (200.0, 100.0), (150.0, 200.0)]);
    let esc = Key("Escape".into());
    core.on_key(&esc, true);
    assert_eq!(core.active().unwrap().geometry.vertices().len(), 2);
    core.on_key(&esc, true);
    assert_eq!(core.active().unwrap().geometry.vertices().len(), 1);
    core.on_key(&esc, true);
    assert!(core.dataset().is_empty());
    assert_eq!(count(&core.take_events(), EventKind::Delete), 0);
}

#[test]
fn escape_deletes_committed_active_shape() {
    let mut core = with_data(vec![rect_json(10.0, 10.0, 60.0, 80.0)]);
    click(&mut core, 30.0, 30.0);
    core.on_key(&Key("Escape".into()), true);
    assert!(core.dataset().is_empty());
}

#[test]
fn keys_suppressed_without_body_focus_or_when_readonly() {
    let mut core = with_data(vec![rect_json(10.0, 10.0, 60.0, 80.0)]);
    click(&mut core, 30.0, 30.0);
    core.on_key(&Key("Backspace".into()), false);
    assert_eq!(core.dataset().len(), 1);
    core.config.readonly = true;
    core.on_key(&Key("Backspace".into()), true);
    assert_eq!(core.dataset().len(), 1);
}

// =============================================================
// Zoom and pan
// =============================================================

#[test]
fn zoom_in_then_out_restores_size() {
    let (mut core, _) = setup();
    assert!(core.set_scale(true, false, false));
    assert_eq!(core.camera.image_width, 840.0);
    assert!(core.set_scale(false, false, false));
    assert_eq!(core.camera.image_width, 800.0);
    assert_eq!(core.camera.image_height, 600.0);
}

#[test]
fn wheel_zooms_around_pointer() {
    let (mut core, _) = setup();
    core.on_wheel(pt(200.0, 150.0), WheelDelta { dx: 0.0, dy: -3.0 });
    assert_eq!(core.camera.scale_step, 1);
    assert_eq!(core.camera.screen_to_image(pt(200.0, 150.0)), pt(200.0, 150.0));
    core.on_wheel(pt(200.0, 150.0), WheelDelta { dx: 0.0, dy: 3.0 });
    assert_eq!(core.camera.scale_step, 0);
}

#[test]
fn wheel_ignored_when_scroll_zoom_off() {
    let (mut core, _) = setup();
    core.config.scroll_zoom = false;
    core.on_wheel(pt(200.0, 150.0), WheelDelta { dx: 0.0, dy: -3.0 });
    assert_eq!(core.camera.scale_step, 0);
}

#[test]
fn fit_zoom_is_idempotent() {
    let (mut core, _) = setup();
    core.resize(500.0, 700.0);
    core.fit_zoom();
    let first = core.camera;
    core.fit_zoom();
    assert_eq!(core.camera.image_width, first.image_width);
    assert_eq!(core.camera.image_height, first.image_height);
    assert_eq!(core.camera.origin_x, first.origin_x);
    assert_eq!(core.camera.origin_y, first.origin_y);
}

#[test]
fn secondary_drag_pans_in_screen_space() {
    let (mut core, _) = setup();
    core.on_pointer_down(&PointerInput::mouse(pt(100.0, 100.0), Button::Secondary));
    core.on_pointer_move(&PointerInput::mouse(pt(150.0, 130.0), Button::Secondary));
    core.on_pointer_up(&PointerInput::mouse(pt(150.0, 130.0), Button::Secondary));
    assert_eq!((core.camera.origin_x, core.camera.origin_y), (50.0, 30.0));
    assert_eq!(core.input, InputState::Idle);
}

#[test]
fn pan_does_not_touch_shapes() {
    let mut core = with_data(vec![rect_json(10.0, 10.0, 60.0, 80.0)]);
    core.on_pointer_down(&PointerInput::mouse(pt(30.0, 30.0), Button::Secondary));
    core.on_pointer_move(&PointerInput::mouse(pt(60.0, 60.0), Button::Secondary));
    assert!(core.active().is_none());
    assert_eq!(core.dataset().get(0).unwrap().geometry, Geometry::rect(pt(10.0, 10.0), pt(60.0, 80.0)));
}

#[test]
fn pinch_spread_zooms_in() {
    let (mut core, _) = setup();
    let start = PointerInput::touch(vec![pt(100.0, 100.0), pt(200.0, 200.0)], 0.0).unwrap();
    core.on_pointer_down(&start);
    let spread = PointerInput::touch(vec![pt(90.0, 90.0), pt(210.0, 210.0)], 16.0).unwrap();
    core.on_pointer_move(&spread);
    assert_eq!(core.camera.scale_step, 1);
    let pinch = PointerInput::touch(vec![pt(120.0, 120.0), pt(180.0, 180.0)], 32.0).unwrap();
    core.on_pointer_move(&pinch);
    assert_eq!(core.camera.scale_step, 0);
}

// =============================================================
// Redraw coalescing and updated
// =============================================================

#[test]
fn redraws_coalesce_into_one_pending_frame() {
    let (mut core, frames) = setup();
    let before = frames.requested();
    core.config.create_type = Tool::Rect;
    down(&mut core, 10.0, 10.0);
    for i in 0..10 {
        move_to(&mut core, 20.0 + f64::from(i), 30.0);
    }
    assert_eq!(frames.pending(), 1);
    assert!(frames.requested() >= before + 11);
    assert!(core.has_pending_frame());
}

#[test]
fn frame_rendered_emits_updated_snapshot() {
    let (mut core, frames) = setup();
    core.set_data(vec![rect_json(10.0, 10.0, 60.0, 80.0)]);
    core.apply_pending_data();
    core.take_events();
    frames.drain();
    core.frame_rendered();
    assert!(!core.has_pending_frame());
    let events = core.take_events();
    assert!(matches!(events.as_slice(), [Event::Updated(shapes)] if shapes.len() == 1));
}

#[test]
fn update_requests_a_frame() {
    let (mut core, frames) = setup();
    frames.drain();
    core.frame_rendered();
    core.update();
    assert_eq!(frames.pending(), 1);
}

#[test]
fn cancel_frame_clears_pending_without_rescheduling() {
    let (mut core, frames) = setup();
    core.update();
    let requested = frames.requested();
    core.cancel_frame();
    assert!(!core.has_pending_frame());
    assert_eq!(frames.pending(), 0);
    assert_eq!(frames.requested(), requested);
}
