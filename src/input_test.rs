use super::*;

fn pt(x: f64, y: f64) -> Point {
    Point::new(x, y)
}

// =============================================================
// Tool
// =============================================================

#[test]
fn tool_default_is_select() {
    assert_eq!(Tool::default(), Tool::Select);
}

#[test]
fn tool_codes_round_trip() {
    for code in 0u8..=5 {
        let tool = Tool::try_from(code).unwrap();
        assert_eq!(u8::from(tool), code);
    }
    assert!(Tool::try_from(6).is_err());
}

#[test]
fn tool_shape_kind() {
    assert_eq!(Tool::Select.shape_kind(), None);
    assert_eq!(Tool::Rect.shape_kind(), Some(ShapeKind::Rect));
    assert_eq!(Tool::Circle.shape_kind(), Some(ShapeKind::Circle));
    assert_eq!(Tool::Line.shape_kind().map(ShapeKind::code), Some(4));
}

#[test]
fn tool_serde_as_number() {
    assert_eq!(serde_json::to_value(Tool::Dot).unwrap(), serde_json::json!(3));
    let t: Tool = serde_json::from_value(serde_json::json!(2)).unwrap();
    assert_eq!(t, Tool::Polygon);
    assert!(serde_json::from_value::<Tool>(serde_json::json!(42)).is_err());
}

// =============================================================
// Buttons and gestures
// =============================================================

#[test]
fn button_from_dom_codes() {
    assert_eq!(Button::from_dom(0), Button::Primary);
    assert_eq!(Button::from_dom(1), Button::Middle);
    assert_eq!(Button::from_dom(2), Button::Secondary);
}

#[test]
fn mouse_gestures() {
    assert_eq!(PointerInput::mouse(pt(0.0, 0.0), Button::Primary).gesture(), Gesture::Primary);
    assert_eq!(PointerInput::mouse(pt(0.0, 0.0), Button::Secondary).gesture(), Gesture::Pan);
    assert_eq!(PointerInput::mouse(pt(0.0, 0.0), Button::Middle).gesture(), Gesture::Pan);
}

#[test]
fn touch_gestures() {
    let one = PointerInput::touch(vec![pt(1.0, 1.0)], 0.0).unwrap();
    assert_eq!(one.gesture(), Gesture::Primary);
    assert!(one.is_touch());
    let two = PointerInput::touch(vec![pt(0.0, 0.0), pt(10.0, 20.0)], 0.0).unwrap();
    assert_eq!(two.gesture(), Gesture::Pinch);
    assert_eq!(two.touch_pair(), Some((pt(0.0, 0.0), pt(10.0, 20.0))));
}

// =============================================================
// Touch merge
// =============================================================

#[test]
fn merge_single_touch_is_itself() {
    assert_eq!(merge_touches(&[pt(3.0, 4.0)]), Some(pt(3.0, 4.0)));
}

#[test]
fn merge_two_touches_is_midpoint() {
    assert_eq!(merge_touches(&[pt(0.0, 0.0), pt(10.0, 20.0)]), Some(pt(5.0, 10.0)));
}

#[test]
fn merge_no_touch_is_none() {
    assert_eq!(merge_touches(&[]), None);
    assert!(PointerInput::touch(Vec::new(), 0.0).is_none());
}

#[test]
fn touch_position_is_merged() {
    let p = PointerInput::touch(vec![pt(2.0, 2.0), pt(4.0, 6.0)], 12.0).unwrap();
    assert_eq!(p.pos, pt(3.0, 4.0));
    assert!((p.time_ms - 12.0).abs() < f64::EPSILON);
}

// =============================================================
// Keys and state
// =============================================================

#[test]
fn key_matches_name() {
    let k = Key("Escape".into());
    assert!(k.is("Escape"));
    assert!(!k.is("Backspace"));
}

#[test]
fn input_state_default_is_idle() {
    assert_eq!(InputState::default(), InputState::Idle);
}
