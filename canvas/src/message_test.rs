use serde_json::json;

use super::*;
use crate::viewport::Point;

fn vector_path() -> VectorPath {
    VectorPath { path_data: "M 10 10 Q 10 10 30 30 L 50 50".into(), stroke_width: 7.0, stroke_color: "#ff0000".into() }
}

// =============================================================
// Wire shapes
// =============================================================

#[test]
fn preview_wire_shape() {
    let msg = DrawMessage::Preview {
        path: PreviewPath::new("#ff0000", 7.0, vec![Point::new(1.0, 2.0)]),
        gesture: Some(3),
    };
    assert_eq!(
        msg.to_value(),
        json!({
            "type": "preview",
            "path": {"points": [{"x": 1.0, "y": 2.0}], "strokeColor": "#ff0000", "strokeWidth": 7.0},
            "gesture": 3
        })
    );
}

#[test]
fn draw_wire_shape_omits_missing_gesture() {
    let msg = DrawMessage::Draw { points: vector_path(), gesture: None };
    assert_eq!(
        msg.to_value(),
        json!({
            "type": "draw",
            "points": {"svgString": "M 10 10 Q 10 10 30 30 L 50 50", "strokeWidth": 7.0, "strokeColor": "#ff0000"}
        })
    );
}

#[test]
fn replace_wire_shape() {
    let msg = DrawMessage::DrawReplaceState { points: vec![vector_path()] };
    let value = msg.to_value();
    assert_eq!(value["type"], "draw_replace_state");
    assert_eq!(value["points"].as_array().map(Vec::len), Some(1));
}

#[test]
fn kind_matches_wire_type() {
    let msgs = [
        DrawMessage::Preview { path: PreviewPath::new("#000000", 3.0, Vec::new()), gesture: None },
        DrawMessage::Draw { points: vector_path(), gesture: None },
        DrawMessage::DrawReplaceState { points: Vec::new() },
    ];
    for msg in msgs {
        assert_eq!(msg.to_value()["type"], msg.kind());
    }
}

// =============================================================
// Parsing
// =============================================================

#[test]
fn parses_payload_without_gesture() {
    let msg = DrawMessage::from_value(&json!({
        "type": "preview",
        "path": {"points": [{"x": 5, "y": 6}], "strokeColor": "#00ff00", "strokeWidth": 10}
    }))
    .unwrap();
    let DrawMessage::Preview { path, gesture } = msg else {
        panic!("expected preview");
    };
    assert_eq!(gesture, None);
    assert_eq!(path.points, vec![Point::new(5.0, 6.0)]);
}

#[test]
fn parses_empty_replace() {
    let msg = DrawMessage::from_value(&json!({"type": "draw_replace_state", "points": []})).unwrap();
    assert_eq!(msg, DrawMessage::DrawReplaceState { points: Vec::new() });
}

#[test]
fn rejects_non_object() {
    let err = DrawMessage::from_value(&json!([1, 2])).unwrap_err();
    assert!(matches!(err, MessageError::NotAnObject));
    assert!(err.is_structural());
}

#[test]
fn rejects_missing_type() {
    let err = DrawMessage::from_value(&json!({"points": []})).unwrap_err();
    assert!(matches!(err, MessageError::MissingType));
}

#[test]
fn other_game_messages_are_unhandled_not_structural() {
    let err = DrawMessage::from_value(&json!({"type": "player_guess", "answer": "house"})).unwrap_err();
    assert!(matches!(err, MessageError::Unhandled(ref t) if t == "player_guess"));
    assert!(!err.is_structural());
}

#[test]
fn draw_without_points_is_malformed() {
    let err = DrawMessage::from_value(&json!({"type": "draw"})).unwrap_err();
    assert!(matches!(err, MessageError::Malformed { kind: "draw", .. }));
    assert!(err.is_structural());
}

#[test]
fn preview_without_path_is_malformed() {
    let err = DrawMessage::from_value(&json!({"type": "preview", "points": []})).unwrap_err();
    assert!(matches!(err, MessageError::Malformed { kind: "preview", .. }));
}

#[test]
fn replace_with_wrong_shape_is_malformed() {
    let err = DrawMessage::from_value(&json!({"type": "draw_replace_state", "points": {"svgString": "M 0 0"}})).unwrap_err();
    assert!(matches!(err, MessageError::Malformed { kind: "draw_replace_state", .. }));
}

#[test]
fn round_trip_through_value() {
    let msg = DrawMessage::Draw { points: vector_path(), gesture: Some(42) };
    assert_eq!(DrawMessage::from_value(&msg.to_value()).unwrap(), msg);
}
