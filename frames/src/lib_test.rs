use super::*;

fn sample_frame() -> Frame {
    Frame::new("id-1", 42, Kind::Emit, serde_json::json!({
        "type": "preview",
        "path": {
            "points": [{"x": 1.25, "y": 2.5}],
            "strokeColor": "#ff0000",
            "strokeWidth": 7
        },
        "gesture": 3,
        "nil": null,
        "ok": true
    }))
    .with_room("lobby")
    .with_from("peer-1")
}

fn wire(kind: i32, data: Option<prost_types::Value>) -> Vec<u8> {
    let wire = WireFrame { id: "id-1".to_owned(), ts: 1, room: None, from: None, to: None, kind, data };
    let mut bytes = Vec::new();
    wire.encode(&mut bytes).expect("encode");
    bytes
}

#[test]
fn kind_numeric_mapping_matches_wire_enum() {
    assert_eq!(Kind::Emit.as_i32(), 0);
    assert_eq!(Kind::Broadcast.as_i32(), 1);
    assert_eq!(Kind::Direct.as_i32(), 2);
    assert_eq!(Kind::Roster.as_i32(), 3);
    assert_eq!(Kind::Welcome.as_i32(), 4);
}

#[test]
fn kind_round_trips_from_wire_values() {
    for kind in [Kind::Emit, Kind::Broadcast, Kind::Direct, Kind::Roster, Kind::Welcome] {
        assert_eq!(Kind::from_i32(kind.as_i32()).expect("kind"), kind);
    }
}

#[test]
fn kind_from_wire_rejects_out_of_range_value() {
    let err = Kind::from_i32(99).expect_err("kind should be invalid");
    assert!(matches!(err, CodecError::InvalidKind(99)));
}

#[test]
fn only_delivery_kinds_are_peer_routable() {
    assert!(Kind::Emit.is_peer_routable());
    assert!(Kind::Broadcast.is_peer_routable());
    assert!(Kind::Direct.is_peer_routable());
    assert!(!Kind::Roster.is_peer_routable());
    assert!(!Kind::Welcome.is_peer_routable());
}

#[test]
fn encode_decode_round_trip_preserves_frame() {
    let frame = sample_frame();
    let decoded = decode_frame(&encode_frame(&frame)).expect("decode should succeed");
    assert_eq!(decoded, frame);
}

#[test]
fn direct_target_round_trips() {
    let frame = Frame::new("id-2", 7, Kind::Direct, serde_json::json!({"type": "draw_replace_state", "points": []}))
        .with_to("peer-9");
    let decoded = decode_frame(&encode_frame(&frame)).expect("decode");
    assert_eq!(decoded.to.as_deref(), Some("peer-9"));
    assert_eq!(decoded, frame);
}

#[test]
fn decode_frame_rejects_malformed_bytes() {
    let err = decode_frame(&[0xff, 0x00, 0x01]).expect_err("bytes should fail");
    assert!(matches!(err, CodecError::Decode(_)));
}

#[test]
fn decode_frame_rejects_invalid_wire_kind() {
    let bytes = wire(77, Some(json::to_proto(&serde_json::json!({}))));
    let err = decode_frame(&bytes).expect_err("kind should fail");
    assert!(matches!(err, CodecError::InvalidKind(77)));
}

#[test]
fn decode_frame_defaults_missing_data_to_empty_object() {
    let frame = decode_frame(&wire(Kind::Broadcast.as_i32(), None)).expect("decode");
    assert_eq!(frame.data, serde_json::json!({}));
}

#[test]
fn decode_frame_converts_nan_number_to_json_null() {
    let data = prost_types::Value { kind: Some(prost_types::value::Kind::NumberValue(f64::NAN)) };
    let frame = decode_frame(&wire(Kind::Emit.as_i32(), Some(data))).expect("decode");
    assert_eq!(frame.data, Value::Null);
}

#[test]
fn wire_conversion_preserves_empty_optional_fields() {
    let frame = Frame::new(String::new(), 0, Kind::Emit, serde_json::json!({}));
    let decoded = decode_frame(&encode_frame(&frame)).expect("decode");
    assert_eq!(decoded, frame);
}

#[test]
fn whole_numbers_decode_as_integers() {
    let frame = Frame::new("id-int", 1, Kind::Emit, serde_json::json!({"gesture": 12, "neg": -3, "w": 7.0}));
    let decoded = decode_frame(&encode_frame(&frame)).expect("decode");
    assert_eq!(decoded.data["gesture"].as_u64(), Some(12));
    assert_eq!(decoded.data["neg"].as_i64(), Some(-3));
    assert_eq!(decoded.data["w"].as_i64(), Some(7));
}

#[test]
fn fractional_and_huge_numbers_stay_floats() {
    let frame = Frame::new("id-f", 1, Kind::Emit, serde_json::json!({"x": 0.5, "big": 1.0e300}));
    let decoded = decode_frame(&encode_frame(&frame)).expect("decode");
    assert_eq!(decoded.data["x"], serde_json::json!(0.5));
    assert!(decoded.data["big"].is_f64());
}

#[test]
fn kind_serializes_as_lowercase_json() {
    assert_eq!(serde_json::to_string(&Kind::Emit).expect("serialize"), "\"emit\"");
    assert_eq!(serde_json::to_string(&Kind::Welcome).expect("serialize"), "\"welcome\"");
}

#[test]
fn kind_rejects_non_lowercase_json() {
    assert!(serde_json::from_str::<Kind>("\"Emit\"").is_err());
}
