use super::*;
use crate::state::test_helpers::test_app_state;
use serde_json::json;
use tokio::time::{Duration, timeout};

async fn recv(rx: &mut mpsc::Receiver<Frame>) -> Frame {
    timeout(Duration::from_millis(500), rx.recv())
        .await
        .expect("receive timed out")
        .expect("channel closed")
}

async fn assert_nothing(rx: &mut mpsc::Receiver<Frame>) {
    assert!(
        timeout(Duration::from_millis(50), rx.recv()).await.is_err(),
        "expected no frame"
    );
}

async fn join(state: &AppState, room: &str) -> (PeerInfo, mpsc::Receiver<Frame>) {
    let (tx, rx) = mpsc::channel(16);
    let info = join_room(state, room, tx).await.expect("join");
    (info, rx)
}

fn draw(kind: Kind) -> Frame {
    Frame::new("f-1", 1, kind, json!({"type": "draw", "points": {"svgString": "M 0 0 L 1 0"}}))
}

// =============================================================================
// JOIN / PART
// =============================================================================

#[tokio::test]
async fn join_assigns_identity_from_palette() {
    let state = test_app_state(4);
    let (a, _rx_a) = join(&state, "r").await;
    let (b, _rx_b) = join(&state, "r").await;
    assert_ne!(a.peer_id, b.peer_id);
    assert!(PALETTE.contains(&a.color.as_str()));
    assert_eq!(roster(&state, "r").await, vec![a, b]);
}

#[tokio::test]
async fn join_refuses_full_room() {
    let state = test_app_state(2);
    let (_a, _rx_a) = join(&state, "r").await;
    let (_b, _rx_b) = join(&state, "r").await;
    let (tx, _rx) = mpsc::channel(1);
    let err = join_room(&state, "r", tx).await.expect_err("room should be full");
    assert!(matches!(err, RelayError::RoomFull { max: 2, .. }));
    assert_eq!(roster(&state, "r").await.len(), 2);
}

#[tokio::test]
async fn rooms_are_independent() {
    let state = test_app_state(1);
    let (_a, _rx_a) = join(&state, "one").await;
    let (_b, _rx_b) = join(&state, "two").await;
    assert_eq!(roster(&state, "one").await.len(), 1);
    assert_eq!(roster(&state, "two").await.len(), 1);
}

#[tokio::test]
async fn last_part_evicts_room() {
    let state = test_app_state(4);
    let (a, _rx_a) = join(&state, "r").await;
    let (b, _rx_b) = join(&state, "r").await;
    part_room(&state, "r", a.peer_id).await;
    assert_eq!(roster(&state, "r").await, vec![b.clone()]);
    part_room(&state, "r", b.peer_id).await;
    assert!(!state.rooms.read().await.contains_key("r"));
}

#[tokio::test]
async fn part_unknown_room_is_noop() {
    let state = test_app_state(4);
    part_room(&state, "nowhere", Uuid::new_v4()).await;
    assert!(state.rooms.read().await.is_empty());
}

#[tokio::test]
async fn roster_broadcast_reaches_everyone() {
    let state = test_app_state(4);
    let (a, mut rx_a) = join(&state, "r").await;
    let (b, mut rx_b) = join(&state, "r").await;
    broadcast_roster(&state, "r").await;

    for rx in [&mut rx_a, &mut rx_b] {
        let frame = recv(rx).await;
        assert_eq!(frame.kind, Kind::Roster);
        assert_eq!(frame.room.as_deref(), Some("r"));
        assert_eq!(
            frame.data,
            json!({"peers": [
                {"peer_id": a.peer_id, "color": a.color},
                {"peer_id": b.peer_id, "color": b.color}
            ]})
        );
    }
}

// =============================================================================
// ROUTING
// =============================================================================

#[tokio::test]
async fn emit_skips_sender() {
    let state = test_app_state(4);
    let (a, mut rx_a) = join(&state, "r").await;
    let (_b, mut rx_b) = join(&state, "r").await;
    let (_c, mut rx_c) = join(&state, "r").await;

    let delivered = route(&state, "r", a.peer_id, draw(Kind::Emit)).await.expect("route");
    assert_eq!(delivered, 2);
    for rx in [&mut rx_b, &mut rx_c] {
        let frame = recv(rx).await;
        assert_eq!(frame.from, Some(a.peer_id.to_string()));
        assert_eq!(frame.room.as_deref(), Some("r"));
        assert_eq!(frame.data["type"], "draw");
    }
    assert_nothing(&mut rx_a).await;
}

#[tokio::test]
async fn broadcast_includes_sender() {
    let state = test_app_state(4);
    let (a, mut rx_a) = join(&state, "r").await;
    let (_b, mut rx_b) = join(&state, "r").await;

    let delivered = route(&state, "r", a.peer_id, draw(Kind::Broadcast)).await.expect("route");
    assert_eq!(delivered, 2);
    assert_eq!(recv(&mut rx_a).await.kind, Kind::Broadcast);
    assert_eq!(recv(&mut rx_b).await.kind, Kind::Broadcast);
}

#[tokio::test]
async fn direct_reaches_only_target() {
    let state = test_app_state(4);
    let (a, mut rx_a) = join(&state, "r").await;
    let (b, mut rx_b) = join(&state, "r").await;
    let (_c, mut rx_c) = join(&state, "r").await;

    let frame = draw(Kind::Direct).with_to(b.peer_id.to_string());
    assert_eq!(route(&state, "r", a.peer_id, frame).await.expect("route"), 1);
    assert_eq!(recv(&mut rx_b).await.from, Some(a.peer_id.to_string()));
    assert_nothing(&mut rx_a).await;
    assert_nothing(&mut rx_c).await;
}

#[tokio::test]
async fn direct_to_unknown_or_missing_target_fails() {
    let state = test_app_state(4);
    let (a, _rx_a) = join(&state, "r").await;

    let err = route(&state, "r", a.peer_id, draw(Kind::Direct)).await.expect_err("no target");
    assert!(matches!(err, RelayError::MissingTarget));

    let frame = draw(Kind::Direct).with_to("not-a-peer");
    let err = route(&state, "r", a.peer_id, frame).await.expect_err("unknown target");
    assert!(matches!(err, RelayError::UnknownPeer(ref t) if t == "not-a-peer"));

    // A real peer in another room is not reachable either.
    let (other, _rx_other) = join(&state, "elsewhere").await;
    let frame = draw(Kind::Direct).with_to(other.peer_id.to_string());
    assert!(route(&state, "r", a.peer_id, frame).await.is_err());
}

#[tokio::test]
async fn server_kinds_are_refused_from_peers() {
    let state = test_app_state(4);
    let (a, _rx_a) = join(&state, "r").await;
    let (_b, mut rx_b) = join(&state, "r").await;
    for kind in [Kind::Roster, Kind::Welcome] {
        let err = route(&state, "r", a.peer_id, draw(kind)).await.expect_err("refused");
        assert!(matches!(err, RelayError::NotRoutable(k) if k == kind));
    }
    assert_nothing(&mut rx_b).await;
}

#[tokio::test]
async fn sender_must_be_in_room() {
    let state = test_app_state(4);
    let (_a, _rx_a) = join(&state, "r").await;
    let err = route(&state, "r", Uuid::new_v4(), draw(Kind::Emit)).await.expect_err("stranger");
    assert!(matches!(err, RelayError::NotInRoom { .. }));
}

#[tokio::test]
async fn client_supplied_from_is_overwritten() {
    let state = test_app_state(4);
    let (a, _rx_a) = join(&state, "r").await;
    let (_b, mut rx_b) = join(&state, "r").await;
    let forged = draw(Kind::Emit).with_from("someone-else").with_room("other-room");
    route(&state, "r", a.peer_id, forged).await.expect("route");
    let frame = recv(&mut rx_b).await;
    assert_eq!(frame.from, Some(a.peer_id.to_string()));
    assert_eq!(frame.room.as_deref(), Some("r"));
}

#[tokio::test]
async fn full_peer_queue_drops_without_blocking_others() {
    let state = test_app_state(4);
    let (a, _rx_a) = join(&state, "r").await;
    let (slow_tx, mut slow_rx) = mpsc::channel(1);
    join_room(&state, "r", slow_tx).await.expect("join");
    let (_c, mut rx_c) = join(&state, "r").await;

    assert_eq!(route(&state, "r", a.peer_id, draw(Kind::Emit)).await.expect("route"), 2);
    assert_eq!(route(&state, "r", a.peer_id, draw(Kind::Emit)).await.expect("route"), 1);

    assert!(recv(&mut slow_rx).await.kind == Kind::Emit);
    assert_nothing(&mut slow_rx).await;
    recv(&mut rx_c).await;
    recv(&mut rx_c).await;
}

// =============================================================================
// SERVER FRAMES
// =============================================================================

#[test]
fn welcome_frame_carries_identity() {
    let me = PeerInfo { peer_id: Uuid::new_v4(), color: "#4363d8".into() };
    let frame = welcome_frame("r", &me);
    assert_eq!(frame.kind, Kind::Welcome);
    assert_eq!(frame.room.as_deref(), Some("r"));
    assert_eq!(frame.data, json!({"peer_id": me.peer_id, "color": "#4363d8"}));
    assert!(Uuid::parse_str(&frame.id).is_ok());
    assert!(frame.ts > 0);
}
