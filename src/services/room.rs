//! Room service: join/part, roster, and frame routing.
//!
//! DESIGN
//! ======
//! The relay is the "messaging layer" the drawing clients talk through. It
//! never looks inside `data`; it only stamps the envelope (`from`, `room`)
//! and routes by `kind`:
//!
//! - `emit`      → every peer in the room except the sender
//! - `broadcast` → every peer in the room, the sender included
//! - `direct`    → the single peer named in `to`
//!
//! `welcome` and `roster` are produced here and refused from peers.
//!
//! ERROR HANDLING
//! ==============
//! Delivery is fire-and-forget. Each peer has a bounded queue; when it is
//! full the frame is dropped for that peer with a warning and the others
//! still receive it. Clients tolerate loss (previews) or accept it as
//! divergence (commits), so the relay never blocks on a slow peer.

#[cfg(test)]
#[path = "room_test.rs"]
mod room_test;

use std::time::{SystemTime, UNIX_EPOCH};

use frames::{Frame, Kind};
use rand::Rng;
use serde::Serialize;
use tokio::sync::mpsc;
use tokio::sync::mpsc::error::TrySendError;
use tracing::{debug, info, warn};
use uuid::Uuid;

use crate::state::{AppState, RoomState};

/// Colours handed out to joining peers.
pub const PALETTE: &[&str] = &[
    "#e6194b", "#3cb44b", "#ffe119", "#4363d8", "#f58231", "#911eb4", "#46f0f0", "#f032e6",
    "#bcf60c", "#fabebe", "#008080", "#e6beff", "#9a6324", "#800000", "#808000", "#000075",
];

// =============================================================================
// TYPES
// =============================================================================

#[derive(Debug, thiserror::Error)]
pub enum RelayError {
    #[error("room {room} is full ({max} peers)")]
    RoomFull { room: String, max: usize },
    #[error("peer {peer} is not in room {room}")]
    NotInRoom { room: String, peer: Uuid },
    #[error("peers may not send {0:?} frames")]
    NotRoutable(Kind),
    #[error("direct frame has no target")]
    MissingTarget,
    #[error("unknown target peer: {0}")]
    UnknownPeer(String),
}

/// A roster entry and the identity sent in `welcome`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct PeerInfo {
    pub peer_id: Uuid,
    pub color: String,
}

// =============================================================================
// JOIN / PART
// =============================================================================

/// Admit a new peer to `room`, creating the room on first join.
///
/// # Errors
///
/// Returns [`RelayError::RoomFull`] when the room already holds
/// `room_max_peers` peers.
pub async fn join_room(state: &AppState, room: &str, tx: mpsc::Sender<Frame>) -> Result<PeerInfo, RelayError> {
    let max = state.config.room_max_peers;
    let mut rooms = state.rooms.write().await;
    let room_state = rooms.entry(room.to_owned()).or_insert_with(RoomState::new);
    if room_state.len() >= max {
        return Err(RelayError::RoomFull { room: room.to_owned(), max });
    }

    let peer_id = Uuid::new_v4();
    let color = pick_color();
    room_state.insert(peer_id, color.clone(), tx);
    info!(%room, %peer_id, peers = room_state.len(), "peer joined room");
    Ok(PeerInfo { peer_id, color })
}

/// Remove a peer; the room is evicted once its last peer leaves.
pub async fn part_room(state: &AppState, room: &str, peer_id: Uuid) {
    let mut rooms = state.rooms.write().await;
    let Some(room_state) = rooms.get_mut(room) else {
        return;
    };
    room_state.remove(peer_id);
    info!(%room, %peer_id, remaining = room_state.len(), "peer left room");

    if room_state.is_empty() {
        rooms.remove(room);
        info!(%room, "evicted empty room");
    }
}

/// Current members of `room` in join order. Empty for an unknown room.
pub async fn roster(state: &AppState, room: &str) -> Vec<PeerInfo> {
    let rooms = state.rooms.read().await;
    rooms.get(room).map_or_else(Vec::new, |room_state| {
        room_state
            .ordered()
            .into_iter()
            .map(|(peer_id, peer)| PeerInfo { peer_id, color: peer.color.clone() })
            .collect()
    })
}

/// Send the current roster to everyone in `room`.
pub async fn broadcast_roster(state: &AppState, room: &str) {
    let peers = roster(state, room).await;
    if peers.is_empty() {
        return;
    }
    let frame = roster_frame(room, &peers);
    let rooms = state.rooms.read().await;
    if let Some(room_state) = rooms.get(room) {
        for (peer_id, peer) in &room_state.peers {
            deliver(*peer_id, &peer.tx, frame.clone());
        }
    }
}

// =============================================================================
// ROUTING
// =============================================================================

/// Stamp a peer's frame and deliver it according to its kind.
///
/// Returns the number of peers the frame was queued for.
///
/// # Errors
///
/// Returns [`RelayError::NotRoutable`] for server-only kinds,
/// [`RelayError::NotInRoom`] if the sender is not a member, and
/// [`RelayError::MissingTarget`] / [`RelayError::UnknownPeer`] for a direct
/// frame that names no member of the room.
pub async fn route(state: &AppState, room: &str, from: Uuid, mut frame: Frame) -> Result<usize, RelayError> {
    if !frame.kind.is_peer_routable() {
        return Err(RelayError::NotRoutable(frame.kind));
    }
    frame.from = Some(from.to_string());
    frame.room = Some(room.to_owned());

    let rooms = state.rooms.read().await;
    let Some(room_state) = rooms.get(room).filter(|r| r.peers.contains_key(&from)) else {
        return Err(RelayError::NotInRoom { room: room.to_owned(), peer: from });
    };

    let kind = frame.kind;
    let delivered = if kind == Kind::Direct {
        let target = frame.to.as_deref().ok_or(RelayError::MissingTarget)?;
        let (peer_id, peer) = Uuid::parse_str(target)
            .ok()
            .and_then(|id| room_state.peers.get_key_value(&id))
            .ok_or_else(|| RelayError::UnknownPeer(target.to_owned()))?;
        usize::from(deliver(*peer_id, &peer.tx, frame))
    } else {
        let include_sender = kind == Kind::Broadcast;
        let mut delivered = 0;
        for (peer_id, peer) in &room_state.peers {
            if !include_sender && *peer_id == from {
                continue;
            }
            if deliver(*peer_id, &peer.tx, frame.clone()) {
                delivered += 1;
            }
        }
        delivered
    };
    debug!(%room, %from, ?kind, delivered, "routed frame");
    Ok(delivered)
}

/// Queue a frame for one peer without waiting. Returns whether it was queued.
fn deliver(peer_id: Uuid, tx: &mpsc::Sender<Frame>, frame: Frame) -> bool {
    match tx.try_send(frame) {
        Ok(()) => true,
        Err(TrySendError::Full(frame)) => {
            warn!(%peer_id, id = %frame.id, kind = ?frame.kind, "peer queue full; dropping frame");
            false
        }
        Err(TrySendError::Closed(_)) => {
            debug!(%peer_id, "peer queue closed");
            false
        }
    }
}

// =============================================================================
// SERVER FRAMES
// =============================================================================

#[must_use]
pub fn welcome_frame(room: &str, me: &PeerInfo) -> Frame {
    server_frame(Kind::Welcome, serde_json::json!({ "peer_id": me.peer_id, "color": me.color })).with_room(room)
}

#[must_use]
pub fn roster_frame(room: &str, peers: &[PeerInfo]) -> Frame {
    server_frame(Kind::Roster, serde_json::json!({ "peers": peers })).with_room(room)
}

fn server_frame(kind: Kind, data: serde_json::Value) -> Frame {
    Frame::new(Uuid::new_v4().to_string(), now_ms(), kind, data)
}

fn pick_color() -> String {
    let idx = rand::rng().random_range(0..PALETTE.len());
    PALETTE[idx].to_owned()
}

fn now_ms() -> i64 {
    let Ok(dur) = SystemTime::now().duration_since(UNIX_EPOCH) else {
        return 0;
    };
    i64::try_from(dur.as_millis()).unwrap_or(0)
}
