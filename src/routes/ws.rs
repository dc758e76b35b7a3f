//! WebSocket handler: one connection per peer, binary protobuf frames.
//!
//! LIFECYCLE
//! =========
//! 1. Upgrade → join the room (refused with a close frame when full)
//! 2. Send `welcome` with the peer's id and colour, then a fresh `roster`
//!    to everyone in the room
//! 3. `select!` loop: inbound frames are routed by kind, queued frames for
//!    this peer are written to the socket
//! 4. Close → part the room → `roster` to whoever is left

#[cfg(test)]
#[path = "ws_test.rs"]
mod ws_test;

use axum::extract::ws::{CloseFrame, Message, WebSocket, WebSocketUpgrade, close_code};
use axum::extract::{Path, State};
use axum::response::Response;
use frames::Frame;
use tokio::sync::mpsc;
use tracing::{debug, info, warn};
use uuid::Uuid;

use crate::services::room;
use crate::state::AppState;

// =============================================================================
// UPGRADE
// =============================================================================

pub async fn handle_ws(Path(room): Path<String>, State(state): State<AppState>, ws: WebSocketUpgrade) -> Response {
    ws.on_upgrade(move |socket| run_ws(socket, state, room))
}

// =============================================================================
// CONNECTION
// =============================================================================

async fn run_ws(mut socket: WebSocket, state: AppState, room: String) {
    let (peer_tx, mut peer_rx) = mpsc::channel::<Frame>(state.config.peer_queue_capacity);

    let me = match room::join_room(&state, &room, peer_tx).await {
        Ok(me) => me,
        Err(e) => {
            warn!(%room, error = %e, "ws: join refused");
            let close = CloseFrame { code: close_code::AGAIN, reason: e.to_string().into() };
            if let Err(e) = socket.send(Message::Close(Some(close))).await {
                debug!(%room, error = %e, "ws: close after refusal failed");
            }
            return;
        }
    };
    let peer_id = me.peer_id;
    info!(%room, %peer_id, color = %me.color, "ws: peer connected");

    if send_frame(&mut socket, &room::welcome_frame(&room, &me)).await {
        room::broadcast_roster(&state, &room).await;
        serve(&mut socket, &state, &room, peer_id, &mut peer_rx).await;
    }

    room::part_room(&state, &room, peer_id).await;
    room::broadcast_roster(&state, &room).await;
    info!(%room, %peer_id, "ws: peer disconnected");
}

async fn serve(
    socket: &mut WebSocket,
    state: &AppState,
    room: &str,
    peer_id: Uuid,
    peer_rx: &mut mpsc::Receiver<Frame>,
) {
    loop {
        tokio::select! {
            msg = socket.recv() => {
                let Some(Ok(msg)) = msg else { break };
                match msg {
                    Message::Binary(bytes) => dispatch(state, room, peer_id, &bytes).await,
                    Message::Text(_) => warn!(%room, %peer_id, "ws: text frames are not supported"),
                    Message::Close(_) => break,
                    _ => {}
                }
            }
            Some(frame) = peer_rx.recv() => {
                if !send_frame(socket, &frame).await {
                    break;
                }
            }
        }
    }
}

// =============================================================================
// FRAME DISPATCH
// =============================================================================

/// Decode one inbound frame and hand it to the router. Failures only cost
/// this frame; the connection stays up.
async fn dispatch(state: &AppState, room: &str, peer_id: Uuid, bytes: &[u8]) {
    let frame = match frames::decode_frame(bytes) {
        Ok(frame) => frame,
        Err(e) => {
            warn!(%room, %peer_id, error = %e, "ws: invalid inbound frame");
            return;
        }
    };
    let id = frame.id.clone();
    if let Err(e) = room::route(state, room, peer_id, frame).await {
        warn!(%room, %peer_id, %id, error = %e, "ws: frame not routed");
    }
}

/// Write a frame to the socket. Returns false once the socket is gone.
async fn send_frame(socket: &mut WebSocket, frame: &Frame) -> bool {
    let bytes = frames::encode_frame(frame);
    match socket.send(Message::Binary(bytes.into())).await {
        Ok(()) => true,
        Err(e) => {
            debug!(id = %frame.id, kind = ?frame.kind, error = %e, "ws: send failed");
            false
        }
    }
}
