//! Shared application state.
//!
//! DESIGN
//! ======
//! `AppState` is injected into Axum handlers via the `State` extractor.
//! It holds the relay configuration and a map of live rooms. A room exists
//! only while at least one peer is connected to it; nothing is persisted.

use std::collections::HashMap;
use std::sync::Arc;

use frames::Frame;
use tokio::sync::{RwLock, mpsc};
use uuid::Uuid;

use crate::config::RelayConfig;

// =============================================================================
// ROOM STATE
// =============================================================================

/// One connected peer as the relay sees it.
#[derive(Debug, Clone)]
pub struct ConnectedPeer {
    pub color: String,
    /// Join order within the room; rosters are listed by it.
    pub seq: u64,
    /// Outbound queue drained by the peer's socket task.
    pub tx: mpsc::Sender<Frame>,
}

/// Per-room live state.
#[derive(Debug, Default)]
pub struct RoomState {
    pub peers: HashMap<Uuid, ConnectedPeer>,
    next_seq: u64,
}

impl RoomState {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Add a peer at the end of the join order.
    pub fn insert(&mut self, peer_id: Uuid, color: String, tx: mpsc::Sender<Frame>) {
        let seq = self.next_seq;
        self.next_seq += 1;
        self.peers.insert(peer_id, ConnectedPeer { color, seq, tx });
    }

    pub fn remove(&mut self, peer_id: Uuid) -> Option<ConnectedPeer> {
        self.peers.remove(&peer_id)
    }

    /// Peers in join order.
    #[must_use]
    pub fn ordered(&self) -> Vec<(Uuid, &ConnectedPeer)> {
        let mut peers: Vec<(Uuid, &ConnectedPeer)> = self.peers.iter().map(|(id, p)| (*id, p)).collect();
        peers.sort_by_key(|(_, p)| p.seq);
        peers
    }

    #[must_use]
    pub fn len(&self) -> usize {
        self.peers.len()
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.peers.is_empty()
    }
}

// =============================================================================
// APP STATE
// =============================================================================

/// Shared application state, injected into Axum handlers via State extractor.
/// Clone is required by Axum; all inner fields are Arc-wrapped or Copy.
#[derive(Clone)]
pub struct AppState {
    pub config: RelayConfig,
    pub rooms: Arc<RwLock<HashMap<String, RoomState>>>,
}

impl AppState {
    #[must_use]
    pub fn new(config: RelayConfig) -> Self {
        Self { config, rooms: Arc::new(RwLock::new(HashMap::new())) }
    }
}

// =============================================================================
// TEST HELPERS
// =============================================================================

#[cfg(test)]
pub mod test_helpers {
    use super::*;

    /// `AppState` with default config except for the room size limit.
    #[must_use]
    pub fn test_app_state(room_max_peers: usize) -> AppState {
        AppState::new(RelayConfig { room_max_peers, ..RelayConfig::default() })
    }
}
