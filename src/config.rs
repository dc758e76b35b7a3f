//! Relay configuration from environment variables.
//!
//! Every knob has a default; a missing or unparsable variable falls back to
//! it, so the relay always starts.

#[cfg(test)]
#[path = "config_test.rs"]
mod config_test;

use std::net::IpAddr;

const DEFAULT_PORT: u16 = 3000;
const DEFAULT_BIND_ADDR: [u8; 4] = [0, 0, 0, 0];
const DEFAULT_ROOM_MAX_PEERS: usize = 16;
const DEFAULT_PEER_QUEUE_CAPACITY: usize = 256;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct RelayConfig {
    pub port: u16,
    pub bind_addr: IpAddr,
    /// Peers allowed in one room before joins are refused.
    pub room_max_peers: usize,
    /// Outbound frames buffered per peer before new ones are dropped.
    pub peer_queue_capacity: usize,
}

impl Default for RelayConfig {
    fn default() -> Self {
        Self {
            port: DEFAULT_PORT,
            bind_addr: IpAddr::from(DEFAULT_BIND_ADDR),
            room_max_peers: DEFAULT_ROOM_MAX_PEERS,
            peer_queue_capacity: DEFAULT_PEER_QUEUE_CAPACITY,
        }
    }
}

impl RelayConfig {
    /// Read `PORT`, `BIND_ADDR`, `ROOM_MAX_PEERS` and `PEER_QUEUE_CAPACITY`.
    #[must_use]
    pub fn from_env() -> Self {
        let defaults = Self::default();
        Self {
            port: env_parse("PORT", defaults.port),
            bind_addr: env_parse("BIND_ADDR", defaults.bind_addr),
            room_max_peers: env_parse("ROOM_MAX_PEERS", defaults.room_max_peers).max(1),
            peer_queue_capacity: env_parse("PEER_QUEUE_CAPACITY", defaults.peer_queue_capacity).max(1),
        }
    }
}

pub(crate) fn env_parse<T>(key: &str, default: T) -> T
where
    T: std::str::FromStr + Copy,
{
    std::env::var(key)
        .ok()
        .and_then(|v| v.parse::<T>().ok())
        .unwrap_or(default)
}
