//! Server configuration.

use std::net::SocketAddr;
use std::time::Duration;

use serde::{Deserialize, Serialize};

use roundhold_protocol::balance::{
    PREP_SECONDS, ROUND_ACK_TIMEOUT_SECS, START_GOLD, START_LIVES, TICK_RATE,
};

/// Server configuration.
///
/// `Default` is the production contract (LAN port 42069, 30 s preparation);
/// tests shrink the durations to keep full-round flows in the millisecond
/// range.
#[derive(Clone, Debug, Serialize, Deserialize)]
pub struct ServerConfig {
    /// Address to bind the UDP socket.
    pub bind_address: SocketAddr,
    /// Maximum concurrently connected clients.
    pub max_clients: usize,
    /// Simulation tick rate handed to every snapshot.
    pub tick_rate: u32,
    /// Length of the preparation window.
    pub prep_duration: Duration,
    /// How long a round waits for both acks before advancing.
    pub ack_timeout: Duration,
    /// Events an outbox may buffer before the match is torn down.
    pub outbox_capacity: usize,
    /// Gold each player starts with.
    pub start_gold: u32,
    /// Lives each player starts with.
    pub start_lives: u32,
}

impl Default for ServerConfig {
    fn default() -> Self {
        Self {
            bind_address: "0.0.0.0:42069".parse().expect("static bind address"),
            max_clients: 16,
            tick_rate: TICK_RATE,
            prep_duration: Duration::from_secs(PREP_SECONDS),
            ack_timeout: Duration::from_secs(ROUND_ACK_TIMEOUT_SECS),
            outbox_capacity: 256,
            start_gold: START_GOLD,
            start_lives: START_LIVES,
        }
    }
}
