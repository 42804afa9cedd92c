//! Roundhold authoritative match server.
//!
//! Owns all game state and drives the round loop; clients replay combat from
//! the snapshots it broadcasts. One mutex guards each match's mutable state,
//! one thread per match runs its rounds, and every client has a bounded
//! outbox drained by the network loop.

pub mod combat;
pub mod config;
pub mod economy;
pub mod matchmaking;
pub mod outbox;
pub mod placement;
pub mod round;
pub mod snapshot;
pub mod state;
pub mod transport;
pub mod wave;

pub use crate::combat::{run_combat, CombatError};
pub use crate::config::ServerConfig;
pub use crate::matchmaking::{MatchHandle, MatchServer};
pub use crate::outbox::{AckGate, Outbox};
pub use crate::round::{Phase, PhaseCell, RoundManager};
pub use crate::state::{GameStateManager, MatchOutcome};
pub use crate::transport::{ServerRunner, TransportConfig, PROTOCOL_ID};
