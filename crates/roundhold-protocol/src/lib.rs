//! Shared contract between the Roundhold server and its clients.
//!
//! Both sides of a match run the same deterministic simulation from the same
//! snapshot, so everything that influences an outcome lives here: the balance
//! tables, the route map, the snapshot and result types, the match event
//! stream and the wire codec. The server crate adds nothing to this contract;
//! it only enforces it.

pub mod balance;
pub mod error;
pub mod event;
pub mod ids;
pub mod map;
pub mod types;
pub mod wire;

pub use crate::error::ActionError;
pub use crate::event::{ActionKind, ClientMessage, MatchEvent, ServerMessage};
pub use crate::ids::PlayerId;
pub use crate::types::{
    QueuedUnit, RoundResult, SimTowerData, SimUnitData, SimulationData, StateSummary,
    TowerPlacement, UnitOrder,
};
