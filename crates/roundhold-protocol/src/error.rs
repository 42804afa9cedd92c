//! Structured failure reasons for client actions.

use serde::{Deserialize, Serialize};
use thiserror::Error;

/// Why the server refused a client action.
///
/// Surfaced verbatim in [`crate::event::ServerMessage::ActionReply`]; the
/// server never crashes on a bad request and never partially applies one.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Error, Serialize, Deserialize)]
pub enum ActionError {
    /// The action is only legal during the preparation phase.
    #[error("action is only allowed during the preparation phase")]
    WrongPhase,
    /// The cost exceeds the player's current gold.
    #[error("not enough gold")]
    InsufficientGold,
    /// The target cell already holds a tower.
    #[error("target cell is already occupied")]
    CellOccupied,
    /// The target cell is on a route or outside the map.
    #[error("target cell cannot hold a tower")]
    NotBuildable,
    /// The tower or unit type name is not in the balance tables.
    #[error("unknown tower or unit type")]
    UnknownType,
    /// The route index is outside the fixed route set.
    #[error("route index out of range")]
    InvalidRoute,
    /// The client has no active match.
    #[error("no active match for this client")]
    NotInMatch,
    /// Unexpected server-side failure; details are logged, not leaked.
    #[error("internal server error")]
    Internal,
}
