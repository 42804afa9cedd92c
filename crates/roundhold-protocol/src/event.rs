//! Wire messages: client requests and the server-streamed match events.

use serde::{Deserialize, Serialize};

use crate::error::ActionError;
use crate::ids::PlayerId;
use crate::types::{RoundResult, SimulationData, StateSummary, TowerPlacement, UnitOrder};

/// Client-to-server messages.
///
/// The sender's identity is the transport's client id; request bodies carry
/// no player field, so another player's actions cannot be forged.
#[derive(Clone, Debug, Serialize, Deserialize)]
#[serde(tag = "type")]
pub enum ClientMessage {
    /// Enter the matchmaking queue. The event stream begins with `MatchFound`.
    QueueForMatch { player_name: String },
    /// Place a tower during preparation. Coordinates are in the sender's own
    /// view; the server mirrors player B's into the local frame.
    BuildTower {
        tower_type: String,
        tile_row: u16,
        tile_col: u16,
    },
    /// Queue units for the next wave during preparation.
    SendUnits { units: Vec<UnitOrder> },
    /// Signal that the finished round has been rendered.
    RoundAck,
}

/// Server-to-client messages.
#[derive(Clone, Debug, Serialize, Deserialize)]
#[serde(tag = "type")]
pub enum ServerMessage {
    /// An event from the client's match outbox, delivered in enqueue order.
    Event { event: MatchEvent },
    /// Unary reply to a mutating request.
    ActionReply {
        action: ActionKind,
        success: bool,
        #[serde(default)]
        error: Option<ActionError>,
    },
}

/// Which request an `ActionReply` answers.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub enum ActionKind {
    BuildTower,
    SendUnits,
    RoundAck,
}

/// Events streamed to each client of a match through its outbox.
#[derive(Clone, Debug, Serialize, Deserialize)]
#[serde(tag = "type")]
pub enum MatchEvent {
    /// Pairing succeeded; always the first event on the stream.
    MatchFound {
        player_id: PlayerId,
        opponent: String,
        initial_state: StateSummary,
    },
    /// Combat begins: both clients replay this snapshot locally.
    RoundStart { simulation_data: SimulationData },
    /// Authoritative outcome of the finished round plus the new totals.
    RoundResult {
        result: RoundResult,
        new_state: StateSummary,
    },
    /// A tower placement was accepted; broadcast to both clients.
    TowerPlaced { placement: TowerPlacement },
    /// The other client's connection ended; the match is over.
    OpponentDisconnected,
}

impl ServerMessage {
    /// Reply for a request that succeeded.
    pub fn ok(action: ActionKind) -> Self {
        ServerMessage::ActionReply {
            action,
            success: true,
            error: None,
        }
    }

    /// Reply for a request the server refused.
    pub fn rejected(action: ActionKind, error: ActionError) -> Self {
        ServerMessage::ActionReply {
            action,
            success: false,
            error: Some(error),
        }
    }
}
