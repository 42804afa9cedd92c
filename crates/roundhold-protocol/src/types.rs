//! Data shapes shared by the server and the client-side replay.
//!
//! `SimulationData` is the lockstep seed: an immutable bundle of towers,
//! queued units and the tick rate that fully determines one round of combat.
//! Order matters — the kernel's tie-breaks follow insertion order, so these
//! vectors are never reordered.

use serde::{Deserialize, Serialize};

use crate::ids::PlayerId;

/// A tower as it enters the simulation, positioned in pixels.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct SimTowerData {
    pub player: PlayerId,
    pub tower_type: String,
    pub position_x: f32,
    pub position_y: f32,
    pub level: u8,
}

/// A unit as it enters the simulation.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct SimUnitData {
    pub player: PlayerId,
    pub unit_type: String,
    pub route: u8,
    pub spawn_tick: u32,
}

/// Immutable snapshot that seeds one round of combat on both hosts.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct SimulationData {
    pub towers: Vec<SimTowerData>,
    pub units: Vec<SimUnitData>,
    pub tick_rate: u32,
}

/// Aggregated outcome of one round of combat.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct RoundResult {
    pub lives_lost_a: u32,
    pub gold_earned_a: u32,
    pub lives_lost_b: u32,
    pub gold_earned_b: u32,
}

impl RoundResult {
    /// Lives the given player lost this round.
    pub fn lives_lost(&self, player: PlayerId) -> u32 {
        match player {
            PlayerId::A => self.lives_lost_a,
            PlayerId::B => self.lives_lost_b,
        }
    }

    /// Gold the given player earned this round.
    pub fn gold_earned(&self, player: PlayerId) -> u32 {
        match player {
            PlayerId::A => self.gold_earned_a,
            PlayerId::B => self.gold_earned_b,
        }
    }
}

/// An accepted tower placement, in local-frame tile coordinates.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct TowerPlacement {
    pub player: PlayerId,
    pub tower_type: String,
    pub tile_row: u16,
    pub tile_col: u16,
    pub level: u8,
}

/// A unit waiting in the next wave, with its assigned spawn tick.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct QueuedUnit {
    pub player: PlayerId,
    pub unit_type: String,
    pub route: u8,
    pub spawn_tick: u32,
}

/// Authoritative economy totals for both players.
///
/// Clients never derive these; the server ships them in `MatchFound` and
/// after every round.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct StateSummary {
    pub gold_a: u32,
    pub lives_a: u32,
    pub gold_b: u32,
    pub lives_b: u32,
}

impl StateSummary {
    /// Gold total for the given player.
    pub fn gold(&self, player: PlayerId) -> u32 {
        match player {
            PlayerId::A => self.gold_a,
            PlayerId::B => self.gold_b,
        }
    }

    /// Lives total for the given player.
    pub fn lives(&self, player: PlayerId) -> u32 {
        match player {
            PlayerId::A => self.lives_a,
            PlayerId::B => self.lives_b,
        }
    }
}

/// One entry of a `SendUnits` request.
///
/// `count` expands server-side into that many queued units. `spawn_tick` is
/// accepted for shape-compatibility but the server always assigns its own
/// deterministic spawn ticks.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct UnitOrder {
    pub unit_type: String,
    pub route: u8,
    #[serde(default = "default_count")]
    pub count: u32,
    #[serde(default)]
    pub spawn_tick: Option<u32>,
}

fn default_count() -> u32 {
    1
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn round_result_per_player_accessors() {
        let result = RoundResult {
            lives_lost_a: 3,
            gold_earned_a: 2,
            lives_lost_b: 0,
            gold_earned_b: 7,
        };
        assert_eq!(result.lives_lost(PlayerId::A), 3);
        assert_eq!(result.gold_earned(PlayerId::B), 7);
    }

    #[test]
    fn unit_order_count_defaults_to_one() {
        let order: UnitOrder =
            serde_json::from_str(r#"{"unit_type":"standard","route":2}"#).unwrap();
        assert_eq!(order.count, 1);
        assert_eq!(order.spawn_tick, None);
    }
}
