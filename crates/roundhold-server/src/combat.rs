//! Headless combat execution for one round.

use thiserror::Error;

use tracing::debug;

use roundhold_core::{CombatState, SimError};
use roundhold_protocol::balance::GOLD_PER_KILL;
use roundhold_protocol::{PlayerId, RoundResult, SimulationData};

/// Hard ceiling on simulated ticks per round. The termination predicate is
/// deterministic, so this only trips on a corrupted snapshot; at 20 Hz it is
/// twenty minutes of game time.
pub const MAX_SIM_TICKS: u32 = 24_000;

/// A round that could not be settled.
#[derive(Debug, Error)]
pub enum CombatError {
    #[error("snapshot rejected: {0}")]
    Sim(#[from] SimError),
    #[error("simulation exceeded {MAX_SIM_TICKS} ticks without completing")]
    TickCeiling,
}

/// Run the kernel to completion on a snapshot and aggregate the outcome.
///
/// Pure with respect to its input: identical snapshots yield identical
/// results on any host, which is what lets clients replay the round locally.
pub fn run_combat(snapshot: &SimulationData) -> Result<RoundResult, CombatError> {
    let mut state = CombatState::new(snapshot)?;
    while !state.is_simulation_complete() {
        if state.current_tick() >= MAX_SIM_TICKS {
            return Err(CombatError::TickCeiling);
        }
        state.update_tick();
    }

    let result = RoundResult {
        lives_lost_a: state.units_reached_base(PlayerId::A),
        gold_earned_a: state.kills_by(PlayerId::A) * GOLD_PER_KILL,
        lives_lost_b: state.units_reached_base(PlayerId::B),
        gold_earned_b: state.kills_by(PlayerId::B) * GOLD_PER_KILL,
    };
    debug!(ticks = state.current_tick(), ?result, "combat settled");
    Ok(result)
}

#[cfg(test)]
mod tests {
    use super::*;
    use roundhold_protocol::balance::{tile_center, MIN_SIM_SECONDS, TAIL_SECONDS, TICK_RATE};
    use roundhold_protocol::{SimTowerData, SimUnitData};

    fn empty_snapshot() -> SimulationData {
        SimulationData {
            towers: vec![],
            units: vec![],
            tick_rate: TICK_RATE,
        }
    }

    #[test]
    fn empty_round_is_all_zeros() {
        let result = run_combat(&empty_snapshot()).unwrap();
        assert_eq!(result, RoundResult::default());
    }

    #[test]
    fn defended_lane_converts_kills_to_gold() {
        let (x, y) = tile_center(5, 3);
        let snapshot = SimulationData {
            towers: vec![SimTowerData {
                player: PlayerId::A,
                tower_type: "standard".into(),
                position_x: x,
                position_y: y,
                level: 1,
            }],
            units: vec![SimUnitData {
                player: PlayerId::B,
                unit_type: "standard".into(),
                route: 0,
                spawn_tick: 0,
            }],
            tick_rate: TICK_RATE,
        };
        let result = run_combat(&snapshot).unwrap();
        assert_eq!(result.lives_lost_a, 0);
        assert_eq!(result.gold_earned_a, GOLD_PER_KILL);
        assert_eq!(result.lives_lost_b, 0);
        assert_eq!(result.gold_earned_b, 0);
    }

    #[test]
    fn undefended_lane_costs_lives() {
        let snapshot = SimulationData {
            towers: vec![],
            units: (0..3)
                .map(|i| SimUnitData {
                    player: PlayerId::B,
                    unit_type: "standard".into(),
                    route: 2,
                    spawn_tick: i * 10,
                })
                .collect(),
            tick_rate: TICK_RATE,
        };
        let result = run_combat(&snapshot).unwrap();
        assert_eq!(result.lives_lost_a, 3);
        assert_eq!(result.gold_earned_b, 0);
    }

    #[test]
    fn two_runs_are_byte_identical() {
        let snapshot = SimulationData {
            towers: vec![],
            units: vec![
                SimUnitData {
                    player: PlayerId::A,
                    unit_type: "standard".into(),
                    route: 1,
                    spawn_tick: 0,
                },
                SimUnitData {
                    player: PlayerId::B,
                    unit_type: "standard".into(),
                    route: 4,
                    spawn_tick: 10,
                },
            ],
            tick_rate: TICK_RATE,
        };
        let first = run_combat(&snapshot).unwrap();
        let second = run_combat(&snapshot).unwrap();
        assert_eq!(first, second);
    }

    #[test]
    fn bad_snapshot_surfaces_sim_error() {
        let snapshot = SimulationData {
            towers: vec![],
            units: vec![SimUnitData {
                player: PlayerId::A,
                unit_type: "dragon".into(),
                route: 0,
                spawn_tick: 0,
            }],
            tick_rate: TICK_RATE,
        };
        assert!(matches!(
            run_combat(&snapshot),
            Err(CombatError::Sim(SimError::UnknownUnitType(_)))
        ));
    }

    #[test]
    fn empty_round_lasts_minimum_plus_tail() {
        let mut state = CombatState::new(&empty_snapshot()).unwrap();
        while !state.is_simulation_complete() {
            state.update_tick();
        }
        assert_eq!(
            state.current_tick(),
            (MIN_SIM_SECONDS + TAIL_SECONDS) * TICK_RATE
        );
    }
}
