//! Whole-round simulation state and the tick loop.

use thiserror::Error;

use roundhold_protocol::balance::{self, MIN_SIM_SECONDS, TAIL_SECONDS};
use roundhold_protocol::map::route_waypoints;
use roundhold_protocol::{PlayerId, SimulationData};

use crate::tower::SimTower;
use crate::unit::SimUnit;

/// A snapshot that cannot seed a simulation.
#[derive(Clone, Debug, PartialEq, Eq, Error)]
pub enum SimError {
    #[error("unknown tower type `{0}`")]
    UnknownTowerType(String),
    #[error("unknown unit type `{0}`")]
    UnknownUnitType(String),
    #[error("route index {0} out of range")]
    InvalidRoute(u8),
    #[error("tick rate must be positive")]
    ZeroTickRate,
}

/// Deterministic state of one round of combat.
///
/// Towers and units are owned by value in insertion order; indices are stable
/// for the whole round and double as entity ids. Inactive units stay in the
/// master list so that targeting indices never shift.
#[derive(Clone, Debug)]
pub struct CombatState {
    tick_rate: u32,
    sim_dt: f32,
    current_tick: u32,
    min_duration_ticks: u32,
    tail_ticks: u32,
    /// First tick (at or after the minimum duration) with nothing on the
    /// field and nothing left to spawn.
    quiet_since: Option<u32>,
    pending_spawns: usize,
    towers: Vec<SimTower>,
    units: Vec<SimUnit>,
    kills: [u32; 2],
}

impl CombatState {
    /// Validate a snapshot and build the initial state.
    pub fn new(data: &SimulationData) -> Result<Self, SimError> {
        if data.tick_rate == 0 {
            return Err(SimError::ZeroTickRate);
        }

        let mut towers = Vec::with_capacity(data.towers.len());
        for (id, tower) in data.towers.iter().enumerate() {
            let stats = balance::tower_stats(&tower.tower_type)
                .ok_or_else(|| SimError::UnknownTowerType(tower.tower_type.clone()))?;
            towers.push(SimTower::new(
                id,
                tower.player,
                tower.tower_type.clone(),
                tower.position_x,
                tower.position_y,
                stats.damage,
                stats.range_px,
                stats.cooldown_ticks,
                tower.level,
            ));
        }

        let mut units = Vec::with_capacity(data.units.len());
        for (id, unit) in data.units.iter().enumerate() {
            let stats = balance::unit_stats(&unit.unit_type)
                .ok_or_else(|| SimError::UnknownUnitType(unit.unit_type.clone()))?;
            let path = route_waypoints(unit.route).ok_or(SimError::InvalidRoute(unit.route))?;
            units.push(SimUnit::new(
                id,
                unit.player,
                unit.unit_type.clone(),
                path,
                stats.health,
                stats.speed_px_per_s,
                unit.spawn_tick,
            ));
        }

        let pending_spawns = units.len();
        Ok(Self {
            tick_rate: data.tick_rate,
            sim_dt: balance::sim_dt(data.tick_rate),
            current_tick: 0,
            min_duration_ticks: MIN_SIM_SECONDS * data.tick_rate,
            tail_ticks: TAIL_SECONDS * data.tick_rate,
            quiet_since: None,
            pending_spawns,
            towers,
            units,
            kills: [0, 0],
        })
    }

    /// Advance the simulation by one tick.
    ///
    /// Fixed order: spawn activations, unit movement, tower fire, quiet-tail
    /// bookkeeping, tick increment. Towers fire after movement, so a unit
    /// that crossed its final waypoint this tick is already untargetable.
    pub fn update_tick(&mut self) {
        for unit in &mut self.units {
            if !unit.spawned() && self.current_tick >= unit.spawn_tick {
                unit.activate();
                self.pending_spawns -= 1;
            }
        }

        for unit in &mut self.units {
            unit.advance(self.sim_dt);
        }

        let Self {
            towers,
            units,
            kills,
            ..
        } = self;
        for tower in towers.iter_mut() {
            if let Some(shot) = tower.update(units) {
                if shot.killed {
                    kills[tower.player.index()] += 1;
                }
            }
        }

        let any_active = self.units.iter().any(SimUnit::is_active);
        if !any_active
            && self.pending_spawns == 0
            && self.quiet_since.is_none()
            && self.current_tick >= self.min_duration_ticks
        {
            self.quiet_since = Some(self.current_tick);
        }

        self.current_tick += 1;
    }

    /// Whether the round is settled.
    ///
    /// True once the minimum duration has elapsed and the field has been
    /// quiet (no active units, nothing left to spawn) for the whole tail
    /// window. The minimum duration guard also prevents ending before the
    /// first spawn of a late wave.
    pub fn is_simulation_complete(&self) -> bool {
        match self.quiet_since {
            Some(quiet_since) => {
                self.current_tick >= self.min_duration_ticks
                    && self.current_tick - quiet_since >= self.tail_ticks
            }
            None => false,
        }
    }

    /// Enemy units that reached this player's base.
    pub fn units_reached_base(&self, player: PlayerId) -> u32 {
        self.units
            .iter()
            .filter(|unit| unit.reached_base() && unit.player != player)
            .count() as u32
    }

    /// Enemy units this player's towers destroyed before they reached base.
    pub fn kills_by(&self, player: PlayerId) -> u32 {
        self.kills[player.index()]
    }

    /// Ticks simulated so far.
    pub fn current_tick(&self) -> u32 {
        self.current_tick
    }

    /// Configured tick rate of this round.
    pub fn tick_rate(&self) -> u32 {
        self.tick_rate
    }

    /// Master unit list, in snapshot order. Indices are stable.
    pub fn units(&self) -> &[SimUnit] {
        &self.units
    }

    /// Master tower list, in snapshot order.
    pub fn towers(&self) -> &[SimTower] {
        &self.towers
    }
}
