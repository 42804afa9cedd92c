//! Thread-safe authoritative game state for one match.

use std::sync::{Arc, Mutex};

use tracing::info;

use roundhold_core::PlacementGrid;
use roundhold_protocol::balance::tower_stats;
use roundhold_protocol::map::in_bounds;
use roundhold_protocol::{
    ActionError, PlayerId, RoundResult, SimulationData, StateSummary, TowerPlacement, UnitOrder,
};

use crate::config::ServerConfig;
use crate::economy::Economy;
use crate::placement::TowerPlacementService;
use crate::round::PhaseCell;
use crate::snapshot::build_snapshot;
use crate::wave::WaveQueue;

/// How a decided match ended.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum MatchOutcome {
    Winner(PlayerId),
    /// Both players hit zero lives in the same round.
    Draw,
}

struct GameStateInner {
    economy: Economy,
    grids: [PlacementGrid; 2],
    placements: TowerPlacementService,
    wave: WaveQueue,
}

/// Single mutex-guarded façade over a match's mutable state.
///
/// Every mutating operation validates and applies under one lock acquisition,
/// so a rejected request leaves no trace. The current phase is read from the
/// round manager's phase cell while the state lock is held (state lock before
/// phase lock, matching the global lock order); no blocking call ever runs
/// inside the critical section.
pub struct GameStateManager {
    inner: Mutex<GameStateInner>,
    phase: Arc<PhaseCell>,
    tick_rate: u32,
}

impl GameStateManager {
    pub fn new(config: &ServerConfig, phase: Arc<PhaseCell>) -> Self {
        Self {
            inner: Mutex::new(GameStateInner {
                economy: Economy::new(config.start_gold, config.start_lives),
                grids: [PlacementGrid::new(), PlacementGrid::new()],
                placements: TowerPlacementService::new(),
                wave: WaveQueue::new(),
            }),
            phase,
            tick_rate: config.tick_rate,
        }
    }

    fn lock(&self) -> std::sync::MutexGuard<'_, GameStateInner> {
        // A poisoned state mutex means a panic mid-mutation; nothing can be
        // salvaged, so propagate.
        self.inner.lock().expect("game state mutex poisoned")
    }

    /// Validate and place a tower atomically: phase, type, bounds, gold and
    /// cell checks all pass before any state changes.
    ///
    /// Coordinates are in the local frame; the caller has already mirrored
    /// player B's view.
    pub fn build_tower(
        &self,
        player: PlayerId,
        tower_type: &str,
        tile_row: u16,
        tile_col: u16,
    ) -> Result<TowerPlacement, ActionError> {
        let mut inner = self.lock();
        if !self.phase.is_preparation() {
            return Err(ActionError::WrongPhase);
        }
        let stats = tower_stats(tower_type).ok_or(ActionError::UnknownType)?;
        if !in_bounds(tile_row, tile_col) {
            return Err(ActionError::NotBuildable);
        }
        if !inner.economy.can_spend(player, stats.cost) {
            return Err(ActionError::InsufficientGold);
        }
        let grid = &inner.grids[player.index()];
        if !grid.is_buildable(tile_row, tile_col) {
            // In bounds but not buildable: occupied cell or route tile.
            return match grid.cell(tile_row, tile_col) {
                Some(roundhold_core::CellState::Occupied) => Err(ActionError::CellOccupied),
                _ => Err(ActionError::NotBuildable),
            };
        }

        inner.economy.spend_gold(player, stats.cost)?;
        inner.grids[player.index()].occupy(tile_row, tile_col);
        let placement = TowerPlacement {
            player,
            tower_type: tower_type.to_owned(),
            tile_row,
            tile_col,
            level: 1,
        };
        inner.placements.record(placement.clone());
        info!(%player, tower_type, tile_row, tile_col, "tower placed");
        Ok(placement)
    }

    /// Validate and queue units atomically.
    pub fn add_units_to_wave(
        &self,
        player: PlayerId,
        orders: &[UnitOrder],
    ) -> Result<(), ActionError> {
        let mut inner = self.lock();
        if !self.phase.is_preparation() {
            return Err(ActionError::WrongPhase);
        }
        let (units, total_cost) = inner.wave.prepare_units(player, orders)?;
        if units.is_empty() {
            return Ok(());
        }
        inner.economy.spend_gold(player, total_cost)?;
        let count = units.len();
        let tick_rate = self.tick_rate;
        inner.wave.enqueue(units, tick_rate);
        info!(%player, count, total_cost, "units queued for next wave");
        Ok(())
    }

    /// Freeze the current towers and queued wave into a snapshot.
    pub fn snapshot(&self) -> SimulationData {
        let inner = self.lock();
        build_snapshot(&inner.placements, &inner.wave, self.tick_rate)
    }

    /// Apply the authoritative outcome of a finished round.
    pub fn apply_round_result(&self, result: &RoundResult) {
        self.lock().economy.apply_round_result(result);
    }

    /// Drop the queued wave. Called once per round, after the snapshot.
    pub fn clear_wave_data(&self) {
        self.lock().wave.clear();
    }

    /// The decided outcome, if any player has run out of lives.
    pub fn match_outcome(&self) -> Option<MatchOutcome> {
        let inner = self.lock();
        let a_out = inner.economy.lives(PlayerId::A) == 0;
        let b_out = inner.economy.lives(PlayerId::B) == 0;
        match (a_out, b_out) {
            (true, true) => Some(MatchOutcome::Draw),
            (true, false) => Some(MatchOutcome::Winner(PlayerId::B)),
            (false, true) => Some(MatchOutcome::Winner(PlayerId::A)),
            (false, false) => None,
        }
    }

    /// Current economy totals.
    pub fn summary(&self) -> StateSummary {
        self.lock().economy.summary()
    }

    /// Current gold for one player.
    pub fn gold(&self, player: PlayerId) -> u32 {
        self.lock().economy.gold(player)
    }

    /// Current lives for one player.
    pub fn lives(&self, player: PlayerId) -> u32 {
        self.lock().economy.lives(player)
    }

    /// Occupied cells of one player's grid, for auditing against placements.
    pub fn occupied_cells(&self, player: PlayerId) -> Vec<(u16, u16)> {
        self.lock().grids[player.index()].occupied_cells()
    }
}
