//! Balance constants and stat tables.
//!
//! These values are part of the external contract: clients replay combat from
//! the same snapshot, so any divergence here desyncs the lockstep. Stats are
//! keyed by type name; unknown names are rejected at the validation boundary.

/// Simulation ticks per second.
pub const TICK_RATE: u32 = 20;

/// Side length of a map tile in pixels.
pub const TILE_SIZE_PX: f32 = 32.0;

/// Length of the preparation window in seconds.
pub const PREP_SECONDS: u64 = 30;

/// How long the server waits for both round acks before advancing anyway.
pub const ROUND_ACK_TIMEOUT_SECS: u64 = 30;

/// A round simulates at least this many seconds, even with an empty wave.
pub const MIN_SIM_SECONDS: u32 = 5;

/// Quiet seconds required after the last unit leaves the field.
pub const TAIL_SECONDS: u32 = 3;

/// Lives each player starts the match with.
pub const START_LIVES: u32 = 20;

/// Gold each player starts the match with.
pub const START_GOLD: u32 = 50;

/// Gold credited per enemy unit destroyed before it reaches a base.
pub const GOLD_PER_KILL: u32 = 1;

/// Ticks between consecutive spawns of the same (player, route) group at the
/// default tick rate.
pub const SPAWN_DELAY_TICKS: u32 = TICK_RATE / 2;

/// Seconds of game time advanced by one tick.
#[inline]
pub fn sim_dt(tick_rate: u32) -> f32 {
    1.0 / tick_rate as f32
}

/// Spawn spacing for an arbitrary tick rate (half a second, rounded).
#[inline]
pub fn spawn_delay_ticks(tick_rate: u32) -> u32 {
    (tick_rate as f32 * 0.5).round() as u32
}

/// Static combat stats for a tower type.
#[derive(Clone, Copy, Debug)]
pub struct TowerStats {
    pub damage: i32,
    pub range_px: f32,
    pub cooldown_ticks: u32,
    pub cost: u32,
}

/// Static combat stats for a unit type.
#[derive(Clone, Copy, Debug)]
pub struct UnitStats {
    pub health: i32,
    pub speed_px_per_s: f32,
    pub cost: u32,
}

const TOWER_TYPES: &[(&str, TowerStats)] = &[(
    "standard",
    TowerStats {
        damage: 25,
        range_px: 120.0,
        cooldown_ticks: 10,
        cost: 20,
    },
)];

const UNIT_TYPES: &[(&str, UnitStats)] = &[(
    "standard",
    UnitStats {
        health: 10,
        speed_px_per_s: 120.0,
        cost: 5,
    },
)];

/// Stats for a tower type name, or `None` if the name is not in the table.
pub fn tower_stats(tower_type: &str) -> Option<&'static TowerStats> {
    TOWER_TYPES
        .iter()
        .find(|(name, _)| *name == tower_type)
        .map(|(_, stats)| stats)
}

/// Stats for a unit type name, or `None` if the name is not in the table.
pub fn unit_stats(unit_type: &str) -> Option<&'static UnitStats> {
    UNIT_TYPES
        .iter()
        .find(|(name, _)| *name == unit_type)
        .map(|(_, stats)| stats)
}

/// Pixel coordinates of a tile's top-left corner.
#[inline]
pub fn tile_to_pixel(row: u16, col: u16) -> (f32, f32) {
    (col as f32 * TILE_SIZE_PX, row as f32 * TILE_SIZE_PX)
}

/// Pixel coordinates of a tile's center. Towers and route waypoints sit here.
#[inline]
pub fn tile_center(row: u16, col: u16) -> (f32, f32) {
    let (x, y) = tile_to_pixel(row, col);
    (x + TILE_SIZE_PX / 2.0, y + TILE_SIZE_PX / 2.0)
}
