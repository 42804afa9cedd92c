//! Defending tower: cooldown bookkeeping and deterministic target selection.

use roundhold_protocol::PlayerId;

use crate::unit::SimUnit;

/// Outcome of a tower firing this tick.
#[derive(Clone, Copy, Debug)]
pub(crate) struct TowerShot {
    pub target: usize,
    pub killed: bool,
}

/// One tower in the simulation.
#[derive(Clone, Debug)]
pub struct SimTower {
    pub id: usize,
    pub player: PlayerId,
    pub tower_type: String,
    x: f32,
    y: f32,
    damage: i32,
    range_px: f32,
    cooldown_ticks: u32,
    cooldown: u32,
    pub level: u8,
}

impl SimTower {
    #[allow(clippy::too_many_arguments)]
    pub(crate) fn new(
        id: usize,
        player: PlayerId,
        tower_type: String,
        x: f32,
        y: f32,
        damage: i32,
        range_px: f32,
        cooldown_ticks: u32,
        level: u8,
    ) -> Self {
        Self {
            id,
            player,
            tower_type,
            x,
            y,
            damage,
            range_px,
            cooldown_ticks,
            cooldown: 0,
            level,
        }
    }

    /// Tick the cooldown and, when ready, fire at the eligible enemy with the
    /// lowest index in the master unit list.
    ///
    /// Lowest-index selection ties targeting to snapshot insertion order,
    /// which is the determinism anchor; anything distance- or address-based
    /// would diverge between hosts.
    pub(crate) fn update(&mut self, units: &mut [SimUnit]) -> Option<TowerShot> {
        if self.cooldown > 0 {
            self.cooldown -= 1;
        }
        if self.cooldown > 0 {
            return None;
        }

        let target = units.iter().position(|unit| {
            unit.is_active()
                && unit.player != self.player
                && unit.distance_to(self.x, self.y) <= self.range_px
        })?;

        let killed = units[target].take_damage(self.damage);
        self.cooldown = self.cooldown_ticks;
        Some(TowerShot { target, killed })
    }

    /// Position in pixels.
    pub fn position(&self) -> (f32, f32) {
        (self.x, self.y)
    }

    /// Ticks until the tower may fire again.
    pub fn cooldown_remaining(&self) -> u32 {
        self.cooldown
    }
}
