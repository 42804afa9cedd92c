//! Queue of units awaiting the next round, with deterministic spawn spacing.

use std::collections::HashMap;

use roundhold_protocol::balance::{spawn_delay_ticks, unit_stats};
use roundhold_protocol::map::ROUTE_COUNT;
use roundhold_protocol::{ActionError, PlayerId, QueuedUnit, SimUnitData, UnitOrder};

/// Units queued for the next wave.
///
/// Spawn ticks depend only on queue contents and input order, never on wall
/// time: within a `(player, route)` group the first unit spawns at tick 0 and
/// every later one half a second after the group's previous maximum.
#[derive(Clone, Debug, Default)]
pub struct WaveQueue {
    queued: Vec<QueuedUnit>,
}

impl WaveQueue {
    pub fn new() -> Self {
        Self::default()
    }

    /// Expand and validate an order list without mutating the queue.
    ///
    /// Returns the normalized units (spawn ticks still unassigned) and their
    /// total cost. Client-supplied spawn ticks are discarded here; the server
    /// assigns its own in [`enqueue`](Self::enqueue).
    pub fn prepare_units(
        &self,
        player: PlayerId,
        orders: &[UnitOrder],
    ) -> Result<(Vec<QueuedUnit>, u32), ActionError> {
        let mut normalized = Vec::new();
        let mut total_cost: u32 = 0;

        for order in orders {
            let stats = unit_stats(&order.unit_type).ok_or(ActionError::UnknownType)?;
            if order.route >= ROUTE_COUNT {
                return Err(ActionError::InvalidRoute);
            }
            for _ in 0..order.count {
                total_cost += stats.cost;
                normalized.push(QueuedUnit {
                    player,
                    unit_type: order.unit_type.clone(),
                    route: order.route,
                    spawn_tick: 0,
                });
            }
        }

        Ok((normalized, total_cost))
    }

    /// Append units, assigning each a spawn tick within its (player, route)
    /// group: `0` for an empty group, otherwise the group's current maximum
    /// plus the half-second spawn delay.
    pub fn enqueue(&mut self, units: Vec<QueuedUnit>, tick_rate: u32) {
        let delay = spawn_delay_ticks(tick_rate);

        // Seed each group's next tick from what is already queued.
        let mut next_tick: HashMap<(PlayerId, u8), u32> = HashMap::new();
        for queued in &self.queued {
            let key = (queued.player, queued.route);
            let next = queued.spawn_tick + delay;
            next_tick
                .entry(key)
                .and_modify(|tick| *tick = (*tick).max(next))
                .or_insert(next);
        }

        for mut unit in units {
            let key = (unit.player, unit.route);
            let tick = next_tick.entry(key).or_insert(0);
            unit.spawn_tick = *tick;
            *tick += delay;
            self.queued.push(unit);
        }
    }

    /// Drop all queued units. Called at end of round.
    pub fn clear(&mut self) {
        self.queued.clear();
    }

    /// Queued units in insertion order.
    pub fn queued_units(&self) -> &[QueuedUnit] {
        &self.queued
    }

    /// Queued units in snapshot form.
    pub fn snapshot_units(&self) -> Vec<SimUnitData> {
        self.queued
            .iter()
            .map(|unit| SimUnitData {
                player: unit.player,
                unit_type: unit.unit_type.clone(),
                route: unit.route,
                spawn_tick: unit.spawn_tick,
            })
            .collect()
    }
}
