//! Freezes the current match state into an immutable simulation snapshot.

use roundhold_protocol::SimulationData;

use crate::placement::TowerPlacementService;
use crate::wave::WaveQueue;

/// Build the snapshot that seeds the next round: all accepted towers, the
/// queued wave, and the tick rate. Insertion order is preserved on both
/// lists — the kernel's tie-breaks depend on it.
pub fn build_snapshot(
    placements: &TowerPlacementService,
    wave: &WaveQueue,
    tick_rate: u32,
) -> SimulationData {
    SimulationData {
        towers: placements.snapshot_towers(),
        units: wave.snapshot_units(),
        tick_rate,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use roundhold_protocol::{PlayerId, TowerPlacement, UnitOrder};

    #[test]
    fn snapshot_reflects_placements_and_queue() {
        let mut placements = TowerPlacementService::new();
        placements.record(TowerPlacement {
            player: PlayerId::A,
            tower_type: "standard".into(),
            tile_row: 5,
            tile_col: 3,
            level: 1,
        });

        let mut wave = WaveQueue::new();
        let (units, _) = wave
            .prepare_units(
                PlayerId::B,
                &[UnitOrder {
                    unit_type: "standard".into(),
                    route: 0,
                    count: 2,
                    spawn_tick: None,
                }],
            )
            .unwrap();
        wave.enqueue(units, 20);

        let snapshot = build_snapshot(&placements, &wave, 20);
        assert_eq!(snapshot.tick_rate, 20);
        assert_eq!(snapshot.towers.len(), 1);
        assert_eq!(snapshot.units.len(), 2);
        assert_eq!(snapshot.units[1].spawn_tick, 10);
    }
}
