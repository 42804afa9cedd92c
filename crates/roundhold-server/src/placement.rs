//! Storage for accepted tower placements.

use roundhold_protocol::balance::tile_center;
use roundhold_protocol::{SimTowerData, TowerPlacement};

/// The set of towers accepted this match, in acceptance order.
///
/// Callers (the game-state manager) validate buildability and gold before
/// recording; this service only stores and converts. Placements live until
/// the match ends.
#[derive(Clone, Debug, Default)]
pub struct TowerPlacementService {
    placements: Vec<TowerPlacement>,
}

impl TowerPlacementService {
    pub fn new() -> Self {
        Self::default()
    }

    /// Record a pre-validated placement.
    pub fn record(&mut self, placement: TowerPlacement) {
        self.placements.push(placement);
    }

    /// Accepted placements, in acceptance order.
    pub fn placements(&self) -> &[TowerPlacement] {
        &self.placements
    }

    /// Convert every placement to snapshot form, centered on its tile.
    pub fn snapshot_towers(&self) -> Vec<SimTowerData> {
        self.placements
            .iter()
            .map(|placement| {
                let (x, y) = tile_center(placement.tile_row, placement.tile_col);
                SimTowerData {
                    player: placement.player,
                    tower_type: placement.tower_type.clone(),
                    position_x: x,
                    position_y: y,
                    level: placement.level,
                }
            })
            .collect()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use roundhold_protocol::balance::TILE_SIZE_PX;
    use roundhold_protocol::PlayerId;

    fn placement(row: u16, col: u16) -> TowerPlacement {
        TowerPlacement {
            player: PlayerId::A,
            tower_type: "standard".into(),
            tile_row: row,
            tile_col: col,
            level: 1,
        }
    }

    #[test]
    fn snapshot_centers_towers_on_their_tile() {
        let mut service = TowerPlacementService::new();
        service.record(placement(5, 3));

        let towers = service.snapshot_towers();
        assert_eq!(towers.len(), 1);
        assert_eq!(towers[0].position_x, 3.0 * TILE_SIZE_PX + TILE_SIZE_PX / 2.0);
        assert_eq!(towers[0].position_y, 5.0 * TILE_SIZE_PX + TILE_SIZE_PX / 2.0);
    }

    #[test]
    fn acceptance_order_is_preserved() {
        let mut service = TowerPlacementService::new();
        service.record(placement(9, 9));
        service.record(placement(2, 2));

        let rows: Vec<u16> = service.placements().iter().map(|p| p.tile_row).collect();
        assert_eq!(rows, vec![9, 2]);
    }
}
