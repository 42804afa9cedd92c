//! Attacking unit marching along a fixed route.

use roundhold_protocol::PlayerId;

/// One unit in the simulation.
///
/// Held by value in the master list of [`crate::CombatState`]; its index
/// there is its identity for the whole round, so inactive units are never
/// compacted out.
#[derive(Clone, Debug)]
pub struct SimUnit {
    pub id: usize,
    pub player: PlayerId,
    pub unit_type: String,
    path: Vec<(f32, f32)>,
    waypoint: usize,
    x: f32,
    y: f32,
    hp: i32,
    speed: f32,
    pub spawn_tick: u32,
    active: bool,
    spawned: bool,
    reached_base: bool,
}

impl SimUnit {
    pub(crate) fn new(
        id: usize,
        player: PlayerId,
        unit_type: String,
        path: Vec<(f32, f32)>,
        hp: i32,
        speed: f32,
        spawn_tick: u32,
    ) -> Self {
        let (x, y) = path[0];
        Self {
            id,
            player,
            unit_type,
            path,
            waypoint: 0,
            x,
            y,
            hp,
            speed,
            spawn_tick,
            active: false,
            spawned: false,
            reached_base: false,
        }
    }

    pub(crate) fn activate(&mut self) {
        self.spawned = true;
        self.active = true;
    }

    pub(crate) fn spawned(&self) -> bool {
        self.spawned
    }

    /// Advance one tick's worth of distance along the route.
    ///
    /// Overshoot at a waypoint carries into the next segment; crossing the
    /// final waypoint marks the base reached and deactivates the unit.
    pub(crate) fn advance(&mut self, sim_dt: f32) {
        if !self.active {
            return;
        }

        let mut remaining = self.speed * sim_dt;
        while remaining > 0.0 {
            if self.waypoint >= self.path.len() - 1 {
                self.reached_base = true;
                self.active = false;
                return;
            }

            let (next_x, next_y) = self.path[self.waypoint + 1];
            let dx = next_x - self.x;
            let dy = next_y - self.y;
            let distance = (dx * dx + dy * dy).sqrt();

            if remaining >= distance {
                self.x = next_x;
                self.y = next_y;
                self.waypoint += 1;
                remaining -= distance;
            } else {
                self.x += dx / distance * remaining;
                self.y += dy / distance * remaining;
                remaining = 0.0;
            }
        }
    }

    /// Apply damage. Returns `true` if this hit destroyed the unit.
    pub(crate) fn take_damage(&mut self, damage: i32) -> bool {
        self.hp -= damage;
        if self.hp <= 0 {
            self.hp = 0;
            self.active = false;
            true
        } else {
            false
        }
    }

    /// Whether the unit is on the field this tick.
    pub fn is_active(&self) -> bool {
        self.active
    }

    /// Whether the unit crossed its final waypoint.
    pub fn reached_base(&self) -> bool {
        self.reached_base
    }

    /// Remaining hit points.
    pub fn hp(&self) -> i32 {
        self.hp
    }

    /// Current position in pixels.
    pub fn position(&self) -> (f32, f32) {
        (self.x, self.y)
    }

    pub(crate) fn distance_to(&self, x: f32, y: f32) -> f32 {
        let dx = x - self.x;
        let dy = y - self.y;
        (dx * dx + dy * dy).sqrt()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn straight_unit(speed: f32, hp: i32) -> SimUnit {
        let path = vec![(0.0, 0.0), (100.0, 0.0), (100.0, 50.0)];
        let mut unit = SimUnit::new(0, PlayerId::A, "standard".into(), path, hp, speed, 0);
        unit.activate();
        unit
    }

    #[test]
    fn moves_speed_times_dt_per_tick() {
        let mut unit = straight_unit(120.0, 10);
        unit.advance(0.05);
        assert_eq!(unit.position(), (6.0, 0.0));
    }

    #[test]
    fn overshoot_carries_into_next_segment() {
        // 10 px to the corner, 6 px/tick: the second tick turns the corner
        // with 2 px carried onto the next segment.
        let path = vec![(0.0, 0.0), (10.0, 0.0), (10.0, 100.0)];
        let mut unit = SimUnit::new(0, PlayerId::A, "standard".into(), path, 10, 120.0, 0);
        unit.activate();
        unit.advance(0.05);
        unit.advance(0.05);
        assert_eq!(unit.position(), (10.0, 2.0));
    }

    #[test]
    fn reaches_base_at_final_waypoint() {
        let mut unit = straight_unit(4000.0, 10);
        unit.advance(0.05);
        assert!(unit.reached_base());
        assert!(!unit.is_active());
    }

    #[test]
    fn lethal_damage_deactivates_without_reaching_base() {
        let mut unit = straight_unit(120.0, 10);
        assert!(!unit.take_damage(7));
        assert!(unit.is_active());
        assert!(unit.take_damage(7));
        assert!(!unit.is_active());
        assert!(!unit.reached_base());
        assert_eq!(unit.hp(), 0);
    }

    #[test]
    fn inactive_unit_does_not_move() {
        let path = vec![(0.0, 0.0), (100.0, 0.0)];
        let mut unit = SimUnit::new(0, PlayerId::B, "standard".into(), path, 10, 120.0, 5);
        unit.advance(0.05);
        assert_eq!(unit.position(), (0.0, 0.0));
    }
}
