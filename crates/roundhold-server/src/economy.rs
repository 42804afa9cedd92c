//! Per-player gold and lives.

use roundhold_protocol::{ActionError, PlayerId, RoundResult, StateSummary};

/// Gold and lives for both players of one match.
///
/// Counters are unsigned and lives saturate at zero, so the non-negativity
/// invariants hold by construction. All calls happen under the
/// [`crate::state::GameStateManager`] mutex.
#[derive(Clone, Debug)]
pub struct Economy {
    gold: [u32; 2],
    lives: [u32; 2],
}

impl Economy {
    pub fn new(start_gold: u32, start_lives: u32) -> Self {
        Self {
            gold: [start_gold; 2],
            lives: [start_lives; 2],
        }
    }

    pub fn gold(&self, player: PlayerId) -> u32 {
        self.gold[player.index()]
    }

    pub fn lives(&self, player: PlayerId) -> u32 {
        self.lives[player.index()]
    }

    /// Whether the player can afford `amount`.
    pub fn can_spend(&self, player: PlayerId, amount: u32) -> bool {
        self.gold[player.index()] >= amount
    }

    /// Deduct gold, failing without any change if the balance is too low.
    pub fn spend_gold(&mut self, player: PlayerId, amount: u32) -> Result<(), ActionError> {
        let gold = &mut self.gold[player.index()];
        if *gold < amount {
            return Err(ActionError::InsufficientGold);
        }
        *gold -= amount;
        Ok(())
    }

    pub fn add_gold(&mut self, player: PlayerId, amount: u32) {
        self.gold[player.index()] += amount;
    }

    /// Remove lives, saturating at zero.
    pub fn lose_lives(&mut self, player: PlayerId, amount: u32) {
        let lives = &mut self.lives[player.index()];
        *lives = lives.saturating_sub(amount);
    }

    /// Single entry point for end-of-round bookkeeping on both players.
    pub fn apply_round_result(&mut self, result: &RoundResult) {
        for player in PlayerId::BOTH {
            self.lose_lives(player, result.lives_lost(player));
            self.add_gold(player, result.gold_earned(player));
        }
    }

    /// Current totals for broadcasting.
    pub fn summary(&self) -> StateSummary {
        StateSummary {
            gold_a: self.gold(PlayerId::A),
            lives_a: self.lives(PlayerId::A),
            gold_b: self.gold(PlayerId::B),
            lives_b: self.lives(PlayerId::B),
        }
    }
}
