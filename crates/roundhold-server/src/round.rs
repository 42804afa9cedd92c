//! Phase-driven round loop for one match.

use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::{Arc, Mutex};
use std::thread;
use std::time::Duration;

use tracing::{error, info, warn};

use roundhold_protocol::MatchEvent;

use crate::combat::run_combat;
use crate::outbox::{AckGate, Outbox};
use crate::state::GameStateManager;

/// Where a match currently is in its round cycle.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum Phase {
    /// Clients may build and queue. The only phase that accepts mutation.
    Preparation,
    /// Snapshot frozen and being broadcast.
    RoundStart,
    /// Combat running; all mutation requests bounce.
    Combat,
    /// Result broadcast, waiting for both clients to finish rendering.
    AwaitAck,
    /// The match is over; the loop has exited.
    Ended,
}

/// Shared cell holding the current phase.
///
/// The round manager owns the transitions; the game-state manager reads it
/// briefly inside its own critical section. The lock is never held across a
/// sleep or a call into other match state.
#[derive(Debug)]
pub struct PhaseCell {
    phase: Mutex<Phase>,
}

impl PhaseCell {
    /// A new match begins in preparation.
    pub fn new() -> Self {
        Self {
            phase: Mutex::new(Phase::Preparation),
        }
    }

    pub fn set(&self, phase: Phase) {
        *self.phase.lock().expect("phase mutex poisoned") = phase;
    }

    pub fn get(&self) -> Phase {
        *self.phase.lock().expect("phase mutex poisoned")
    }

    pub fn is_preparation(&self) -> bool {
        self.get() == Phase::Preparation
    }
}

impl Default for PhaseCell {
    fn default() -> Self {
        Self::new()
    }
}

/// Granularity of the cooperative preparation sleep.
const PREP_SLEEP_SLICE: Duration = Duration::from_millis(500);

/// Timer-driven round controller: preparation, snapshot broadcast, headless
/// combat, result application, ack gate, repeat.
///
/// One instance per match, consumed by its own thread. `stop()` (via the
/// shared flag) is observed within one sleep slice.
pub struct RoundManager {
    state: Arc<GameStateManager>,
    outboxes: [Arc<Outbox>; 2],
    acks: Arc<AckGate>,
    phase: Arc<PhaseCell>,
    stop: Arc<AtomicBool>,
    prep_duration: Duration,
    ack_timeout: Duration,
    round: u32,
}

impl RoundManager {
    #[allow(clippy::too_many_arguments)]
    pub fn new(
        state: Arc<GameStateManager>,
        outboxes: [Arc<Outbox>; 2],
        acks: Arc<AckGate>,
        phase: Arc<PhaseCell>,
        stop: Arc<AtomicBool>,
        prep_duration: Duration,
        ack_timeout: Duration,
    ) -> Self {
        Self {
            state,
            outboxes,
            acks,
            phase,
            stop,
            prep_duration,
            ack_timeout,
            round: 0,
        }
    }

    fn stopped(&self) -> bool {
        self.stop.load(Ordering::SeqCst)
    }

    /// Sleep through the preparation window in slices, bailing out early on
    /// stop. Returns `false` if stopped.
    fn sleep_preparation(&self) -> bool {
        let mut remaining = self.prep_duration;
        while remaining > Duration::ZERO {
            if self.stopped() {
                return false;
            }
            let slice = remaining.min(PREP_SLEEP_SLICE);
            thread::sleep(slice);
            remaining = remaining.saturating_sub(slice);
        }
        !self.stopped()
    }

    /// Push an event to both outboxes. An overflowing outbox marks the match
    /// unhealthy and stops the loop.
    fn broadcast(&self, event: MatchEvent) {
        for outbox in &self.outboxes {
            if outbox.push(event.clone()).is_err() {
                error!(round = self.round, "outbox overflow, stopping match");
                self.stop.store(true, Ordering::SeqCst);
            }
        }
    }

    /// Drive rounds until the match is decided or stopped.
    pub fn run(mut self) {
        info!(prep_secs = self.prep_duration.as_secs_f64(), "round loop started");

        while !self.stopped() {
            self.round += 1;
            self.phase.set(Phase::Preparation);
            info!(round = self.round, "preparation phase started");

            if !self.sleep_preparation() {
                break;
            }

            self.phase.set(Phase::RoundStart);
            let snapshot = self.state.snapshot();
            info!(
                round = self.round,
                towers = snapshot.towers.len(),
                units = snapshot.units.len(),
                "round starting"
            );
            self.broadcast(MatchEvent::RoundStart {
                simulation_data: snapshot.clone(),
            });

            self.phase.set(Phase::Combat);
            let worker = thread::spawn(move || run_combat(&snapshot));
            let result = match worker.join() {
                Ok(Ok(result)) => result,
                Ok(Err(err)) => {
                    error!(round = self.round, %err, "combat failed, ending match");
                    break;
                }
                Err(_) => {
                    error!(round = self.round, "combat worker panicked, ending match");
                    break;
                }
            };

            self.state.apply_round_result(&result);
            self.state.clear_wave_data();
            let new_state = self.state.summary();

            if let Some(outcome) = self.state.match_outcome() {
                self.broadcast(MatchEvent::RoundResult { result, new_state });
                info!(round = self.round, ?outcome, "match decided");
                break;
            }

            self.phase.set(Phase::AwaitAck);
            self.acks.reset();
            self.broadcast(MatchEvent::RoundResult { result, new_state });
            if !self.acks.wait_both(self.ack_timeout) {
                warn!(round = self.round, "round ack timed out, advancing");
            }
        }

        self.phase.set(Phase::Ended);
        info!(rounds = self.round, "round loop stopped");
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::ServerConfig;
    use roundhold_protocol::PlayerId;

    fn test_config() -> ServerConfig {
        ServerConfig {
            prep_duration: Duration::from_millis(30),
            ack_timeout: Duration::from_millis(60),
            ..ServerConfig::default()
        }
    }

    struct Harness {
        state: Arc<GameStateManager>,
        outboxes: [Arc<Outbox>; 2],
        acks: Arc<AckGate>,
        phase: Arc<PhaseCell>,
        stop: Arc<AtomicBool>,
        thread: thread::JoinHandle<()>,
    }

    fn spawn_round_loop(config: &ServerConfig) -> Harness {
        let phase = Arc::new(PhaseCell::new());
        let state = Arc::new(GameStateManager::new(config, phase.clone()));
        let outboxes = [
            Arc::new(Outbox::new(config.outbox_capacity)),
            Arc::new(Outbox::new(config.outbox_capacity)),
        ];
        let acks = Arc::new(AckGate::new());
        let stop = Arc::new(AtomicBool::new(false));

        let manager = RoundManager::new(
            state.clone(),
            [outboxes[0].clone(), outboxes[1].clone()],
            acks.clone(),
            phase.clone(),
            stop.clone(),
            config.prep_duration,
            config.ack_timeout,
        );
        let thread = thread::spawn(move || manager.run());
        Harness {
            state,
            outboxes,
            acks,
            phase,
            stop,
            thread,
        }
    }

    fn wait_for<E>(outbox: &Outbox, mut pred: impl FnMut(&MatchEvent) -> Option<E>) -> E {
        let deadline = std::time::Instant::now() + Duration::from_secs(5);
        loop {
            for event in outbox.wait_and_drain(Duration::from_millis(50)) {
                if let Some(out) = pred(&event) {
                    return out;
                }
            }
            assert!(
                std::time::Instant::now() < deadline,
                "expected event did not arrive"
            );
        }
    }

    #[test]
    fn empty_round_broadcasts_start_and_zero_result() {
        let harness = spawn_round_loop(&test_config());

        for outbox in &harness.outboxes {
            let (towers, units) = wait_for(outbox, |event| match event {
                MatchEvent::RoundStart { simulation_data } => {
                    Some((simulation_data.towers.len(), simulation_data.units.len()))
                }
                _ => None,
            });
            assert_eq!((towers, units), (0, 0));
        }

        let result = wait_for(&harness.outboxes[0], |event| match event {
            MatchEvent::RoundResult { result, .. } => Some(*result),
            _ => None,
        });
        assert_eq!(result, roundhold_protocol::RoundResult::default());

        harness.stop.store(true, Ordering::SeqCst);
        harness.thread.join().unwrap();
        assert_eq!(harness.phase.get(), Phase::Ended);
    }

    #[test]
    fn acks_advance_to_next_preparation() {
        let harness = spawn_round_loop(&test_config());

        wait_for(&harness.outboxes[0], |event| match event {
            MatchEvent::RoundResult { .. } => Some(()),
            _ => None,
        });
        harness.acks.ack(PlayerId::A);
        harness.acks.ack(PlayerId::B);

        // A second round begins.
        wait_for(&harness.outboxes[0], |event| match event {
            MatchEvent::RoundStart { .. } => Some(()),
            _ => None,
        });

        harness.stop.store(true, Ordering::SeqCst);
        harness.thread.join().unwrap();
    }

    #[test]
    fn ack_timeout_still_advances_and_both_got_the_result() {
        let harness = spawn_round_loop(&test_config());

        wait_for(&harness.outboxes[0], |event| match event {
            MatchEvent::RoundResult { .. } => Some(()),
            _ => None,
        });
        // Only one client acks; the other never does.
        harness.acks.ack(PlayerId::A);

        // The non-acking client still received the result, and the next
        // round begins after the timeout.
        wait_for(&harness.outboxes[1], |event| match event {
            MatchEvent::RoundResult { .. } => Some(()),
            _ => None,
        });
        wait_for(&harness.outboxes[0], |event| match event {
            MatchEvent::RoundStart { .. } => Some(()),
            _ => None,
        });

        harness.stop.store(true, Ordering::SeqCst);
        harness.thread.join().unwrap();
    }

    #[test]
    fn stop_during_preparation_exits_cleanly() {
        let config = ServerConfig {
            prep_duration: Duration::from_secs(60),
            ..test_config()
        };
        let harness = spawn_round_loop(&config);

        // Give the loop a moment to enter preparation, then stop it.
        thread::sleep(Duration::from_millis(20));
        assert_eq!(harness.phase.get(), Phase::Preparation);
        harness.stop.store(true, Ordering::SeqCst);
        harness.thread.join().unwrap();
        assert_eq!(harness.phase.get(), Phase::Ended);
        assert!(harness.state.match_outcome().is_none());
    }

    #[test]
    fn decided_match_emits_final_result_and_ends() {
        let config = ServerConfig {
            start_lives: 1,
            prep_duration: Duration::from_millis(150),
            ..test_config()
        };
        let harness = spawn_round_loop(&config);

        // B floods an undefended lane; A's single life is gone after round 1.
        harness
            .state
            .add_units_to_wave(
                PlayerId::B,
                &[roundhold_protocol::UnitOrder {
                    unit_type: "standard".into(),
                    route: 0,
                    count: 1,
                    spawn_tick: None,
                }],
            )
            .unwrap();

        let new_state = wait_for(&harness.outboxes[1], |event| match event {
            MatchEvent::RoundResult { new_state, .. } => Some(*new_state),
            _ => None,
        });
        assert_eq!(new_state.lives(PlayerId::A), 0);

        harness.thread.join().unwrap();
        assert_eq!(harness.phase.get(), Phase::Ended);
        assert_eq!(
            harness.state.match_outcome(),
            Some(crate::state::MatchOutcome::Winner(PlayerId::B))
        );
    }
}
