//! Per-client event outbox and the round-ack gate.

use std::collections::VecDeque;
use std::sync::{Condvar, Mutex};
use std::time::{Duration, Instant};

use thiserror::Error;

use roundhold_protocol::{MatchEvent, PlayerId};

/// The outbox hit its capacity; the consumer is not draining.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Error)]
#[error("outbox is full")]
pub struct OutboxFull;

/// Bounded FIFO of match events for one client.
///
/// Producers (the round loop, build broadcasts) push under the internal lock
/// and signal; the client's stream drains everything in order. Ordering is
/// preserved within one outbox only — no cross-client guarantee. A full
/// outbox means the consumer is gone or wedged, and the match is torn down.
#[derive(Debug)]
pub struct Outbox {
    events: Mutex<VecDeque<MatchEvent>>,
    ready: Condvar,
    capacity: usize,
}

impl Outbox {
    pub fn new(capacity: usize) -> Self {
        Self {
            events: Mutex::new(VecDeque::new()),
            ready: Condvar::new(),
            capacity,
        }
    }

    /// Append an event and wake the consumer.
    pub fn push(&self, event: MatchEvent) -> Result<(), OutboxFull> {
        let mut events = self.events.lock().expect("outbox mutex poisoned");
        if events.len() >= self.capacity {
            return Err(OutboxFull);
        }
        events.push_back(event);
        self.ready.notify_all();
        Ok(())
    }

    /// Take all buffered events without blocking.
    pub fn drain(&self) -> Vec<MatchEvent> {
        let mut events = self.events.lock().expect("outbox mutex poisoned");
        events.drain(..).collect()
    }

    /// Block until at least one event is buffered or the timeout elapses,
    /// then take everything. An empty result means timeout.
    pub fn wait_and_drain(&self, timeout: Duration) -> Vec<MatchEvent> {
        let deadline = Instant::now() + timeout;
        let mut events = self.events.lock().expect("outbox mutex poisoned");
        while events.is_empty() {
            let Some(remaining) = deadline.checked_duration_since(Instant::now()) else {
                return Vec::new();
            };
            let (guard, _timed_out) = self
                .ready
                .wait_timeout(events, remaining)
                .expect("outbox mutex poisoned");
            events = guard;
        }
        events.drain(..).collect()
    }

    /// Buffered event count.
    pub fn len(&self) -> usize {
        self.events.lock().expect("outbox mutex poisoned").len()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }
}

/// Latch for the two per-round acknowledgements.
///
/// Reset at the start of every ack wait; duplicate acks from the same player
/// collapse into one.
#[derive(Debug, Default)]
pub struct AckGate {
    acked: Mutex<[bool; 2]>,
    both: Condvar,
}

impl AckGate {
    pub fn new() -> Self {
        Self::default()
    }

    /// Clear both latches for the next round.
    pub fn reset(&self) {
        *self.acked.lock().expect("ack mutex poisoned") = [false, false];
    }

    /// Record a player's ack. Idempotent.
    pub fn ack(&self, player: PlayerId) {
        let mut acked = self.acked.lock().expect("ack mutex poisoned");
        acked[player.index()] = true;
        if acked.iter().all(|&a| a) {
            self.both.notify_all();
        }
    }

    /// Wait until both players have acked or the timeout elapses.
    /// Returns `false` on timeout.
    pub fn wait_both(&self, timeout: Duration) -> bool {
        let deadline = Instant::now() + timeout;
        let mut acked = self.acked.lock().expect("ack mutex poisoned");
        while !acked.iter().all(|&a| a) {
            let Some(remaining) = deadline.checked_duration_since(Instant::now()) else {
                return false;
            };
            let (guard, _timed_out) = self
                .both
                .wait_timeout(acked, remaining)
                .expect("ack mutex poisoned");
            acked = guard;
        }
        true
    }
}
