//! Matchmaking queue, match registry and the client request handlers.

use std::collections::HashMap;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::{Arc, Mutex};
use std::thread;

use tracing::{info, warn};

use roundhold_protocol::map::mirror_tile;
use roundhold_protocol::{
    ActionError, ActionKind, ClientMessage, MatchEvent, PlayerId, ServerMessage, TowerPlacement,
    UnitOrder,
};

use crate::config::ServerConfig;
use crate::outbox::{AckGate, Outbox};
use crate::round::{PhaseCell, RoundManager};
use crate::state::GameStateManager;

/// Everything shared about one active match.
pub struct MatchHandle {
    pub match_id: u64,
    clients: [u64; 2],
    names: [String; 2],
    pub state: Arc<GameStateManager>,
    outboxes: [Arc<Outbox>; 2],
    pub acks: Arc<AckGate>,
    pub phase: Arc<PhaseCell>,
    stop: Arc<AtomicBool>,
}

impl MatchHandle {
    /// Which side a transport client plays, if it belongs to this match.
    pub fn player_of(&self, client_id: u64) -> Option<PlayerId> {
        PlayerId::BOTH
            .into_iter()
            .find(|player| self.clients[player.index()] == client_id)
    }

    /// The outbox streamed to the given player.
    pub fn outbox(&self, player: PlayerId) -> &Arc<Outbox> {
        &self.outboxes[player.index()]
    }

    /// Opponent's display name for the given player.
    pub fn opponent_name(&self, player: PlayerId) -> &str {
        &self.names[player.opponent().index()]
    }

    fn signal_stop(&self) {
        self.stop.store(true, Ordering::SeqCst);
    }
}

#[derive(Clone)]
struct WaitingClient {
    client_id: u64,
    name: String,
}

#[derive(Default)]
struct Registry {
    waiting: Vec<WaitingClient>,
    matches: HashMap<u64, Arc<MatchHandle>>,
    by_client: HashMap<u64, u64>,
    /// Event streams by client. A stream outlives its match so that final
    /// events (like `OpponentDisconnected`) still reach the survivor; it is
    /// dropped only when that client itself disconnects.
    streams: HashMap<u64, Arc<Outbox>>,
    next_match_id: u64,
}

/// The server's top-level state: a single waiting room and the table of
/// active matches.
///
/// One lock (`registry`) guards matchmaking; per-match state has its own
/// locks. Lock order is registry → outbox → game state → phase, never
/// reversed. Handlers clone the `Arc<MatchHandle>` out of the registry and
/// release the registry lock before touching match state.
pub struct MatchServer {
    config: ServerConfig,
    registry: Mutex<Registry>,
}

impl MatchServer {
    pub fn new(config: ServerConfig) -> Self {
        Self {
            config,
            registry: Mutex::new(Registry::default()),
        }
    }

    fn registry(&self) -> std::sync::MutexGuard<'_, Registry> {
        self.registry.lock().expect("match registry mutex poisoned")
    }

    /// Dispatch one wire message. Mutating requests get an `ActionReply`;
    /// `QueueForMatch` answers through the event stream instead.
    pub fn handle_message(&self, client_id: u64, message: ClientMessage) -> Option<ServerMessage> {
        match message {
            ClientMessage::QueueForMatch { player_name } => {
                self.queue_for_match(client_id, player_name);
                None
            }
            ClientMessage::BuildTower {
                tower_type,
                tile_row,
                tile_col,
            } => Some(match self.build_tower(client_id, &tower_type, tile_row, tile_col) {
                Ok(_) => ServerMessage::ok(ActionKind::BuildTower),
                Err(err) => ServerMessage::rejected(ActionKind::BuildTower, err),
            }),
            ClientMessage::SendUnits { units } => Some(match self.send_units(client_id, &units) {
                Ok(()) => ServerMessage::ok(ActionKind::SendUnits),
                Err(err) => ServerMessage::rejected(ActionKind::SendUnits, err),
            }),
            ClientMessage::RoundAck => Some(match self.round_ack(client_id) {
                Ok(()) => ServerMessage::ok(ActionKind::RoundAck),
                Err(err) => ServerMessage::rejected(ActionKind::RoundAck, err),
            }),
        }
    }

    /// Enter the waiting room; when a second client is waiting, pair them
    /// and start the match.
    pub fn queue_for_match(&self, client_id: u64, name: String) {
        let mut registry = self.registry();
        if registry.by_client.contains_key(&client_id)
            || registry.waiting.iter().any(|w| w.client_id == client_id)
        {
            warn!(client_id, "client queued twice, ignoring");
            return;
        }

        info!(client_id, %name, "client joined the waiting room");
        registry.waiting.push(WaitingClient { client_id, name });

        if registry.waiting.len() >= 2 {
            let first = registry.waiting.remove(0);
            let second = registry.waiting.remove(0);
            self.start_match(&mut registry, first, second);
        }
    }

    fn start_match(&self, registry: &mut Registry, first: WaitingClient, second: WaitingClient) {
        let match_id = registry.next_match_id;
        registry.next_match_id += 1;

        let phase = Arc::new(PhaseCell::new());
        let state = Arc::new(GameStateManager::new(&self.config, phase.clone()));
        let outboxes = [
            Arc::new(Outbox::new(self.config.outbox_capacity)),
            Arc::new(Outbox::new(self.config.outbox_capacity)),
        ];
        let acks = Arc::new(AckGate::new());
        let stop = Arc::new(AtomicBool::new(false));

        let handle = Arc::new(MatchHandle {
            match_id,
            clients: [first.client_id, second.client_id],
            names: [first.name.clone(), second.name.clone()],
            state: state.clone(),
            outboxes: [outboxes[0].clone(), outboxes[1].clone()],
            acks: acks.clone(),
            phase: phase.clone(),
            stop: stop.clone(),
        });

        let initial_state = state.summary();
        for player in PlayerId::BOTH {
            let found = MatchEvent::MatchFound {
                player_id: player,
                opponent: handle.opponent_name(player).to_owned(),
                initial_state,
            };
            // Fresh outbox; cannot be full.
            let _ = handle.outbox(player).push(found);
        }

        registry.by_client.insert(first.client_id, match_id);
        registry.by_client.insert(second.client_id, match_id);
        registry.streams.insert(first.client_id, outboxes[0].clone());
        registry.streams.insert(second.client_id, outboxes[1].clone());
        registry.matches.insert(match_id, handle);

        info!(
            match_id,
            player_a = %first.name,
            player_b = %second.name,
            "match found, starting round loop"
        );

        let round_manager = RoundManager::new(
            state,
            [outboxes[0].clone(), outboxes[1].clone()],
            acks,
            phase,
            stop,
            self.config.prep_duration,
            self.config.ack_timeout,
        );
        let _ = thread::Builder::new()
            .name(format!("round-loop-{match_id}"))
            .spawn(move || round_manager.run());
    }

    /// The match a client currently plays in.
    pub fn find_match(&self, client_id: u64) -> Option<Arc<MatchHandle>> {
        let registry = self.registry();
        let match_id = registry.by_client.get(&client_id)?;
        registry.matches.get(match_id).cloned()
    }

    fn match_and_player(
        &self,
        client_id: u64,
    ) -> Result<(Arc<MatchHandle>, PlayerId), ActionError> {
        let handle = self.find_match(client_id).ok_or(ActionError::NotInMatch)?;
        let player = handle.player_of(client_id).ok_or(ActionError::Internal)?;
        Ok((handle, player))
    }

    /// Place a tower for the sending client, mirroring player B's view into
    /// the local frame; on success, broadcast `TowerPlaced` to both clients.
    pub fn build_tower(
        &self,
        client_id: u64,
        tower_type: &str,
        tile_row: u16,
        tile_col: u16,
    ) -> Result<TowerPlacement, ActionError> {
        let (handle, player) = self.match_and_player(client_id)?;
        let (tile_row, tile_col) = match player {
            PlayerId::A => (tile_row, tile_col),
            PlayerId::B => mirror_tile(tile_row, tile_col),
        };

        let placement = handle
            .state
            .build_tower(player, tower_type, tile_row, tile_col)?;

        let mut overflow = false;
        for side in PlayerId::BOTH {
            let event = MatchEvent::TowerPlaced {
                placement: placement.clone(),
            };
            if handle.outbox(side).push(event).is_err() {
                overflow = true;
            }
        }
        if overflow {
            warn!(match_id = handle.match_id, "outbox overflow, tearing match down");
            self.teardown(&handle);
        }
        Ok(placement)
    }

    /// Queue units for the sending client's next wave. Not broadcast — the
    /// wave's composition is revealed by `RoundStart` only.
    pub fn send_units(&self, client_id: u64, units: &[UnitOrder]) -> Result<(), ActionError> {
        let (handle, player) = self.match_and_player(client_id)?;
        handle.state.add_units_to_wave(player, units)
    }

    /// Record the sending client's round ack.
    pub fn round_ack(&self, client_id: u64) -> Result<(), ActionError> {
        let (handle, player) = self.match_and_player(client_id)?;
        handle.acks.ack(player);
        Ok(())
    }

    /// Drain pending events for one client without blocking. Used by the
    /// network loop to feed the event stream.
    pub fn drain_outbox(&self, client_id: u64) -> Vec<MatchEvent> {
        let stream = self.registry().streams.get(&client_id).cloned();
        match stream {
            Some(outbox) => outbox.drain(),
            None => Vec::new(),
        }
    }

    /// Handle a transport-level disconnect: drop a waiting client silently;
    /// for an active match, notify the partner and tear the match down.
    pub fn disconnect(&self, client_id: u64) {
        let handle = {
            let mut registry = self.registry();
            registry.waiting.retain(|w| w.client_id != client_id);
            registry.streams.remove(&client_id);
            registry
                .by_client
                .get(&client_id)
                .copied()
                .and_then(|match_id| registry.matches.get(&match_id).cloned())
        };

        let Some(handle) = handle else {
            return;
        };
        let Some(player) = handle.player_of(client_id) else {
            return;
        };

        info!(
            match_id = handle.match_id,
            %player,
            "client disconnected, ending match"
        );
        let partner = player.opponent();
        if handle.outbox(partner).push(MatchEvent::OpponentDisconnected).is_err() {
            warn!(match_id = handle.match_id, "partner outbox full during teardown");
        }
        self.teardown(&handle);
    }

    fn teardown(&self, handle: &MatchHandle) {
        handle.signal_stop();
        let mut registry = self.registry();
        registry.matches.remove(&handle.match_id);
        for client in handle.clients {
            registry.by_client.remove(&client);
        }
    }

    /// Number of matches currently running.
    pub fn active_matches(&self) -> usize {
        self.registry().matches.len()
    }

    /// Number of clients in the waiting room.
    pub fn waiting_clients(&self) -> usize {
        self.registry().waiting.len()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::time::Duration;

    fn test_server() -> MatchServer {
        MatchServer::new(ServerConfig {
            prep_duration: Duration::from_millis(200),
            ack_timeout: Duration::from_millis(100),
            ..ServerConfig::default()
        })
    }

    #[test]
    fn lone_client_waits() {
        let server = test_server();
        server.queue_for_match(1, "Alice".into());
        assert_eq!(server.waiting_clients(), 1);
        assert_eq!(server.active_matches(), 0);
        assert!(server.find_match(1).is_none());
        server.disconnect(1);
        assert_eq!(server.waiting_clients(), 0);
    }

    #[test]
    fn pairing_assigns_roles_in_queue_order() {
        let server = test_server();
        server.queue_for_match(1, "Alice".into());
        server.queue_for_match(2, "Bob".into());
        assert_eq!(server.active_matches(), 1);

        let handle = server.find_match(1).unwrap();
        assert_eq!(handle.player_of(1), Some(PlayerId::A));
        assert_eq!(handle.player_of(2), Some(PlayerId::B));
        assert_eq!(handle.opponent_name(PlayerId::A), "Bob");

        server.disconnect(1);
    }

    #[test]
    fn double_queue_is_ignored() {
        let server = test_server();
        server.queue_for_match(1, "Alice".into());
        server.queue_for_match(1, "Alice".into());
        assert_eq!(server.waiting_clients(), 1);

        server.queue_for_match(2, "Bob".into());
        assert_eq!(server.active_matches(), 1);
        // Queueing again while in a match changes nothing.
        server.queue_for_match(1, "Alice".into());
        assert_eq!(server.waiting_clients(), 0);
        server.disconnect(2);
    }

    #[test]
    fn actions_without_a_match_are_rejected() {
        let server = test_server();
        assert_eq!(
            server.build_tower(7, "standard", 5, 3).unwrap_err(),
            ActionError::NotInMatch
        );
        assert_eq!(server.round_ack(7).unwrap_err(), ActionError::NotInMatch);
    }

    #[test]
    fn player_b_coordinates_are_mirrored() {
        let server = test_server();
        server.queue_for_match(1, "Alice".into());
        server.queue_for_match(2, "Bob".into());

        // B builds at its own view of (5, 3); the local frame stores the
        // column flipped.
        let placement = server.build_tower(2, "standard", 5, 3).unwrap();
        assert_eq!(placement.player, PlayerId::B);
        let (expected_row, expected_col) = mirror_tile(5, 3);
        assert_eq!((placement.tile_row, placement.tile_col), (expected_row, expected_col));

        server.disconnect(1);
    }

    #[test]
    fn tower_placed_is_broadcast_to_both() {
        let server = test_server();
        server.queue_for_match(1, "Alice".into());
        server.queue_for_match(2, "Bob".into());
        server.build_tower(1, "standard", 5, 3).unwrap();

        for client in [1, 2] {
            let events = server.drain_outbox(client);
            assert!(
                events
                    .iter()
                    .any(|e| matches!(e, MatchEvent::TowerPlaced { .. })),
                "client {client} missed the broadcast"
            );
        }
        server.disconnect(2);
    }

    #[test]
    fn match_found_arrives_first_with_roles() {
        let server = test_server();
        server.queue_for_match(1, "Alice".into());
        server.queue_for_match(2, "Bob".into());

        let events = server.drain_outbox(2);
        match events.first() {
            Some(MatchEvent::MatchFound {
                player_id,
                opponent,
                initial_state,
            }) => {
                assert_eq!(*player_id, PlayerId::B);
                assert_eq!(opponent, "Alice");
                assert_eq!(initial_state.lives(PlayerId::B), 20);
            }
            other => panic!("expected MatchFound first, got {other:?}"),
        }
        server.disconnect(1);
    }

    #[test]
    fn disconnect_notifies_partner_and_clears_registry() {
        let server = test_server();
        server.queue_for_match(1, "Alice".into());
        server.queue_for_match(2, "Bob".into());
        assert!(server.find_match(2).is_some());

        server.disconnect(1);
        assert_eq!(server.active_matches(), 0);
        assert!(server.find_match(2).is_none());

        // The survivor's stream outlives the match and still delivers the
        // final event through the normal drain path.
        let events = server.drain_outbox(2);
        assert!(events
            .iter()
            .any(|e| matches!(e, MatchEvent::OpponentDisconnected)));
    }
}
