//! Roundhold authoritative server binary.
//!
//! Network loop at ~60 Hz: pump the transport, dispatch client requests to
//! the match server, drain every client's outbox into its event channel.

use std::time::{Duration, Instant};

use renet::{ConnectionConfig, RenetServer, ServerEvent};
use tracing::{info, warn};

use roundhold_protocol::wire::{deserialize_client_message, serialize_server_message};
use roundhold_protocol::ServerMessage;
use roundhold_server::transport::{channel_id, create_channel_configs};
use roundhold_server::{MatchServer, ServerConfig, ServerRunner, TransportConfig, PROTOCOL_ID};

struct Server {
    renet: RenetServer,
    matches: MatchServer,
}

impl Server {
    fn new(config: ServerConfig) -> Self {
        let connection_config = ConnectionConfig {
            available_bytes_per_tick: 60_000,
            server_channels_config: create_channel_configs(),
            client_channels_config: create_channel_configs(),
        };

        Self {
            renet: RenetServer::new(connection_config),
            matches: MatchServer::new(config),
        }
    }

    /// One tick of server logic: connection events, requests, outbox pump.
    fn update(&mut self) {
        while let Some(event) = self.renet.get_event() {
            match event {
                ServerEvent::ClientConnected { client_id } => {
                    info!(client_id, "client connected");
                }
                ServerEvent::ClientDisconnected { client_id, reason } => {
                    info!(client_id, ?reason, "client disconnected");
                    self.matches.disconnect(client_id);
                }
            }
        }

        for client_id in self.renet.clients_id() {
            while let Some(data) = self.renet.receive_message(client_id, channel_id::COMMANDS) {
                self.handle_client_message(client_id, &data);
            }
        }

        self.pump_outboxes();
    }

    fn handle_client_message(&mut self, client_id: u64, data: &[u8]) {
        let message = match deserialize_client_message(data) {
            Ok(message) => message,
            Err(e) => {
                warn!(client_id, %e, "undecodable message dropped");
                return;
            }
        };

        if let Some(reply) = self.matches.handle_message(client_id, message) {
            self.send_message(client_id, channel_id::COMMANDS, &reply);
        }
    }

    /// Move buffered match events onto each client's event channel, in
    /// outbox order.
    fn pump_outboxes(&mut self) {
        for client_id in self.renet.clients_id() {
            for event in self.matches.drain_outbox(client_id) {
                let message = ServerMessage::Event { event };
                self.send_message(client_id, channel_id::EVENTS, &message);
            }
        }
    }

    fn send_message(&mut self, client_id: u64, channel: u8, message: &ServerMessage) {
        match serialize_server_message(message) {
            Ok(data) => self.renet.send_message(client_id, channel, data),
            Err(e) => warn!(client_id, %e, "failed to encode server message"),
        }
    }
}

fn main() {
    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| "roundhold_server=info".into()),
        )
        .init();

    let config = ServerConfig::default();

    let transport_config = TransportConfig {
        public_address: config.bind_address,
        max_clients: config.max_clients,
    };
    let mut transport = match ServerRunner::new(transport_config) {
        Ok(transport) => transport,
        Err(e) => {
            tracing::error!("failed to create transport: {}", e);
            std::process::exit(1);
        }
    };

    info!("Roundhold server v{}", env!("CARGO_PKG_VERSION"));
    info!("listening on {}", config.bind_address);
    info!("protocol id: {:016x}", PROTOCOL_ID);

    let mut server = Server::new(config);

    let tick_duration = Duration::from_millis(16);
    loop {
        let start = Instant::now();

        transport.update(&mut server.renet);
        server.update();

        let elapsed = start.elapsed();
        if let Some(sleep_time) = tick_duration.checked_sub(elapsed) {
            std::thread::sleep(sleep_time);
        }
    }
}
