//! UDP transport using renet_netcode.
//!
//! Handles socket binding, authentication and packet pumping. LAN play uses
//! unsecure netcode authentication; the protocol id pins client and server
//! to the same wire contract.

use std::net::{SocketAddr, UdpSocket};
use std::time::{Duration, SystemTime, UNIX_EPOCH};

use renet::{ChannelConfig, RenetServer, SendType};
use renet_netcode::{NetcodeServerTransport, ServerAuthentication, ServerConfig};
use thiserror::Error;
use tracing::{error, info};

/// Protocol id (must match clients).
pub const PROTOCOL_ID: u64 = 0x0521_0AD0_1D01;

/// Channel ids for the two traffic kinds.
pub mod channel_id {
    /// Client requests and their unary replies. Reliable, ordered.
    pub const COMMANDS: u8 = 0;
    /// Server-streamed match events (the per-client outbox). Reliable,
    /// ordered — outbox ordering survives the wire.
    pub const EVENTS: u8 = 1;
}

/// Maximum bytes buffered per channel.
const MAX_CHANNEL_MEMORY: usize = 5 * 1024 * 1024;

/// Channel configurations shared by server and client endpoints.
pub fn create_channel_configs() -> Vec<ChannelConfig> {
    vec![
        ChannelConfig {
            channel_id: channel_id::COMMANDS,
            max_memory_usage_bytes: MAX_CHANNEL_MEMORY,
            send_type: SendType::ReliableOrdered {
                resend_time: Duration::from_millis(300),
            },
        },
        ChannelConfig {
            channel_id: channel_id::EVENTS,
            max_memory_usage_bytes: MAX_CHANNEL_MEMORY,
            send_type: SendType::ReliableOrdered {
                resend_time: Duration::from_millis(300),
            },
        },
    ]
}

/// Server transport configuration.
pub struct TransportConfig {
    /// Address clients connect to.
    pub public_address: SocketAddr,
    /// Maximum concurrent clients.
    pub max_clients: usize,
}

/// Transport setup failure.
#[derive(Debug, Error)]
pub enum TransportError {
    #[error("failed to bind socket to {0}: {1}")]
    BindFailed(SocketAddr, std::io::Error),
    #[error("failed to determine bound address for {0}: {1}")]
    LocalAddrFailed(SocketAddr, std::io::Error),
    #[error("failed to configure socket: {0}")]
    SocketConfig(std::io::Error),
    #[error("failed to create transport: {0}")]
    TransportCreation(String),
}

/// Create the netcode transport bound to the configured address.
pub fn create_server_transport(
    config: TransportConfig,
) -> Result<NetcodeServerTransport, TransportError> {
    let socket = UdpSocket::bind(config.public_address)
        .map_err(|e| TransportError::BindFailed(config.public_address, e))?;

    let bound_addr = socket
        .local_addr()
        .map_err(|e| TransportError::LocalAddrFailed(config.public_address, e))?;

    socket
        .set_nonblocking(true)
        .map_err(TransportError::SocketConfig)?;

    let current_time = SystemTime::now()
        .duration_since(UNIX_EPOCH)
        .expect("system clock before unix epoch");

    let server_config = ServerConfig {
        current_time,
        max_clients: config.max_clients,
        protocol_id: PROTOCOL_ID,
        public_addresses: vec![bound_addr],
        // LAN server: no connect-token infrastructure.
        authentication: ServerAuthentication::Unsecure,
    };

    let transport = NetcodeServerTransport::new(server_config, socket)
        .map_err(|e| TransportError::TransportCreation(e.to_string()))?;

    info!(
        "transport bound to {} (max {} clients, protocol {:016x})",
        config.public_address, config.max_clients, PROTOCOL_ID
    );

    Ok(transport)
}

/// Owns the netcode transport and pumps it against a `RenetServer`.
pub struct ServerRunner {
    transport: NetcodeServerTransport,
}

impl ServerRunner {
    pub fn new(config: TransportConfig) -> Result<Self, TransportError> {
        let transport = create_server_transport(config)?;
        Ok(Self { transport })
    }

    /// One tick of the transport layer: receive, then flush.
    pub fn update(&mut self, renet_server: &mut RenetServer) {
        let current_time = SystemTime::now()
            .duration_since(UNIX_EPOCH)
            .expect("system clock before unix epoch");

        if let Err(e) = self.transport.update(current_time, renet_server) {
            error!("transport update error: {}", e);
        }

        self.transport.send_packets(renet_server);
    }

    /// The bound address.
    pub fn local_addr(&self) -> Option<SocketAddr> {
        self.transport.addresses().first().copied()
    }
}
