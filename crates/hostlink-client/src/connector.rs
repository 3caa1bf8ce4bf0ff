//! Connection establishment to the local broker
//!
//! The broker endpoint is an explicit value handed to the connector at
//! construction (never a hidden global) so tests can point it at a mock
//! listener.

use std::io;
use std::net::{IpAddr, Ipv4Addr, SocketAddr};

use tokio::net::TcpStream;

use crate::connection::Connection;
use crate::error::{ClientError, LaunchFailure, Result};

/// Well-known port the broker listens on
pub const DEFAULT_BROKER_PORT: u16 = 5037;

/// The default broker endpoint: loopback at the well-known port
pub fn default_endpoint() -> SocketAddr {
    SocketAddr::new(IpAddr::V4(Ipv4Addr::LOCALHOST), DEFAULT_BROKER_PORT)
}

/// Opens stream connections to the broker
///
/// Each logical operation gets its own fresh connection; the protocol is
/// not session-multiplexed at this layer. The connector never retries;
/// retry policy, if any, belongs to the caller.
#[derive(Debug, Clone)]
pub struct Connector {
    /// Broker endpoint
    endpoint: SocketAddr,
}

impl Connector {
    /// Create a connector for the default loopback endpoint
    pub fn new() -> Self {
        Self::with_endpoint(default_endpoint())
    }

    /// Create a connector for a custom endpoint
    pub fn with_endpoint(endpoint: SocketAddr) -> Self {
        Self { endpoint }
    }

    /// Get the broker endpoint
    pub fn endpoint(&self) -> SocketAddr {
        self.endpoint
    }

    /// Open a fresh connection to the broker
    pub async fn connect(&self) -> Result<Connection> {
        tracing::debug!(endpoint = %self.endpoint, "Connecting to broker");
        let stream = TcpStream::connect(self.endpoint).await?;
        Ok(Connection::new(stream))
    }

    /// Probe the broker, launching it if the connection is refused
    ///
    /// Only an explicit `ConnectionRefused` triggers the launch hook; any
    /// other socket error (reset, timeout, unreachable) propagates
    /// unchanged. The hook is an external collaborator that starts the
    /// broker executable and reports its exit status and stderr on
    /// failure.
    pub async fn ensure_broker_running<F>(&self, launch: F) -> Result<()>
    where
        F: FnOnce() -> std::result::Result<(), LaunchFailure>,
    {
        match TcpStream::connect(self.endpoint).await {
            Ok(_) => Ok(()),
            Err(e) if e.kind() == io::ErrorKind::ConnectionRefused => {
                tracing::debug!(endpoint = %self.endpoint, "Broker not running, launching");
                launch().map_err(ClientError::BrokerLaunch)
            }
            Err(e) => Err(e.into()),
        }
    }
}

impl Default for Connector {
    fn default() -> Self {
        Self::new()
    }
}
