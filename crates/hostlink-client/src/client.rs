//! Broker command client
//!
//! Implements the broker's fixed command vocabulary, one round trip per
//! command. Every command opens its own connection, writes the framed
//! command text, and requires an OKAY status before reading any payload;
//! the two-step commands (transport, subscribe) keep their connection
//! open and hand ownership of it back to the caller.

use hostlink_protocol::{parse_device_list, Device};

use crate::connection::Connection;
use crate::connector::Connector;
use crate::error::Result;

/// Client for the broker's host command set
#[derive(Debug, Clone)]
pub struct HostClient {
    connector: Connector,
}

impl HostClient {
    /// Create a client for the default broker endpoint
    pub fn new() -> Self {
        Self::with_connector(Connector::new())
    }

    /// Create a client using an existing connector
    pub fn with_connector(connector: Connector) -> Self {
        Self { connector }
    }

    /// Get the underlying connector
    pub fn connector(&self) -> &Connector {
        &self.connector
    }

    /// List the devices currently online
    ///
    /// Devices in any state other than fully online (unauthorized,
    /// offline, ...) are not reported.
    pub async fn list_devices(&self) -> Result<Vec<Device>> {
        let mut conn = self.connector.connect().await?;
        conn.send_command("host:devices-l").await?;
        conn.expect_okay().await?;

        let payload = conn.read_payload().await?;
        let devices = parse_device_list(&payload)?;
        tracing::debug!(count = devices.len(), "Listed devices");
        Ok(devices)
    }

    /// Subscribe to device-change notifications
    ///
    /// Returns the live connection; the broker pushes a length-prefixed
    /// notification on it whenever the device set may have changed. The
    /// caller owns the connection for its lifetime.
    pub async fn track_devices(&self) -> Result<Connection> {
        let mut conn = self.connector.connect().await?;
        conn.send_command("host:track-devices").await?;
        conn.expect_okay().await?;
        Ok(conn)
    }

    /// Open a transport scoped to one device
    ///
    /// The returned [`Transport`] is valid for exactly one follow-up
    /// device-scoped command; issuing it consumes the transport.
    pub async fn transport(&self, serial: &str) -> Result<Transport> {
        let mut conn = self.connector.connect().await?;
        conn.send_command(&format!("host:transport:{}", serial))
            .await?;
        conn.expect_okay().await?;
        Ok(Transport { conn })
    }

    /// Run a shell command on a device and collect its full output
    pub async fn shell(&self, serial: &str, cmd: &str) -> Result<String> {
        self.transport(serial).await?.shell(cmd).await
    }

    /// Register a port forward for a device
    ///
    /// `local` and `remote` are the broker's own endpoint specifications
    /// (e.g. `tcp:6100`); they are passed through untouched.
    pub async fn forward(&self, serial: &str, local: &str, remote: &str) -> Result<()> {
        let mut conn = self.connector.connect().await?;
        conn.send_command(&format!("host-serial:{}:forward:{};{}", serial, local, remote))
            .await?;
        conn.expect_okay().await?;
        tracing::debug!(serial, local, remote, "Registered port forward");
        Ok(())
    }
}

impl Default for HostClient {
    fn default() -> Self {
        Self::new()
    }
}

/// A connection scoped to a single device
///
/// Produced by [`HostClient::transport`]; holds the handshake open so the
/// one follow-up command does not redo it. Consuming methods enforce the
/// protocol's "one device-scoped command per transport" rule in the type
/// system.
#[derive(Debug)]
pub struct Transport {
    conn: Connection,
}

impl Transport {
    /// Run a remote shell command, reading output until the broker closes
    /// the connection
    pub async fn shell(mut self, cmd: &str) -> Result<String> {
        self.conn.send_command(&format!("shell:{}", cmd)).await?;
        self.conn.expect_okay().await?;

        let output = self.conn.read_until_close().await?;
        Ok(String::from_utf8_lossy(&output).into_owned())
    }
}
