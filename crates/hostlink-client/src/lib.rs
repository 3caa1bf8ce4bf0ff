//! hostlink-client: Command client and device tracker for the local
//! device broker
//!
//! Talks the broker's line-oriented, length-prefixed host protocol over
//! loopback TCP: enumerate devices, open per-device transports, run
//! remote shell commands, register port forwards, and track attach/detach
//! events from the broker's change-notification stream.
//!
//! The crate performs no background work of its own: commands are one
//! awaited round trip each, and the tracker is driven entirely by the
//! caller's poll loop.

pub mod client;
pub mod connection;
pub mod connector;
pub mod error;
pub mod tracker;

pub use client::{HostClient, Transport};
pub use connection::Connection;
pub use connector::{default_endpoint, Connector, DEFAULT_BROKER_PORT};
pub use error::{ClientError, LaunchFailure};
pub use tracker::{DeviceEvent, DeviceSnapshot, DeviceTracker};

// Re-export the protocol surface callers interact with directly
pub use hostlink_protocol::{Device, ProtocolError};
