//! Client error types

use thiserror::Error;

use hostlink_protocol::ProtocolError;

/// Outcome of a failed broker launch attempt
///
/// Produced by the externally supplied launch hook passed to
/// [`Connector::ensure_broker_running`](crate::Connector::ensure_broker_running);
/// carries whatever the launcher captured from the broker executable.
#[derive(Debug, Clone)]
pub struct LaunchFailure {
    /// Exit code of the broker executable, if it ran at all
    pub exit_code: Option<i32>,
    /// Captured standard error output
    pub stderr: String,
}

impl std::fmt::Display for LaunchFailure {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self.exit_code {
            Some(code) => write!(f, "broker exited with code {}: {}", code, self.stderr),
            None => write!(f, "broker failed to start: {}", self.stderr),
        }
    }
}

/// Errors surfaced by broker commands and the device tracker
///
/// Every failure aborts the in-flight operation; nothing here is retried
/// internally.
#[derive(Error, Debug)]
pub enum ClientError {
    /// Socket-level failure: refused, reset, or closed mid-exchange
    #[error("Connection error: {0}")]
    Connection(#[from] std::io::Error),

    /// The broker sent bytes that violate the wire protocol
    #[error("Protocol violation: {0}")]
    Protocol(#[from] ProtocolError),

    /// The broker answered FAIL; `message` is its own error text, verbatim
    #[error("Rejected by broker: {message}")]
    Rejected { message: String },

    /// The launch hook could not start the broker
    #[error("Broker launch failed: {0}")]
    BrokerLaunch(LaunchFailure),

    /// The tracker's subscription connection is gone; the tracker is
    /// permanently failed and a new one must be constructed
    #[error("Device subscription lost; construct a new tracker")]
    SubscriptionLost,
}

/// Convenience alias used throughout the client crate
pub type Result<T> = std::result::Result<T, ClientError>;
