//! Protocol error types

use thiserror::Error;

/// Errors that can occur while framing or parsing broker traffic
#[derive(Error, Debug)]
pub enum ProtocolError {
    /// Socket-level failure surfaced through the codec traits
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    /// Command text is too long to fit in a 4-hex-digit length prefix
    #[error("Command too long: {len} bytes exceeds maximum of {max} bytes")]
    CommandTooLong { len: usize, max: usize },

    /// The 4-byte status token was neither OKAY nor FAIL
    #[error("Unexpected status token: expected \"OKAY\" or \"FAIL\", got {actual:?}")]
    UnexpectedStatus { actual: String },

    /// The 4-byte length prefix was not valid hexadecimal
    #[error("Invalid length prefix: {text:?} is not a hex integer")]
    InvalidLength { text: String },

    /// A device record in state "device" is missing required fields
    #[error("Malformed device record: {line:?}")]
    MalformedRecord { line: String },
}
