//! hostlink-protocol: Wire protocol for the hostlink device broker
//!
//! This crate defines the framing used between the client and the local
//! device broker: 4-hex-digit length-prefixed command text outbound, a
//! 4-byte `OKAY`/`FAIL` status plus length-prefixed payloads inbound, and
//! the line grammar of `devices-l` replies. It contains no I/O; the client
//! crate drives it against live connections.

pub mod codec;
pub mod device;
pub mod error;
pub mod frame;

pub use codec::PayloadCodec;
pub use device::{parse_device_list, Device};
pub use error::ProtocolError;
pub use frame::{
    encode_command, parse_hex_length, Status, FAIL, LENGTH_DIGITS, MAX_COMMAND_LEN, OKAY,
    STATUS_LEN,
};
