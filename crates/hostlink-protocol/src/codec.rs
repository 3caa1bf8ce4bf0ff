//! Tokio codec for length-prefixed broker payloads

use bytes::{Buf, Bytes, BytesMut};
use tokio_util::codec::{Decoder, Encoder};

use crate::error::ProtocolError;
use crate::frame::{encode_command, parse_hex_length, LENGTH_DIGITS};

/// Codec for the broker's length-prefixed frames
///
/// Decodes `HHHH` + payload into the raw payload bytes, and encodes
/// command text into the same framing. One codec instance belongs to one
/// connection; a partially received frame is held across calls until the
/// rest arrives.
#[derive(Debug, Default)]
pub struct PayloadCodec {
    /// Payload length parsed from a prefix whose payload has not fully arrived
    pending_length: Option<usize>,
}

impl PayloadCodec {
    /// Create a new codec
    pub fn new() -> Self {
        Self {
            pending_length: None,
        }
    }
}

impl Decoder for PayloadCodec {
    type Item = Bytes;
    type Error = ProtocolError;

    fn decode(&mut self, src: &mut BytesMut) -> Result<Option<Self::Item>, Self::Error> {
        // Parse the length prefix if we don't have one yet
        let length = match self.pending_length.take() {
            Some(len) => len,
            None => {
                if src.len() < LENGTH_DIGITS {
                    return Ok(None); // Need more data
                }
                let mut digits = [0u8; LENGTH_DIGITS];
                src.copy_to_slice(&mut digits);
                parse_hex_length(&digits)?
            }
        };

        // Wait for the full payload
        if src.len() < length {
            self.pending_length = Some(length);
            return Ok(None);
        }

        Ok(Some(src.split_to(length).freeze()))
    }
}

impl Encoder<&str> for PayloadCodec {
    type Error = ProtocolError;

    fn encode(&mut self, text: &str, dst: &mut BytesMut) -> Result<(), Self::Error> {
        let framed = encode_command(text)?;
        dst.extend_from_slice(&framed);
        Ok(())
    }
}
