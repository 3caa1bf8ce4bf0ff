//! Command framing and status tokens
//!
//! Every outbound command is the command text prefixed by its byte length
//! as 4 uppercase hex digits. Every reply starts with a 4-byte ASCII status
//! token, `OKAY` or `FAIL`.

use bytes::{BufMut, Bytes, BytesMut};

use crate::error::ProtocolError;

/// Number of ASCII hex digits in a length prefix
pub const LENGTH_DIGITS: usize = 4;

/// Number of bytes in a status token
pub const STATUS_LEN: usize = 4;

/// Maximum command length encodable in a 4-hex-digit prefix
pub const MAX_COMMAND_LEN: usize = 0xFFFF;

/// Status token for a successful exchange
pub const OKAY: &[u8; STATUS_LEN] = b"OKAY";

/// Status token for a rejected exchange
pub const FAIL: &[u8; STATUS_LEN] = b"FAIL";

/// Reply status sent by the broker before any payload
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Status {
    /// The broker accepted the command
    Okay,
    /// The broker rejected the command; a length-prefixed error message follows
    Fail,
}

impl Status {
    /// Parse a 4-byte status token
    ///
    /// Any sequence other than `OKAY` or `FAIL` is a protocol violation;
    /// the offending bytes are carried in the error for diagnostics.
    pub fn from_bytes(token: &[u8; STATUS_LEN]) -> Result<Self, ProtocolError> {
        match token {
            t if t == OKAY => Ok(Status::Okay),
            t if t == FAIL => Ok(Status::Fail),
            other => Err(ProtocolError::UnexpectedStatus {
                actual: String::from_utf8_lossy(other).into_owned(),
            }),
        }
    }
}

/// Encode a command as `HHHH` + text, where `HHHH` is the byte length of
/// the text as 4 uppercase hex digits
pub fn encode_command(text: &str) -> Result<Bytes, ProtocolError> {
    let len = text.len();
    if len > MAX_COMMAND_LEN {
        return Err(ProtocolError::CommandTooLong {
            len,
            max: MAX_COMMAND_LEN,
        });
    }

    let mut buf = BytesMut::with_capacity(LENGTH_DIGITS + len);
    buf.put_slice(format!("{:04X}", len).as_bytes());
    buf.put_slice(text.as_bytes());
    Ok(buf.freeze())
}

/// Parse a 4-byte ASCII hex length prefix
pub fn parse_hex_length(digits: &[u8; LENGTH_DIGITS]) -> Result<usize, ProtocolError> {
    let invalid = || ProtocolError::InvalidLength {
        text: String::from_utf8_lossy(digits).into_owned(),
    };

    let text = std::str::from_utf8(digits).map_err(|_| invalid())?;
    usize::from_str_radix(text, 16).map_err(|_| invalid())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_encode_command_exact_bytes() {
        assert_eq!(encode_command("shell:ls").unwrap().as_ref(), b"0008shell:ls");
        assert_eq!(
            encode_command("host:devices-l").unwrap().as_ref(),
            b"000Ehost:devices-l"
        );
    }

    #[test]
    fn test_encode_command_uppercase_padded() {
        // 10 bytes encodes as 000A, not 000a
        let encoded = encode_command("host:kill!").unwrap();
        assert!(encoded.starts_with(b"000A"));
    }

    #[test]
    fn test_encode_command_too_long() {
        let text = "x".repeat(MAX_COMMAND_LEN + 1);
        let result = encode_command(&text);
        assert!(matches!(
            result,
            Err(ProtocolError::CommandTooLong { len, .. }) if len == MAX_COMMAND_LEN + 1
        ));
    }

    #[test]
    fn test_encode_command_max_length() {
        let text = "x".repeat(MAX_COMMAND_LEN);
        let encoded = encode_command(&text).unwrap();
        assert!(encoded.starts_with(b"FFFF"));
        assert_eq!(encoded.len(), LENGTH_DIGITS + MAX_COMMAND_LEN);
    }

    #[test]
    fn test_status_from_bytes() {
        assert_eq!(Status::from_bytes(b"OKAY").unwrap(), Status::Okay);
        assert_eq!(Status::from_bytes(b"FAIL").unwrap(), Status::Fail);
    }

    #[test]
    fn test_status_rejects_other_tokens() {
        let result = Status::from_bytes(b"OK  ");
        assert!(matches!(
            result,
            Err(ProtocolError::UnexpectedStatus { actual }) if actual == "OK  "
        ));
    }

    #[test]
    fn test_parse_hex_length() {
        assert_eq!(parse_hex_length(b"0000").unwrap(), 0);
        assert_eq!(parse_hex_length(b"000E").unwrap(), 14);
        assert_eq!(parse_hex_length(b"FFFF").unwrap(), 0xFFFF);
    }

    #[test]
    fn test_parse_hex_length_invalid() {
        let result = parse_hex_length(b"12G4");
        assert!(matches!(
            result,
            Err(ProtocolError::InvalidLength { text }) if text == "12G4"
        ));
    }
}
