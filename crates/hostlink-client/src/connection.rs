//! A single framed connection to the broker
//!
//! Wraps the stream together with the read buffer and codec so framing
//! state never outlives the connection it belongs to. One connection is
//! owned by exactly one logical operation (or by the device tracker) and
//! is not safe for concurrent use.

use std::io;

use bytes::{Buf, Bytes, BytesMut};
use tokio::io::{AsyncReadExt, AsyncWriteExt};
use tokio::net::TcpStream;
use tokio_util::codec::{Decoder, Encoder};

use hostlink_protocol::{PayloadCodec, Status, STATUS_LEN};

use crate::error::{ClientError, Result};

/// Initial read buffer capacity
const READ_BUFFER_CAPACITY: usize = 4096;

/// A live connection to the broker
///
/// Once the broker has answered anything other than OKAY the exchange is
/// over and the connection must be dropped, not reused; every erroring
/// method returns before leaving readable state behind.
pub struct Connection {
    /// The underlying stream
    stream: TcpStream,
    /// Bytes received but not yet consumed by a read operation
    read_buf: BytesMut,
    /// Length-prefix framing state for this connection
    codec: PayloadCodec,
}

impl Connection {
    /// Wrap a freshly connected stream
    pub(crate) fn new(stream: TcpStream) -> Self {
        Self {
            stream,
            read_buf: BytesMut::with_capacity(READ_BUFFER_CAPACITY),
            codec: PayloadCodec::new(),
        }
    }

    /// Send one framed command and flush it
    pub async fn send_command(&mut self, text: &str) -> Result<()> {
        tracing::debug!(command = text, "Sending command");

        let mut buf = BytesMut::new();
        self.codec.encode(text, &mut buf)?;

        self.stream.write_all(&buf).await?;
        self.stream.flush().await?;
        Ok(())
    }

    /// Read the 4-byte status token that opens every reply
    pub async fn read_status(&mut self) -> Result<Status> {
        self.fill_to(STATUS_LEN).await?;
        let mut token = [0u8; STATUS_LEN];
        self.read_buf.copy_to_slice(&mut token);
        Ok(Status::from_bytes(&token)?)
    }

    /// Read the status token and require OKAY
    ///
    /// On FAIL the broker's length-prefixed error text follows; it is read
    /// and surfaced verbatim as [`ClientError::Rejected`].
    pub async fn expect_okay(&mut self) -> Result<()> {
        match self.read_status().await? {
            Status::Okay => Ok(()),
            Status::Fail => {
                let message = self.read_payload().await?;
                tracing::debug!(message = %message, "Broker rejected command");
                Err(ClientError::Rejected { message })
            }
        }
    }

    /// Read one length-prefixed payload as text
    pub async fn read_payload(&mut self) -> Result<String> {
        loop {
            if let Some(payload) = self.codec.decode(&mut self.read_buf)? {
                return Ok(String::from_utf8_lossy(&payload).into_owned());
            }

            let read = self.stream.read_buf(&mut self.read_buf).await?;
            if read == 0 {
                return Err(unexpected_eof("connection closed mid-payload"));
            }
        }
    }

    /// Read everything until the broker closes the connection
    ///
    /// Used for replies with no declared length (shell output). The result
    /// grows as needed; there is no size cap.
    pub async fn read_until_close(&mut self) -> Result<Vec<u8>> {
        let mut out = self.read_buf.split().to_vec();
        self.stream.read_to_end(&mut out).await?;
        Ok(out)
    }

    /// Try to consume one complete notification without blocking
    ///
    /// Drains whatever the socket currently has, then decodes at most one
    /// length-prefixed frame. `Ok(None)` means no complete frame is
    /// buffered; a partial frame stays buffered for the next call. The
    /// broker closing the connection is a connection error.
    pub fn poll_notification(&mut self) -> Result<Option<Bytes>> {
        loop {
            match self.stream.try_read_buf(&mut self.read_buf) {
                Ok(0) => return Err(unexpected_eof("subscription connection closed")),
                Ok(_) => continue,
                Err(e) if e.kind() == io::ErrorKind::WouldBlock => break,
                Err(e) => return Err(e.into()),
            }
        }

        Ok(self.codec.decode(&mut self.read_buf)?)
    }

    /// Read into the buffer until it holds at least `n` bytes
    async fn fill_to(&mut self, n: usize) -> Result<()> {
        while self.read_buf.len() < n {
            let read = self.stream.read_buf(&mut self.read_buf).await?;
            if read == 0 {
                return Err(unexpected_eof("connection closed mid-frame"));
            }
        }
        Ok(())
    }
}

impl std::fmt::Debug for Connection {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Connection")
            .field("peer", &self.stream.peer_addr().ok())
            .field("buffered", &self.read_buf.len())
            .finish()
    }
}

fn unexpected_eof(context: &str) -> ClientError {
    ClientError::Connection(io::Error::new(io::ErrorKind::UnexpectedEof, context))
}
