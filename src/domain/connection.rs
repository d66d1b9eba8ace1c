//! Transport seam used by the [`super::Bridge`].
//!
//! A [`Connection`] is an already-accepted duplex stream. The bridge only
//! needs three things from it: pull the next inbound frame (which it
//! discards), push one [`Message`] out, and close.

use async_trait::async_trait;

use super::Message;

/// Failures raised by a [`Connection`].
#[derive(Debug, thiserror::Error)]
pub enum TransportError {
    /// The peer is gone or the connection was already closed.
    #[error("connection closed")]
    Closed,

    /// Reading from the connection failed.
    #[error("read failed: {0}")]
    Read(String),

    /// Writing to the connection failed.
    #[error("write failed: {0}")]
    Write(String),

    /// The message could not be encoded for the wire.
    #[error("encode failed: {0}")]
    Encode(#[from] serde_json::Error),
}

/// A long-lived duplex connection to one subscriber.
///
/// `recv` and `send` are called concurrently from two different tasks, so
/// implementations must not hold a shared lock across both directions.
#[async_trait]
pub trait Connection: Send + Sync + 'static {
    /// Waits for the next inbound frame and returns its size in bytes.
    ///
    /// Returns `Ok(None)` once the peer has closed its side.
    ///
    /// # Errors
    ///
    /// Returns [`TransportError`] if the underlying read fails.
    async fn recv(&self) -> Result<Option<usize>, TransportError>;

    /// Encodes and writes one message.
    ///
    /// # Errors
    ///
    /// Returns [`TransportError`] if the message cannot be encoded or the
    /// peer can no longer be written to.
    async fn send(&self, message: &Message) -> Result<(), TransportError>;

    /// Closes the connection. Closing twice must be harmless.
    ///
    /// # Errors
    ///
    /// Returns [`TransportError`] if the close handshake could not be sent.
    async fn close(&self) -> Result<(), TransportError>;
}
