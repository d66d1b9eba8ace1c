//! Immutable broadcast payload.
//!
//! [`Message`] wraps a reference-counted [`Bytes`] buffer so fanning one
//! message out to many subscribers never copies the payload. The core
//! imposes no structure on the bytes; the transport layer decides how to
//! put them on the wire.

use std::fmt;

use bytes::Bytes;

/// A message that was broadcast.
///
/// Cloning is cheap: every clone shares the same underlying buffer.
#[derive(Clone, PartialEq, Eq, Hash)]
pub struct Message {
    data: Bytes,
}

impl Message {
    /// Creates a message from raw bytes.
    #[must_use]
    pub fn new(data: impl Into<Bytes>) -> Self {
        Self { data: data.into() }
    }

    /// Creates a message from text.
    #[must_use]
    pub fn from_text(text: impl Into<String>) -> Self {
        Self {
            data: Bytes::from(text.into()),
        }
    }

    /// Returns the raw payload.
    #[must_use]
    pub fn data(&self) -> &Bytes {
        &self.data
    }

    /// Returns the payload as text, replacing invalid UTF-8 sequences.
    #[must_use]
    pub fn as_text(&self) -> std::borrow::Cow<'_, str> {
        String::from_utf8_lossy(&self.data)
    }

    /// Payload length in bytes.
    #[must_use]
    pub fn len(&self) -> usize {
        self.data.len()
    }

    /// Returns `true` if the payload is empty.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.data.is_empty()
    }
}

impl fmt::Debug for Message {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Message")
            .field("len", &self.data.len())
            .field("data", &self.as_text())
            .finish()
    }
}

impl From<&'static str> for Message {
    fn from(text: &'static str) -> Self {
        Self::new(Bytes::from_static(text.as_bytes()))
    }
}

impl From<String> for Message {
    fn from(text: String) -> Self {
        Self::from_text(text)
    }
}

impl From<Vec<u8>> for Message {
    fn from(data: Vec<u8>) -> Self {
        Self::new(data)
    }
}
