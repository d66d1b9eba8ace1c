//! WebSocket wire format for broadcast messages.

use serde::{Deserialize, Serialize};
use utoipa::ToSchema;

use crate::domain::Message;

/// JSON frame pushed to every subscriber for each broadcast.
///
/// ```json
/// { "data": "Hello!" }
/// ```
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, ToSchema)]
pub struct WireMessage {
    /// Broadcast payload as text. Non-UTF-8 bytes are replaced.
    pub data: String,
}

impl WireMessage {
    /// Serializes the frame to JSON text.
    ///
    /// # Errors
    ///
    /// Returns [`serde_json::Error`] if serialization fails.
    pub fn encode(&self) -> Result<String, serde_json::Error> {
        serde_json::to_string(self)
    }
}

impl From<&Message> for WireMessage {
    fn from(message: &Message) -> Self {
        Self {
            data: message.as_text().into_owned(),
        }
    }
}

#[cfg(test)]
#[allow(clippy::panic)]
mod tests {
    use super::*;

    #[test]
    fn encodes_data_field() {
        let wire = WireMessage::from(&Message::from_text("Hello!"));
        let Ok(json) = wire.encode() else {
            panic!("encoding failed");
        };
        assert_eq!(json, r#"{"data":"Hello!"}"#);
    }

    #[test]
    fn escapes_json_in_payload() {
        let wire = WireMessage::from(&Message::from_text(r#"{"nested":"quote"}"#));
        let Ok(json) = wire.encode() else {
            panic!("encoding failed");
        };
        let Ok(back) = serde_json::from_str::<WireMessage>(&json) else {
            panic!("decoding failed");
        };
        assert_eq!(back.data, r#"{"nested":"quote"}"#);
    }
}
