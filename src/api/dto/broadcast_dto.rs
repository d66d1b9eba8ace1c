//! Broadcast request/response DTOs.

use serde::{Deserialize, Serialize};
use utoipa::ToSchema;

/// Request body for `POST /broadcast`.
#[derive(Debug, Clone, Serialize, Deserialize, ToSchema)]
pub struct BroadcastRequest {
    /// Text to send to every subscriber.
    pub data: String,
}

/// Response body for a successful broadcast.
#[derive(Debug, Clone, Serialize, Deserialize, ToSchema)]
pub struct BroadcastResponse {
    /// Number of subscribers the message was handed to.
    pub delivered: usize,
}
