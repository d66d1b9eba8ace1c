//! Shared application state injected into all Axum handlers.

use crate::domain::PubSub;

/// Shared application state available to all handlers via Axum's
/// `State` extractor.
#[derive(Debug, Clone, Default)]
pub struct AppState {
    /// Process-wide broadcast registry.
    pub pubsub: PubSub,
}
