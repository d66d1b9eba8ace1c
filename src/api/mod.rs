//! REST API layer: route handlers, DTOs, router composition, and the
//! OpenAPI document.
//!
//! Routes are mounted at the root: `/broadcast` and `/health`.

pub mod dto;
pub mod handlers;

use axum::Router;
use utoipa::OpenApi;

use crate::app_state::AppState;

/// OpenAPI description of the REST surface.
#[derive(Debug, OpenApi)]
#[openapi(
    info(title = "pubsub-gateway", description = "Broadcast-only publish/subscribe gateway"),
    paths(handlers::broadcast::broadcast_handler, handlers::system::health_handler),
    components(schemas(
        dto::BroadcastRequest,
        dto::BroadcastResponse,
        crate::error::ErrorResponse,
        crate::error::ErrorBody,
        crate::ws::WireMessage,
    )),
    tags(
        (name = "PubSub", description = "Publishing to WebSocket subscribers"),
        (name = "System", description = "Service health"),
    )
)]
pub struct ApiDoc;

/// Builds the complete API router with all REST endpoints.
pub fn build_router() -> Router<AppState> {
    handlers::routes()
}
