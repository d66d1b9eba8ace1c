//! Broadcast endpoint handler.

use std::net::SocketAddr;

use axum::extract::rejection::JsonRejection;
use axum::extract::{ConnectInfo, State};
use axum::response::IntoResponse;
use axum::routing::post;
use axum::{Json, Router};

use crate::api::dto::{BroadcastRequest, BroadcastResponse};
use crate::app_state::AppState;
use crate::domain::Message;
use crate::error::{ErrorResponse, GatewayError};

/// `POST /broadcast` — Send a message to every connected subscriber.
///
/// Returns once every subscriber present at the time of the call has
/// accepted the message into its delivery slot.
///
/// # Errors
///
/// Returns [`GatewayError`] on a malformed or oversized body, or when a
/// subscriber fails during delivery.
#[utoipa::path(
    post,
    path = "/broadcast",
    tag = "PubSub",
    summary = "Broadcast a message",
    description = "Delivers the message to every WebSocket subscriber connected to `/subscribe`. There is no queue: subscribers that are not connected never see it.",
    request_body = BroadcastRequest,
    responses(
        (status = 200, description = "Message broadcast", body = BroadcastResponse),
        (status = 400, description = "Malformed request body", body = ErrorResponse),
        (status = 405, description = "Method other than POST"),
        (status = 413, description = "Request body too large", body = ErrorResponse),
        (status = 500, description = "A subscriber failed during delivery", body = ErrorResponse),
    )
)]
pub async fn broadcast_handler(
    State(state): State<AppState>,
    ConnectInfo(remote_addr): ConnectInfo<SocketAddr>,
    payload: Result<Json<BroadcastRequest>, JsonRejection>,
) -> Result<impl IntoResponse, GatewayError> {
    tracing::info!("received publish from {remote_addr}");

    let Json(req) = payload?;
    let delivered = state
        .pubsub
        .broadcast(Message::from_text(req.data))
        .await?;
    tracing::debug!(%remote_addr, delivered, "broadcast complete");

    Ok(Json(BroadcastResponse { delivered }))
}

/// Broadcast routes.
pub fn routes() -> Router<AppState> {
    Router::new().route("/broadcast", post(broadcast_handler))
}

#[cfg(test)]
#[allow(clippy::panic)]
mod tests {
    use std::sync::Arc;

    use axum::body::{Body, to_bytes};
    use axum::extract::connect_info::MockConnectInfo;
    use axum::http::{Method, Request, StatusCode, header};
    use parking_lot::Mutex;
    use tower::ServiceExt;

    use super::*;
    use crate::config::GatewayConfig;
    use crate::domain::PubSub;

    fn app(pubsub: PubSub, max_request_size: usize) -> Router {
        let config = GatewayConfig {
            max_request_size,
            ..GatewayConfig::default()
        };
        crate::server::build_router(AppState { pubsub }, &config)
            .layer(MockConnectInfo(SocketAddr::from(([127, 0, 0, 1], 4000))))
    }

    fn post_json(body: impl Into<Body>) -> Request<Body> {
        let Ok(request) = Request::builder()
            .method(Method::POST)
            .uri("/broadcast")
            .header(header::CONTENT_TYPE, "application/json")
            .body(body.into())
        else {
            panic!("request should build");
        };
        request
    }

    async fn json_body(response: axum::response::Response) -> serde_json::Value {
        let Ok(bytes) = to_bytes(response.into_body(), usize::MAX).await else {
            panic!("body should be readable");
        };
        let Ok(value) = serde_json::from_slice(&bytes) else {
            panic!("body should be JSON");
        };
        value
    }

    #[tokio::test]
    async fn broadcast_reaches_subscribers() {
        let pubsub = PubSub::new();
        let seen = Arc::new(Mutex::new(Vec::new()));
        let sink = Arc::clone(&seen);
        let _handle = pubsub.subscribe(move |m: Message| sink.lock().push(m));

        let Ok(response) = app(pubsub, 1024)
            .oneshot(post_json(r#"{"data":"Hello!"}"#))
            .await;
        assert_eq!(response.status(), StatusCode::OK);
        assert_eq!(json_body(response).await["delivered"], 1);
        assert_eq!(*seen.lock(), vec![Message::from("Hello!")]);
    }

    #[tokio::test]
    async fn broadcast_without_subscribers_is_ok() {
        let Ok(response) = app(PubSub::new(), 1024)
            .oneshot(post_json(r#"{"data":"nobody home"}"#))
            .await;
        assert_eq!(response.status(), StatusCode::OK);
        assert_eq!(json_body(response).await["delivered"], 0);
    }

    #[tokio::test]
    async fn wrong_method_is_rejected() {
        let Ok(request) = Request::builder()
            .method(Method::GET)
            .uri("/broadcast")
            .body(Body::empty())
        else {
            panic!("request should build");
        };
        let Ok(response) = app(PubSub::new(), 1024).oneshot(request).await;
        assert_eq!(response.status(), StatusCode::METHOD_NOT_ALLOWED);
    }

    #[tokio::test]
    async fn malformed_json_is_bad_request() {
        let Ok(response) = app(PubSub::new(), 1024)
            .oneshot(post_json("<notJson}"))
            .await;
        assert_eq!(response.status(), StatusCode::BAD_REQUEST);
        assert_eq!(json_body(response).await["error"]["code"], 1001);
    }

    #[tokio::test]
    async fn oversized_body_is_rejected() {
        let data = "stringstring".repeat(1000);
        let body = format!(r#"{{"data":"{data}"}}"#);
        let Ok(response) = app(PubSub::new(), 1024).oneshot(post_json(body)).await;
        assert_eq!(response.status(), StatusCode::PAYLOAD_TOO_LARGE);
        assert_eq!(json_body(response).await["error"]["code"], 1002);
    }
}
