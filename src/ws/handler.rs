//! Axum WebSocket upgrade handler.

use std::net::SocketAddr;

use axum::extract::ws::WebSocketUpgrade;
use axum::extract::{ConnectInfo, State};
use axum::response::IntoResponse;

use super::connection::WsConnection;
use crate::app_state::AppState;
use crate::domain::Bridge;

/// `GET /subscribe` — Upgrade HTTP connection to WebSocket and receive
/// every broadcast until the socket closes.
pub async fn subscribe_handler(
    ws: WebSocketUpgrade,
    ConnectInfo(remote_addr): ConnectInfo<SocketAddr>,
    State(state): State<AppState>,
) -> impl IntoResponse {
    tracing::info!("received new subscription from {remote_addr}");
    let pubsub = state.pubsub.clone();

    ws.on_upgrade(move |socket| async move {
        let bridge = Bridge::new(WsConnection::new(socket, remote_addr), &pubsub);
        let connection_id = bridge.id();
        tracing::debug!(%connection_id, %remote_addr, "subscriber attached");
        bridge.run().await;
        tracing::debug!(%connection_id, %remote_addr, "subscriber detached");
    })
}
