//! Router assembly and the serve loop.
//!
//! Shared by `main` and the end-to-end tests so both run exactly the same
//! stack.

use std::future::Future;
use std::net::SocketAddr;

use axum::Router;
use axum::extract::DefaultBodyLimit;
use axum::routing::get;
use tokio::net::TcpListener;
use tower_http::cors::CorsLayer;
use tower_http::trace::TraceLayer;

use crate::api;
use crate::app_state::AppState;
use crate::config::GatewayConfig;
use crate::ws::handler::subscribe_handler;

/// Builds the full application router: REST routes, the WebSocket
/// endpoint, and (with the `swagger-ui` feature) the API docs.
pub fn build_router(state: AppState, config: &GatewayConfig) -> Router {
    let router = Router::new()
        .merge(api::build_router())
        .route("/subscribe", get(subscribe_handler))
        .layer(DefaultBodyLimit::max(config.max_request_size))
        .layer(TraceLayer::new_for_http())
        .layer(CorsLayer::permissive())
        .with_state(state);

    #[cfg(feature = "swagger-ui")]
    let router = {
        use utoipa::OpenApi;
        router.merge(
            utoipa_swagger_ui::SwaggerUi::new("/swagger-ui")
                .url("/api-docs/openapi.json", api::ApiDoc::openapi()),
        )
    };

    router
}

/// Serves `router` on `listener` until `shutdown` resolves.
///
/// Peer addresses are made available to handlers through
/// [`axum::extract::ConnectInfo`].
///
/// # Errors
///
/// Returns an I/O error if the accept loop fails.
pub async fn serve<F>(listener: TcpListener, router: Router, shutdown: F) -> std::io::Result<()>
where
    F: Future<Output = ()> + Send + 'static,
{
    axum::serve(
        listener,
        router.into_make_service_with_connect_info::<SocketAddr>(),
    )
    .with_graceful_shutdown(shutdown)
    .await
}
