//! pubsub-gateway server entry point.
//!
//! Starts the Axum HTTP server with the broadcast and WebSocket endpoints.

use tracing_subscriber::EnvFilter;

use pubsub_gateway::app_state::AppState;
use pubsub_gateway::config::GatewayConfig;
use pubsub_gateway::server;

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    // Initialize tracing
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")),
        )
        .init();

    // Load configuration
    let config = GatewayConfig::from_env()?;
    tracing::info!(
        addr = %config.listen_addr,
        max_request_size = config.max_request_size,
        "starting pubsub-gateway"
    );

    let app = server::build_router(AppState::default(), &config);

    // Start server
    let listener = tokio::net::TcpListener::bind(config.listen_addr).await?;
    tracing::info!(addr = %config.listen_addr, "server listening");

    server::serve(listener, app, shutdown_signal()).await?;
    tracing::info!("server stopped");

    Ok(())
}

async fn shutdown_signal() {
    if let Err(e) = tokio::signal::ctrl_c().await {
        tracing::error!(error = %e, "failed to listen for shutdown signal");
        std::future::pending::<()>().await;
    }
    tracing::info!("shutdown signal received");
}
