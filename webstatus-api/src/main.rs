//! webstatus API Server Entry Point
//!
//! Loads configuration from the environment, opens the store and cache, and
//! starts the Axum HTTP server.

use axum::Router;
use webstatus_api::telemetry::init_tracing;
use webstatus_api::{build_state, create_router, ApiError, ApiResult, AppConfig};

#[tokio::main]
async fn main() -> ApiResult<()> {
    let config = AppConfig::from_env()?;
    init_tracing(config.log_format)?;

    let state = build_state(&config)?;
    let app: Router = create_router(state);

    let addr = config.listen_addr;
    tracing::info!(
        %addr,
        data_dir = %config.data_dir.display(),
        cache_backend = ?config.cache_backend,
        "Starting webstatus API server"
    );

    let listener = tokio::net::TcpListener::bind(addr)
        .await
        .map_err(|e| ApiError::internal_error(format!("Failed to bind {}: {}", addr, e)))?;

    axum::serve(listener, app)
        .with_graceful_shutdown(async {
            if tokio::signal::ctrl_c().await.is_ok() {
                tracing::info!("Shutdown signal received");
            }
        })
        .await
        .map_err(|e| ApiError::internal_error(format!("Server error: {}", e)))?;

    Ok(())
}
