//! Trellis API Server Entry Point
//!
//! Bootstraps configuration, wires the in-memory store and access directory,
//! and starts the Axum HTTP server.

use std::net::SocketAddr;
use std::sync::Arc;

use trellis_api::telemetry::{init_tracer, TelemetryConfig};
use trellis_api::{
    create_api_router, ApiConfig, ApiError, ApiResult, AppState, AuthConfig, InMemoryAccessDirectory, WsState,
};
use trellis_storage::InMemoryStore;

#[tokio::main]
async fn main() -> ApiResult<()> {
    let telemetry_config = TelemetryConfig::from_env();
    init_tracer(&telemetry_config)?;

    let api_config = ApiConfig::from_env();
    let auth_config = AuthConfig::from_env();

    let access = InMemoryAccessDirectory::from_env();
    if access.is_empty() {
        tracing::warn!("No conversation members configured; set TRELLIS_MEMBERS");
    } else {
        tracing::info!(members = access.len(), "Loaded conversation members");
    }

    let ws = Arc::new(WsState::new(api_config.ws_capacity));
    let state = AppState::new(Arc::new(InMemoryStore::new()), Arc::new(access), ws, api_config);
    let app = create_api_router(state, auth_config)?;

    let addr = resolve_bind_addr()?;
    tracing::info!(%addr, "Starting Trellis API server");

    let listener = tokio::net::TcpListener::bind(addr)
        .await
        .map_err(|e| ApiError::internal_error(format!("Failed to bind {}: {}", addr, e)))?;

    let server = axum::serve(listener, app);
    tokio::select! {
        result = server => {
            result.map_err(|e| ApiError::internal_error(format!("Server error: {}", e)))?;
        }
        _ = tokio::signal::ctrl_c() => {
            tracing::info!("Shutdown signal received");
        }
    }

    Ok(())
}

fn resolve_bind_addr() -> ApiResult<SocketAddr> {
    let host = std::env::var("TRELLIS_API_BIND").unwrap_or_else(|_| "0.0.0.0".to_string());
    let port_str = std::env::var("PORT")
        .ok()
        .or_else(|| std::env::var("TRELLIS_API_PORT").ok())
        .unwrap_or_else(|| "3000".to_string());
    let port = port_str
        .parse::<u16>()
        .map_err(|_| ApiError::invalid_input(format!("Invalid port value: {}", port_str)))?;

    let addr = format!("{}:{}", host, port);
    addr.parse::<SocketAddr>()
        .map_err(|e| ApiError::invalid_input(format!("Invalid bind address {}: {}", addr, e)))
}
