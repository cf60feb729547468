//! Trellis API - REST and WebSocket layer
//!
//! Exposes the per-conversation tracking board over HTTP (Axum) and streams
//! every accepted mutation to connected participants over WebSocket.

pub mod access;
pub mod auth;
pub mod config;
pub mod error;
pub mod events;
mod macros;
pub mod middleware;
#[cfg(feature = "openapi")]
pub mod openapi;
pub mod routes;
pub mod services;
pub mod state;
pub mod telemetry;
pub mod types;
pub mod ws;

// Re-export commonly used types
pub use access::{resolve_participant, AccessDirectory, InMemoryAccessDirectory, Participant};
pub use auth::{authenticate, generate_jwt_token, validate_jwt_token, AuthConfig, AuthContext, Claims, JwtSecret};
pub use config::ApiConfig;
pub use error::{ApiError, ApiResult, ErrorCode};
pub use events::WsEvent;
pub use middleware::{auth_middleware, AuthExtractor, AuthMiddlewareState};
#[cfg(feature = "openapi")]
pub use openapi::ApiDoc;
pub use routes::{create_api_router, SecureRouterBuilder};
pub use state::AppState;
pub use types::*;
pub use ws::{Published, WsState};
