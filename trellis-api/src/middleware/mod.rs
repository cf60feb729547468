//! Middleware modules for the Trellis API
//!
//! - `auth`: bearer-token authentication and the `AuthExtractor`

mod auth;

pub use auth::{auth_middleware, AuthExtractor, AuthMiddlewareError, AuthMiddlewareState};
