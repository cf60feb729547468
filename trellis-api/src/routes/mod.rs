//! REST API Routes Module
//!
//! Route handlers organized by resource, and the builder that assembles them
//! behind authentication, tracing, timeouts and CORS.

pub mod application;
pub mod board;
pub mod health;
pub mod suggestion;

use std::time::Duration;

use axum::{
    http::{header, Method, StatusCode},
    middleware::from_fn_with_state,
    routing::get,
    Router,
};
use tower_http::{
    cors::{Any, CorsLayer},
    timeout::TimeoutLayer,
    trace::TraceLayer,
};

use crate::auth::AuthConfig;
use crate::config::ApiConfig;
use crate::error::{ApiError, ApiResult};
use crate::middleware::{auth_middleware, AuthMiddlewareState};
use crate::state::AppState;
use crate::ws::ws_handler;

// ============================================================================
// OPENAPI ENDPOINT
// ============================================================================

#[cfg(feature = "openapi")]
async fn openapi_json() -> axum::Json<utoipa::openapi::OpenApi> {
    use utoipa::OpenApi;
    axum::Json(crate::openapi::ApiDoc::openapi())
}

// ============================================================================
// PRODUCTION VALIDATION
// ============================================================================

/// Check if running in a production environment.
fn is_production_environment() -> bool {
    std::env::var("TRELLIS_ENVIRONMENT")
        .map(|e| matches!(e.to_lowercase().as_str(), "production" | "prod"))
        .unwrap_or(false)
}

fn validate_api_config_for_production(config: &ApiConfig) -> ApiResult<()> {
    if config.cors_origins.is_empty() {
        return Err(ApiError::invalid_input(
            "CORS origins not configured for production. Set TRELLIS_CORS_ORIGINS.",
        ));
    }
    Ok(())
}

// ============================================================================
// SECURE ROUTER BUILDER
// ============================================================================

/// Builder for the API router with authentication on every `/api/v1` route.
///
/// Health and OpenAPI endpoints stay public.
pub struct SecureRouterBuilder {
    state: AppState,
    auth_state: AuthMiddlewareState,
}

impl SecureRouterBuilder {
    /// In production, refuses weak secrets and wide-open CORS.
    pub fn new(state: AppState, auth_config: AuthConfig) -> ApiResult<Self> {
        if is_production_environment() {
            auth_config.validate_for_production()?;
            validate_api_config_for_production(&state.config)?;
        }

        Ok(Self {
            state,
            auth_state: AuthMiddlewareState::new(auth_config),
        })
    }

    fn build_resource_routes() -> Router<AppState> {
        Router::new()
            .merge(board::create_router())
            .merge(application::create_router())
            .merge(suggestion::create_router())
            .route("/conversations/:cid/ws", get(ws_handler))
    }

    /// Build the complete router.
    ///
    /// # Middleware Order (outer to inner)
    /// 1. CORS - handles preflight requests
    /// 2. Tracing - one span per request
    /// 3. Timeout - bounds handler time, answering 408 when exceeded
    /// 4. Auth (only on /api/v1/*) - validates the bearer token
    pub fn build(self) -> Router {
        let api_routes = Self::build_resource_routes()
            .layer(from_fn_with_state(self.auth_state.clone(), auth_middleware));

        #[allow(unused_mut)]
        let mut router = Router::new()
            .nest("/api/v1", api_routes)
            .nest("/health", health::create_router());

        #[cfg(feature = "openapi")]
        {
            router = router.route("/openapi.json", get(openapi_json));
        }

        let cors = build_cors_layer(&self.state.config);
        let timeout = self.state.config.request_timeout;

        router
            .with_state(self.state)
            .layer(timeout_layer(timeout))
            .layer(TraceLayer::new_for_http())
            .layer(cors)
    }
}

/// Handlers still running after `timeout` are answered with 408.
fn timeout_layer(timeout: Duration) -> TimeoutLayer {
    TimeoutLayer::with_status_code(StatusCode::REQUEST_TIMEOUT, timeout)
}

// ============================================================================
// CORS LAYER
// ============================================================================

/// In development mode (empty origins) every origin is allowed; in
/// production only the configured ones.
fn build_cors_layer(config: &ApiConfig) -> CorsLayer {
    let cors = CorsLayer::new()
        .allow_methods([
            Method::GET,
            Method::POST,
            Method::PATCH,
            Method::DELETE,
            Method::OPTIONS,
        ])
        .allow_headers([header::AUTHORIZATION, header::CONTENT_TYPE, header::ACCEPT])
        .max_age(Duration::from_secs(config.cors_max_age_secs));

    if config.cors_origins.is_empty() {
        tracing::info!("CORS: Development mode - allowing all origins");
        cors.allow_origin(Any)
    } else {
        tracing::info!(
            "CORS: Production mode - allowing origins: {:?}",
            config.cors_origins
        );
        let origin_config = config.clone();
        let predicate = tower_http::cors::AllowOrigin::predicate(move |origin, _| {
            origin
                .to_str()
                .map(|o| origin_config.is_origin_allowed(o))
                .unwrap_or(false)
        });

        if config.cors_allow_credentials {
            cors.allow_origin(predicate).allow_credentials(true)
        } else {
            cors.allow_origin(predicate)
        }
    }
}

/// Create the complete API router with authentication.
pub fn create_api_router(state: AppState, auth_config: AuthConfig) -> ApiResult<Router> {
    SecureRouterBuilder::new(state, auth_config).map(SecureRouterBuilder::build)
}

#[cfg(test)]
mod tests {
    use super::*;
    use axum::body::Body;
    use axum::http::Request;
    use tower::ServiceExt;

    #[tokio::test]
    async fn test_slow_handler_gets_request_timeout() {
        let app = Router::new()
            .route("/slow", get(|| std::future::pending::<&'static str>()))
            .layer(timeout_layer(Duration::from_millis(10)));

        let request = Request::builder().uri("/slow").body(Body::empty()).expect("request");
        let response = app.oneshot(request).await.expect("response");
        assert_eq!(response.status(), StatusCode::REQUEST_TIMEOUT);
    }
}
