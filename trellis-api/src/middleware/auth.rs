//! Axum middleware for bearer-token authentication.
//!
//! Valid requests get an [`AuthContext`] in their extensions; everything
//! else is answered with 401 before reaching a handler.

use crate::auth::{authenticate, AuthConfig, AuthContext};
use crate::error::ApiError;
use axum::{
    async_trait,
    extract::{FromRequestParts, Request, State},
    http::request::Parts,
    middleware::Next,
    response::{IntoResponse, Response},
};
use std::sync::Arc;

// ============================================================================
// MIDDLEWARE STATE
// ============================================================================

/// Shared state for authentication middleware.
#[derive(Debug, Clone)]
pub struct AuthMiddlewareState {
    pub auth_config: Arc<AuthConfig>,
}

impl AuthMiddlewareState {
    pub fn new(auth_config: AuthConfig) -> Self {
        Self {
            auth_config: Arc::new(auth_config),
        }
    }
}

// ============================================================================
// AUTHENTICATION MIDDLEWARE
// ============================================================================

/// Authenticate the `Authorization: Bearer` header and inject [`AuthContext`].
///
/// ```ignore
/// let app = Router::new()
///     .route("/api/v1/conversations/:cid/board", get(get_board))
///     .layer(middleware::from_fn_with_state(auth_state, auth_middleware));
/// ```
pub async fn auth_middleware(
    State(state): State<AuthMiddlewareState>,
    mut request: Request,
    next: Next,
) -> Result<Response, AuthMiddlewareError> {
    let auth_header = request
        .headers()
        .get("authorization")
        .and_then(|h| h.to_str().ok());

    let auth_context = authenticate(&state.auth_config, auth_header).map_err(AuthMiddlewareError)?;

    request.extensions_mut().insert(auth_context);
    Ok(next.run(request).await)
}

// ============================================================================
// ERROR HANDLING
// ============================================================================

/// Error wrapper for middleware that implements IntoResponse.
#[derive(Debug)]
pub struct AuthMiddlewareError(pub ApiError);

impl IntoResponse for AuthMiddlewareError {
    fn into_response(self) -> Response {
        self.0.into_response()
    }
}

// ============================================================================
// TYPED EXTRACTOR
// ============================================================================

/// Typed extractor for the authenticated caller.
///
/// Requires `auth_middleware` on the route; without it extraction fails with
/// a 500.
#[derive(Debug, Clone)]
pub struct AuthExtractor(pub AuthContext);

#[async_trait]
impl<S> FromRequestParts<S> for AuthExtractor
where
    S: Send + Sync,
{
    type Rejection = AuthMiddlewareError;

    async fn from_request_parts(parts: &mut Parts, _state: &S) -> Result<Self, Self::Rejection> {
        parts
            .extensions
            .get::<AuthContext>()
            .cloned()
            .map(AuthExtractor)
            .ok_or_else(|| {
                AuthMiddlewareError(ApiError::internal_error(
                    "AuthContext not found in request extensions. \
                     Ensure auth_middleware is applied to this route.",
                ))
            })
    }
}

impl std::ops::Deref for AuthExtractor {
    type Target = AuthContext;

    fn deref(&self) -> &Self::Target {
        &self.0
    }
}

// ============================================================================
// TESTS
// ============================================================================

#[cfg(test)]
mod tests {
    use super::*;
    use crate::auth::{generate_jwt_token, test_clocks, JwtSecret};
    use axum::{
        body::Body,
        http::{Request, StatusCode},
        middleware,
        routing::get,
        Router,
    };
    use tower::ServiceExt; // for `oneshot`

    fn test_auth_config() -> AuthConfig {
        AuthConfig {
            jwt_secret: JwtSecret::new("test_secret".to_string()).expect("test secret should be valid"),
            clock: Arc::new(test_clocks::valid()),
            ..AuthConfig::default()
        }
    }

    fn test_app() -> Router {
        let auth_state = AuthMiddlewareState::new(test_auth_config());

        Router::new()
            .route(
                "/protected",
                get(|AuthExtractor(auth): AuthExtractor| async move { auth.user_id }),
            )
            .layer(middleware::from_fn_with_state(auth_state, auth_middleware))
    }

    async fn status_for(request: Request<Body>) -> Result<StatusCode, String> {
        let response = test_app()
            .oneshot(request)
            .await
            .map_err(|e| format!("Request failed: {:?}", e))?;
        Ok(response.status())
    }

    #[tokio::test]
    async fn test_middleware_with_valid_jwt() -> Result<(), String> {
        let token = generate_jwt_token(&test_auth_config(), "mentor-1").map_err(|e| e.message)?;

        let request = Request::builder()
            .uri("/protected")
            .header("authorization", format!("Bearer {}", token))
            .body(Body::empty())
            .map_err(|e| e.to_string())?;

        let response = test_app()
            .oneshot(request)
            .await
            .map_err(|e| format!("Request failed: {:?}", e))?;
        assert_eq!(response.status(), StatusCode::OK);

        let body = axum::body::to_bytes(response.into_body(), usize::MAX)
            .await
            .map_err(|e| e.to_string())?;
        assert_eq!(&body[..], b"mentor-1");
        Ok(())
    }

    #[tokio::test]
    async fn test_middleware_without_authentication() -> Result<(), String> {
        let request = Request::builder()
            .uri("/protected")
            .body(Body::empty())
            .map_err(|e| e.to_string())?;

        assert_eq!(status_for(request).await?, StatusCode::UNAUTHORIZED);
        Ok(())
    }

    #[tokio::test]
    async fn test_middleware_with_invalid_jwt() -> Result<(), String> {
        let request = Request::builder()
            .uri("/protected")
            .header("authorization", "Bearer invalid.jwt.token")
            .body(Body::empty())
            .map_err(|e| e.to_string())?;

        assert_eq!(status_for(request).await?, StatusCode::UNAUTHORIZED);
        Ok(())
    }

    #[tokio::test]
    async fn test_middleware_with_malformed_auth_header() -> Result<(), String> {
        let request = Request::builder()
            .uri("/protected")
            .header("authorization", "Token abc")
            .body(Body::empty())
            .map_err(|e| e.to_string())?;

        assert_eq!(status_for(request).await?, StatusCode::UNAUTHORIZED);
        Ok(())
    }

    #[tokio::test]
    async fn test_auth_extractor_without_middleware() -> Result<(), String> {
        async fn handler(AuthExtractor(_auth): AuthExtractor) -> String {
            "unreachable".to_string()
        }

        let app = Router::new().route("/test", get(handler));
        let request = Request::builder()
            .uri("/test")
            .body(Body::empty())
            .map_err(|e| e.to_string())?;

        let response = app
            .oneshot(request)
            .await
            .map_err(|e| format!("Request failed: {:?}", e))?;
        assert_eq!(response.status(), StatusCode::INTERNAL_SERVER_ERROR);
        Ok(())
    }
}
