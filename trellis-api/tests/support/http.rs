use axum::{
    body::{to_bytes, Body},
    http::{header, Method, Request, StatusCode},
    Router,
};
use serde_json::Value as JsonValue;
use tower::ServiceExt;
use trellis_api::{generate_jwt_token, AuthConfig, JwtSecret};

pub fn test_auth_config() -> AuthConfig {
    AuthConfig {
        jwt_secret: JwtSecret::new("trellis-integration-test-secret".to_string())
            .expect("test secret is non-empty"),
        ..AuthConfig::default()
    }
}

pub fn bearer(config: &AuthConfig, user_id: &str) -> String {
    let token = generate_jwt_token(config, user_id).expect("token generation");
    format!("Bearer {}", token)
}

/// Send one request through `app` and decode the JSON body (null when empty).
pub async fn send(
    app: &Router,
    method: Method,
    uri: &str,
    auth: Option<&str>,
    body: Option<JsonValue>,
) -> (StatusCode, JsonValue) {
    let mut builder = Request::builder().method(method).uri(uri);
    if let Some(auth) = auth {
        builder = builder.header(header::AUTHORIZATION, auth);
    }
    let request = match body {
        Some(json) => builder
            .header(header::CONTENT_TYPE, "application/json")
            .body(Body::from(json.to_string())),
        None => builder.body(Body::empty()),
    }
    .expect("request");

    let response = app.clone().oneshot(request).await.expect("response");
    let status = response.status();
    let bytes = to_bytes(response.into_body(), usize::MAX).await.expect("body");
    let json = if bytes.is_empty() {
        JsonValue::Null
    } else {
        serde_json::from_slice(&bytes).expect("JSON body")
    };
    (status, json)
}
