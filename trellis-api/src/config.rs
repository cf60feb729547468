//! API Configuration Module
//!
//! CORS, request timeouts, fan-out capacity and pagination bounds. Loaded
//! from environment variables with defaults suited to local development.

use std::time::Duration;

// ============================================================================
// API CONFIGURATION
// ============================================================================

/// API configuration for CORS, timeouts and listing limits.
#[derive(Debug, Clone)]
pub struct ApiConfig {
    // ========================================================================
    // CORS Configuration
    // ========================================================================
    /// Allowed CORS origins (comma-separated in env var).
    /// Empty means allow all origins (dev mode).
    /// Example: "https://trellis.app,https://*.trellis.app"
    pub cors_origins: Vec<String>,

    /// Whether to allow credentials in CORS requests.
    pub cors_allow_credentials: bool,

    /// Max age for CORS preflight cache in seconds.
    pub cors_max_age_secs: u64,

    // ========================================================================
    // Request Handling
    // ========================================================================
    /// Upper bound on a single request's processing time.
    pub request_timeout: Duration,

    /// Buffered events per subscriber before it starts lagging.
    pub ws_capacity: usize,

    // ========================================================================
    // Pagination
    // ========================================================================
    pub default_page_size: u32,
    pub max_page_size: u32,
}

impl Default for ApiConfig {
    fn default() -> Self {
        Self {
            cors_origins: Vec::new(), // Empty = allow all
            cors_allow_credentials: false,
            cors_max_age_secs: 86400, // 24 hours

            request_timeout: Duration::from_secs(30),
            ws_capacity: 1000,

            default_page_size: 20,
            max_page_size: 100,
        }
    }
}

impl ApiConfig {
    /// Create ApiConfig from environment variables.
    ///
    /// Environment variables:
    /// - `TRELLIS_CORS_ORIGINS`: Comma-separated allowed origins (empty = allow all)
    /// - `TRELLIS_CORS_ALLOW_CREDENTIALS`: "true" or "false" (default: false)
    /// - `TRELLIS_CORS_MAX_AGE_SECS`: Preflight cache duration (default: 86400)
    /// - `TRELLIS_REQUEST_TIMEOUT_SECS`: Per-request timeout (default: 30)
    /// - `TRELLIS_WS_CAPACITY`: Broadcast buffer size (default: 1000)
    pub fn from_env() -> Self {
        let defaults = Self::default();

        let cors_origins = std::env::var("TRELLIS_CORS_ORIGINS")
            .ok()
            .map(|s| {
                s.split(',')
                    .map(|o| o.trim().to_string())
                    .filter(|o| !o.is_empty())
                    .collect()
            })
            .unwrap_or_default();

        let cors_allow_credentials = std::env::var("TRELLIS_CORS_ALLOW_CREDENTIALS")
            .ok()
            .map(|s| s.to_lowercase() == "true")
            .unwrap_or(false);

        let cors_max_age_secs = std::env::var("TRELLIS_CORS_MAX_AGE_SECS")
            .ok()
            .and_then(|s| s.parse().ok())
            .unwrap_or(defaults.cors_max_age_secs);

        let request_timeout = std::env::var("TRELLIS_REQUEST_TIMEOUT_SECS")
            .ok()
            .and_then(|s| s.parse().ok())
            .map(Duration::from_secs)
            .unwrap_or(defaults.request_timeout);

        let ws_capacity = std::env::var("TRELLIS_WS_CAPACITY")
            .ok()
            .and_then(|s| s.parse::<usize>().ok())
            .filter(|c| *c > 0)
            .unwrap_or(defaults.ws_capacity);

        Self {
            cors_origins,
            cors_allow_credentials,
            cors_max_age_secs,
            request_timeout,
            ws_capacity,
            ..defaults
        }
    }

    /// Check if running in production mode (strict CORS).
    pub fn is_production(&self) -> bool {
        !self.cors_origins.is_empty()
    }

    /// Check if a given origin is allowed.
    pub fn is_origin_allowed(&self, origin: &str) -> bool {
        if self.cors_origins.is_empty() {
            return true;
        }

        self.cors_origins.iter().any(|allowed| {
            if allowed == origin {
                return true;
            }
            // Wildcard subdomains: *.trellis.app
            if let Some(pattern) = allowed.strip_prefix("*.") {
                if let Some(origin_domain) = origin.strip_prefix("https://") {
                    return origin_domain.ends_with(&format!(".{}", pattern));
                }
            }
            false
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_default_config() {
        let config = ApiConfig::default();
        assert!(config.cors_origins.is_empty());
        assert!(!config.cors_allow_credentials);
        assert_eq!(config.cors_max_age_secs, 86400);
        assert_eq!(config.request_timeout, Duration::from_secs(30));
        assert_eq!(config.ws_capacity, 1000);
        assert_eq!(config.default_page_size, 20);
        assert_eq!(config.max_page_size, 100);
    }

    #[test]
    fn test_is_production() {
        let mut config = ApiConfig::default();
        assert!(!config.is_production());

        config.cors_origins = vec!["https://trellis.app".to_string()];
        assert!(config.is_production());
    }

    #[test]
    fn test_origin_allowed_dev_mode() {
        let config = ApiConfig::default();
        assert!(config.is_origin_allowed("https://anything.com"));
        assert!(config.is_origin_allowed("http://localhost:3000"));
    }

    #[test]
    fn test_origin_allowed_production() {
        let config = ApiConfig {
            cors_origins: vec![
                "https://trellis.app".to_string(),
                "*.coach.trellis.app".to_string(),
            ],
            ..ApiConfig::default()
        };

        assert!(config.is_origin_allowed("https://trellis.app"));
        assert!(config.is_origin_allowed("https://eu.coach.trellis.app"));
        assert!(!config.is_origin_allowed("https://evil.com"));
        assert!(!config.is_origin_allowed("https://notcoach.trellis.app"));
    }
}
