//! Shared application state for Axum routers.

use std::sync::Arc;

use trellis_storage::DocumentStore;

use crate::access::AccessDirectory;
use crate::config::ApiConfig;
use crate::ws::WsState;

/// Application-wide state shared across all routes.
#[derive(Clone)]
pub struct AppState {
    /// Boards, applications and suggestions.
    pub store: Arc<dyn DocumentStore>,
    /// Conversation membership and roles.
    pub access: Arc<dyn AccessDirectory>,
    pub ws: Arc<WsState>,
    pub config: Arc<ApiConfig>,
    pub start_time: std::time::Instant,
}

impl AppState {
    pub fn new(
        store: Arc<dyn DocumentStore>,
        access: Arc<dyn AccessDirectory>,
        ws: Arc<WsState>,
        config: ApiConfig,
    ) -> Self {
        Self {
            store,
            access,
            ws,
            config: Arc::new(config),
            start_time: std::time::Instant::now(),
        }
    }
}

crate::impl_from_ref!(Arc<dyn DocumentStore>, store);
crate::impl_from_ref!(Arc<WsState>, ws);
crate::impl_from_ref!(Arc<ApiConfig>, config);
crate::impl_from_ref!(std::time::Instant, start_time);
