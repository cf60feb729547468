use std::sync::Arc;

use trellis_api::{ApiConfig, AppState, AuthContext, InMemoryAccessDirectory, WsState};
use trellis_core::{ConversationId, Role};
use trellis_storage::{DocumentStore, InMemoryStore};

pub const MENTOR: &str = "mentor-1";
pub const MENTEE: &str = "mentee-1";

/// App state over a fresh in-memory store with one mentor and one mentee
/// in a single conversation.
pub fn test_state() -> (AppState, ConversationId) {
    test_state_with_store(Arc::new(InMemoryStore::new()))
}

/// Same participants as [`test_state`], over a caller-supplied store.
#[allow(dead_code)]
pub fn test_state_with_store(store: Arc<dyn DocumentStore>) -> (AppState, ConversationId) {
    let conversation_id = ConversationId::now_v7();
    let access = InMemoryAccessDirectory::new();
    access.grant(conversation_id, MENTOR, Role::Mentor);
    access.grant(conversation_id, MENTEE, Role::Mentee);

    let state = AppState::new(
        store,
        Arc::new(access),
        Arc::new(WsState::new(128)),
        ApiConfig::default(),
    );
    (state, conversation_id)
}

pub fn mentor() -> AuthContext {
    AuthContext::new(MENTOR)
}

pub fn mentee() -> AuthContext {
    AuthContext::new(MENTEE)
}
