//! Suggestion resolution when the backing store fails mid-request
//!
//! A failed resolution write leaves both the suggestion and its row as they
//! were, so the mentee can simply retry.

use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;

use async_trait::async_trait;
use serde_json::json;
use trellis_api::{services, types::CreateSuggestionRequest, ErrorCode};
use trellis_core::{
    Application, ApplicationId, Board, CellValue, ConversationId, StorageError, Suggestion, SuggestionId,
    SuggestionStatus, Timestamp, TrellisResult,
};
use trellis_storage::{DocumentStore, InMemoryStore, Listing, SuggestionFilter};
use trellis_test_utils::fixtures;

#[path = "support/state.rs"]
mod test_state_support;
use test_state_support::{mentee, mentor, test_state_with_store};

/// In-memory store whose resolution write can be switched off.
#[derive(Default)]
struct FlakyStore {
    inner: InMemoryStore,
    fail_resolve: AtomicBool,
}

impl FlakyStore {
    fn set_failing(&self, failing: bool) {
        self.fail_resolve.store(failing, Ordering::SeqCst);
    }
}

#[async_trait]
impl DocumentStore for FlakyStore {
    async fn board_get_by_conversation(&self, conversation_id: ConversationId) -> TrellisResult<Option<Board>> {
        self.inner.board_get_by_conversation(conversation_id).await
    }

    async fn board_insert(&self, board: &Board) -> TrellisResult<()> {
        self.inner.board_insert(board).await
    }

    async fn board_update(&self, board: &Board) -> TrellisResult<()> {
        self.inner.board_update(board).await
    }

    async fn application_insert(&self, application: &Application) -> TrellisResult<()> {
        self.inner.application_insert(application).await
    }

    async fn application_get(&self, id: ApplicationId) -> TrellisResult<Option<Application>> {
        self.inner.application_get(id).await
    }

    async fn application_update(&self, application: &Application) -> TrellisResult<()> {
        self.inner.application_update(application).await
    }

    async fn application_delete(&self, id: ApplicationId) -> TrellisResult<()> {
        self.inner.application_delete(id).await
    }

    async fn application_list_by_conversation(
        &self,
        conversation_id: ConversationId,
        limit: usize,
        offset: usize,
    ) -> TrellisResult<Listing<Application>> {
        self.inner
            .application_list_by_conversation(conversation_id, limit, offset)
            .await
    }

    async fn suggestion_insert(&self, suggestion: &Suggestion) -> TrellisResult<()> {
        self.inner.suggestion_insert(suggestion).await
    }

    async fn suggestion_get(&self, id: SuggestionId) -> TrellisResult<Option<Suggestion>> {
        self.inner.suggestion_get(id).await
    }

    async fn suggestion_list_by_conversation(
        &self,
        conversation_id: ConversationId,
        filter: SuggestionFilter,
    ) -> TrellisResult<Vec<Suggestion>> {
        self.inner.suggestion_list_by_conversation(conversation_id, filter).await
    }

    async fn suggestion_resolve(
        &self,
        id: SuggestionId,
        status: SuggestionStatus,
        resolved_at: Timestamp,
        application: &Application,
    ) -> TrellisResult<Suggestion> {
        if self.fail_resolve.load(Ordering::SeqCst) {
            return Err(StorageError::Unavailable {
                reason: "write rejected".to_string(),
            }
            .into());
        }
        self.inner
            .suggestion_resolve(id, status, resolved_at, application)
            .await
    }

    async fn health_check(&self) -> TrellisResult<bool> {
        self.inner.health_check().await
    }
}

#[tokio::test]
async fn test_failed_accept_leaves_everything_pending_and_retry_succeeds() {
    let store = Arc::new(FlakyStore::default());
    let (state, cid) = test_state_with_store(store.clone());
    let row = services::create_application(&state, &mentee(), cid, &fixtures::acme_patch())
        .await
        .expect("create");
    let req = CreateSuggestionRequest {
        application_id: row.application_id,
        field: "notes".to_string(),
        old_value: serde_json::Value::Null,
        proposed_value: json!("Prep questions"),
    };
    let suggestion = services::create_suggestion(&state, &mentor(), cid, &req)
        .await
        .expect("suggest");

    store.set_failing(true);
    let err = services::accept_suggestion(&state, &mentee(), suggestion.suggestion_id)
        .await
        .expect_err("store is failing");
    assert_eq!(err.code, ErrorCode::ServiceUnavailable);

    let stored = state
        .store
        .suggestion_get(suggestion.suggestion_id)
        .await
        .expect("get")
        .expect("exists");
    assert_eq!(stored.status, SuggestionStatus::Pending);
    let unchanged = services::get_application(&state, &mentee(), cid, row.application_id)
        .await
        .expect("row");
    assert_eq!(unchanged.cell("notes"), CellValue::Null);
    assert!(unchanged.history.is_empty());
    assert_eq!(unchanged.activity_log.len(), row.activity_log.len());

    store.set_failing(false);
    let (resolved, applied) = services::accept_suggestion(&state, &mentee(), suggestion.suggestion_id)
        .await
        .expect("retry succeeds");
    assert_eq!(resolved.status, SuggestionStatus::Accepted);
    assert_eq!(applied.cell("notes"), CellValue::Text("Prep questions".to_string()));
    assert_eq!(applied.history.len(), 1);

    let reread = services::get_application(&state, &mentee(), cid, row.application_id)
        .await
        .expect("row");
    assert_eq!(reread, applied);
}

#[tokio::test]
async fn test_failed_reject_can_be_retried() {
    let store = Arc::new(FlakyStore::default());
    let (state, cid) = test_state_with_store(store.clone());
    let row = services::create_application(&state, &mentee(), cid, &fixtures::acme_patch())
        .await
        .expect("create");
    let req = CreateSuggestionRequest {
        application_id: row.application_id,
        field: "status".to_string(),
        old_value: json!("Applied"),
        proposed_value: json!("Offer"),
    };
    let suggestion = services::create_suggestion(&state, &mentor(), cid, &req)
        .await
        .expect("suggest");

    store.set_failing(true);
    assert!(services::reject_suggestion(&state, &mentee(), suggestion.suggestion_id)
        .await
        .is_err());
    let unchanged = services::get_application(&state, &mentee(), cid, row.application_id)
        .await
        .expect("row");
    assert_eq!(unchanged.activity_log.len(), row.activity_log.len());

    store.set_failing(false);
    let (resolved, stored) = services::reject_suggestion(&state, &mentee(), suggestion.suggestion_id)
        .await
        .expect("retry succeeds");
    assert_eq!(resolved.status, SuggestionStatus::Rejected);
    assert_eq!(stored.activity_log.len(), row.activity_log.len() + 1);
}
