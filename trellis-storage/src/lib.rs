//! Trellis Storage - Document Store Trait and In-Memory Implementation
//!
//! Boards, applications and suggestions are persisted as whole documents.
//! Row updates are last-write-wins; suggestion resolution is the one
//! conditional write.

mod memory;

pub use memory::InMemoryStore;

use ::async_trait::async_trait;
use trellis_core::{
    Application, ApplicationId, Board, ConversationId, Suggestion, SuggestionId, SuggestionStatus,
    Timestamp, TrellisResult,
};

/// Filter for listing suggestions of a conversation.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct SuggestionFilter {
    pub status: Option<SuggestionStatus>,
    pub application_id: Option<ApplicationId>,
}

impl SuggestionFilter {
    pub fn matches(&self, s: &Suggestion) -> bool {
        self.status.map_or(true, |status| s.status == status)
            && self.application_id.map_or(true, |id| s.application_id == id)
    }
}

/// One page of a newest-first listing.
#[derive(Debug, Clone, PartialEq)]
pub struct Listing<T> {
    pub items: Vec<T>,
    /// Total matching documents, ignoring the window.
    pub total: usize,
}

/// Async document store for Trellis entities.
#[async_trait]
pub trait DocumentStore: Send + Sync {
    // ========================================================================
    // BOARD OPERATIONS
    // ========================================================================

    /// Board of a conversation, if one was created.
    async fn board_get_by_conversation(&self, conversation_id: ConversationId) -> TrellisResult<Option<Board>>;

    /// Insert a board. Fails with `UniqueViolation` when the conversation
    /// already owns one.
    async fn board_insert(&self, board: &Board) -> TrellisResult<()>;

    /// Replace a stored board.
    async fn board_update(&self, board: &Board) -> TrellisResult<()>;

    // ========================================================================
    // APPLICATION OPERATIONS
    // ========================================================================

    async fn application_insert(&self, application: &Application) -> TrellisResult<()>;

    async fn application_get(&self, id: ApplicationId) -> TrellisResult<Option<Application>>;

    /// Replace a stored application document.
    async fn application_update(&self, application: &Application) -> TrellisResult<()>;

    /// Delete an application together with its suggestions.
    async fn application_delete(&self, id: ApplicationId) -> TrellisResult<()>;

    /// Applications of a conversation, newest first.
    async fn application_list_by_conversation(
        &self,
        conversation_id: ConversationId,
        limit: usize,
        offset: usize,
    ) -> TrellisResult<Listing<Application>>;

    // ========================================================================
    // SUGGESTION OPERATIONS
    // ========================================================================

    async fn suggestion_insert(&self, suggestion: &Suggestion) -> TrellisResult<()>;

    async fn suggestion_get(&self, id: SuggestionId) -> TrellisResult<Option<Suggestion>>;

    /// Suggestions of a conversation, newest first.
    async fn suggestion_list_by_conversation(
        &self,
        conversation_id: ConversationId,
        filter: SuggestionFilter,
    ) -> TrellisResult<Vec<Suggestion>>;

    /// Atomically move a suggestion out of `pending` and replace the row it
    /// targets, as a single write.
    ///
    /// Fails with `PreconditionFailed` when the stored status is no longer
    /// pending, so two concurrent resolutions cannot both succeed. On any
    /// error neither document changes.
    async fn suggestion_resolve(
        &self,
        id: SuggestionId,
        status: SuggestionStatus,
        resolved_at: Timestamp,
        application: &Application,
    ) -> TrellisResult<Suggestion>;

    // ========================================================================
    // HEALTH
    // ========================================================================

    /// Whether the backend can serve requests.
    async fn health_check(&self) -> TrellisResult<bool>;
}
