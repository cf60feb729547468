//! In-memory document store, used by tests and single-node deployments.

use crate::{DocumentStore, Listing, SuggestionFilter};
use ::async_trait::async_trait;
use std::collections::HashMap;
use std::sync::Arc;
use tokio::sync::RwLock;
use trellis_core::{
    Application, ApplicationId, Board, ConversationId, EntityIdType, EntityType, StorageError,
    Suggestion, SuggestionId, SuggestionStatus, Timestamp, TrellisResult,
};

/// Store backed by `HashMap`s behind async read-write locks.
///
/// Cloning shares the underlying maps.
#[derive(Debug, Default, Clone)]
pub struct InMemoryStore {
    boards: Arc<RwLock<HashMap<ConversationId, Board>>>,
    applications: Arc<RwLock<HashMap<ApplicationId, Application>>>,
    suggestions: Arc<RwLock<HashMap<SuggestionId, Suggestion>>>,
}

impl InMemoryStore {
    pub fn new() -> Self {
        Self::default()
    }

    /// Clear all stored data.
    pub async fn clear(&self) {
        self.boards.write().await.clear();
        self.applications.write().await.clear();
        self.suggestions.write().await.clear();
    }

    pub async fn board_count(&self) -> usize {
        self.boards.read().await.len()
    }

    pub async fn application_count(&self) -> usize {
        self.applications.read().await.len()
    }

    pub async fn suggestion_count(&self) -> usize {
        self.suggestions.read().await.len()
    }
}

#[async_trait]
impl DocumentStore for InMemoryStore {
    // === Board Operations ===

    async fn board_get_by_conversation(&self, conversation_id: ConversationId) -> TrellisResult<Option<Board>> {
        Ok(self.boards.read().await.get(&conversation_id).cloned())
    }

    async fn board_insert(&self, board: &Board) -> TrellisResult<()> {
        let mut boards = self.boards.write().await;
        if boards.contains_key(&board.conversation_id) {
            return Err(StorageError::UniqueViolation {
                entity_type: EntityType::Board,
                constraint: "boards_conversation_id_key".to_string(),
            }
            .into());
        }
        boards.insert(board.conversation_id, board.clone());
        Ok(())
    }

    async fn board_update(&self, board: &Board) -> TrellisResult<()> {
        let mut boards = self.boards.write().await;
        match boards.get_mut(&board.conversation_id) {
            Some(stored) if stored.board_id == board.board_id => {
                *stored = board.clone();
                Ok(())
            }
            _ => Err(StorageError::NotFound {
                entity_type: EntityType::Board,
                id: board.board_id.as_uuid(),
            }
            .into()),
        }
    }

    // === Application Operations ===

    async fn application_insert(&self, application: &Application) -> TrellisResult<()> {
        let mut applications = self.applications.write().await;
        if applications.contains_key(&application.application_id) {
            return Err(StorageError::InsertFailed {
                entity_type: EntityType::Application,
                reason: "already exists".to_string(),
            }
            .into());
        }
        applications.insert(application.application_id, application.clone());
        Ok(())
    }

    async fn application_get(&self, id: ApplicationId) -> TrellisResult<Option<Application>> {
        Ok(self.applications.read().await.get(&id).cloned())
    }

    async fn application_update(&self, application: &Application) -> TrellisResult<()> {
        let mut applications = self.applications.write().await;
        let stored = applications
            .get_mut(&application.application_id)
            .ok_or(StorageError::NotFound {
                entity_type: EntityType::Application,
                id: application.application_id.as_uuid(),
            })?;
        *stored = application.clone();
        Ok(())
    }

    async fn application_delete(&self, id: ApplicationId) -> TrellisResult<()> {
        let removed = self.applications.write().await.remove(&id);
        if removed.is_none() {
            return Err(StorageError::NotFound {
                entity_type: EntityType::Application,
                id: id.as_uuid(),
            }
            .into());
        }
        let mut suggestions = self.suggestions.write().await;
        let before = suggestions.len();
        suggestions.retain(|_, s| s.application_id != id);
        tracing::debug!(
            application_id = %id,
            removed_suggestions = before - suggestions.len(),
            "Deleted application"
        );
        Ok(())
    }

    async fn application_list_by_conversation(
        &self,
        conversation_id: ConversationId,
        limit: usize,
        offset: usize,
    ) -> TrellisResult<Listing<Application>> {
        let applications = self.applications.read().await;
        let mut matching: Vec<&Application> = applications
            .values()
            .filter(|a| a.conversation_id == conversation_id)
            .collect();
        matching.sort_by(|a, b| {
            b.created_at
                .cmp(&a.created_at)
                .then_with(|| b.application_id.cmp(&a.application_id))
        });
        let total = matching.len();
        let items = matching.into_iter().skip(offset).take(limit).cloned().collect();
        Ok(Listing { items, total })
    }

    // === Suggestion Operations ===

    async fn suggestion_insert(&self, suggestion: &Suggestion) -> TrellisResult<()> {
        let mut suggestions = self.suggestions.write().await;
        if suggestions.contains_key(&suggestion.suggestion_id) {
            return Err(StorageError::InsertFailed {
                entity_type: EntityType::Suggestion,
                reason: "already exists".to_string(),
            }
            .into());
        }
        suggestions.insert(suggestion.suggestion_id, suggestion.clone());
        Ok(())
    }

    async fn suggestion_get(&self, id: SuggestionId) -> TrellisResult<Option<Suggestion>> {
        Ok(self.suggestions.read().await.get(&id).cloned())
    }

    async fn suggestion_list_by_conversation(
        &self,
        conversation_id: ConversationId,
        filter: SuggestionFilter,
    ) -> TrellisResult<Vec<Suggestion>> {
        let suggestions = self.suggestions.read().await;
        let mut matching: Vec<Suggestion> = suggestions
            .values()
            .filter(|s| s.conversation_id == conversation_id && filter.matches(s))
            .cloned()
            .collect();
        matching.sort_by(|a, b| {
            b.created_at
                .cmp(&a.created_at)
                .then_with(|| b.suggestion_id.cmp(&a.suggestion_id))
        });
        Ok(matching)
    }

    async fn suggestion_resolve(
        &self,
        id: SuggestionId,
        status: SuggestionStatus,
        resolved_at: Timestamp,
        application: &Application,
    ) -> TrellisResult<Suggestion> {
        // Lock order: applications before suggestions.
        let mut applications = self.applications.write().await;
        let mut suggestions = self.suggestions.write().await;

        let suggestion = suggestions.get_mut(&id).ok_or(StorageError::NotFound {
            entity_type: EntityType::Suggestion,
            id: id.as_uuid(),
        })?;
        if suggestion.application_id != application.application_id {
            return Err(StorageError::UpdateFailed {
                entity_type: EntityType::Suggestion,
                id: id.as_uuid(),
                reason: format!("targets application {}", suggestion.application_id),
            }
            .into());
        }
        let stored_row = applications
            .get_mut(&application.application_id)
            .ok_or(StorageError::NotFound {
                entity_type: EntityType::Application,
                id: application.application_id.as_uuid(),
            })?;
        if suggestion.resolve(status, resolved_at).is_err() {
            return Err(StorageError::PreconditionFailed {
                entity_type: EntityType::Suggestion,
                id: id.as_uuid(),
            }
            .into());
        }
        *stored_row = application.clone();
        Ok(suggestion.clone())
    }

    // === Health ===

    async fn health_check(&self) -> TrellisResult<bool> {
        Ok(true)
    }
}
