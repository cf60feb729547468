//! Service Layer
//!
//! Business operations behind the REST handlers. Each operation resolves the
//! caller inside the conversation, loads what it needs, mutates in memory,
//! persists, and only then publishes to the conversation's subscribers.

mod application_service;
mod board_service;
mod suggestion_service;

pub use application_service::*;
pub use board_service::*;
pub use suggestion_service::*;

use trellis_core::{AccessError, Application, ApplicationId, ConversationId, EntityIdType, EntityType};
use trellis_storage::DocumentStore;

use crate::error::{ApiError, ApiResult};

/// Load a row and check it belongs to `conversation_id`.
pub(crate) async fn load_row(
    store: &dyn DocumentStore,
    conversation_id: ConversationId,
    application_id: ApplicationId,
) -> ApiResult<Application> {
    let row = store
        .application_get(application_id)
        .await?
        .ok_or_else(|| ApiError::entity_not_found(EntityType::Application, application_id))?;

    if row.conversation_id != conversation_id {
        return Err(AccessError::WrongConversation {
            entity_type: EntityType::Application,
            id: application_id.as_uuid(),
            conversation_id: conversation_id.as_uuid(),
        }
        .into());
    }
    Ok(row)
}
