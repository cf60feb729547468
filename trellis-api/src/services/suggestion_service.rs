//! Suggestion Service
//!
//! Proposals guarded by the value their author saw, and their one-time
//! resolution by the mentee. The store's conditional update decides races
//! between concurrent resolutions; the row is only written by the winner.

use chrono::Utc;
use tracing::{info, warn};
use trellis_core::{
    lost_resolution_race, Application, Changes, ConversationId, EntityType, StorageError, Suggestion,
    SuggestionId, SuggestionStatus, TrellisError,
};
use trellis_storage::SuggestionFilter;

use super::{get_or_create_board, load_row};
use crate::access::resolve_participant;
use crate::auth::AuthContext;
use crate::error::{ApiError, ApiResult};
use crate::events::WsEvent;
use crate::state::AppState;
use crate::types::CreateSuggestionRequest;

/// Suggestions of a conversation, newest first.
pub async fn list_suggestions(
    state: &AppState,
    auth: &AuthContext,
    conversation_id: ConversationId,
    filter: SuggestionFilter,
) -> ApiResult<Vec<Suggestion>> {
    resolve_participant(state.access.as_ref(), conversation_id, auth).await?;
    Ok(state
        .store
        .suggestion_list_by_conversation(conversation_id, filter)
        .await?)
}

/// Propose a change. Fails with a stale-state error, storing nothing, when
/// `old_value` no longer matches the row.
pub async fn create_suggestion(
    state: &AppState,
    auth: &AuthContext,
    conversation_id: ConversationId,
    req: &CreateSuggestionRequest,
) -> ApiResult<Suggestion> {
    let participant = resolve_participant(state.access.as_ref(), conversation_id, auth).await?;
    let row = load_row(state.store.as_ref(), conversation_id, req.application_id).await?;
    let board = get_or_create_board(state.store.as_ref(), conversation_id).await?;

    let suggestion = Suggestion::propose(
        &board,
        &row,
        &req.field,
        &req.old_value,
        &req.proposed_value,
        participant.role,
    )?;
    state.store.suggestion_insert(&suggestion).await?;

    info!(
        conversation_id = %conversation_id,
        application_id = %suggestion.application_id,
        suggestion_id = %suggestion.suggestion_id,
        field = %suggestion.field,
        role = %participant.role,
        "Suggestion created"
    );
    state.ws.publish(
        conversation_id,
        WsEvent::SuggestionCreated {
            conversation_id,
            application_id: suggestion.application_id,
            suggestion: suggestion.clone(),
        },
    );
    Ok(suggestion)
}

/// Accept a pending suggestion: the proposed value is written to the row.
pub async fn accept_suggestion(
    state: &AppState,
    auth: &AuthContext,
    suggestion_id: SuggestionId,
) -> ApiResult<(Suggestion, Application)> {
    resolve_suggestion(state, auth, suggestion_id, SuggestionStatus::Accepted).await
}

/// Reject a pending suggestion. Only the row's activity log changes.
pub async fn reject_suggestion(
    state: &AppState,
    auth: &AuthContext,
    suggestion_id: SuggestionId,
) -> ApiResult<(Suggestion, Application)> {
    resolve_suggestion(state, auth, suggestion_id, SuggestionStatus::Rejected).await
}

async fn resolve_suggestion(
    state: &AppState,
    auth: &AuthContext,
    suggestion_id: SuggestionId,
    outcome: SuggestionStatus,
) -> ApiResult<(Suggestion, Application)> {
    let suggestion = state
        .store
        .suggestion_get(suggestion_id)
        .await?
        .ok_or_else(|| ApiError::entity_not_found(EntityType::Suggestion, suggestion_id))?;
    let conversation_id = suggestion.conversation_id;

    let participant = resolve_participant(state.access.as_ref(), conversation_id, auth).await?;
    suggestion.ensure_resolvable(participant.role)?;

    let mut row = load_row(state.store.as_ref(), conversation_id, suggestion.application_id).await?;
    let board = get_or_create_board(state.store.as_ref(), conversation_id).await?;

    let accepted = match outcome {
        SuggestionStatus::Accepted => Some(suggestion.apply_accepted(&board, &mut row, participant.role)?),
        _ => {
            suggestion.apply_rejected(&board, &mut row, participant.role)?;
            None
        }
    };

    row.updated_at = super::application_service::touched_at(&row);
    let resolved = match state
        .store
        .suggestion_resolve(suggestion_id, outcome, Utc::now(), &row)
        .await
    {
        Ok(resolved) => resolved,
        Err(TrellisError::Storage(StorageError::PreconditionFailed { .. })) => {
            let status = state
                .store
                .suggestion_get(suggestion_id)
                .await?
                .map_or(outcome, |s| s.status);
            warn!(
                suggestion_id = %suggestion_id,
                status = %status,
                "Suggestion resolved concurrently"
            );
            return Err(lost_resolution_race(status).into());
        }
        Err(e) => return Err(e.into()),
    };

    info!(
        conversation_id = %conversation_id,
        application_id = %row.application_id,
        suggestion_id = %suggestion_id,
        status = %resolved.status,
        role = %participant.role,
        "Suggestion resolved"
    );
    state.ws.publish(
        conversation_id,
        WsEvent::SuggestionResolved {
            conversation_id,
            application_id: row.application_id,
            suggestion: resolved.clone(),
        },
    );
    if let Some(change) = accepted {
        let mut changes = Changes::new();
        changes.insert(change.field, change.new_value);
        state
            .ws
            .publish(conversation_id, WsEvent::cells_changed(&row, &changes));
    }
    Ok((resolved, row))
}
