//! Application Service
//!
//! Row lifecycle: create, direct edit, undo, delete, plus the timeline
//! annotations (activity posts, tags, reminders).

use chrono::Utc;
use serde_json::json;
use tracing::{debug, info};
use trellis_core::{
    apply_edit, build_cells, ActivityEntry, Application, ApplicationId, CellPatch, Changes,
    ConversationId, HistoryEntry, ReminderRef, Tag, TagId, Timestamp, UndoOutcome,
};

use super::{get_or_create_board, load_row};
use crate::access::resolve_participant;
use crate::auth::AuthContext;
use crate::error::ApiResult;
use crate::events::WsEvent;
use crate::state::AppState;
use crate::types::{Page, PageWindow};

// ============================================================================
// READS
// ============================================================================

/// Rows of a conversation, newest first.
pub async fn list_applications(
    state: &AppState,
    auth: &AuthContext,
    conversation_id: ConversationId,
    window: PageWindow,
) -> ApiResult<Page<Application>> {
    resolve_participant(state.access.as_ref(), conversation_id, auth).await?;
    let listing = state
        .store
        .application_list_by_conversation(conversation_id, window.limit as usize, window.offset())
        .await?;
    Ok(Page::new(listing.items, window, listing.total))
}

pub async fn get_application(
    state: &AppState,
    auth: &AuthContext,
    conversation_id: ConversationId,
    application_id: ApplicationId,
) -> ApiResult<Application> {
    resolve_participant(state.access.as_ref(), conversation_id, auth).await?;
    load_row(state.store.as_ref(), conversation_id, application_id).await
}

/// History of a row, newest first.
pub async fn list_history(
    state: &AppState,
    auth: &AuthContext,
    conversation_id: ConversationId,
    application_id: ApplicationId,
    window: PageWindow,
) -> ApiResult<Page<HistoryEntry>> {
    let row = get_application(state, auth, conversation_id, application_id).await?;
    let entries: Vec<HistoryEntry> = row.history_newest_first().into_iter().cloned().collect();
    Ok(Page::new(window.slice(&entries), window, entries.len()))
}

/// Activity log of a row, newest first.
pub async fn list_activity(
    state: &AppState,
    auth: &AuthContext,
    conversation_id: ConversationId,
    application_id: ApplicationId,
    window: PageWindow,
) -> ApiResult<Page<ActivityEntry>> {
    let row = get_application(state, auth, conversation_id, application_id).await?;
    let entries: Vec<ActivityEntry> = row.activity_newest_first().into_iter().cloned().collect();
    Ok(Page::new(window.slice(&entries), window, entries.len()))
}

// ============================================================================
// ROW MUTATIONS
// ============================================================================

/// Create a row from raw cell values. No history is recorded.
pub async fn create_application(
    state: &AppState,
    auth: &AuthContext,
    conversation_id: ConversationId,
    values: &CellPatch,
) -> ApiResult<Application> {
    let participant = resolve_participant(state.access.as_ref(), conversation_id, auth).await?;
    let board = get_or_create_board(state.store.as_ref(), conversation_id).await?;

    let mut row = Application::new(&board, participant.user_id.as_str());
    row.cells = build_cells(&board, values)?;
    state.store.application_insert(&row).await?;

    info!(
        conversation_id = %conversation_id,
        application_id = %row.application_id,
        role = %participant.role,
        "Application created"
    );
    state.ws.publish(
        conversation_id,
        WsEvent::ApplicationCreated {
            conversation_id,
            application_id: row.application_id,
            application: row.clone(),
        },
    );
    Ok(row)
}

/// Apply a direct edit. Returns the stored row and the fields that changed.
pub async fn edit_application(
    state: &AppState,
    auth: &AuthContext,
    conversation_id: ConversationId,
    application_id: ApplicationId,
    patch: &CellPatch,
) -> ApiResult<(Application, Changes)> {
    let participant = resolve_participant(state.access.as_ref(), conversation_id, auth).await?;
    let mut row = load_row(state.store.as_ref(), conversation_id, application_id).await?;
    let board = get_or_create_board(state.store.as_ref(), conversation_id).await?;

    let stored = row.clone();
    let changes = apply_edit(&mut row, &board, patch, participant.role)?;
    if changes.is_empty() {
        debug!(
            conversation_id = %conversation_id,
            application_id = %application_id,
            "Edit changed nothing"
        );
        return Ok((stored, changes));
    }
    row.updated_at = touched_at(&row);
    state.store.application_update(&row).await?;

    info!(
        conversation_id = %conversation_id,
        application_id = %application_id,
        role = %participant.role,
        changed = changes.len(),
        "Application edited"
    );
    state
        .ws
        .publish(conversation_id, WsEvent::cells_changed(&row, &changes));
    Ok((row, changes))
}

/// Revert the row's most recent change.
pub async fn undo_application(
    state: &AppState,
    auth: &AuthContext,
    conversation_id: ConversationId,
    application_id: ApplicationId,
) -> ApiResult<UndoOutcome> {
    let participant = resolve_participant(state.access.as_ref(), conversation_id, auth).await?;
    let mut row = load_row(state.store.as_ref(), conversation_id, application_id).await?;

    let outcome = row.undo(participant.role)?;
    row.updated_at = touched_at(&row);
    state.store.application_update(&row).await?;

    info!(
        conversation_id = %conversation_id,
        application_id = %application_id,
        field = %outcome.field,
        role = %participant.role,
        "Undo applied"
    );
    let mut changes = Changes::new();
    changes.insert(outcome.field.clone(), outcome.new_value.clone());
    state
        .ws
        .publish(conversation_id, WsEvent::cells_changed(&row, &changes));
    Ok(outcome)
}

/// Delete a row together with its suggestions.
pub async fn delete_application(
    state: &AppState,
    auth: &AuthContext,
    conversation_id: ConversationId,
    application_id: ApplicationId,
) -> ApiResult<()> {
    let participant = resolve_participant(state.access.as_ref(), conversation_id, auth).await?;
    load_row(state.store.as_ref(), conversation_id, application_id).await?;
    state.store.application_delete(application_id).await?;

    info!(
        conversation_id = %conversation_id,
        application_id = %application_id,
        role = %participant.role,
        "Application deleted"
    );
    state.ws.publish(
        conversation_id,
        WsEvent::ApplicationDeleted {
            conversation_id,
            application_id,
        },
    );
    Ok(())
}

// ============================================================================
// ANNOTATIONS
// ============================================================================

pub async fn post_activity(
    state: &AppState,
    auth: &AuthContext,
    conversation_id: ConversationId,
    application_id: ApplicationId,
    message: &str,
) -> ApiResult<ActivityEntry> {
    let participant = resolve_participant(state.access.as_ref(), conversation_id, auth).await?;
    let mut row = load_row(state.store.as_ref(), conversation_id, application_id).await?;

    let entry = row.post_activity(participant.role, message)?;
    row.updated_at = touched_at(&row);
    state.store.application_update(&row).await?;

    state.ws.publish(
        conversation_id,
        WsEvent::ActivityLogCreated {
            conversation_id,
            application_id,
            entry: entry.clone(),
        },
    );
    Ok(entry)
}

pub async fn add_tag(
    state: &AppState,
    auth: &AuthContext,
    conversation_id: ConversationId,
    application_id: ApplicationId,
    label: &str,
    color: &str,
) -> ApiResult<Tag> {
    resolve_participant(state.access.as_ref(), conversation_id, auth).await?;
    let mut row = load_row(state.store.as_ref(), conversation_id, application_id).await?;

    let tag = row.add_tag(label, color)?;
    state.store.application_update(&row).await?;

    state
        .ws
        .publish(conversation_id, WsEvent::row_field_changed(&row, "tags", json!(row.tags)));
    Ok(tag)
}

pub async fn remove_tag(
    state: &AppState,
    auth: &AuthContext,
    conversation_id: ConversationId,
    application_id: ApplicationId,
    tag_id: TagId,
) -> ApiResult<Tag> {
    resolve_participant(state.access.as_ref(), conversation_id, auth).await?;
    let mut row = load_row(state.store.as_ref(), conversation_id, application_id).await?;

    let tag = row.remove_tag(tag_id)?;
    state.store.application_update(&row).await?;

    state
        .ws
        .publish(conversation_id, WsEvent::row_field_changed(&row, "tags", json!(row.tags)));
    Ok(tag)
}

pub async fn attach_reminder(
    state: &AppState,
    auth: &AuthContext,
    conversation_id: ConversationId,
    application_id: ApplicationId,
    reminder_id: &str,
    due_at: Timestamp,
) -> ApiResult<ReminderRef> {
    let participant = resolve_participant(state.access.as_ref(), conversation_id, auth).await?;
    let mut row = load_row(state.store.as_ref(), conversation_id, application_id).await?;

    let reminder = row.attach_reminder(reminder_id, due_at, participant.role)?;
    state.store.application_update(&row).await?;

    state.ws.publish(
        conversation_id,
        WsEvent::row_field_changed(&row, "reminders", json!(row.reminders)),
    );
    Ok(reminder)
}

/// `updated_at` never moves backwards.
pub(crate) fn touched_at(row: &Application) -> Timestamp {
    Utc::now().max(row.updated_at)
}
