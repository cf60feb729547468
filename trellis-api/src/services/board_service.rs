//! Board Service
//!
//! Lazy creation of a conversation's board and column-schema edits.

use tracing::{debug, info};
use trellis_core::{Board, ColumnDef, ColumnPatch, ConversationId, NewColumn, StorageError, TrellisError, ValidationError};
use trellis_storage::DocumentStore;

use crate::access::resolve_participant;
use crate::auth::AuthContext;
use crate::error::{ApiError, ApiResult};
use crate::events::WsEvent;
use crate::state::AppState;

/// Board of `conversation_id`, created with the default columns on first use.
///
/// When a concurrent request creates the board first, the stored board is
/// re-read and returned.
pub async fn get_or_create_board(store: &dyn DocumentStore, conversation_id: ConversationId) -> ApiResult<Board> {
    if let Some(board) = store.board_get_by_conversation(conversation_id).await? {
        return Ok(board);
    }

    let board = Board::with_default_columns(conversation_id);
    match store.board_insert(&board).await {
        Ok(()) => {
            info!(
                conversation_id = %conversation_id,
                board_id = %board.board_id,
                "Created board with default columns"
            );
            Ok(board)
        }
        Err(TrellisError::Storage(StorageError::UniqueViolation { .. })) => {
            debug!(conversation_id = %conversation_id, "Lost board creation race, re-reading");
            store
                .board_get_by_conversation(conversation_id)
                .await?
                .ok_or_else(|| ApiError::internal_error("Board vanished after a uniqueness conflict"))
        }
        Err(e) => Err(e.into()),
    }
}

/// `GET /conversations/{cid}/board`
pub async fn get_board(state: &AppState, auth: &AuthContext, conversation_id: ConversationId) -> ApiResult<Board> {
    resolve_participant(state.access.as_ref(), conversation_id, auth).await?;
    get_or_create_board(state.store.as_ref(), conversation_id).await
}

/// Append a column and announce the new schema.
pub async fn add_column(
    state: &AppState,
    auth: &AuthContext,
    conversation_id: ConversationId,
    new: NewColumn,
) -> ApiResult<ColumnDef> {
    let participant = resolve_participant(state.access.as_ref(), conversation_id, auth).await?;
    let mut board = get_or_create_board(state.store.as_ref(), conversation_id).await?;

    let column = board.add_column(new)?;
    state.store.board_update(&board).await?;

    info!(
        conversation_id = %conversation_id,
        column_key = %column.key,
        role = %participant.role,
        "Column added"
    );
    state.ws.publish(conversation_id, WsEvent::BoardUpdated { conversation_id, board });
    Ok(column)
}

/// Patch a column's name, required flag, options or order.
pub async fn update_column(
    state: &AppState,
    auth: &AuthContext,
    conversation_id: ConversationId,
    key: &str,
    patch: ColumnPatch,
) -> ApiResult<ColumnDef> {
    let participant = resolve_participant(state.access.as_ref(), conversation_id, auth).await?;
    let mut board = get_or_create_board(state.store.as_ref(), conversation_id).await?;

    let column = board.update_column(key, patch).map_err(|e| match e {
        ValidationError::UnknownColumn { key } => ApiError::not_found(format!("Column '{}' not found", key)),
        other => other.into(),
    })?;
    state.store.board_update(&board).await?;

    info!(
        conversation_id = %conversation_id,
        column_key = %column.key,
        role = %participant.role,
        "Column updated"
    );
    state.ws.publish(conversation_id, WsEvent::BoardUpdated { conversation_id, board });
    Ok(column)
}
