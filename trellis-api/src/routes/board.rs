//! Board REST API Routes

use axum::{
    extract::{Path, State},
    http::StatusCode,
    response::IntoResponse,
    routing::{get, patch, post},
    Json, Router,
};
use trellis_core::{Board, ColumnDef, ConversationId};

use crate::{
    error::{ApiError, ApiResult},
    middleware::AuthExtractor,
    services,
    state::AppState,
    types::{AddColumnRequest, UpdateColumnRequest},
};

/// GET /api/v1/conversations/{cid}/board - Board of a conversation
#[utoipa::path(
    get,
    path = "/api/v1/conversations/{cid}/board",
    tag = "Board",
    params(("cid" = String, Path, description = "Conversation ID")),
    responses(
        (status = 200, description = "Board, created with default columns on first access", body = Board),
        (status = 401, description = "Unauthorized", body = ApiError),
        (status = 403, description = "Not a participant", body = ApiError),
    ),
    security(("bearer_auth" = []))
)]
pub async fn get_board(
    State(state): State<AppState>,
    AuthExtractor(auth): AuthExtractor,
    Path(conversation_id): Path<ConversationId>,
) -> ApiResult<Json<Board>> {
    let board = services::get_board(&state, &auth, conversation_id).await?;
    Ok(Json(board))
}

/// POST /api/v1/conversations/{cid}/board/columns - Add a column
#[utoipa::path(
    post,
    path = "/api/v1/conversations/{cid}/board/columns",
    tag = "Board",
    params(("cid" = String, Path, description = "Conversation ID")),
    request_body = AddColumnRequest,
    responses(
        (status = 201, description = "Column added", body = ColumnDef),
        (status = 400, description = "Invalid column definition", body = ApiError),
        (status = 409, description = "Column key already exists", body = ApiError),
    ),
    security(("bearer_auth" = []))
)]
pub async fn add_column(
    State(state): State<AppState>,
    AuthExtractor(auth): AuthExtractor,
    Path(conversation_id): Path<ConversationId>,
    Json(req): Json<AddColumnRequest>,
) -> ApiResult<impl IntoResponse> {
    let column = services::add_column(&state, &auth, conversation_id, req.into()).await?;
    Ok((StatusCode::CREATED, Json(column)))
}

/// PATCH /api/v1/conversations/{cid}/board/columns/{key} - Update a column
#[utoipa::path(
    patch,
    path = "/api/v1/conversations/{cid}/board/columns/{key}",
    tag = "Board",
    params(
        ("cid" = String, Path, description = "Conversation ID"),
        ("key" = String, Path, description = "Column key"),
    ),
    request_body = UpdateColumnRequest,
    responses(
        (status = 200, description = "Column updated", body = ColumnDef),
        (status = 400, description = "Invalid update", body = ApiError),
        (status = 404, description = "Column not found", body = ApiError),
    ),
    security(("bearer_auth" = []))
)]
pub async fn update_column(
    State(state): State<AppState>,
    AuthExtractor(auth): AuthExtractor,
    Path((conversation_id, key)): Path<(ConversationId, String)>,
    Json(req): Json<UpdateColumnRequest>,
) -> ApiResult<Json<ColumnDef>> {
    let column = services::update_column(&state, &auth, conversation_id, &key, req.into()).await?;
    Ok(Json(column))
}

/// Board routes, relative to `/api/v1`.
pub fn create_router() -> Router<AppState> {
    Router::new()
        .route("/conversations/:cid/board", get(get_board))
        .route("/conversations/:cid/board/columns", post(add_column))
        .route("/conversations/:cid/board/columns/:key", patch(update_column))
}
