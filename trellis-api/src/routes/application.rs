//! Application REST API Routes
//!
//! Rows of a conversation's board, their history and their timeline.

use axum::{
    extract::{Path, Query, State},
    http::StatusCode,
    response::IntoResponse,
    routing::{delete, get, post},
    Json, Router,
};
use trellis_core::{
    ActivityEntry, Application, ApplicationId, ConversationId, HistoryEntry, ReminderRef, Tag, TagId,
    UndoOutcome,
};

use crate::{
    error::{ApiError, ApiResult},
    middleware::AuthExtractor,
    services,
    state::AppState,
    types::{
        AddTagRequest, AttachReminderRequest, CreateApplicationRequest, EditApplicationRequest,
        EditApplicationResponse, Page, PageParams, PostActivityRequest,
    },
};

type RowPath = Path<(ConversationId, ApplicationId)>;

/// GET /api/v1/conversations/{cid}/applications - List rows, newest first
#[utoipa::path(
    get,
    path = "/api/v1/conversations/{cid}/applications",
    tag = "Applications",
    params(("cid" = String, Path, description = "Conversation ID"), PageParams),
    responses(
        (status = 200, description = "One page of rows", body = Page<Application>),
        (status = 400, description = "Invalid page window", body = ApiError),
        (status = 403, description = "Not a participant", body = ApiError),
    ),
    security(("bearer_auth" = []))
)]
pub async fn list_applications(
    State(state): State<AppState>,
    AuthExtractor(auth): AuthExtractor,
    Path(conversation_id): Path<ConversationId>,
    Query(params): Query<PageParams>,
) -> ApiResult<Json<Page<Application>>> {
    let window = params.window(&state.config)?;
    let page = services::list_applications(&state, &auth, conversation_id, window).await?;
    Ok(Json(page))
}

/// POST /api/v1/conversations/{cid}/applications - Create a row
#[utoipa::path(
    post,
    path = "/api/v1/conversations/{cid}/applications",
    tag = "Applications",
    params(("cid" = String, Path, description = "Conversation ID")),
    request_body = CreateApplicationRequest,
    responses(
        (status = 201, description = "Row created", body = Application),
        (status = 400, description = "Invalid or missing cell values", body = ApiError),
        (status = 403, description = "Not a participant", body = ApiError),
    ),
    security(("bearer_auth" = []))
)]
pub async fn create_application(
    State(state): State<AppState>,
    AuthExtractor(auth): AuthExtractor,
    Path(conversation_id): Path<ConversationId>,
    Json(req): Json<CreateApplicationRequest>,
) -> ApiResult<impl IntoResponse> {
    let row = services::create_application(&state, &auth, conversation_id, &req.cells).await?;
    Ok((StatusCode::CREATED, Json(row)))
}

/// GET /api/v1/conversations/{cid}/applications/{id} - Get a row
#[utoipa::path(
    get,
    path = "/api/v1/conversations/{cid}/applications/{id}",
    tag = "Applications",
    params(
        ("cid" = String, Path, description = "Conversation ID"),
        ("id" = String, Path, description = "Application ID"),
    ),
    responses(
        (status = 200, description = "Row found", body = Application),
        (status = 404, description = "Row not found", body = ApiError),
    ),
    security(("bearer_auth" = []))
)]
pub async fn get_application(
    State(state): State<AppState>,
    AuthExtractor(auth): AuthExtractor,
    Path((conversation_id, application_id)): RowPath,
) -> ApiResult<Json<Application>> {
    let row = services::get_application(&state, &auth, conversation_id, application_id).await?;
    Ok(Json(row))
}

/// PATCH /api/v1/conversations/{cid}/applications/{id} - Direct edit
#[utoipa::path(
    patch,
    path = "/api/v1/conversations/{cid}/applications/{id}",
    tag = "Applications",
    params(
        ("cid" = String, Path, description = "Conversation ID"),
        ("id" = String, Path, description = "Application ID"),
    ),
    request_body = EditApplicationRequest,
    responses(
        (status = 200, description = "Row edited", body = EditApplicationResponse),
        (status = 400, description = "Invalid cell value or required column missing", body = ApiError),
        (status = 404, description = "Row not found", body = ApiError),
    ),
    security(("bearer_auth" = []))
)]
pub async fn edit_application(
    State(state): State<AppState>,
    AuthExtractor(auth): AuthExtractor,
    Path((conversation_id, application_id)): RowPath,
    Json(req): Json<EditApplicationRequest>,
) -> ApiResult<Json<EditApplicationResponse>> {
    let (application, changes) =
        services::edit_application(&state, &auth, conversation_id, application_id, &req.cells).await?;
    Ok(Json(EditApplicationResponse {
        application,
        changes: changes
            .into_iter()
            .map(|(key, value)| (key, value.to_json()))
            .collect(),
    }))
}

/// DELETE /api/v1/conversations/{cid}/applications/{id} - Delete a row
#[utoipa::path(
    delete,
    path = "/api/v1/conversations/{cid}/applications/{id}",
    tag = "Applications",
    params(
        ("cid" = String, Path, description = "Conversation ID"),
        ("id" = String, Path, description = "Application ID"),
    ),
    responses(
        (status = 204, description = "Row deleted"),
        (status = 404, description = "Row not found", body = ApiError),
    ),
    security(("bearer_auth" = []))
)]
pub async fn delete_application(
    State(state): State<AppState>,
    AuthExtractor(auth): AuthExtractor,
    Path((conversation_id, application_id)): RowPath,
) -> ApiResult<StatusCode> {
    services::delete_application(&state, &auth, conversation_id, application_id).await?;
    Ok(StatusCode::NO_CONTENT)
}

/// POST /api/v1/conversations/{cid}/applications/{id}/undo - Revert the latest change
#[utoipa::path(
    post,
    path = "/api/v1/conversations/{cid}/applications/{id}/undo",
    tag = "Applications",
    params(
        ("cid" = String, Path, description = "Conversation ID"),
        ("id" = String, Path, description = "Application ID"),
    ),
    responses(
        (status = 200, description = "Change reverted", body = UndoOutcome),
        (status = 400, description = "No history to undo", body = ApiError),
        (status = 404, description = "Row not found", body = ApiError),
    ),
    security(("bearer_auth" = []))
)]
pub async fn undo_application(
    State(state): State<AppState>,
    AuthExtractor(auth): AuthExtractor,
    Path((conversation_id, application_id)): RowPath,
) -> ApiResult<Json<UndoOutcome>> {
    let outcome = services::undo_application(&state, &auth, conversation_id, application_id).await?;
    Ok(Json(outcome))
}

/// GET /api/v1/conversations/{cid}/applications/{id}/history - History, newest first
#[utoipa::path(
    get,
    path = "/api/v1/conversations/{cid}/applications/{id}/history",
    tag = "Applications",
    params(
        ("cid" = String, Path, description = "Conversation ID"),
        ("id" = String, Path, description = "Application ID"),
        PageParams,
    ),
    responses(
        (status = 200, description = "One page of history", body = Page<HistoryEntry>),
        (status = 404, description = "Row not found", body = ApiError),
    ),
    security(("bearer_auth" = []))
)]
pub async fn list_history(
    State(state): State<AppState>,
    AuthExtractor(auth): AuthExtractor,
    Path((conversation_id, application_id)): RowPath,
    Query(params): Query<PageParams>,
) -> ApiResult<Json<Page<HistoryEntry>>> {
    let window = params.window(&state.config)?;
    let page = services::list_history(&state, &auth, conversation_id, application_id, window).await?;
    Ok(Json(page))
}

/// GET /api/v1/conversations/{cid}/applications/{id}/activity - Activity, newest first
#[utoipa::path(
    get,
    path = "/api/v1/conversations/{cid}/applications/{id}/activity",
    tag = "Applications",
    params(
        ("cid" = String, Path, description = "Conversation ID"),
        ("id" = String, Path, description = "Application ID"),
        PageParams,
    ),
    responses(
        (status = 200, description = "One page of activity", body = Page<ActivityEntry>),
        (status = 404, description = "Row not found", body = ApiError),
    ),
    security(("bearer_auth" = []))
)]
pub async fn list_activity(
    State(state): State<AppState>,
    AuthExtractor(auth): AuthExtractor,
    Path((conversation_id, application_id)): RowPath,
    Query(params): Query<PageParams>,
) -> ApiResult<Json<Page<ActivityEntry>>> {
    let window = params.window(&state.config)?;
    let page = services::list_activity(&state, &auth, conversation_id, application_id, window).await?;
    Ok(Json(page))
}

/// POST /api/v1/conversations/{cid}/applications/{id}/activity - Post a note
#[utoipa::path(
    post,
    path = "/api/v1/conversations/{cid}/applications/{id}/activity",
    tag = "Applications",
    params(
        ("cid" = String, Path, description = "Conversation ID"),
        ("id" = String, Path, description = "Application ID"),
    ),
    request_body = PostActivityRequest,
    responses(
        (status = 201, description = "Activity posted", body = ActivityEntry),
        (status = 400, description = "Empty or oversized message", body = ApiError),
    ),
    security(("bearer_auth" = []))
)]
pub async fn post_activity(
    State(state): State<AppState>,
    AuthExtractor(auth): AuthExtractor,
    Path((conversation_id, application_id)): RowPath,
    Json(req): Json<PostActivityRequest>,
) -> ApiResult<impl IntoResponse> {
    let entry =
        services::post_activity(&state, &auth, conversation_id, application_id, &req.message).await?;
    Ok((StatusCode::CREATED, Json(entry)))
}

/// POST /api/v1/conversations/{cid}/applications/{id}/tags - Add a tag
#[utoipa::path(
    post,
    path = "/api/v1/conversations/{cid}/applications/{id}/tags",
    tag = "Applications",
    params(
        ("cid" = String, Path, description = "Conversation ID"),
        ("id" = String, Path, description = "Application ID"),
    ),
    request_body = AddTagRequest,
    responses(
        (status = 201, description = "Tag added", body = Tag),
        (status = 400, description = "Invalid label or color", body = ApiError),
        (status = 409, description = "Label already used on this row", body = ApiError),
    ),
    security(("bearer_auth" = []))
)]
pub async fn add_tag(
    State(state): State<AppState>,
    AuthExtractor(auth): AuthExtractor,
    Path((conversation_id, application_id)): RowPath,
    Json(req): Json<AddTagRequest>,
) -> ApiResult<impl IntoResponse> {
    let tag = services::add_tag(&state, &auth, conversation_id, application_id, &req.label, &req.color).await?;
    Ok((StatusCode::CREATED, Json(tag)))
}

/// DELETE /api/v1/conversations/{cid}/applications/{id}/tags/{tagId} - Remove a tag
#[utoipa::path(
    delete,
    path = "/api/v1/conversations/{cid}/applications/{id}/tags/{tagId}",
    tag = "Applications",
    params(
        ("cid" = String, Path, description = "Conversation ID"),
        ("id" = String, Path, description = "Application ID"),
        ("tagId" = String, Path, description = "Tag ID"),
    ),
    responses(
        (status = 200, description = "Tag removed", body = Tag),
        (status = 404, description = "Tag not found", body = ApiError),
    ),
    security(("bearer_auth" = []))
)]
pub async fn remove_tag(
    State(state): State<AppState>,
    AuthExtractor(auth): AuthExtractor,
    Path((conversation_id, application_id, tag_id)): Path<(ConversationId, ApplicationId, TagId)>,
) -> ApiResult<Json<Tag>> {
    let tag = services::remove_tag(&state, &auth, conversation_id, application_id, tag_id).await?;
    Ok(Json(tag))
}

/// POST /api/v1/conversations/{cid}/applications/{id}/reminders - Attach a reminder
#[utoipa::path(
    post,
    path = "/api/v1/conversations/{cid}/applications/{id}/reminders",
    tag = "Applications",
    params(
        ("cid" = String, Path, description = "Conversation ID"),
        ("id" = String, Path, description = "Application ID"),
    ),
    request_body = AttachReminderRequest,
    responses(
        (status = 201, description = "Reminder attached", body = ReminderRef),
        (status = 400, description = "Invalid reminder reference", body = ApiError),
    ),
    security(("bearer_auth" = []))
)]
pub async fn attach_reminder(
    State(state): State<AppState>,
    AuthExtractor(auth): AuthExtractor,
    Path((conversation_id, application_id)): RowPath,
    Json(req): Json<AttachReminderRequest>,
) -> ApiResult<impl IntoResponse> {
    let reminder = services::attach_reminder(
        &state,
        &auth,
        conversation_id,
        application_id,
        &req.reminder_id,
        req.due_at,
    )
    .await?;
    Ok((StatusCode::CREATED, Json(reminder)))
}

/// Application routes, relative to `/api/v1`.
pub fn create_router() -> Router<AppState> {
    Router::new()
        .route(
            "/conversations/:cid/applications",
            get(list_applications).post(create_application),
        )
        .route(
            "/conversations/:cid/applications/:id",
            get(get_application)
                .patch(edit_application)
                .delete(delete_application),
        )
        .route("/conversations/:cid/applications/:id/undo", post(undo_application))
        .route("/conversations/:cid/applications/:id/history", get(list_history))
        .route(
            "/conversations/:cid/applications/:id/activity",
            get(list_activity).post(post_activity),
        )
        .route("/conversations/:cid/applications/:id/tags", post(add_tag))
        .route("/conversations/:cid/applications/:id/tags/:tag_id", delete(remove_tag))
        .route("/conversations/:cid/applications/:id/reminders", post(attach_reminder))
}
