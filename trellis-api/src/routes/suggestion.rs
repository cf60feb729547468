//! Suggestion REST API Routes

use axum::{
    extract::{Path, Query, State},
    http::StatusCode,
    response::IntoResponse,
    routing::{get, post},
    Json, Router,
};
use trellis_core::{ConversationId, Suggestion, SuggestionId};
use trellis_storage::SuggestionFilter;

use crate::{
    error::{ApiError, ApiResult},
    middleware::AuthExtractor,
    services,
    state::AppState,
    types::{CreateSuggestionRequest, ListSuggestionsResponse, ResolveSuggestionResponse, SuggestionListParams},
};

/// GET /api/v1/conversations/{cid}/suggestions - List suggestions
#[utoipa::path(
    get,
    path = "/api/v1/conversations/{cid}/suggestions",
    tag = "Suggestions",
    params(("cid" = String, Path, description = "Conversation ID"), SuggestionListParams),
    responses(
        (status = 200, description = "Suggestions, newest first", body = ListSuggestionsResponse),
        (status = 403, description = "Not a participant", body = ApiError),
    ),
    security(("bearer_auth" = []))
)]
pub async fn list_suggestions(
    State(state): State<AppState>,
    AuthExtractor(auth): AuthExtractor,
    Path(conversation_id): Path<ConversationId>,
    Query(params): Query<SuggestionListParams>,
) -> ApiResult<Json<ListSuggestionsResponse>> {
    let filter = SuggestionFilter {
        status: params.status,
        application_id: params.application_id,
    };
    let items = services::list_suggestions(&state, &auth, conversation_id, filter).await?;
    let total = items.len();
    Ok(Json(ListSuggestionsResponse { items, total }))
}

/// POST /api/v1/conversations/{cid}/suggestions - Propose a change
#[utoipa::path(
    post,
    path = "/api/v1/conversations/{cid}/suggestions",
    tag = "Suggestions",
    params(("cid" = String, Path, description = "Conversation ID")),
    request_body = CreateSuggestionRequest,
    responses(
        (status = 201, description = "Suggestion created", body = Suggestion),
        (status = 400, description = "Unknown column or invalid proposed value", body = ApiError),
        (status = 404, description = "Row not found", body = ApiError),
        (status = 409, description = "Value changed since it was read", body = ApiError),
    ),
    security(("bearer_auth" = []))
)]
pub async fn create_suggestion(
    State(state): State<AppState>,
    AuthExtractor(auth): AuthExtractor,
    Path(conversation_id): Path<ConversationId>,
    Json(req): Json<CreateSuggestionRequest>,
) -> ApiResult<impl IntoResponse> {
    let suggestion = services::create_suggestion(&state, &auth, conversation_id, &req).await?;
    Ok((StatusCode::CREATED, Json(suggestion)))
}

/// POST /api/v1/suggestions/{id}/accept - Accept a pending suggestion
#[utoipa::path(
    post,
    path = "/api/v1/suggestions/{id}/accept",
    tag = "Suggestions",
    params(("id" = String, Path, description = "Suggestion ID")),
    responses(
        (status = 200, description = "Suggestion accepted", body = ResolveSuggestionResponse),
        (status = 403, description = "Only the mentee resolves suggestions", body = ApiError),
        (status = 404, description = "Suggestion not found", body = ApiError),
        (status = 409, description = "Suggestion is no longer pending", body = ApiError),
    ),
    security(("bearer_auth" = []))
)]
pub async fn accept_suggestion(
    State(state): State<AppState>,
    AuthExtractor(auth): AuthExtractor,
    Path(suggestion_id): Path<SuggestionId>,
) -> ApiResult<Json<ResolveSuggestionResponse>> {
    let (suggestion, application) = services::accept_suggestion(&state, &auth, suggestion_id).await?;
    Ok(Json(ResolveSuggestionResponse {
        suggestion,
        application,
    }))
}

/// POST /api/v1/suggestions/{id}/reject - Reject a pending suggestion
#[utoipa::path(
    post,
    path = "/api/v1/suggestions/{id}/reject",
    tag = "Suggestions",
    params(("id" = String, Path, description = "Suggestion ID")),
    responses(
        (status = 200, description = "Suggestion rejected", body = ResolveSuggestionResponse),
        (status = 403, description = "Only the mentee resolves suggestions", body = ApiError),
        (status = 404, description = "Suggestion not found", body = ApiError),
        (status = 409, description = "Suggestion is no longer pending", body = ApiError),
    ),
    security(("bearer_auth" = []))
)]
pub async fn reject_suggestion(
    State(state): State<AppState>,
    AuthExtractor(auth): AuthExtractor,
    Path(suggestion_id): Path<SuggestionId>,
) -> ApiResult<Json<ResolveSuggestionResponse>> {
    let (suggestion, application) = services::reject_suggestion(&state, &auth, suggestion_id).await?;
    Ok(Json(ResolveSuggestionResponse {
        suggestion,
        application,
    }))
}

/// Suggestion routes, relative to `/api/v1`.
pub fn create_router() -> Router<AppState> {
    Router::new()
        .route(
            "/conversations/:cid/suggestions",
            get(list_suggestions).post(create_suggestion),
        )
        .route("/suggestions/:id/accept", post(accept_suggestion))
        .route("/suggestions/:id/reject", post(reject_suggestion))
}
