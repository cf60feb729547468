//! OpenAPI Specification for the Trellis API
//!
//! Generated with utoipa from the route annotations and the entity types.

use utoipa::openapi::security::{HttpAuthScheme, HttpBuilder, SecurityScheme};
use utoipa::{Modify, OpenApi};

use crate::error::{ApiError, ErrorCode};
use crate::routes::health::{ComponentHealth, HealthDetails, HealthResponse, HealthStatus};
use crate::routes::{application, board, health, suggestion};
use crate::types::*;

use trellis_core::{
    ActivityEntry, Application, Board, ColumnDef, ColumnType, HistoryEntry, ReminderRef, Role, Suggestion,
    SuggestionStatus, Tag, UndoOutcome,
};

/// OpenAPI document for the Trellis API.
#[derive(OpenApi)]
#[openapi(
    info(
        title = "Trellis API",
        version = "0.3.0",
        description = "Collaborative application tracking boards for mentor/mentee coaching"
    ),
    servers(
        (url = "http://localhost:3000", description = "Local Development")
    ),
    tags(
        (name = "Board", description = "Per-conversation column schema"),
        (name = "Applications", description = "Rows, direct edits, undo, history and timeline"),
        (name = "Suggestions", description = "Proposed edits and their resolution"),
        (name = "Health", description = "Liveness and readiness probes")
    ),
    paths(
        board::get_board,
        board::add_column,
        board::update_column,
        application::list_applications,
        application::create_application,
        application::get_application,
        application::edit_application,
        application::delete_application,
        application::undo_application,
        application::list_history,
        application::list_activity,
        application::post_activity,
        application::add_tag,
        application::remove_tag,
        application::attach_reminder,
        suggestion::list_suggestions,
        suggestion::create_suggestion,
        suggestion::accept_suggestion,
        suggestion::reject_suggestion,
        health::liveness,
        health::readiness,
    ),
    components(
        schemas(
            ApiError,
            ErrorCode,
            // Entities
            Board,
            ColumnDef,
            ColumnType,
            Application,
            HistoryEntry,
            ActivityEntry,
            Tag,
            ReminderRef,
            Suggestion,
            SuggestionStatus,
            Role,
            UndoOutcome,
            // Requests and responses
            AddColumnRequest,
            UpdateColumnRequest,
            CreateApplicationRequest,
            EditApplicationRequest,
            EditApplicationResponse,
            PostActivityRequest,
            AddTagRequest,
            AttachReminderRequest,
            CreateSuggestionRequest,
            ResolveSuggestionResponse,
            ListSuggestionsResponse,
            HealthResponse,
            HealthStatus,
            HealthDetails,
            ComponentHealth,
        )
    ),
    modifiers(&SecurityAddon)
)]
pub struct ApiDoc;

/// Registers the bearer scheme referenced by `security(("bearer_auth" = []))`.
struct SecurityAddon;

impl Modify for SecurityAddon {
    fn modify(&self, openapi: &mut utoipa::openapi::OpenApi) {
        if let Some(components) = openapi.components.as_mut() {
            components.add_security_scheme(
                "bearer_auth",
                SecurityScheme::Http(
                    HttpBuilder::new()
                        .scheme(HttpAuthScheme::Bearer)
                        .bearer_format("JWT")
                        .description(Some("JWT Bearer token"))
                        .build(),
                ),
            );
        }
    }
}

impl ApiDoc {
    /// Generate OpenAPI spec as JSON string.
    pub fn to_json() -> Result<String, serde_json::Error> {
        serde_json::to_string_pretty(&Self::openapi())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_openapi_generation() -> Result<(), String> {
        let openapi = ApiDoc::openapi();
        assert_eq!(openapi.info.title, "Trellis API");

        let components = openapi
            .components
            .as_ref()
            .ok_or_else(|| "OpenAPI components missing".to_string())?;
        assert!(components.security_schemes.contains_key("bearer_auth"));
        assert!(components.schemas.contains_key("Suggestion"));
        Ok(())
    }

    #[test]
    fn test_openapi_lists_board_paths() -> Result<(), String> {
        let json = ApiDoc::to_json().map_err(|e| format!("Failed to serialize OpenAPI: {}", e))?;
        assert!(json.contains("/api/v1/conversations/{cid}/board"));
        assert!(json.contains("/api/v1/suggestions/{id}/accept"));
        Ok(())
    }
}
