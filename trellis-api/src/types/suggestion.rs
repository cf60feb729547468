//! Suggestion request and response types

use serde::{Deserialize, Serialize};
use serde_json::Value as JsonValue;
use trellis_core::{Application, ApplicationId, Suggestion, SuggestionStatus};

/// Proposal to change one cell of a row.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[cfg_attr(feature = "openapi", derive(utoipa::ToSchema))]
#[serde(rename_all = "camelCase")]
pub struct CreateSuggestionRequest {
    #[cfg_attr(feature = "openapi", schema(value_type = String, format = "uuid"))]
    pub application_id: ApplicationId,
    pub field: String,
    /// Value the proposer saw; must still be current
    #[serde(default)]
    #[cfg_attr(feature = "openapi", schema(value_type = Object))]
    pub old_value: JsonValue,
    #[serde(default)]
    #[cfg_attr(feature = "openapi", schema(value_type = Object))]
    pub proposed_value: JsonValue,
}

/// Query parameters of the suggestion listing.
#[derive(Debug, Clone, Copy, Default, PartialEq, Serialize, Deserialize)]
#[cfg_attr(feature = "openapi", derive(utoipa::IntoParams))]
#[cfg_attr(feature = "openapi", into_params(parameter_in = Query))]
#[serde(rename_all = "camelCase")]
pub struct SuggestionListParams {
    #[serde(default)]
    pub status: Option<SuggestionStatus>,
    #[serde(default)]
    #[cfg_attr(feature = "openapi", param(value_type = Option<String>, format = "uuid"))]
    pub application_id: Option<ApplicationId>,
}

/// Outcome of an accept or reject.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[cfg_attr(feature = "openapi", derive(utoipa::ToSchema))]
#[serde(rename_all = "camelCase")]
pub struct ResolveSuggestionResponse {
    pub suggestion: Suggestion,
    pub application: Application,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[cfg_attr(feature = "openapi", derive(utoipa::ToSchema))]
pub struct ListSuggestionsResponse {
    pub items: Vec<Suggestion>,
    pub total: usize,
}
