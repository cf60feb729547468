//! Application (row) request and response types

use serde::{Deserialize, Serialize};
use trellis_core::{Application, CellPatch, Timestamp};

/// Request to create a row.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[cfg_attr(feature = "openapi", derive(utoipa::ToSchema))]
#[serde(rename_all = "camelCase")]
pub struct CreateApplicationRequest {
    /// Raw cell values keyed by column key
    #[serde(default)]
    #[cfg_attr(feature = "openapi", schema(value_type = Object))]
    pub cells: CellPatch,
}

/// Direct edit of a row's cells.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[cfg_attr(feature = "openapi", derive(utoipa::ToSchema))]
#[serde(rename_all = "camelCase")]
pub struct EditApplicationRequest {
    /// Raw cell values keyed by column key; unknown keys are ignored
    #[cfg_attr(feature = "openapi", schema(value_type = Object))]
    pub cells: CellPatch,
}

/// Result of a direct edit.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[cfg_attr(feature = "openapi", derive(utoipa::ToSchema))]
#[serde(rename_all = "camelCase")]
pub struct EditApplicationResponse {
    pub application: Application,
    /// Only the fields whose value changed
    #[cfg_attr(feature = "openapi", schema(value_type = Object))]
    pub changes: serde_json::Map<String, serde_json::Value>,
}

/// Free-text note on a row's timeline.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[cfg_attr(feature = "openapi", derive(utoipa::ToSchema))]
pub struct PostActivityRequest {
    pub message: String,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[cfg_attr(feature = "openapi", derive(utoipa::ToSchema))]
pub struct AddTagRequest {
    pub label: String,
    /// `#RRGGBB`
    pub color: String,
}

/// Pointer to a reminder owned by the notification system.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[cfg_attr(feature = "openapi", derive(utoipa::ToSchema))]
#[serde(rename_all = "camelCase")]
pub struct AttachReminderRequest {
    pub reminder_id: String,
    #[cfg_attr(feature = "openapi", schema(value_type = String, format = "date-time"))]
    pub due_at: Timestamp,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_create_request_defaults_to_no_cells() {
        let req: CreateApplicationRequest = serde_json::from_str("{}").expect("empty body parses");
        assert!(req.cells.is_empty());
    }
}
