//! Board schema request types

use serde::{Deserialize, Serialize};
use trellis_core::{ColumnPatch, ColumnType, NewColumn};

/// Request to append a column to the board.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[cfg_attr(feature = "openapi", derive(utoipa::ToSchema))]
#[serde(rename_all = "camelCase")]
pub struct AddColumnRequest {
    /// Stable key; derived from `name` when omitted
    #[serde(default)]
    pub key: Option<String>,
    pub name: String,
    #[serde(rename = "type")]
    pub column_type: ColumnType,
    #[serde(default)]
    pub required: bool,
    /// Choices of a select column; ignored for other types
    #[serde(default)]
    pub options: Vec<String>,
    #[serde(default)]
    pub order: Option<i32>,
}

impl From<AddColumnRequest> for NewColumn {
    fn from(req: AddColumnRequest) -> Self {
        NewColumn {
            key: req.key,
            name: req.name,
            column_type: req.column_type,
            required: req.required,
            options: req.options,
            order: req.order,
        }
    }
}

/// Partial update of a column. Key and type cannot change.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[cfg_attr(feature = "openapi", derive(utoipa::ToSchema))]
#[serde(rename_all = "camelCase")]
pub struct UpdateColumnRequest {
    #[serde(default)]
    pub name: Option<String>,
    #[serde(default)]
    pub required: Option<bool>,
    #[serde(default)]
    pub options: Option<Vec<String>>,
    #[serde(default)]
    pub order: Option<i32>,
}

impl From<UpdateColumnRequest> for ColumnPatch {
    fn from(req: UpdateColumnRequest) -> Self {
        ColumnPatch {
            name: req.name,
            required: req.required,
            options: req.options,
            order: req.order,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn test_add_column_request_defaults() {
        let req: AddColumnRequest =
            serde_json::from_value(json!({"name": "Salary", "type": "number"})).expect("valid body");
        let new: NewColumn = req.into();
        assert_eq!(new.key, None);
        assert_eq!(new.column_type, ColumnType::Number);
        assert!(!new.required);
        assert!(new.options.is_empty());
        assert_eq!(new.order, None);
    }
}
