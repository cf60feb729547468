//! Core entity structures

use crate::{
    ActivityEntryId, ApplicationId, BoardId, CellValue, ColumnType, ConversationId,
    HistoryEntryId, ReminderRefId, Role, SuggestionId, SuggestionStatus, TagId, Timestamp,
};
use chrono::Utc;
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;

/// Cell map of a row, keyed by column key.
pub type Cells = BTreeMap<String, CellValue>;

/// One typed column of a board.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[cfg_attr(feature = "openapi", derive(utoipa::ToSchema))]
#[serde(rename_all = "camelCase")]
pub struct ColumnDef {
    /// Stable identifier referenced by row cells. Never changes once created.
    pub key: String,
    /// Display label
    pub name: String,
    #[serde(rename = "type")]
    pub column_type: ColumnType,
    pub required: bool,
    /// Allowed values, only meaningful for select columns
    #[serde(default)]
    pub options: Vec<String>,
    /// UI sort key
    pub order: i32,
}

impl ColumnDef {
    pub fn new(key: impl Into<String>, name: impl Into<String>, column_type: ColumnType, order: i32) -> Self {
        Self {
            key: key.into(),
            name: name.into(),
            column_type,
            required: false,
            options: Vec::new(),
            order,
        }
    }

    pub fn required(mut self) -> Self {
        self.required = true;
        self
    }

    pub fn with_options<I, S>(mut self, options: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.options = options.into_iter().map(Into::into).collect();
        self
    }
}

/// Per-conversation schema of the tracking table.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[cfg_attr(feature = "openapi", derive(utoipa::ToSchema))]
#[serde(rename_all = "camelCase")]
pub struct Board {
    pub board_id: BoardId,
    pub conversation_id: ConversationId,
    pub columns: Vec<ColumnDef>,
    #[cfg_attr(feature = "openapi", schema(value_type = String, format = "date-time"))]
    pub created_at: Timestamp,
    #[cfg_attr(feature = "openapi", schema(value_type = String, format = "date-time"))]
    pub updated_at: Timestamp,
}

/// Immutable record of one field transition on a row.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[cfg_attr(feature = "openapi", derive(utoipa::ToSchema))]
#[serde(rename_all = "camelCase")]
pub struct HistoryEntry {
    pub id: HistoryEntryId,
    pub field: String,
    #[cfg_attr(feature = "openapi", schema(value_type = Object))]
    pub old_value: CellValue,
    #[cfg_attr(feature = "openapi", schema(value_type = Object))]
    pub new_value: CellValue,
    pub changed_by: Role,
    #[cfg_attr(feature = "openapi", schema(value_type = String, format = "date-time"))]
    pub timestamp: Timestamp,
}

/// Free-text narration on a row's timeline.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[cfg_attr(feature = "openapi", derive(utoipa::ToSchema))]
#[serde(rename_all = "camelCase")]
pub struct ActivityEntry {
    pub id: ActivityEntryId,
    pub author_role: Role,
    pub message: String,
    #[cfg_attr(feature = "openapi", schema(value_type = String, format = "date-time"))]
    pub timestamp: Timestamp,
}

impl ActivityEntry {
    pub fn new(author_role: Role, message: impl Into<String>, timestamp: Timestamp) -> Self {
        Self {
            id: ActivityEntryId::now_v7(),
            author_role,
            message: message.into(),
            timestamp,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[cfg_attr(feature = "openapi", derive(utoipa::ToSchema))]
#[serde(rename_all = "camelCase")]
pub struct Tag {
    pub id: TagId,
    pub label: String,
    pub color: String,
}

/// Pointer into the external notification system.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[cfg_attr(feature = "openapi", derive(utoipa::ToSchema))]
#[serde(rename_all = "camelCase")]
pub struct ReminderRef {
    pub id: ReminderRefId,
    pub reminder_id: String,
    #[cfg_attr(feature = "openapi", schema(value_type = String, format = "date-time"))]
    pub due_at: Timestamp,
    pub created_by_role: Role,
}

/// A tracked job application: one board row.
///
/// History, activity, tags and reminders are embedded and owned by the row.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[cfg_attr(feature = "openapi", derive(utoipa::ToSchema))]
#[serde(rename_all = "camelCase")]
pub struct Application {
    pub application_id: ApplicationId,
    pub board_id: BoardId,
    pub conversation_id: ConversationId,
    pub created_by: String,
    #[cfg_attr(feature = "openapi", schema(value_type = Object))]
    pub cells: Cells,
    #[serde(default)]
    pub tags: Vec<Tag>,
    #[serde(default)]
    pub history: Vec<HistoryEntry>,
    #[serde(default)]
    pub activity_log: Vec<ActivityEntry>,
    #[serde(default)]
    pub reminders: Vec<ReminderRef>,
    #[cfg_attr(feature = "openapi", schema(value_type = String, format = "date-time"))]
    pub created_at: Timestamp,
    #[cfg_attr(feature = "openapi", schema(value_type = String, format = "date-time"))]
    pub updated_at: Timestamp,
}

impl Application {
    /// Empty row on `board`. Cells are filled by [`crate::edit::build_cells`].
    pub fn new(board: &Board, created_by: impl Into<String>) -> Self {
        let now = Utc::now();
        Self {
            application_id: ApplicationId::now_v7(),
            board_id: board.board_id,
            conversation_id: board.conversation_id,
            created_by: created_by.into(),
            cells: Cells::new(),
            tags: Vec::new(),
            history: Vec::new(),
            activity_log: Vec::new(),
            reminders: Vec::new(),
            created_at: now,
            updated_at: now,
        }
    }

    /// Current value of `key`; an absent key reads as null.
    pub fn cell(&self, key: &str) -> CellValue {
        self.cells.get(key).cloned().unwrap_or_default()
    }
}

/// A proposed single-field change awaiting review.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[cfg_attr(feature = "openapi", derive(utoipa::ToSchema))]
#[serde(rename_all = "camelCase")]
pub struct Suggestion {
    pub suggestion_id: SuggestionId,
    pub conversation_id: ConversationId,
    pub application_id: ApplicationId,
    pub field: String,
    /// Value the proposer believed was current
    #[cfg_attr(feature = "openapi", schema(value_type = Object))]
    pub old_value: CellValue,
    #[cfg_attr(feature = "openapi", schema(value_type = Object))]
    pub proposed_value: CellValue,
    pub proposed_by_role: Role,
    pub status: SuggestionStatus,
    #[cfg_attr(feature = "openapi", schema(value_type = String, format = "date-time"))]
    pub created_at: Timestamp,
    #[cfg_attr(feature = "openapi", schema(value_type = Option<String>, format = "date-time"))]
    pub resolved_at: Option<Timestamp>,
}
