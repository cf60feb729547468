//! WebSocket Event Types
//!
//! Every mutation that reaches the store is announced to the conversation's
//! subscribers with one of these events. Frames are JSON objects tagged by a
//! dotted `type` name.

use serde::{Deserialize, Serialize};
use serde_json::{Map, Value as JsonValue};
use trellis_core::{
    ActivityEntry, Application, ApplicationId, Board, Changes, ConversationId, Suggestion,
};

/// WebSocket event types for real-time updates.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "type")]
pub enum WsEvent {
    // ========================================================================
    // APPLICATION EVENTS
    // ========================================================================
    #[serde(rename = "application.created", rename_all = "camelCase")]
    ApplicationCreated {
        conversation_id: ConversationId,
        application_id: ApplicationId,
        application: Application,
    },

    /// Fields of a row changed. `changes` holds only what changed.
    #[serde(rename = "application.updated", rename_all = "camelCase")]
    ApplicationUpdated {
        conversation_id: ConversationId,
        application_id: ApplicationId,
        changes: Map<String, JsonValue>,
    },

    #[serde(rename = "application.deleted", rename_all = "camelCase")]
    ApplicationDeleted {
        conversation_id: ConversationId,
        application_id: ApplicationId,
    },

    // ========================================================================
    // SUGGESTION EVENTS
    // ========================================================================
    #[serde(rename = "suggestion.created", rename_all = "camelCase")]
    SuggestionCreated {
        conversation_id: ConversationId,
        application_id: ApplicationId,
        suggestion: Suggestion,
    },

    #[serde(rename = "suggestion.resolved", rename_all = "camelCase")]
    SuggestionResolved {
        conversation_id: ConversationId,
        application_id: ApplicationId,
        suggestion: Suggestion,
    },

    // ========================================================================
    // TIMELINE AND SCHEMA EVENTS
    // ========================================================================
    #[serde(rename = "activityLog.created", rename_all = "camelCase")]
    ActivityLogCreated {
        conversation_id: ConversationId,
        application_id: ApplicationId,
        entry: ActivityEntry,
    },

    #[serde(rename = "board.updated", rename_all = "camelCase")]
    BoardUpdated {
        conversation_id: ConversationId,
        board: Board,
    },

    // ========================================================================
    // CONNECTION EVENTS
    // ========================================================================
    /// Client successfully connected.
    #[serde(rename = "connected", rename_all = "camelCase")]
    Connected { conversation_id: ConversationId },

    #[serde(rename = "disconnected")]
    Disconnected { reason: String },

    /// Delivery problem on this connection, such as dropped events.
    #[serde(rename = "error")]
    Error { message: String },
}

impl WsEvent {
    /// `application.updated` carrying cell changes.
    pub fn cells_changed(row: &Application, changes: &Changes) -> Self {
        WsEvent::ApplicationUpdated {
            conversation_id: row.conversation_id,
            application_id: row.application_id,
            changes: changes
                .iter()
                .map(|(key, value)| (key.clone(), value.to_json()))
                .collect(),
        }
    }

    /// `application.updated` carrying one non-cell field of the row.
    pub fn row_field_changed(row: &Application, field: &str, value: JsonValue) -> Self {
        let mut changes = Map::new();
        changes.insert(field.to_string(), value);
        WsEvent::ApplicationUpdated {
            conversation_id: row.conversation_id,
            application_id: row.application_id,
            changes,
        }
    }

    /// Get the event type as a string for logging/debugging.
    pub fn event_type(&self) -> &'static str {
        match self {
            WsEvent::ApplicationCreated { .. } => "application.created",
            WsEvent::ApplicationUpdated { .. } => "application.updated",
            WsEvent::ApplicationDeleted { .. } => "application.deleted",
            WsEvent::SuggestionCreated { .. } => "suggestion.created",
            WsEvent::SuggestionResolved { .. } => "suggestion.resolved",
            WsEvent::ActivityLogCreated { .. } => "activityLog.created",
            WsEvent::BoardUpdated { .. } => "board.updated",
            WsEvent::Connected { .. } => "connected",
            WsEvent::Disconnected { .. } => "disconnected",
            WsEvent::Error { .. } => "error",
        }
    }

    /// Conversation the event belongs to. Connection frames have none.
    pub fn conversation_id(&self) -> Option<ConversationId> {
        match self {
            WsEvent::ApplicationCreated { conversation_id, .. }
            | WsEvent::ApplicationUpdated { conversation_id, .. }
            | WsEvent::ApplicationDeleted { conversation_id, .. }
            | WsEvent::SuggestionCreated { conversation_id, .. }
            | WsEvent::SuggestionResolved { conversation_id, .. }
            | WsEvent::ActivityLogCreated { conversation_id, .. }
            | WsEvent::BoardUpdated { conversation_id, .. } => Some(*conversation_id),
            WsEvent::Connected { .. } | WsEvent::Disconnected { .. } | WsEvent::Error { .. } => None,
        }
    }

    /// Row the event is about, when it is about one.
    pub fn application_id(&self) -> Option<ApplicationId> {
        match self {
            WsEvent::ApplicationCreated { application_id, .. }
            | WsEvent::ApplicationUpdated { application_id, .. }
            | WsEvent::ApplicationDeleted { application_id, .. }
            | WsEvent::SuggestionCreated { application_id, .. }
            | WsEvent::SuggestionResolved { application_id, .. }
            | WsEvent::ActivityLogCreated { application_id, .. } => Some(*application_id),
            _ => None,
        }
    }
}
