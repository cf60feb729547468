//! Error types for Trellis operations

use crate::{EntityType, Role, SuggestionStatus};
use thiserror::Error;
use uuid::Uuid;

/// Storage layer errors.
#[derive(Debug, Clone, Error, PartialEq, Eq)]
pub enum StorageError {
    #[error("Entity not found: {entity_type} with id {id}")]
    NotFound { entity_type: EntityType, id: Uuid },

    #[error("Insert failed for {entity_type}: {reason}")]
    InsertFailed { entity_type: EntityType, reason: String },

    #[error("Unique constraint {constraint} violated for {entity_type}")]
    UniqueViolation {
        entity_type: EntityType,
        constraint: String,
    },

    #[error("Update failed for {entity_type} with id {id}: {reason}")]
    UpdateFailed {
        entity_type: EntityType,
        id: Uuid,
        reason: String,
    },

    #[error("Conditional update on {entity_type} {id} did not match current state")]
    PreconditionFailed { entity_type: EntityType, id: Uuid },

    #[error("Storage backend unavailable: {reason}")]
    Unavailable { reason: String },
}

/// Validation errors. Caller errors, never retried.
#[derive(Debug, Clone, Error, PartialEq, Eq)]
pub enum ValidationError {
    #[error("Required field missing: {field}")]
    RequiredFieldMissing { field: String },

    #[error("Invalid value for {field}: {reason}")]
    InvalidValue { field: String, reason: String },

    #[error("Unknown column: {key}")]
    UnknownColumn { key: String },

    #[error("Column {key} already exists")]
    DuplicateColumn { key: String },

    #[error("Value of {field} changed since it was read; refresh and try again")]
    StaleValue { field: String },

    #[error("No history to undo")]
    NothingToUndo,

    #[error("Suggestion is {status}, expected pending")]
    NotPending { status: SuggestionStatus },

    #[error("Constraint violation on {constraint}: {reason}")]
    ConstraintViolation { constraint: String, reason: String },
}

/// Authorization errors (role or conversation scoping).
#[derive(Debug, Clone, Error, PartialEq, Eq)]
pub enum AccessError {
    #[error("Role {role} cannot {action}")]
    RoleNotAllowed { role: Role, action: String },

    #[error("{entity_type} {id} does not belong to conversation {conversation_id}")]
    WrongConversation {
        entity_type: EntityType,
        id: Uuid,
        conversation_id: Uuid,
    },

    #[error("Caller is not a participant of conversation {conversation_id}")]
    NotParticipant { conversation_id: Uuid },
}

/// Master error type for all Trellis errors.
#[derive(Debug, Clone, Error)]
pub enum TrellisError {
    #[error("Storage error: {0}")]
    Storage(#[from] StorageError),

    #[error("Validation error: {0}")]
    Validation(#[from] ValidationError),

    #[error("Access error: {0}")]
    Access(#[from] AccessError),
}

/// Result type alias for Trellis operations.
pub type TrellisResult<T> = Result<T, TrellisError>;

// =============================================================================
// TESTS
// =============================================================================
