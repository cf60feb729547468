//! Trellis Test Utilities
//!
//! Shared test infrastructure for the Trellis workspace:
//! - Proptest generators for boards, cells and patches
//! - Fixtures for common board scenarios
//! - Assertions over `TrellisResult`

// Re-export the in-memory store from its source crate
pub use trellis_storage::InMemoryStore;

// Re-export core types for convenience
pub use trellis_core::{
    AccessError, Application, ApplicationId, Board, BoardId, CellPatch, CellValue, ColumnDef, ColumnType,
    ConversationId, EntityIdType, EntityType, Role, StorageError, Suggestion, SuggestionId, SuggestionStatus,
    Timestamp, TrellisError, TrellisResult, ValidationError, DEFAULT_STATUS_OPTIONS,
};

// ============================================================================
// PROPTEST GENERATORS
// ============================================================================

pub mod generators {
    //! Proptest strategies for Trellis values.

    use super::*;
    use chrono::{NaiveDate, Utc};
    use proptest::prelude::*;
    use serde_json::{json, Value as JsonValue};
    use uuid::Uuid;

    /// Generate a random UUID.
    pub fn arb_uuid() -> impl Strategy<Value = Uuid> {
        any::<u128>().prop_map(Uuid::from_u128)
    }

    pub fn arb_conversation_id() -> impl Strategy<Value = ConversationId> {
        arb_uuid().prop_map(ConversationId::from_uuid)
    }

    pub fn arb_application_id() -> impl Strategy<Value = ApplicationId> {
        arb_uuid().prop_map(ApplicationId::from_uuid)
    }

    /// Generate a Timestamp within 2020-2030.
    pub fn arb_timestamp() -> impl Strategy<Value = Timestamp> {
        (1577836800i64..1893456000i64)
            .prop_map(|secs| chrono::DateTime::from_timestamp(secs, 0).unwrap_or_else(Utc::now))
    }

    pub fn arb_role() -> impl Strategy<Value = Role> {
        prop_oneof![Just(Role::Mentor), Just(Role::Mentee)]
    }

    pub fn arb_column_type() -> impl Strategy<Value = ColumnType> {
        prop_oneof![
            Just(ColumnType::Text),
            Just(ColumnType::Longtext),
            Just(ColumnType::Number),
            Just(ColumnType::Checkbox),
            Just(ColumnType::Date),
            Just(ColumnType::Select),
        ]
    }

    /// One of the default status options.
    pub fn arb_status() -> impl Strategy<Value = String> {
        prop::sample::select(DEFAULT_STATUS_OPTIONS.to_vec()).prop_map(str::to_string)
    }

    /// A `YYYY-MM-DD` date string.
    pub fn arb_date_string() -> impl Strategy<Value = String> {
        (2000i32..2035, 1u32..=12, 1u32..=28).prop_map(|(y, m, d)| {
            NaiveDate::from_ymd_opt(y, m, d)
                .map(|date| date.format("%Y-%m-%d").to_string())
                .unwrap_or_else(|| "2024-01-01".to_string())
        })
    }

    /// A non-empty display text without surrounding whitespace.
    pub fn arb_text() -> impl Strategy<Value = String> {
        "[A-Za-z0-9][A-Za-z0-9 .,&-]{0,40}[A-Za-z0-9]"
    }

    /// A JSON value that validates for `column`. Null is included for
    /// non-checkbox columns.
    pub fn arb_valid_json_for(column: &ColumnDef) -> BoxedStrategy<JsonValue> {
        let value: BoxedStrategy<JsonValue> = match column.column_type {
            ColumnType::Text | ColumnType::Longtext => arb_text().prop_map(JsonValue::String).boxed(),
            ColumnType::Number => (-1_000_000i64..1_000_000).prop_map(|n| json!(n)).boxed(),
            ColumnType::Checkbox => any::<bool>().prop_map(JsonValue::Bool).boxed(),
            ColumnType::Date => arb_date_string().prop_map(JsonValue::String).boxed(),
            ColumnType::Select if column.options.is_empty() => Just(JsonValue::Null).boxed(),
            ColumnType::Select => prop::sample::select(column.options.clone())
                .prop_map(JsonValue::String)
                .boxed(),
        };
        if column.column_type == ColumnType::Checkbox {
            value
        } else {
            prop_oneof![1 => Just(JsonValue::Null), 4 => value].boxed()
        }
    }

    /// A full row patch for the default board with every required key set.
    pub fn arb_default_row_patch() -> impl Strategy<Value = CellPatch> {
        (arb_text(), arb_text(), arb_status(), prop::option::of(arb_date_string())).prop_map(
            |(company, position, status, date)| {
                let mut patch = CellPatch::new();
                patch.insert("company".to_string(), JsonValue::String(company));
                patch.insert("position".to_string(), JsonValue::String(position));
                patch.insert("status".to_string(), JsonValue::String(status));
                if let Some(date) = date {
                    patch.insert("dateApplied".to_string(), JsonValue::String(date));
                }
                patch
            },
        )
    }
}

// ============================================================================
// TEST FIXTURES
// ============================================================================

pub mod fixtures {
    //! Pre-built fixtures for common board scenarios.

    use super::*;
    use serde_json::json;

    pub const MENTOR_USER: &str = "mentor-1";
    pub const MENTEE_USER: &str = "mentee-1";

    /// A board with the default column set.
    pub fn default_board() -> Board {
        Board::with_default_columns(ConversationId::now_v7())
    }

    /// Patch for a freshly applied-to position.
    pub fn acme_patch() -> CellPatch {
        let mut patch = CellPatch::new();
        patch.insert("company".to_string(), json!("Acme"));
        patch.insert("position".to_string(), json!("Backend Engineer"));
        patch.insert("status".to_string(), json!("Applied"));
        patch.insert("dateApplied".to_string(), json!("2024-03-01"));
        patch
    }

    /// Single-field patch.
    pub fn patch_of(key: &str, value: serde_json::Value) -> CellPatch {
        let mut patch = CellPatch::new();
        patch.insert(key.to_string(), value);
        patch
    }

    /// A row on `board` built from [`acme_patch`].
    pub fn acme_application(board: &Board) -> Application {
        let mut row = Application::new(board, MENTEE_USER);
        // The default board accepts acme_patch.
        if let Ok(cells) = trellis_core::build_cells(board, &acme_patch()) {
            row.cells = cells;
        }
        row
    }

    /// A store seeded with one default board and one row.
    pub async fn seeded_store() -> TrellisResult<(InMemoryStore, Board, Application)> {
        use trellis_storage::DocumentStore;

        let store = InMemoryStore::new();
        let board = default_board();
        store.board_insert(&board).await?;
        let row = acme_application(&board);
        store.application_insert(&row).await?;
        Ok((store, board, row))
    }
}

// ============================================================================
// CUSTOM ASSERTIONS
// ============================================================================

pub mod assertions {
    //! Assertions over Trellis results and rows.

    use super::*;

    /// Assert that a TrellisResult is Ok.
    #[track_caller]
    pub fn assert_ok<T: std::fmt::Debug>(result: &TrellisResult<T>) {
        assert!(result.is_ok(), "Expected Ok, got Err: {:?}", result);
    }

    /// Assert that a TrellisResult is a NotFound storage error.
    #[track_caller]
    pub fn assert_not_found<T: std::fmt::Debug>(result: &TrellisResult<T>, entity_type: EntityType) {
        match result {
            Err(TrellisError::Storage(StorageError::NotFound { entity_type: et, .. })) => {
                assert_eq!(*et, entity_type, "Wrong entity type in NotFound error");
            }
            other => panic!("Expected NotFound error for {:?}, got: {:?}", entity_type, other),
        }
    }

    /// Assert that a TrellisResult is a Validation error.
    #[track_caller]
    pub fn assert_validation_error<T: std::fmt::Debug>(result: &TrellisResult<T>) {
        match result {
            Err(TrellisError::Validation(_)) => {}
            other => panic!("Expected Validation error, got: {:?}", other),
        }
    }

    /// Assert that a TrellisResult is a StaleValue error for `field`.
    #[track_caller]
    pub fn assert_stale<T: std::fmt::Debug>(result: &TrellisResult<T>, field: &str) {
        match result {
            Err(TrellisError::Validation(ValidationError::StaleValue { field: f })) => {
                assert_eq!(f, field, "Wrong field in StaleValue error");
            }
            other => panic!("Expected StaleValue error for {}, got: {:?}", field, other),
        }
    }

    /// Assert that a TrellisResult is a RoleNotAllowed error.
    #[track_caller]
    pub fn assert_role_denied<T: std::fmt::Debug>(result: &TrellisResult<T>) {
        match result {
            Err(TrellisError::Access(AccessError::RoleNotAllowed { .. })) => {}
            other => panic!("Expected RoleNotAllowed error, got: {:?}", other),
        }
    }

    /// Assert the current (coerced) value of a cell.
    #[track_caller]
    pub fn assert_cell(row: &Application, key: &str, expected: &CellValue) {
        assert_eq!(&row.cell(key), expected, "Unexpected value in cell {}", key);
    }

    #[track_caller]
    pub fn assert_history_len(row: &Application, expected: usize) {
        assert_eq!(
            row.history.len(),
            expected,
            "Expected {} history entries, got {:?}",
            expected,
            row.history
        );
    }

    /// Assert that every timestamp in history and activity is strictly
    /// increasing in append order.
    #[track_caller]
    pub fn assert_timeline_ordered(row: &Application) {
        for pair in row.history.windows(2) {
            assert!(pair[0].timestamp < pair[1].timestamp, "History out of order: {:?}", pair);
        }
        for pair in row.activity_log.windows(2) {
            assert!(pair[0].timestamp < pair[1].timestamp, "Activity out of order: {:?}", pair);
        }
    }
}

// ============================================================================
// TESTS
// ============================================================================
