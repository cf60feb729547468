//! Suggestion workflow: optimistic proposals and their one-time resolution.
//!
//! A proposal snapshots the value its author believed was current. Creation
//! fails when that snapshot is stale. Resolution is a single transition out of
//! `pending`; the state machine below is the in-memory mirror of the store's
//! conditional update.

use crate::{
    cell, AccessError, Application, Board, CellValue, EntityIdType, EntityType, Role, Suggestion,
    SuggestionId, SuggestionStatus, Timestamp, TrellisError, TrellisResult, ValidationError,
};
use chrono::Utc;
use serde_json::Value as JsonValue;

/// A resolution applied to a row, for event payloads.
#[derive(Debug, Clone, PartialEq)]
pub struct AcceptedChange {
    pub field: String,
    pub old_value: CellValue,
    pub new_value: CellValue,
}

impl Suggestion {
    /// Build a pending suggestion against the current state of `row`.
    ///
    /// Fails with [`ValidationError::StaleValue`] when the row's current value
    /// of `field` (absent reads as null) does not equal `old_value`.
    pub fn propose(
        board: &Board,
        row: &Application,
        field: &str,
        old_value: &JsonValue,
        proposed_value: &JsonValue,
        proposed_by_role: Role,
    ) -> Result<Suggestion, ValidationError> {
        let column = board.column(field).ok_or_else(|| ValidationError::UnknownColumn {
            key: field.to_string(),
        })?;

        let current = row.cell(field);
        if !current.matches_json(old_value) {
            return Err(ValidationError::StaleValue {
                field: field.to_string(),
            });
        }

        let proposed_value = cell::validate_for_column(proposed_value, column).into_result(field)?;

        Ok(Suggestion {
            suggestion_id: SuggestionId::now_v7(),
            conversation_id: row.conversation_id,
            application_id: row.application_id,
            field: field.to_string(),
            old_value: current,
            proposed_value,
            proposed_by_role,
            status: SuggestionStatus::Pending,
            created_at: Utc::now(),
            resolved_at: None,
        })
    }

    pub fn is_pending(&self) -> bool {
        self.status == SuggestionStatus::Pending
    }

    /// Role and state checks shared by accept and reject.
    pub fn ensure_resolvable(&self, role: Role) -> TrellisResult<()> {
        if !role.can_resolve_suggestions() {
            return Err(AccessError::RoleNotAllowed {
                role,
                action: "resolve suggestions".to_string(),
            }
            .into());
        }
        if !self.is_pending() {
            return Err(ValidationError::NotPending { status: self.status }.into());
        }
        Ok(())
    }

    /// Move out of `pending` exactly once.
    pub fn resolve(&mut self, status: SuggestionStatus, at: Timestamp) -> Result<(), ValidationError> {
        if !self.is_pending() {
            return Err(ValidationError::NotPending { status: self.status });
        }
        if !status.is_terminal() {
            return Err(ValidationError::InvalidValue {
                field: "status".to_string(),
                reason: "resolution must be accepted or rejected".to_string(),
            });
        }
        self.status = status;
        self.resolved_at = Some(at);
        Ok(())
    }

    fn ensure_targets(&self, row: &Application) -> TrellisResult<()> {
        if row.application_id != self.application_id || row.conversation_id != self.conversation_id {
            return Err(AccessError::WrongConversation {
                entity_type: EntityType::Application,
                id: row.application_id.as_uuid(),
                conversation_id: self.conversation_id.as_uuid(),
            }
            .into());
        }
        Ok(())
    }

    /// Write the proposed value to `row` with one history and one activity entry.
    ///
    /// The proposal is written unconditionally; history records whatever the
    /// row held at acceptance time.
    pub fn apply_accepted(
        &self,
        board: &Board,
        row: &mut Application,
        resolver: Role,
    ) -> TrellisResult<AcceptedChange> {
        self.ensure_targets(row)?;

        let current = row.cell(&self.field);
        row.cells.insert(self.field.clone(), self.proposed_value.clone());
        row.record_change(&self.field, current.clone(), self.proposed_value.clone(), resolver);
        row.record_activity(
            resolver,
            format!(
                "{} accepted {} suggestion for {}: {} -> {}",
                resolver.label(),
                self.proposed_by_role.label(),
                column_label(board, &self.field),
                current,
                self.proposed_value
            ),
        );

        Ok(AcceptedChange {
            field: self.field.clone(),
            old_value: current,
            new_value: self.proposed_value.clone(),
        })
    }

    /// Record the rejection on the row's timeline. Cells are not touched.
    pub fn apply_rejected(&self, board: &Board, row: &mut Application, resolver: Role) -> TrellisResult<()> {
        self.ensure_targets(row)?;
        row.record_activity(
            resolver,
            format!(
                "{} rejected {} suggestion for {}: {}",
                resolver.label(),
                self.proposed_by_role.label(),
                column_label(board, &self.field),
                self.proposed_value
            ),
        );
        Ok(())
    }
}

fn column_label<'a>(board: &'a Board, key: &'a str) -> &'a str {
    board.column(key).map_or(key, |c| c.name.as_str())
}

/// Map a lost conditional update onto the same error a stale read produces.
pub fn lost_resolution_race(status: SuggestionStatus) -> TrellisError {
    ValidationError::NotPending { status }.into()
}


#[cfg(test)]
mod prop_tests {
    use super::*;
    use crate::ConversationId;
    use proptest::prelude::*;

    fn status() -> impl Strategy<Value = SuggestionStatus> {
        prop_oneof![
            Just(SuggestionStatus::Pending),
            Just(SuggestionStatus::Accepted),
            Just(SuggestionStatus::Rejected),
        ]
    }

    proptest! {
        #![proptest_config(ProptestConfig::with_cases(100))]

        /// A mismatching snapshot never yields a suggestion.
        #[test]
        fn prop_stale_snapshot_always_fails(current in "[a-z]{1,10}", believed in "[a-z]{1,10}") {
            prop_assume!(current != believed);
            let board = Board::with_default_columns(ConversationId::now_v7());
            let mut row = Application::new(&board, "user");
            row.cells.insert("notes".into(), CellValue::from(current.as_str()));

            let result = Suggestion::propose(
                &board,
                &row,
                "notes",
                &JsonValue::String(believed),
                &JsonValue::String("new".into()),
                Role::Mentor,
            );
            prop_assert_eq!(result, Err(ValidationError::StaleValue { field: "notes".to_string() }));
        }

        /// Once terminal, no sequence of resolutions changes the status.
        #[test]
        fn prop_terminal_states_are_immutable(
            first in prop_oneof![Just(SuggestionStatus::Accepted), Just(SuggestionStatus::Rejected)],
            attempts in prop::collection::vec(status(), 0..8),
        ) {
            let board = Board::with_default_columns(ConversationId::now_v7());
            let row = Application::new(&board, "user");
            let mut s = Suggestion::propose(&board, &row, "notes", &JsonValue::Null, &JsonValue::Null, Role::Mentor)
                .expect("propose");
            s.resolve(first, Utc::now()).expect("first resolution");
            let resolved_at = s.resolved_at;

            for attempt in attempts {
                prop_assert!(s.resolve(attempt, Utc::now()).is_err());
                prop_assert_eq!(s.status, first);
                prop_assert_eq!(s.resolved_at, resolved_at);
                prop_assert!(s.ensure_resolvable(Role::Mentee).is_err());
            }
        }
    }
}
