//! Row history: append-only change log and the undo operator.
//!
//! Entries are only ever pushed. Display order (newest first) is produced by
//! sorting at read time, and undo records its own entry instead of removing
//! the one it reverts.

use crate::{
    ActivityEntry, Application, CellValue, HistoryEntry, HistoryEntryId, Role, Timestamp,
    ValidationError,
};
use chrono::{Duration, Utc};
use serde::{Deserialize, Serialize};

/// Result of one undo.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[cfg_attr(feature = "openapi", derive(utoipa::ToSchema))]
#[serde(rename_all = "camelCase")]
pub struct UndoOutcome {
    pub field: String,
    /// Value the cell held before the undo
    #[cfg_attr(feature = "openapi", schema(value_type = Object))]
    pub old_value: CellValue,
    /// Value restored by the undo
    #[cfg_attr(feature = "openapi", schema(value_type = Object))]
    pub new_value: CellValue,
}

impl Application {
    /// Timestamp for the next log append.
    ///
    /// Strictly greater than every timestamp already in `history` and
    /// `activity_log`, so append order and timestamp order agree.
    pub fn next_timestamp(&self) -> Timestamp {
        let now = Utc::now();
        let latest = self
            .history
            .iter()
            .map(|h| h.timestamp)
            .chain(self.activity_log.iter().map(|a| a.timestamp))
            .max();
        match latest {
            Some(latest) if latest >= now => latest + Duration::microseconds(1),
            _ => now,
        }
    }

    /// Append a history entry for `field` and return it.
    pub fn record_change(
        &mut self,
        field: &str,
        old_value: CellValue,
        new_value: CellValue,
        changed_by: Role,
    ) -> &HistoryEntry {
        let entry = HistoryEntry {
            id: HistoryEntryId::now_v7(),
            field: field.to_string(),
            old_value,
            new_value,
            changed_by,
            timestamp: self.next_timestamp(),
        };
        self.updated_at = entry.timestamp;
        self.history.push(entry);
        &self.history[self.history.len() - 1]
    }

    /// Append a free-text activity entry and return it.
    pub fn record_activity(&mut self, author_role: Role, message: impl Into<String>) -> &ActivityEntry {
        let entry = ActivityEntry::new(author_role, message, self.next_timestamp());
        self.updated_at = entry.timestamp;
        self.activity_log.push(entry);
        &self.activity_log[self.activity_log.len() - 1]
    }

    /// History sorted newest first.
    pub fn history_newest_first(&self) -> Vec<&HistoryEntry> {
        let mut entries: Vec<(usize, &HistoryEntry)> = self.history.iter().enumerate().collect();
        entries.sort_by(|(ia, a), (ib, b)| b.timestamp.cmp(&a.timestamp).then(ib.cmp(ia)));
        entries.into_iter().map(|(_, e)| e).collect()
    }

    /// Activity log sorted newest first.
    pub fn activity_newest_first(&self) -> Vec<&ActivityEntry> {
        let mut entries: Vec<(usize, &ActivityEntry)> = self.activity_log.iter().enumerate().collect();
        entries.sort_by(|(ia, a), (ib, b)| b.timestamp.cmp(&a.timestamp).then(ib.cmp(ia)));
        entries.into_iter().map(|(_, e)| e).collect()
    }

    /// Most recent change to any field of this row.
    pub fn latest_change(&self) -> Option<&HistoryEntry> {
        self.history_newest_first().into_iter().next()
    }

    /// Revert the most recent change on the row.
    ///
    /// Undo is row-scoped: it targets the latest entry regardless of field,
    /// restores that entry's `old_value`, and appends `current -> old_value`.
    /// Undoing an undo therefore re-applies the original change.
    pub fn undo(&mut self, changed_by: Role) -> Result<UndoOutcome, ValidationError> {
        let (field, restored) = match self.latest_change() {
            Some(entry) => (entry.field.clone(), entry.old_value.clone()),
            None => return Err(ValidationError::NothingToUndo),
        };

        let current = self.cell(&field);
        self.cells.insert(field.clone(), restored.clone());
        self.record_change(&field, current.clone(), restored.clone(), changed_by);

        Ok(UndoOutcome {
            field,
            old_value: current,
            new_value: restored,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::{Board, ConversationId};

    fn row() -> Application {
        let board = Board::with_default_columns(ConversationId::now_v7());
        let mut row = Application::new(&board, "user-1");
        row.cells.insert("company".into(), "Acme".into());
        row.cells.insert("position".into(), "Engineer".into());
        row
    }

    #[test]
    fn test_timestamps_strictly_increase() {
        let mut row = row();
        for i in 0..50 {
            row.record_change("notes", CellValue::Null, CellValue::Number(i as f64), Role::Mentee);
        }
        for pair in row.history.windows(2) {
            assert!(pair[0].timestamp < pair[1].timestamp);
        }
    }

    #[test]
    fn test_undo_empty_history_fails() {
        let mut row = row();
        let before = row.clone();
        assert_eq!(row.undo(Role::Mentee), Err(ValidationError::NothingToUndo));
        assert_eq!(row, before);
    }

    #[test]
    fn test_undo_restores_and_appends() {
        let mut row = row();
        row.cells.insert("status".into(), "Interview".into());
        row.record_change("status", "Applied".into(), "Interview".into(), Role::Mentee);

        let outcome = row.undo(Role::Mentor).expect("undo");
        assert_eq!(outcome.field, "status");
        assert_eq!(outcome.old_value, CellValue::from("Interview"));
        assert_eq!(outcome.new_value, CellValue::from("Applied"));
        assert_eq!(row.cell("status"), CellValue::from("Applied"));
        assert_eq!(row.history.len(), 2);

        let latest = row.latest_change().expect("latest");
        assert_eq!(latest.old_value, CellValue::from("Interview"));
        assert_eq!(latest.new_value, CellValue::from("Applied"));
        assert_eq!(latest.changed_by, Role::Mentor);
    }

    #[test]
    fn test_undo_of_undo_reapplies() {
        let mut row = row();
        row.cells.insert("status".into(), "Offer".into());
        row.record_change("status", "Interview".into(), "Offer".into(), Role::Mentee);

        row.undo(Role::Mentee).expect("first undo");
        assert_eq!(row.cell("status"), CellValue::from("Interview"));
        row.undo(Role::Mentee).expect("second undo");
        assert_eq!(row.cell("status"), CellValue::from("Offer"));
        assert_eq!(row.history.len(), 3);
    }

    #[test]
    fn test_undo_targets_latest_field() {
        let mut row = row();
        row.cells.insert("status".into(), "Interview".into());
        row.record_change("status", "Applied".into(), "Interview".into(), Role::Mentee);
        row.cells.insert("notes".into(), "call back".into());
        row.record_change("notes", CellValue::Null, "call back".into(), Role::Mentee);

        let outcome = row.undo(Role::Mentee).expect("undo");
        assert_eq!(outcome.field, "notes");
        assert_eq!(row.cell("notes"), CellValue::Null);
        assert_eq!(row.cell("status"), CellValue::from("Interview"));
    }

    #[test]
    fn test_newest_first_ordering() {
        let mut row = row();
        row.record_activity(Role::Mentor, "first");
        row.record_activity(Role::Mentee, "second");
        let messages: Vec<&str> = row.activity_newest_first().iter().map(|a| a.message.as_str()).collect();
        assert_eq!(messages, vec!["second", "first"]);
    }
}
