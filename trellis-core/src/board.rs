//! Board definitions: the default column set and column-schema edits.

use crate::{Board, BoardId, ColumnDef, ColumnType, ConversationId, ValidationError};
use chrono::Utc;

/// Options of the default `status` column.
pub const DEFAULT_STATUS_OPTIONS: [&str; 4] = ["Applied", "Rejected", "Interview", "Offer"];

const MAX_KEY_LEN: usize = 64;
const MAX_NAME_LEN: usize = 80;

/// Column set every new board starts with, in display order.
pub fn default_columns() -> Vec<ColumnDef> {
    vec![
        ColumnDef::new("company", "Company", ColumnType::Text, 0).required(),
        ColumnDef::new("dateApplied", "Date Applied", ColumnType::Date, 1),
        ColumnDef::new("position", "Position", ColumnType::Text, 2).required(),
        ColumnDef::new("status", "Status", ColumnType::Select, 3)
            .with_options(DEFAULT_STATUS_OPTIONS),
        ColumnDef::new("notes", "Notes", ColumnType::Longtext, 4),
    ]
}

/// Request to append a column to a board.
#[derive(Debug, Clone, PartialEq)]
pub struct NewColumn {
    /// Derived from `name` when absent.
    pub key: Option<String>,
    pub name: String,
    pub column_type: ColumnType,
    pub required: bool,
    pub options: Vec<String>,
    /// Appended after the last column when absent.
    pub order: Option<i32>,
}

/// Partial update of an existing column.
///
/// Key and type are immutable: rows already hold values coerced for them.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct ColumnPatch {
    pub name: Option<String>,
    pub required: Option<bool>,
    pub options: Option<Vec<String>>,
    pub order: Option<i32>,
}

impl ColumnPatch {
    pub fn is_empty(&self) -> bool {
        self.name.is_none() && self.required.is_none() && self.options.is_none() && self.order.is_none()
    }
}

impl Board {
    /// Fresh board seeded with [`default_columns`].
    pub fn with_default_columns(conversation_id: ConversationId) -> Self {
        let now = Utc::now();
        Self {
            board_id: BoardId::now_v7(),
            conversation_id,
            columns: default_columns(),
            created_at: now,
            updated_at: now,
        }
    }

    pub fn column(&self, key: &str) -> Option<&ColumnDef> {
        self.columns.iter().find(|c| c.key == key)
    }

    /// Keep `columns` in display order. The sort is stable, so ties keep
    /// insertion order.
    fn sort_columns(&mut self) {
        self.columns.sort_by_key(|c| c.order);
    }

    pub fn required_keys(&self) -> impl Iterator<Item = &str> {
        self.columns.iter().filter(|c| c.required).map(|c| c.key.as_str())
    }

    /// Append a column, enforcing key uniqueness. Returns the stored definition.
    pub fn add_column(&mut self, new: NewColumn) -> Result<ColumnDef, ValidationError> {
        let name = validate_name(&new.name)?;
        let key = match new.key {
            Some(key) => key.trim().to_string(),
            None => derive_key(&name),
        };
        validate_key(&key)?;
        if self.column(&key).is_some() {
            return Err(ValidationError::DuplicateColumn { key });
        }

        let order = new
            .order
            .unwrap_or_else(|| self.columns.iter().map(|c| c.order).max().map_or(0, |m| m + 1));
        let options = if new.column_type.uses_options() {
            normalize_options(new.options)
        } else {
            Vec::new()
        };

        let column = ColumnDef {
            key,
            name,
            column_type: new.column_type,
            required: new.required,
            options,
            order,
        };
        self.columns.push(column.clone());
        self.sort_columns();
        self.updated_at = Utc::now();
        Ok(column)
    }

    /// Apply a patch to the column named `key`.
    pub fn update_column(&mut self, key: &str, patch: ColumnPatch) -> Result<ColumnDef, ValidationError> {
        let name = patch.name.as_deref().map(validate_name).transpose()?;
        let column = self
            .columns
            .iter_mut()
            .find(|c| c.key == key)
            .ok_or_else(|| ValidationError::UnknownColumn { key: key.to_string() })?;

        if patch.options.is_some() && !column.column_type.uses_options() {
            return Err(ValidationError::InvalidValue {
                field: "options".to_string(),
                reason: format!("{} columns do not take options", column.column_type),
            });
        }

        if let Some(name) = name {
            column.name = name;
        }
        if let Some(required) = patch.required {
            column.required = required;
        }
        if let Some(options) = patch.options {
            column.options = normalize_options(options);
        }
        if let Some(order) = patch.order {
            column.order = order;
        }

        let updated = column.clone();
        self.sort_columns();
        self.updated_at = Utc::now();
        Ok(updated)
    }
}

fn validate_name(name: &str) -> Result<String, ValidationError> {
    let trimmed = name.trim();
    if trimmed.is_empty() {
        return Err(ValidationError::RequiredFieldMissing {
            field: "name".to_string(),
        });
    }
    if trimmed.chars().count() > MAX_NAME_LEN {
        return Err(ValidationError::InvalidValue {
            field: "name".to_string(),
            reason: format!("must be at most {} characters", MAX_NAME_LEN),
        });
    }
    Ok(trimmed.to_string())
}

/// Keys start with an ASCII letter, then letters, digits or `_`.
pub fn validate_key(key: &str) -> Result<(), ValidationError> {
    let mut chars = key.chars();
    let starts_with_letter = chars.next().is_some_and(|c| c.is_ascii_alphabetic());
    let rest_ok = chars.all(|c| c.is_ascii_alphanumeric() || c == '_');
    if !starts_with_letter || !rest_ok || key.len() > MAX_KEY_LEN {
        return Err(ValidationError::InvalidValue {
            field: "key".to_string(),
            reason: format!(
                "'{}' must start with a letter and contain only letters, digits or '_' (max {})",
                key, MAX_KEY_LEN
            ),
        });
    }
    Ok(())
}

/// camelCase key from a display name: "Date Applied" -> "dateApplied".
pub fn derive_key(name: &str) -> String {
    let mut key = String::new();
    for (i, word) in name
        .split(|c: char| !c.is_ascii_alphanumeric())
        .filter(|w| !w.is_empty())
        .enumerate()
    {
        let lower = word.to_ascii_lowercase();
        if i == 0 {
            key.push_str(&lower);
        } else {
            let mut chars = lower.chars();
            if let Some(first) = chars.next() {
                key.push(first.to_ascii_uppercase());
                key.push_str(chars.as_str());
            }
        }
    }
    if key.chars().next().is_some_and(|c| c.is_ascii_digit()) {
        key.insert(0, 'c');
    }
    key
}

fn normalize_options(options: Vec<String>) -> Vec<String> {
    let mut seen = Vec::with_capacity(options.len());
    for option in options {
        let trimmed = option.trim();
        if !trimmed.is_empty() && !seen.iter().any(|s: &String| s == trimmed) {
            seen.push(trimmed.to_string());
        }
    }
    seen
}

#[cfg(test)]
mod tests {
    use super::*;

    fn board() -> Board {
        Board::with_default_columns(ConversationId::now_v7())
    }

    #[test]
    fn test_default_columns_layout() {
        let board = board();
        let keys: Vec<&str> = board.columns.iter().map(|c| c.key.as_str()).collect();
        assert_eq!(keys, vec!["company", "dateApplied", "position", "status", "notes"]);

        let required: Vec<&str> = board.required_keys().collect();
        assert_eq!(required, vec!["company", "position"]);

        let status = board.column("status").expect("status column");
        assert_eq!(status.column_type, ColumnType::Select);
        assert_eq!(status.options, DEFAULT_STATUS_OPTIONS.to_vec());
        assert_eq!(board.column("notes").map(|c| c.column_type), Some(ColumnType::Longtext));
    }

    #[test]
    fn test_add_column_derives_key_and_order() {
        let mut board = board();
        let column = board
            .add_column(NewColumn {
                key: None,
                name: "Salary Range".to_string(),
                column_type: ColumnType::Number,
                required: false,
                options: vec!["ignored".to_string()],
                order: None,
            })
            .expect("add column");
        assert_eq!(column.key, "salaryRange");
        assert_eq!(column.order, 5);
        assert!(column.options.is_empty());
        assert!(board.column("salaryRange").is_some());
    }

    #[test]
    fn test_add_column_rejects_duplicate_key() {
        let mut board = board();
        let err = board
            .add_column(NewColumn {
                key: Some("status".to_string()),
                name: "Another Status".to_string(),
                column_type: ColumnType::Text,
                required: false,
                options: vec![],
                order: None,
            })
            .unwrap_err();
        assert_eq!(err, ValidationError::DuplicateColumn { key: "status".to_string() });
    }

    #[test]
    fn test_add_column_rejects_bad_key() {
        let mut board = board();
        let err = board
            .add_column(NewColumn {
                key: Some("1st-round".to_string()),
                name: "First round".to_string(),
                column_type: ColumnType::Checkbox,
                required: false,
                options: vec![],
                order: None,
            })
            .unwrap_err();
        assert!(matches!(err, ValidationError::InvalidValue { ref field, .. } if field == "key"));
    }

    #[test]
    fn test_update_column_keeps_key() {
        let mut board = board();
        let updated = board
            .update_column(
                "status",
                ColumnPatch {
                    name: Some("Stage".to_string()),
                    options: Some(vec![" Applied ".into(), "Offer".into(), "Offer".into(), "".into()]),
                    ..ColumnPatch::default()
                },
            )
            .expect("update");
        assert_eq!(updated.key, "status");
        assert_eq!(updated.name, "Stage");
        assert_eq!(updated.options, vec!["Applied".to_string(), "Offer".to_string()]);
    }

    #[test]
    fn test_reordering_keeps_columns_sorted() {
        let mut board = board();
        board
            .update_column(
                "company",
                ColumnPatch {
                    order: Some(10),
                    ..ColumnPatch::default()
                },
            )
            .expect("update");
        board
            .add_column(NewColumn {
                key: Some("recruiter".to_string()),
                name: "Recruiter".to_string(),
                column_type: ColumnType::Text,
                required: false,
                options: vec![],
                order: Some(2),
            })
            .expect("add column");

        let keys: Vec<&str> = board.columns.iter().map(|c| c.key.as_str()).collect();
        // "recruiter" ties with "position" and lands after it.
        assert_eq!(keys, vec!["dateApplied", "position", "recruiter", "status", "notes", "company"]);
    }

    #[test]
    fn test_update_column_rejects_options_on_text() {
        let mut board = board();
        let err = board
            .update_column(
                "company",
                ColumnPatch {
                    options: Some(vec!["a".into()]),
                    ..ColumnPatch::default()
                },
            )
            .unwrap_err();
        assert!(matches!(err, ValidationError::InvalidValue { .. }));
    }

    #[test]
    fn test_update_unknown_column() {
        let mut board = board();
        let err = board.update_column("salary", ColumnPatch::default()).unwrap_err();
        assert_eq!(err, ValidationError::UnknownColumn { key: "salary".to_string() });
    }

    #[test]
    fn test_derive_key() {
        assert_eq!(derive_key("Date Applied"), "dateApplied");
        assert_eq!(derive_key("  recruiter's e-mail "), "recruiterSEMail");
        assert_eq!(derive_key("2nd interview"), "c2ndInterview");
    }
}
