//! Row annotations that sit beside the cells: tags, reminders, free-text activity.

use crate::{
    ActivityEntry, Application, EntityIdType, EntityType, ReminderRef, ReminderRefId, Role,
    StorageError, Tag, TagId, Timestamp, TrellisResult, ValidationError,
};
use once_cell::sync::Lazy;
use regex::Regex;

static HEX_COLOR: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"^#[0-9A-Fa-f]{6}$").expect("Invalid color regex"));

pub const MAX_TAG_LABEL_LEN: usize = 40;
pub const MAX_ACTIVITY_LEN: usize = 2000;
pub const MAX_REMINDER_ID_LEN: usize = 128;

/// Trimmed activity text, or an error when empty or too long.
pub fn validate_message(message: &str) -> Result<String, ValidationError> {
    let trimmed = message.trim();
    if trimmed.is_empty() {
        return Err(ValidationError::RequiredFieldMissing {
            field: "message".to_string(),
        });
    }
    if trimmed.chars().count() > MAX_ACTIVITY_LEN {
        return Err(ValidationError::InvalidValue {
            field: "message".to_string(),
            reason: format!("must be at most {} characters", MAX_ACTIVITY_LEN),
        });
    }
    Ok(trimmed.to_string())
}

impl Application {
    /// Append a caller-authored activity entry.
    pub fn post_activity(&mut self, author_role: Role, message: &str) -> Result<ActivityEntry, ValidationError> {
        let message = validate_message(message)?;
        Ok(self.record_activity(author_role, message).clone())
    }

    /// Attach a tag. Labels are unique per row, ignoring case.
    pub fn add_tag(&mut self, label: &str, color: &str) -> Result<Tag, ValidationError> {
        let label = label.trim();
        if label.is_empty() {
            return Err(ValidationError::RequiredFieldMissing {
                field: "label".to_string(),
            });
        }
        if label.chars().count() > MAX_TAG_LABEL_LEN {
            return Err(ValidationError::InvalidValue {
                field: "label".to_string(),
                reason: format!("must be at most {} characters", MAX_TAG_LABEL_LEN),
            });
        }
        let color = color.trim();
        if !HEX_COLOR.is_match(color) {
            return Err(ValidationError::InvalidValue {
                field: "color".to_string(),
                reason: "expected a #RRGGBB hex color".to_string(),
            });
        }
        if self.tags.iter().any(|t| t.label.eq_ignore_ascii_case(label)) {
            return Err(ValidationError::ConstraintViolation {
                constraint: "tag_label_unique".to_string(),
                reason: format!("tag '{}' already exists on this application", label),
            });
        }

        let tag = Tag {
            id: TagId::now_v7(),
            label: label.to_string(),
            color: color.to_ascii_uppercase(),
        };
        self.tags.push(tag.clone());
        self.updated_at = self.next_timestamp();
        Ok(tag)
    }

    /// Detach a tag by id.
    pub fn remove_tag(&mut self, tag_id: TagId) -> TrellisResult<Tag> {
        let index = self
            .tags
            .iter()
            .position(|t| t.id == tag_id)
            .ok_or(StorageError::NotFound {
                entity_type: EntityType::Tag,
                id: tag_id.as_uuid(),
            })?;
        let tag = self.tags.remove(index);
        self.updated_at = self.next_timestamp();
        Ok(tag)
    }

    /// Attach a pointer to a reminder held by the notification system.
    pub fn attach_reminder(
        &mut self,
        reminder_id: &str,
        due_at: Timestamp,
        created_by_role: Role,
    ) -> Result<ReminderRef, ValidationError> {
        let reminder_id = reminder_id.trim();
        if reminder_id.is_empty() {
            return Err(ValidationError::RequiredFieldMissing {
                field: "reminderId".to_string(),
            });
        }
        if reminder_id.len() > MAX_REMINDER_ID_LEN {
            return Err(ValidationError::InvalidValue {
                field: "reminderId".to_string(),
                reason: format!("must be at most {} bytes", MAX_REMINDER_ID_LEN),
            });
        }

        let reminder = ReminderRef {
            id: ReminderRefId::now_v7(),
            reminder_id: reminder_id.to_string(),
            due_at,
            created_by_role,
        };
        self.reminders.push(reminder.clone());
        self.updated_at = self.next_timestamp();
        Ok(reminder)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::{Board, ConversationId, TrellisError};
    use chrono::{Duration, Utc};

    fn row() -> Application {
        let board = Board::with_default_columns(ConversationId::now_v7());
        Application::new(&board, "user-1")
    }

    #[test]
    fn test_post_activity_trims() {
        let mut row = row();
        let entry = row.post_activity(Role::Mentor, "  Sent referral  ").expect("post");
        assert_eq!(entry.message, "Sent referral");
        assert_eq!(entry.author_role, Role::Mentor);
        assert_eq!(row.activity_log.len(), 1);
    }

    #[test]
    fn test_post_activity_rejects_blank_and_long() {
        let mut row = row();
        assert!(row.post_activity(Role::Mentee, "   ").is_err());
        let long = "x".repeat(MAX_ACTIVITY_LEN + 1);
        assert!(row.post_activity(Role::Mentee, &long).is_err());
        assert!(row.activity_log.is_empty());
    }

    #[test]
    fn test_add_tag_normalizes_color() {
        let mut row = row();
        let tag = row.add_tag(" Remote ", "#a1b2c3").expect("tag");
        assert_eq!(tag.label, "Remote");
        assert_eq!(tag.color, "#A1B2C3");
    }

    #[test]
    fn test_add_tag_rejects_duplicates_and_bad_color() {
        let mut row = row();
        row.add_tag("Remote", "#000000").expect("tag");
        let dup = row.add_tag("remote", "#FFFFFF").unwrap_err();
        assert!(matches!(dup, ValidationError::ConstraintViolation { .. }));
        let color = row.add_tag("Onsite", "red").unwrap_err();
        assert!(matches!(color, ValidationError::InvalidValue { ref field, .. } if field == "color"));
        assert_eq!(row.tags.len(), 1);
    }

    #[test]
    fn test_remove_tag() {
        let mut row = row();
        let tag = row.add_tag("Referral", "#00FF00").expect("tag");
        row.remove_tag(tag.id).expect("remove");
        assert!(row.tags.is_empty());
        let err = row.remove_tag(tag.id).unwrap_err();
        assert!(matches!(err, TrellisError::Storage(StorageError::NotFound { .. })));
    }

    #[test]
    fn test_attach_reminder() {
        let mut row = row();
        let due = Utc::now() + Duration::days(3);
        let reminder = row.attach_reminder("rem_123", due, Role::Mentee).expect("reminder");
        assert_eq!(reminder.reminder_id, "rem_123");
        assert_eq!(reminder.due_at, due);
        assert_eq!(row.reminders.len(), 1);
        assert!(row.attach_reminder("  ", due, Role::Mentee).is_err());
    }
}
