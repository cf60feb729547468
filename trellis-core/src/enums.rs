//! Enum types for Trellis entities

use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

// ============================================================================
// CORE ENUMS
// ============================================================================

/// Declared type of a board column. Drives coercion in [`crate::cell`].
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[cfg_attr(feature = "openapi", derive(utoipa::ToSchema))]
#[serde(rename_all = "lowercase")]
pub enum ColumnType {
    /// Single-line text
    Text,
    /// Multi-line text
    Longtext,
    /// Floating point number
    Number,
    /// Boolean flag
    Checkbox,
    /// `YYYY-MM-DD` prefixed date string
    Date,
    /// One value out of the column's option list
    Select,
}

impl ColumnType {
    pub fn as_str(&self) -> &'static str {
        match self {
            ColumnType::Text => "text",
            ColumnType::Longtext => "longtext",
            ColumnType::Number => "number",
            ColumnType::Checkbox => "checkbox",
            ColumnType::Date => "date",
            ColumnType::Select => "select",
        }
    }

    /// Whether the column carries an option list.
    pub fn uses_options(&self) -> bool {
        matches!(self, ColumnType::Select)
    }
}

impl fmt::Display for ColumnType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for ColumnType {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_ascii_lowercase().as_str() {
            "text" => Ok(ColumnType::Text),
            "longtext" => Ok(ColumnType::Longtext),
            "number" => Ok(ColumnType::Number),
            "checkbox" => Ok(ColumnType::Checkbox),
            "date" => Ok(ColumnType::Date),
            "select" => Ok(ColumnType::Select),
            other => Err(format!("unknown column type '{}'", other)),
        }
    }
}

/// Participant role inside a conversation.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[cfg_attr(feature = "openapi", derive(utoipa::ToSchema))]
#[serde(rename_all = "lowercase")]
pub enum Role {
    Mentor,
    Mentee,
}

impl Role {
    pub fn as_str(&self) -> &'static str {
        match self {
            Role::Mentor => "mentor",
            Role::Mentee => "mentee",
        }
    }

    /// Capitalised label used in activity narration.
    pub fn label(&self) -> &'static str {
        match self {
            Role::Mentor => "Mentor",
            Role::Mentee => "Mentee",
        }
    }

    /// Suggestions flow mentor -> mentee for review; only the mentee resolves them.
    pub fn can_resolve_suggestions(&self) -> bool {
        matches!(self, Role::Mentee)
    }
}

impl fmt::Display for Role {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for Role {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_ascii_lowercase().as_str() {
            "mentor" => Ok(Role::Mentor),
            "mentee" => Ok(Role::Mentee),
            other => Err(format!("unknown role '{}'", other)),
        }
    }
}

/// Lifecycle of a suggestion. `Pending` is the only non-terminal state.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, Default)]
#[cfg_attr(feature = "openapi", derive(utoipa::ToSchema))]
#[serde(rename_all = "lowercase")]
pub enum SuggestionStatus {
    #[default]
    Pending,
    Accepted,
    Rejected,
}

impl SuggestionStatus {
    pub fn as_str(&self) -> &'static str {
        match self {
            SuggestionStatus::Pending => "pending",
            SuggestionStatus::Accepted => "accepted",
            SuggestionStatus::Rejected => "rejected",
        }
    }

    pub fn is_terminal(&self) -> bool {
        !matches!(self, SuggestionStatus::Pending)
    }
}

impl fmt::Display for SuggestionStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for SuggestionStatus {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_ascii_lowercase().as_str() {
            "pending" => Ok(SuggestionStatus::Pending),
            "accepted" => Ok(SuggestionStatus::Accepted),
            "rejected" => Ok(SuggestionStatus::Rejected),
            other => Err(format!("unknown suggestion status '{}'", other)),
        }
    }
}

/// Entity type discriminator used in storage errors.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[cfg_attr(feature = "openapi", derive(utoipa::ToSchema))]
pub enum EntityType {
    Conversation,
    Board,
    Column,
    Application,
    Suggestion,
    Tag,
}

impl fmt::Display for EntityType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            EntityType::Conversation => "Conversation",
            EntityType::Board => "Board",
            EntityType::Column => "Column",
            EntityType::Application => "Application",
            EntityType::Suggestion => "Suggestion",
            EntityType::Tag => "Tag",
        };
        f.write_str(name)
    }
}
