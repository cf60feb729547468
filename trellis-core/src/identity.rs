//! Identity types for Trellis entities

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;
use uuid::Uuid;

/// Entity identifier using UUIDv7 for timestamp-sortable IDs.
/// UUIDv7 embeds a Unix timestamp, making IDs naturally sortable by creation time.
pub type EntityId = Uuid;

/// Timestamp type using UTC timezone.
pub type Timestamp = DateTime<Utc>;

/// Generate a new UUIDv7 EntityId (timestamp-sortable).
pub fn new_entity_id() -> EntityId {
    Uuid::now_v7()
}

/// Common behaviour of the strongly-typed id wrappers.
pub trait EntityIdType: Copy + Eq + std::hash::Hash + fmt::Display {
    /// Human-readable entity name used in error messages.
    const ENTITY_NAME: &'static str;

    /// Wrap an existing UUID.
    fn new(uuid: Uuid) -> Self;

    /// Borrow the underlying UUID.
    fn as_uuid(&self) -> Uuid;

    /// Generate a fresh UUIDv7 id.
    fn now_v7() -> Self {
        Self::new(Uuid::now_v7())
    }
}

macro_rules! define_entity_id {
    ($(#[$meta:meta])* $name:ident, $entity:literal) => {
        $(#[$meta])*
        #[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
        #[cfg_attr(feature = "openapi", derive(utoipa::ToSchema))]
        #[serde(transparent)]
        pub struct $name(Uuid);

        impl EntityIdType for $name {
            const ENTITY_NAME: &'static str = $entity;

            fn new(uuid: Uuid) -> Self {
                Self(uuid)
            }

            fn as_uuid(&self) -> Uuid {
                self.0
            }
        }

        impl $name {
            /// Wrap an existing UUID.
            pub const fn from_uuid(uuid: Uuid) -> Self {
                Self(uuid)
            }

            /// Generate a fresh UUIDv7 id.
            pub fn now_v7() -> Self {
                Self(Uuid::now_v7())
            }

            /// The nil id, used by fixtures.
            pub const fn nil() -> Self {
                Self(Uuid::nil())
            }
        }

        impl fmt::Display for $name {
            fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
                self.0.fmt(f)
            }
        }

        impl FromStr for $name {
            type Err = uuid::Error;

            fn from_str(s: &str) -> Result<Self, Self::Err> {
                Uuid::parse_str(s).map(Self)
            }
        }

        impl From<Uuid> for $name {
            fn from(uuid: Uuid) -> Self {
                Self(uuid)
            }
        }

        impl From<$name> for Uuid {
            fn from(id: $name) -> Self {
                id.0
            }
        }
    };
}

define_entity_id!(
    /// A mentor-mentee pairing. Owns exactly one board.
    ConversationId,
    "Conversation"
);
define_entity_id!(
    /// Column definition document for one conversation.
    BoardId,
    "Board"
);
define_entity_id!(
    /// One tracked job application (a board row).
    ApplicationId,
    "Application"
);
define_entity_id!(SuggestionId, "Suggestion");
define_entity_id!(HistoryEntryId, "HistoryEntry");
define_entity_id!(ActivityEntryId, "ActivityEntry");
define_entity_id!(TagId, "Tag");
define_entity_id!(ReminderRefId, "Reminder");

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_new_entity_id_is_v7() {
        let id = new_entity_id();
        assert_eq!(id.get_version_num(), 7);
    }

    #[test]
    fn test_typed_id_roundtrips_through_string() {
        let id = ApplicationId::now_v7();
        let parsed: ApplicationId = id.to_string().parse().expect("parse id");
        assert_eq!(parsed, id);
    }

    #[test]
    fn test_typed_id_serializes_as_bare_uuid() {
        let id = ConversationId::nil();
        let json = serde_json::to_string(&id).expect("serialize id");
        assert_eq!(json, "\"00000000-0000-0000-0000-000000000000\"");
    }

    #[test]
    fn test_entity_names() {
        assert_eq!(SuggestionId::ENTITY_NAME, "Suggestion");
        assert_eq!(<ApplicationId as EntityIdType>::now_v7().as_uuid().get_version_num(), 7);
    }
}
