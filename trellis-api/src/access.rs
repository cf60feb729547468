//! Conversation membership.
//!
//! A bearer token names the caller; membership and the caller's role in a
//! conversation come from an [`AccessDirectory`]. The in-memory directory is
//! what the binary and the tests run with.

use crate::auth::AuthContext;
use async_trait::async_trait;
use dashmap::DashMap;
use trellis_core::{AccessError, ConversationId, EntityIdType, Role, TrellisResult};

/// An authenticated caller resolved inside one conversation.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Participant {
    pub user_id: String,
    pub conversation_id: ConversationId,
    pub role: Role,
}

/// Resolves conversation membership and role.
#[async_trait]
pub trait AccessDirectory: Send + Sync {
    /// Role of `user_id` in `conversation_id`.
    ///
    /// Fails with [`AccessError::NotParticipant`] when the user is not a
    /// member of the conversation.
    async fn role_of(&self, conversation_id: ConversationId, user_id: &str) -> TrellisResult<Role>;
}

/// Resolve the caller of a request as a participant of `conversation_id`.
pub async fn resolve_participant(
    directory: &dyn AccessDirectory,
    conversation_id: ConversationId,
    auth: &AuthContext,
) -> TrellisResult<Participant> {
    let role = directory.role_of(conversation_id, &auth.user_id).await?;
    Ok(Participant {
        user_id: auth.user_id.clone(),
        conversation_id,
        role,
    })
}

/// Membership table held in memory.
#[derive(Debug, Default)]
pub struct InMemoryAccessDirectory {
    members: DashMap<(ConversationId, String), Role>,
}

impl InMemoryAccessDirectory {
    pub fn new() -> Self {
        Self::default()
    }

    /// Add (or re-role) a member of a conversation.
    pub fn grant(&self, conversation_id: ConversationId, user_id: impl Into<String>, role: Role) {
        self.members.insert((conversation_id, user_id.into()), role);
    }

    pub fn revoke(&self, conversation_id: ConversationId, user_id: &str) -> Option<Role> {
        self.members
            .remove(&(conversation_id, user_id.to_string()))
            .map(|(_, role)| role)
    }

    /// Parse `conversation:user:role` triples separated by commas.
    ///
    /// Used to seed the directory from `TRELLIS_MEMBERS`; malformed entries
    /// are skipped with a warning.
    pub fn from_spec(spec: &str) -> Self {
        let directory = Self::new();
        for entry in spec.split(',').map(str::trim).filter(|e| !e.is_empty()) {
            let mut parts = entry.splitn(3, ':');
            let parsed = match (parts.next(), parts.next(), parts.next()) {
                (Some(cid), Some(user), Some(role)) if !user.trim().is_empty() => cid
                    .trim()
                    .parse::<ConversationId>()
                    .ok()
                    .zip(role.trim().parse::<Role>().ok())
                    .map(|(cid, role)| (cid, user.trim().to_string(), role)),
                _ => None,
            };
            match parsed {
                Some((cid, user, role)) => directory.grant(cid, user, role),
                None => tracing::warn!(entry = entry, "Skipping malformed membership entry"),
            }
        }
        directory
    }

    /// Seed from the `TRELLIS_MEMBERS` environment variable.
    pub fn from_env() -> Self {
        std::env::var("TRELLIS_MEMBERS")
            .map(|spec| Self::from_spec(&spec))
            .unwrap_or_default()
    }

    pub fn len(&self) -> usize {
        self.members.len()
    }

    pub fn is_empty(&self) -> bool {
        self.members.is_empty()
    }
}

#[async_trait]
impl AccessDirectory for InMemoryAccessDirectory {
    async fn role_of(&self, conversation_id: ConversationId, user_id: &str) -> TrellisResult<Role> {
        self.members
            .get(&(conversation_id, user_id.to_string()))
            .map(|entry| *entry.value())
            .ok_or_else(|| {
                AccessError::NotParticipant {
                    conversation_id: conversation_id.as_uuid(),
                }
                .into()
            })
    }
}
