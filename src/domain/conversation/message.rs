//! Message entity for conversations.
//!
//! Messages are immutable records of user/assistant exchanges within a turn's
//! history. The caller owns the history and resends it in full every turn;
//! nothing here is persisted.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use thiserror::Error;
use uuid::Uuid;

/// Unique identifier for a message within a conversation.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct MessageId(Uuid);

impl MessageId {
    /// Creates a new random MessageId.
    pub fn new() -> Self {
        Self(Uuid::new_v4())
    }

    /// Creates a MessageId from an existing UUID.
    pub fn from_uuid(uuid: Uuid) -> Self {
        Self(uuid)
    }

    /// Returns the inner UUID.
    pub fn as_uuid(&self) -> &Uuid {
        &self.0
    }
}

impl Default for MessageId {
    fn default() -> Self {
        Self::new()
    }
}

impl std::fmt::Display for MessageId {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.0)
    }
}

/// Role of a message sender in a conversation.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Role {
    /// User input.
    User,
    /// Assistant response.
    Assistant,
}

/// Error raised when constructing a message from invalid input.
#[derive(Debug, Clone, Error)]
pub enum MessageError {
    #[error("Message content cannot be empty")]
    EmptyContent,
}

/// An immutable message within a conversation.
///
/// # Invariants
///
/// - `content` is non-empty (validated at construction)
/// - `created_at` is set at construction and never changes
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Message {
    /// Unique identifier for this message.
    id: MessageId,

    /// The role of the message sender.
    role: Role,

    /// The content of the message.
    content: String,

    /// When the message was created.
    created_at: DateTime<Utc>,
}

impl Message {
    /// Creates a new message with the given role and content.
    ///
    /// # Errors
    ///
    /// - `EmptyContent` if content is empty or whitespace-only
    pub fn new(role: Role, content: impl Into<String>) -> Result<Self, MessageError> {
        let content = content.into();
        if content.trim().is_empty() {
            return Err(MessageError::EmptyContent);
        }

        Ok(Self {
            id: MessageId::new(),
            role,
            content,
            created_at: Utc::now(),
        })
    }

    /// Creates a user message.
    pub fn user(content: impl Into<String>) -> Result<Self, MessageError> {
        Self::new(Role::User, content)
    }

    /// Creates an assistant message.
    pub fn assistant(content: impl Into<String>) -> Result<Self, MessageError> {
        Self::new(Role::Assistant, content)
    }

    /// Returns the message id.
    pub fn id(&self) -> MessageId {
        self.id
    }

    /// Returns the sender role.
    pub fn role(&self) -> Role {
        self.role
    }

    /// Returns the message content.
    pub fn content(&self) -> &str {
        &self.content
    }

    /// Returns the creation timestamp.
    pub fn created_at(&self) -> DateTime<Utc> {
        self.created_at
    }

    /// Returns true if this message was sent by the user.
    pub fn is_user(&self) -> bool {
        self.role == Role::User
    }
}

/// Collects the content of every user message, in order.
pub(crate) fn user_contents(messages: &[Message]) -> Vec<String> {
    messages
        .iter()
        .filter(|m| m.is_user())
        .map(|m| m.content().to_string())
        .collect()
}

/// Returns the content of the most recent user message, if any.
pub(crate) fn latest_user_content(messages: &[Message]) -> Option<String> {
    messages
        .iter()
        .rev()
        .find(|m| m.is_user())
        .map(|m| m.content().to_string())
}
