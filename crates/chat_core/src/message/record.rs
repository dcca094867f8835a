//! Persisted records - conversations, messages and responses as stored rows.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

/// Store-assigned conversation identifier.
pub type ConversationId = i64;
/// Store-assigned message identifier.
pub type MessageId = i64;
/// Store-assigned response identifier.
pub type ResponseId = i64;

/// Title used when a conversation is created without one.
pub const DEFAULT_CONVERSATION_TITLE: &str = "New Conversation";

/// Returns the title to persist for a requested conversation title.
pub fn conversation_title(requested: &str) -> String {
    if requested.is_empty() {
        DEFAULT_CONVERSATION_TITLE.to_string()
    } else {
        requested.to_string()
    }
}

/// A conversation row. Never mutated after creation.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Conversation {
    pub id: ConversationId,
    pub title: String,
    pub created_at: DateTime<Utc>,
}

/// A user message row, either an original message or a branch of one.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Message {
    pub id: MessageId,
    pub conversation_id: ConversationId,
    pub content: String,
    pub is_branch: bool,
    #[serde(default)]
    pub parent_id: Option<MessageId>,
    #[serde(default)]
    pub thread_level: u32,
    pub created_at: DateTime<Utc>,
}

impl Message {
    /// Whether this message is the root of a thread.
    pub fn is_original(&self) -> bool {
        !self.is_branch
    }
}

/// A simulated AI response row attached to exactly one message.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Response {
    pub id: ResponseId,
    pub message_id: MessageId,
    pub content: String,
    pub created_at: DateTime<Utc>,
}

/// Insert payload for a message.
///
/// Build it with [`NewMessage::original`] or [`NewMessage::branch`]; stores
/// reject payloads where `is_branch` and `parent_id` disagree.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct NewMessage {
    pub conversation_id: ConversationId,
    pub content: String,
    pub is_branch: bool,
    pub parent_id: Option<MessageId>,
    pub thread_level: u32,
}

impl NewMessage {
    /// An original (non-branch) message at thread level 0.
    pub fn original(conversation_id: ConversationId, content: impl Into<String>) -> Self {
        Self {
            conversation_id,
            content: content.into(),
            is_branch: false,
            parent_id: None,
            thread_level: 0,
        }
    }

    /// A branch forked from `parent_id`.
    pub fn branch(
        conversation_id: ConversationId,
        parent_id: MessageId,
        content: impl Into<String>,
        thread_level: u32,
    ) -> Self {
        Self {
            conversation_id,
            content: content.into(),
            is_branch: true,
            parent_id: Some(parent_id),
            thread_level,
        }
    }

    /// Checks the original/branch invariant: branches always carry a parent,
    /// originals never do.
    pub fn is_consistent(&self) -> bool {
        self.is_branch == self.parent_id.is_some()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_empty_title_falls_back_to_default() {
        assert_eq!(conversation_title(""), "New Conversation");
        assert_eq!(conversation_title("Trip planning"), "Trip planning");
    }

    #[test]
    fn test_constructors_are_consistent() {
        let original = NewMessage::original(1, "hello");
        assert!(!original.is_branch);
        assert!(original.parent_id.is_none());
        assert!(original.is_consistent());

        let branch = NewMessage::branch(1, 7, "hello again", 1);
        assert!(branch.is_branch);
        assert_eq!(branch.parent_id, Some(7));
        assert!(branch.is_consistent());
    }

    #[test]
    fn test_hand_built_payload_can_be_inconsistent() {
        let mut payload = NewMessage::original(1, "x");
        payload.is_branch = true;
        assert!(!payload.is_consistent());
    }

    #[test]
    fn test_message_deserializes_without_optional_columns() {
        let json = r#"{
            "id": 3,
            "conversation_id": 1,
            "content": "Where should I go in July?",
            "is_branch": false,
            "created_at": "2024-07-01T10:00:00Z"
        }"#;
        let message: Message = serde_json::from_str(json).unwrap();
        assert!(message.is_original());
        assert_eq!(message.parent_id, None);
        assert_eq!(message.thread_level, 0);
    }
}
