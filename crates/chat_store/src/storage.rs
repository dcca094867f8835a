//! Persistence gateway trait

use async_trait::async_trait;
use chat_core::{Conversation, ConversationId, Message, MessageId, NewMessage, Response};

use crate::error::StoreResult;

/// Conversation, message and response operations over a backing store.
///
/// Every method may suspend on I/O. Nothing is retried; a failure is reported
/// once through [`crate::StoreError`].
#[async_trait]
pub trait ChatStore: Send + Sync {
    /// Insert a conversation. An empty title is stored as "New Conversation".
    async fn create_conversation(&self, title: &str) -> StoreResult<Conversation>;

    /// Insert an original message or a branch.
    async fn send_message(&self, message: NewMessage) -> StoreResult<Message>;

    /// Fork a branch from `parent_id` instead of overwriting it.
    async fn edit_message(
        &self,
        conversation_id: ConversationId,
        parent_id: MessageId,
        new_content: &str,
        thread_level: u32,
    ) -> StoreResult<Message> {
        self.send_message(NewMessage::branch(
            conversation_id,
            parent_id,
            new_content,
            thread_level,
        ))
        .await
    }

    /// Attach a response to a message. Callers must not save two for one message.
    async fn save_response(&self, message_id: MessageId, content: &str) -> StoreResult<Response>;

    /// All conversations, newest first.
    async fn fetch_conversations(&self) -> StoreResult<Vec<Conversation>>;

    /// Original (non-branch) messages of a conversation, oldest first.
    async fn fetch_messages(&self, conversation_id: ConversationId) -> StoreResult<Vec<Message>>;

    /// Every message whose `parent_id` equals `parent_id`.
    async fn fetch_children(&self, parent_id: MessageId) -> StoreResult<Vec<Message>>;

    /// The response of a message; `Ok(None)` when none was saved.
    async fn fetch_response(&self, message_id: MessageId) -> StoreResult<Option<Response>>;

    /// Delete every response, then every message, then every conversation.
    ///
    /// Not atomic: the first failing stage aborts the rest and is named by the
    /// error's operation; rows deleted by earlier stages stay deleted.
    async fn clear_all(&self) -> StoreResult<()>;
}
