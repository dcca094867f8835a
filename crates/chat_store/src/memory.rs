//! In-memory store

use std::collections::HashSet;

use async_trait::async_trait;
use chat_core::{
    conversation_title, Conversation, ConversationId, Message, MessageId, NewMessage, Response,
};
use chrono::Utc;
use tokio::sync::RwLock;

use crate::error::{StoreError, StoreOperation, StoreResult};
use crate::storage::ChatStore;

#[derive(Debug, Default)]
struct Tables {
    conversations: Vec<Conversation>,
    messages: Vec<Message>,
    responses: Vec<Response>,
    next_id: i64,
}

impl Tables {
    fn next_id(&mut self) -> i64 {
        self.next_id += 1;
        self.next_id
    }
}

/// Store held entirely in memory, with the same referential checks as SQLite.
///
/// Operations can be made to fail with [`InMemoryChatStore::inject_failure`].
#[derive(Debug, Default)]
pub struct InMemoryChatStore {
    tables: RwLock<Tables>,
    failures: RwLock<HashSet<StoreOperation>>,
}

impl InMemoryChatStore {
    pub fn new() -> Self {
        Self::default()
    }

    /// Make every later call of `operation` fail until [`Self::clear_failures`].
    pub async fn inject_failure(&self, operation: StoreOperation) {
        self.failures.write().await.insert(operation);
    }

    pub async fn clear_failures(&self) {
        self.failures.write().await.clear();
    }

    /// Number of stored (conversations, messages, responses).
    pub async fn row_counts(&self) -> (usize, usize, usize) {
        let tables = self.tables.read().await;
        (
            tables.conversations.len(),
            tables.messages.len(),
            tables.responses.len(),
        )
    }

    async fn check(&self, operation: StoreOperation) -> StoreResult<()> {
        if self.failures.read().await.contains(&operation) {
            return Err(StoreError::new(operation, "injected failure"));
        }
        Ok(())
    }
}

#[async_trait]
impl ChatStore for InMemoryChatStore {
    async fn create_conversation(&self, title: &str) -> StoreResult<Conversation> {
        self.check(StoreOperation::CreateConversation).await?;
        let mut tables = self.tables.write().await;
        let conversation = Conversation {
            id: tables.next_id(),
            title: conversation_title(title),
            created_at: Utc::now(),
        };
        tables.conversations.push(conversation.clone());
        Ok(conversation)
    }

    async fn send_message(&self, message: NewMessage) -> StoreResult<Message> {
        let op = StoreOperation::SendMessage;
        self.check(op).await?;
        if !message.is_consistent() {
            return Err(StoreError::new(op, "is_branch and parent_id disagree"));
        }

        let mut tables = self.tables.write().await;
        if !tables
            .conversations
            .iter()
            .any(|c| c.id == message.conversation_id)
        {
            return Err(StoreError::new(
                op,
                format!("conversation {} does not exist", message.conversation_id),
            ));
        }
        if let Some(parent_id) = message.parent_id {
            if !tables.messages.iter().any(|m| m.id == parent_id) {
                return Err(StoreError::new(
                    op,
                    format!("parent message {parent_id} does not exist"),
                ));
            }
        }

        let stored = Message {
            id: tables.next_id(),
            conversation_id: message.conversation_id,
            content: message.content,
            is_branch: message.is_branch,
            parent_id: message.parent_id,
            thread_level: message.thread_level,
            created_at: Utc::now(),
        };
        tables.messages.push(stored.clone());
        Ok(stored)
    }

    async fn save_response(&self, message_id: MessageId, content: &str) -> StoreResult<Response> {
        let op = StoreOperation::SaveResponse;
        self.check(op).await?;
        let mut tables = self.tables.write().await;
        if !tables.messages.iter().any(|m| m.id == message_id) {
            return Err(StoreError::new(
                op,
                format!("message {message_id} does not exist"),
            ));
        }
        let response = Response {
            id: tables.next_id(),
            message_id,
            content: content.to_string(),
            created_at: Utc::now(),
        };
        tables.responses.push(response.clone());
        Ok(response)
    }

    async fn fetch_conversations(&self) -> StoreResult<Vec<Conversation>> {
        self.check(StoreOperation::FetchConversations).await?;
        let tables = self.tables.read().await;
        let mut conversations = tables.conversations.clone();
        conversations.sort_by(|a, b| (b.created_at, b.id).cmp(&(a.created_at, a.id)));
        Ok(conversations)
    }

    async fn fetch_messages(&self, conversation_id: ConversationId) -> StoreResult<Vec<Message>> {
        self.check(StoreOperation::FetchMessages).await?;
        let tables = self.tables.read().await;
        let mut messages: Vec<Message> = tables
            .messages
            .iter()
            .filter(|m| m.conversation_id == conversation_id && !m.is_branch)
            .cloned()
            .collect();
        messages.sort_by_key(|m| (m.created_at, m.id));
        Ok(messages)
    }

    async fn fetch_children(&self, parent_id: MessageId) -> StoreResult<Vec<Message>> {
        self.check(StoreOperation::FetchChildren).await?;
        let tables = self.tables.read().await;
        Ok(tables
            .messages
            .iter()
            .filter(|m| m.parent_id == Some(parent_id))
            .cloned()
            .collect())
    }

    async fn fetch_response(&self, message_id: MessageId) -> StoreResult<Option<Response>> {
        self.check(StoreOperation::FetchResponse).await?;
        let tables = self.tables.read().await;
        Ok(tables
            .responses
            .iter()
            .find(|r| r.message_id == message_id)
            .cloned())
    }

    async fn clear_all(&self) -> StoreResult<()> {
        self.check(StoreOperation::ClearResponses).await?;
        self.tables.write().await.responses.clear();

        self.check(StoreOperation::ClearMessages).await?;
        self.tables.write().await.messages.clear();

        self.check(StoreOperation::ClearConversations).await?;
        self.tables.write().await.conversations.clear();
        Ok(())
    }
}
