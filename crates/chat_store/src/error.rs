//! Store error types

use std::fmt;

use chat_core::{ConversationId, MessageId};
use thiserror::Error;

/// Gateway operation that produced a [`StoreError`].
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum StoreOperation {
    Init,
    CreateConversation,
    SendMessage,
    SaveResponse,
    FetchConversations,
    FetchMessages,
    FetchChildren,
    FetchResponse,
    ClearResponses,
    ClearMessages,
    ClearConversations,
}

impl StoreOperation {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Init => "init",
            Self::CreateConversation => "create_conversation",
            Self::SendMessage => "send_message",
            Self::SaveResponse => "save_response",
            Self::FetchConversations => "fetch_conversations",
            Self::FetchMessages => "fetch_messages",
            Self::FetchChildren => "fetch_children",
            Self::FetchResponse => "fetch_response",
            Self::ClearResponses => "clear_responses",
            Self::ClearMessages => "clear_messages",
            Self::ClearConversations => "clear_conversations",
        }
    }

    /// Whether this is one of the stages of a bulk clear.
    pub fn is_clear_stage(&self) -> bool {
        matches!(
            self,
            Self::ClearResponses | Self::ClearMessages | Self::ClearConversations
        )
    }
}

impl fmt::Display for StoreOperation {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Transport, query or constraint failure reported by a store.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
#[error("{operation} failed: {message}")]
pub struct StoreError {
    pub operation: StoreOperation,
    pub message: String,
}

impl StoreError {
    pub fn new(operation: StoreOperation, message: impl Into<String>) -> Self {
        Self {
            operation,
            message: message.into(),
        }
    }

    /// Adapter for `map_err`.
    pub fn during<E: fmt::Display>(operation: StoreOperation) -> impl Fn(E) -> Self {
        move |error| Self::new(operation, error.to_string())
    }
}

pub type StoreResult<T> = std::result::Result<T, StoreError>;

/// Thread assembly failure. Partial results are discarded.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum FetchError {
    #[error("failed to fetch messages of conversation {conversation_id}: {source}")]
    Originals {
        conversation_id: ConversationId,
        #[source]
        source: StoreError,
    },

    #[error("failed to fetch thread data for message {message_id}: {source}")]
    Message {
        message_id: MessageId,
        #[source]
        source: StoreError,
    },
}

impl FetchError {
    /// The underlying store failure.
    pub fn store_error(&self) -> &StoreError {
        match self {
            Self::Originals { source, .. } | Self::Message { source, .. } => source,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_store_error_display_names_operation() {
        let error = StoreError::new(StoreOperation::ClearMessages, "connection reset");
        assert_eq!(error.to_string(), "clear_messages failed: connection reset");
        assert!(error.operation.is_clear_stage());
        assert!(!StoreOperation::SendMessage.is_clear_stage());
    }

    #[test]
    fn test_fetch_error_names_message() {
        let error = FetchError::Message {
            message_id: 42,
            source: StoreError::new(StoreOperation::FetchResponse, "timeout"),
        };
        assert_eq!(
            error.to_string(),
            "failed to fetch thread data for message 42: fetch_response failed: timeout"
        );
        assert_eq!(error.store_error().operation, StoreOperation::FetchResponse);
    }
}
