//! View events - everything that can change the conversation view.

use chat_core::{ConversationId, Message, MessageId, ResponseId, Thread, ValidationError};
use serde::{Deserialize, Serialize};

/// Direction of branch navigation within a thread.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum NavDirection {
    Previous,
    Next,
}

/// Events that drive [`crate::reduce`].
#[derive(Debug, Clone, PartialEq)]
pub enum ViewEvent {
    // ========== Conversation Events ==========
    /// Threads of a conversation were assembled from the store.
    ConversationLoaded {
        conversation_id: ConversationId,
        threads: Vec<Thread>,
    },

    /// A conversation was created for the first message.
    ConversationStarted { conversation_id: ConversationId },

    /// Every conversation was deleted.
    HistoryCleared,

    // ========== Composer Events ==========
    /// The input buffer changed.
    InputChanged { text: String },

    /// Submission was refused before reaching the store.
    SubmitRejected { error: ValidationError },

    // ========== Exchange Events ==========
    /// An original message was stored; its response is pending.
    MessageSent { message: Message },

    /// A branch was stored; its response is pending.
    BranchCreated { message: Message },

    /// The simulated response for a message is ready to show.
    ResponseResolved {
        message_id: MessageId,
        content: String,
    },

    /// The store confirmed a shown response.
    ResponsePersisted {
        message_id: MessageId,
        response_id: ResponseId,
    },

    // ========== Navigation Events ==========
    /// User moved between the branches of a thread.
    BranchNavigated {
        original_message_id: MessageId,
        direction: NavDirection,
    },
}

impl ViewEvent {
    /// Check if this event concerns a message/response exchange.
    pub fn is_exchange_event(&self) -> bool {
        matches!(
            self,
            Self::MessageSent { .. }
                | Self::BranchCreated { .. }
                | Self::ResponseResolved { .. }
                | Self::ResponsePersisted { .. }
        )
    }
}
