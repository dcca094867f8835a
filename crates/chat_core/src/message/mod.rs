//! Message module - persisted chat records
//!
//! Row types shared by the store, the view state and the terminal client.

mod record;

pub use record::{
    conversation_title, Conversation, ConversationId, Message, MessageId, NewMessage, Response,
    ResponseId, DEFAULT_CONVERSATION_TITLE,
};
