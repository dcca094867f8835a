//! chat_core - Core types for the branching chat client
//!
//! This crate provides the foundational types used across all chat crates:
//! - `message` - persisted conversation, message and response records
//! - `thread` - derived trees of an original message and its branches
//! - `responder` - the simulated assistant
//! - `config` - settings loaded from file and environment

pub mod config;
pub mod message;
pub mod paths;
pub mod responder;
pub mod thread;
pub mod validation;

// Re-export commonly used types
pub use config::{Backend, Config, ConfigError, DEFAULT_RESPONSE_DELAY_MS};
pub use message::{
    conversation_title, Conversation, ConversationId, Message, MessageId, NewMessage, Response,
    ResponseId, DEFAULT_CONVERSATION_TITLE,
};
pub use responder::{CannedResponder, Responder, CANNED_RESPONSES};
pub use thread::{BranchView, ResponseView, Thread, ROOT_THREAD_LEVEL};
pub use validation::{validate_input, ValidationError};
