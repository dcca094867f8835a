//! chat_state - Conversation view state for the branching chat client
//!
//! This crate provides the reducer that turns user actions and store results
//! into the conversation view, and the session that wires it to a store.

pub mod error;
pub mod machine;
pub mod session;

// Re-export commonly used types
pub use error::SessionError;
pub use machine::{reduce, ConversationView, ExchangeState, NavDirection, ThreadView, ViewEvent};
pub use session::{ChatSession, PendingResponse, ResponseOutcome};
