//! View state machine
//!
//! Conversation view, its events and the reducer between them.

mod events;
mod states;
mod transitions;

pub use events::{NavDirection, ViewEvent};
pub use states::{ConversationView, ExchangeState, ThreadView};
pub use transitions::reduce;
