//! Session error types

use chat_core::{MessageId, ValidationError};
use chat_store::{FetchError, StoreError};
use thiserror::Error;

#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum SessionError {
    #[error(transparent)]
    Validation(#[from] ValidationError),

    #[error(transparent)]
    Store(#[from] StoreError),

    #[error(transparent)]
    Fetch(#[from] FetchError),

    #[error("no conversation is selected")]
    NoConversation,

    #[error("message {0} is not part of the current conversation")]
    UnknownMessage(MessageId),

    #[error("session is closed")]
    Closed,
}

pub type Result<T> = std::result::Result<T, SessionError>;
