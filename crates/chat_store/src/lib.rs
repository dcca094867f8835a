//! # Chat Store
//!
//! Persistence gateway for conversations, messages and responses, plus the
//! assembler that rebuilds branch threads from stored rows.

pub mod assembler;
pub mod error;
pub mod memory;
pub mod rest;
pub mod sqlite;
pub mod storage;

// Re-exports
pub use assembler::{ThreadAssembler, ASSEMBLED_BRANCH_LEVEL};
pub use error::{FetchError, StoreError, StoreOperation, StoreResult};
pub use memory::InMemoryChatStore;
pub use rest::RestChatStore;
pub use sqlite::SqliteChatStore;
pub use storage::ChatStore;
