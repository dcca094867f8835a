//! Thread assembly - rebuilds branch trees from flat message and response rows.

use std::sync::Arc;

use chat_core::{BranchView, ConversationId, Message, Thread};
use futures::future::try_join_all;

use crate::error::FetchError;
use crate::storage::ChatStore;

/// Thread level given to every branch returned by the store.
///
/// Stored levels are caller-supplied and may be stale, so assembly flattens
/// all branches to the first level below the original.
pub const ASSEMBLED_BRANCH_LEVEL: u32 = 1;

/// Reconstructs the threads of a conversation from a [`ChatStore`].
#[derive(Clone)]
pub struct ThreadAssembler {
    store: Arc<dyn ChatStore>,
}

impl ThreadAssembler {
    pub fn new(store: Arc<dyn ChatStore>) -> Self {
        Self { store }
    }

    /// One thread per original message, oldest original first.
    ///
    /// A missing response is `None`; any other failure aborts the assembly.
    pub async fn assemble(
        &self,
        conversation_id: ConversationId,
    ) -> Result<Vec<Thread>, FetchError> {
        let originals = self
            .store
            .fetch_messages(conversation_id)
            .await
            .map_err(|source| FetchError::Originals {
                conversation_id,
                source,
            })?;
        tracing::debug!(
            "assembling {} threads for conversation {}",
            originals.len(),
            conversation_id
        );

        try_join_all(originals.iter().map(|original| self.assemble_thread(original))).await
    }

    async fn assemble_thread(&self, original: &Message) -> Result<Thread, FetchError> {
        let message_id = original.id;
        let (response, children) = tokio::try_join!(
            self.store.fetch_response(message_id),
            self.store.fetch_children(message_id),
        )
        .map_err(|source| FetchError::Message { message_id, source })?;

        let branches =
            try_join_all(children.iter().map(|child| self.assemble_branch(child))).await?;

        let mut thread = Thread::new(BranchView::from_message(original, response.as_ref()));
        thread.root.children = branches;
        Ok(thread)
    }

    async fn assemble_branch(&self, child: &Message) -> Result<BranchView, FetchError> {
        let response = self
            .store
            .fetch_response(child.id)
            .await
            .map_err(|source| FetchError::Message {
                message_id: child.id,
                source,
            })?;
        Ok(BranchView::from_message(child, response.as_ref())
            .with_thread_level(ASSEMBLED_BRANCH_LEVEL))
    }
}
