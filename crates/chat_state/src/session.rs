//! Chat session - drives the conversation view from user actions.
//!
//! Store writes happen first, then the optimistic view update, then a
//! scheduled task delivers the simulated response. Scheduled tasks hang off
//! the session's cancellation token, so closing or dropping the session stops
//! them before they touch the view.

use std::sync::Arc;
use std::time::Duration;

use chat_core::{
    validate_input, CannedResponder, Config, Conversation, ConversationId, MessageId,
    NewMessage, Responder, ResponseId,
};
use chat_store::{ChatStore, ThreadAssembler};
use tokio::sync::RwLock;
use tokio::task::JoinHandle;
use tokio_util::sync::CancellationToken;

use crate::error::{Result, SessionError};
use crate::machine::{reduce, ConversationView, NavDirection, ViewEvent};

/// What became of a scheduled response.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ResponseOutcome {
    /// Shown in the view. `response_id` is `None` when persisting it failed.
    Delivered {
        content: String,
        response_id: Option<ResponseId>,
    },
    /// The session went away before the delay elapsed.
    Cancelled,
}

/// Handle to the simulated response of one message.
///
/// Dropping the handle does not stop the task.
#[derive(Debug)]
pub struct PendingResponse {
    message_id: MessageId,
    token: CancellationToken,
    handle: JoinHandle<ResponseOutcome>,
}

impl PendingResponse {
    pub fn message_id(&self) -> MessageId {
        self.message_id
    }

    /// Stop this response if it has not been delivered yet.
    pub fn cancel(&self) {
        self.token.cancel();
    }

    /// Wait for the task to finish.
    pub async fn wait(self) -> ResponseOutcome {
        match self.handle.await {
            Ok(outcome) => outcome,
            Err(e) => {
                tracing::warn!("response task for message {} failed: {}", self.message_id, e);
                ResponseOutcome::Cancelled
            }
        }
    }
}

/// One user's view of one conversation at a time.
pub struct ChatSession {
    store: Arc<dyn ChatStore>,
    assembler: ThreadAssembler,
    responder: Arc<dyn Responder>,
    response_delay: Duration,
    view: Arc<RwLock<ConversationView>>,
    cancel_token: CancellationToken,
}

impl ChatSession {
    pub fn new(
        store: Arc<dyn ChatStore>,
        responder: Arc<dyn Responder>,
        response_delay: Duration,
    ) -> Self {
        Self {
            assembler: ThreadAssembler::new(store.clone()),
            store,
            responder,
            response_delay,
            view: Arc::new(RwLock::new(ConversationView::default())),
            cancel_token: CancellationToken::new(),
        }
    }

    /// Session with canned responses and the configured delay.
    pub fn from_config(store: Arc<dyn ChatStore>, config: &Config) -> Self {
        Self::new(store, Arc::new(CannedResponder), config.response_delay())
    }

    /// Copy of the current view.
    pub async fn snapshot(&self) -> ConversationView {
        self.view.read().await.clone()
    }

    pub fn is_closed(&self) -> bool {
        self.cancel_token.is_cancelled()
    }

    /// Cancel every scheduled response. The session refuses further actions.
    pub fn close(&self) {
        tracing::debug!("closing chat session");
        self.cancel_token.cancel();
    }

    /// All conversations, newest first.
    pub async fn conversations(&self) -> Result<Vec<Conversation>> {
        Ok(self.store.fetch_conversations().await?)
    }

    /// Load a conversation's threads. On failure the view is left untouched.
    pub async fn select_conversation(&self, conversation_id: ConversationId) -> Result<()> {
        self.ensure_open()?;
        let threads = self.assembler.assemble(conversation_id).await?;
        self.apply(ViewEvent::ConversationLoaded {
            conversation_id,
            threads,
        })
        .await;
        Ok(())
    }

    /// Create an empty conversation and select it.
    pub async fn new_conversation(&self) -> Result<Conversation> {
        self.ensure_open()?;
        let conversation = self.store.create_conversation("").await?;
        self.apply(ViewEvent::ConversationLoaded {
            conversation_id: conversation.id,
            threads: Vec::new(),
        })
        .await;
        Ok(conversation)
    }

    pub async fn set_input(&self, text: impl Into<String>) {
        self.apply(ViewEvent::InputChanged { text: text.into() })
            .await;
    }

    /// Send whatever is in the composer buffer.
    pub async fn submit(&self) -> Result<PendingResponse> {
        let input = self.view.read().await.input.clone();
        self.send(&input).await
    }

    /// Send an original message, creating the conversation if none is selected.
    pub async fn send(&self, content: &str) -> Result<PendingResponse> {
        self.ensure_open()?;
        let content = self.validate(content).await?;

        let selected = self.view.read().await.conversation_id;
        let conversation_id = match selected {
            Some(id) => id,
            None => {
                let conversation = self.store.create_conversation(content).await?;
                self.apply(ViewEvent::ConversationStarted {
                    conversation_id: conversation.id,
                })
                .await;
                conversation.id
            }
        };

        let message = self
            .store
            .send_message(NewMessage::original(conversation_id, content))
            .await?;
        let message_id = message.id;
        self.apply(ViewEvent::MessageSent { message }).await;

        Ok(self.schedule_response(message_id))
    }

    /// Fork a branch of the thread holding `message_id` with new content.
    pub async fn edit(&self, message_id: MessageId, content: &str) -> Result<PendingResponse> {
        self.ensure_open()?;
        let content = self.validate(content).await?;

        let (conversation_id, original_id, thread_level) = {
            let view = self.view.read().await;
            let conversation_id = view.conversation_id.ok_or(SessionError::NoConversation)?;
            let original_id = view
                .thread_containing(message_id)
                .map(|thread| thread.original_message_id())
                .ok_or(SessionError::UnknownMessage(message_id))?;
            (conversation_id, original_id, view.thread_level + 1)
        };

        let message = self
            .store
            .edit_message(conversation_id, original_id, content, thread_level)
            .await?;
        let message_id = message.id;
        self.apply(ViewEvent::BranchCreated { message }).await;

        Ok(self.schedule_response(message_id))
    }

    /// Show the previous or next branch of a thread.
    pub async fn navigate(&self, original_message_id: MessageId, direction: NavDirection) {
        self.apply(ViewEvent::BranchNavigated {
            original_message_id,
            direction,
        })
        .await;
    }

    /// Delete every conversation in the store, not only the selected one.
    pub async fn clear_all(&self) -> Result<()> {
        self.ensure_open()?;
        if let Err(e) = self.store.clear_all().await {
            if e.operation.is_clear_stage() {
                tracing::warn!(
                    "clear-all stopped at {}; earlier stages stay deleted",
                    e.operation
                );
            }
            return Err(e.into());
        }
        self.apply(ViewEvent::HistoryCleared).await;
        Ok(())
    }

    async fn validate<'a>(&self, content: &'a str) -> Result<&'a str> {
        match validate_input(content) {
            Ok(content) => Ok(content),
            Err(error) => {
                self.apply(ViewEvent::SubmitRejected {
                    error: error.clone(),
                })
                .await;
                Err(error.into())
            }
        }
    }

    async fn apply(&self, event: ViewEvent) {
        apply_event(&self.view, event).await;
    }

    fn ensure_open(&self) -> Result<()> {
        if self.is_closed() {
            return Err(SessionError::Closed);
        }
        Ok(())
    }

    fn schedule_response(&self, message_id: MessageId) -> PendingResponse {
        let token = self.cancel_token.child_token();
        tracing::debug!(
            "response for message {} scheduled in {:?}",
            message_id,
            self.response_delay
        );

        let handle = tokio::spawn(deliver_response(
            message_id,
            self.response_delay,
            self.responder.clone(),
            self.store.clone(),
            self.view.clone(),
            token.clone(),
        ));

        PendingResponse {
            message_id,
            token,
            handle,
        }
    }
}

impl Drop for ChatSession {
    fn drop(&mut self) {
        self.cancel_token.cancel();
    }
}

async fn apply_event(view: &RwLock<ConversationView>, event: ViewEvent) {
    if event.is_exchange_event() {
        tracing::debug!("applying {:?}", event);
    }
    let mut guard = view.write().await;
    let current = std::mem::take(&mut *guard);
    *guard = reduce(current, event);
}

async fn deliver_response(
    message_id: MessageId,
    delay: Duration,
    responder: Arc<dyn Responder>,
    store: Arc<dyn ChatStore>,
    view: Arc<RwLock<ConversationView>>,
    token: CancellationToken,
) -> ResponseOutcome {
    tokio::select! {
        _ = token.cancelled() => {
            tracing::debug!("response for message {} cancelled", message_id);
            return ResponseOutcome::Cancelled;
        }
        _ = tokio::time::sleep(delay) => {}
    }

    let content = responder.generate_response();
    apply_event(
        &view,
        ViewEvent::ResponseResolved {
            message_id,
            content: content.clone(),
        },
    )
    .await;

    // The shown response stays even if it cannot be stored.
    let response_id = match store.save_response(message_id, &content).await {
        Ok(response) => {
            apply_event(
                &view,
                ViewEvent::ResponsePersisted {
                    message_id,
                    response_id: response.id,
                },
            )
            .await;
            Some(response.id)
        }
        Err(e) => {
            tracing::warn!("failed to save response for message {}: {}", message_id, e);
            None
        }
    };

    ResponseOutcome::Delivered {
        content,
        response_id,
    }
}
