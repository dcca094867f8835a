//! View states - the in-memory conversation shown to the user.

use chat_core::{BranchView, ConversationId, MessageId, Thread};
use serde::{Deserialize, Serialize};

use super::events::NavDirection;

/// Lifecycle of one message/response exchange.
#[derive(Serialize, Deserialize, Clone, Copy, Debug, PartialEq, Eq, Default)]
#[serde(rename_all = "snake_case", tag = "state")]
pub enum ExchangeState {
    /// Nothing submitted yet; the user is typing.
    #[default]
    Composing,

    /// Message stored, response placeholder shown.
    Sent { message_id: MessageId },

    /// Response shown in place of the placeholder.
    Resolved { message_id: MessageId },
}

impl ExchangeState {
    pub fn is_pending(&self) -> bool {
        matches!(self, Self::Sent { .. })
    }

    /// Get a human-readable description of the current state.
    pub fn description(&self) -> &str {
        match self {
            Self::Composing => "Ready for input",
            Self::Sent { .. } => "Waiting for response",
            Self::Resolved { .. } => "Response received",
        }
    }
}

/// A thread plus the branch the user is looking at.
#[derive(Serialize, Deserialize, Clone, Debug, PartialEq, Eq)]
pub struct ThreadView {
    pub thread: Thread,
    pub current_branch_index: usize,
}

impl ThreadView {
    pub fn new(thread: Thread) -> Self {
        Self {
            thread,
            current_branch_index: 0,
        }
    }

    pub fn original_message_id(&self) -> MessageId {
        self.thread.original_message_id()
    }

    /// The branch at `current_branch_index`.
    pub fn current_branch(&self) -> &BranchView {
        let branches = self.thread.branches();
        let index = self.current_branch_index.min(branches.len() - 1);
        branches[index]
    }

    /// Move one branch left or right, clamped to the ends.
    pub fn navigate(&mut self, direction: NavDirection) {
        let last = self.thread.branch_count() - 1;
        self.current_branch_index = match direction {
            NavDirection::Previous => self.current_branch_index.saturating_sub(1),
            NavDirection::Next => (self.current_branch_index + 1).min(last),
        };
    }

    /// Focus a message of this thread; unknown ids leave the index alone.
    pub fn focus(&mut self, message_id: MessageId) {
        if let Some(index) = self.thread.position_of(message_id) {
            self.current_branch_index = index;
        }
    }
}

/// Everything the presentation layer renders for one conversation.
#[derive(Serialize, Deserialize, Clone, Debug, PartialEq, Eq, Default)]
pub struct ConversationView {
    /// Selected conversation; `None` until the first message creates one.
    pub conversation_id: Option<ConversationId>,
    pub threads: Vec<ThreadView>,
    /// Conversation-scoped counter bumped by every edit.
    pub thread_level: u32,
    /// Composer buffer.
    pub input: String,
    /// Inline validation message.
    pub validation_error: Option<String>,
    /// Message of the most recent exchange.
    pub last_sent: Option<MessageId>,
}

impl ConversationView {
    pub fn is_empty(&self) -> bool {
        self.threads.is_empty()
    }

    pub fn thread(&self, original_message_id: MessageId) -> Option<&ThreadView> {
        self.threads
            .iter()
            .find(|view| view.original_message_id() == original_message_id)
    }

    /// The thread holding `message_id`, at any depth.
    pub fn thread_containing(&self, message_id: MessageId) -> Option<&ThreadView> {
        self.threads
            .iter()
            .find(|view| view.thread.contains(message_id))
    }

    pub(crate) fn thread_containing_mut(
        &mut self,
        message_id: MessageId,
    ) -> Option<&mut ThreadView> {
        self.threads
            .iter_mut()
            .find(|view| view.thread.contains(message_id))
    }

    /// Exchange state of a shown message.
    pub fn exchange(&self, message_id: MessageId) -> Option<ExchangeState> {
        let branch = self
            .thread_containing(message_id)?
            .thread
            .find(message_id)?;
        Some(if branch.is_pending() {
            ExchangeState::Sent { message_id }
        } else {
            ExchangeState::Resolved { message_id }
        })
    }

    /// Exchange state of the most recent submission.
    pub fn latest_exchange(&self) -> ExchangeState {
        self.last_sent
            .and_then(|message_id| self.exchange(message_id))
            .unwrap_or_default()
    }

    /// Whether any shown message still waits for its response.
    pub fn is_loading(&self) -> bool {
        self.threads.iter().any(|view| view.thread.has_pending())
    }

    /// Branches across all threads, i.e. the edits made so far. Seeds `thread_level`.
    pub(crate) fn edit_count(&self) -> u32 {
        self.threads
            .iter()
            .map(|view| (view.thread.branch_count() - 1) as u32)
            .sum()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn thread_with_branches(count: usize) -> Thread {
        let node = |id: MessageId, parent: Option<MessageId>| BranchView {
            message_id: id,
            parent_id: parent,
            content: format!("m{id}"),
            thread_level: if parent.is_some() { 1 } else { 0 },
            response: None,
            children: Vec::new(),
        };
        let mut thread = Thread::new(node(1, None));
        for id in 2..=count as MessageId {
            thread.attach(1, node(id, Some(1)));
        }
        thread
    }

    #[test]
    fn test_default_exchange_is_composing() {
        let exchange = ConversationView::default().latest_exchange();
        assert_eq!(exchange, ExchangeState::Composing);
        assert_eq!(exchange.description(), "Ready for input");
        assert_eq!(
            ExchangeState::Sent { message_id: 1 }.description(),
            "Waiting for response"
        );
    }

    #[test]
    fn test_navigation_is_clamped() {
        let mut view = ThreadView::new(thread_with_branches(3));
        view.navigate(NavDirection::Previous);
        assert_eq!(view.current_branch_index, 0);

        view.navigate(NavDirection::Next);
        view.navigate(NavDirection::Next);
        view.navigate(NavDirection::Next);
        assert_eq!(view.current_branch_index, 2);
        assert_eq!(view.current_branch().message_id, 3);
    }

    #[test]
    fn test_single_branch_never_moves() {
        let mut view = ThreadView::new(thread_with_branches(1));
        view.navigate(NavDirection::Next);
        assert_eq!(view.current_branch_index, 0);
    }

    #[test]
    fn test_pending_message_is_sent_state() {
        let view = ConversationView {
            threads: vec![ThreadView::new(thread_with_branches(1))],
            last_sent: Some(1),
            ..Default::default()
        };
        assert_eq!(view.latest_exchange(), ExchangeState::Sent { message_id: 1 });
        assert!(view.latest_exchange().is_pending());
        assert!(view.is_loading());
        assert_eq!(view.exchange(42), None);
    }
}
