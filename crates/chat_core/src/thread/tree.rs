//! Thread tree - an original message and the branches forked from it.
//!
//! Threads are derived from stored rows and never persisted themselves.

use serde::{Deserialize, Serialize};

use crate::message::{Message, MessageId, Response, ResponseId};

/// Thread level of an original message.
pub const ROOT_THREAD_LEVEL: u32 = 0;

/// Response attached to a branch.
///
/// `id` is `None` while the response is shown but not yet confirmed by the store.
#[derive(Serialize, Deserialize, Clone, Debug, PartialEq, Eq)]
pub struct ResponseView {
    pub id: Option<ResponseId>,
    pub content: String,
}

impl From<&Response> for ResponseView {
    fn from(response: &Response) -> Self {
        Self {
            id: Some(response.id),
            content: response.content.clone(),
        }
    }
}

/// One node of a thread: a message, its response and the branches forked from it.
#[derive(Serialize, Deserialize, Clone, Debug, PartialEq, Eq)]
pub struct BranchView {
    pub message_id: MessageId,
    pub parent_id: Option<MessageId>,
    pub content: String,
    pub thread_level: u32,
    pub response: Option<ResponseView>,
    #[serde(default)]
    pub children: Vec<BranchView>,
}

impl BranchView {
    /// Build a node from a stored message, keeping its stored thread level.
    pub fn from_message(message: &Message, response: Option<&Response>) -> Self {
        Self {
            message_id: message.id,
            parent_id: message.parent_id,
            content: message.content.clone(),
            thread_level: message.thread_level,
            response: response.map(ResponseView::from),
            children: Vec::new(),
        }
    }

    /// Override the thread level.
    pub fn with_thread_level(mut self, thread_level: u32) -> Self {
        self.thread_level = thread_level;
        self
    }

    /// Whether the response for this node is still outstanding.
    pub fn is_pending(&self) -> bool {
        self.response.is_none()
    }

    fn collect<'a>(&'a self, out: &mut Vec<&'a BranchView>) {
        out.push(self);
        for child in &self.children {
            child.collect(out);
        }
    }

    fn find(&self, message_id: MessageId) -> Option<&BranchView> {
        if self.message_id == message_id {
            return Some(self);
        }
        self.children.iter().find_map(|child| child.find(message_id))
    }

    fn find_mut(&mut self, message_id: MessageId) -> Option<&mut BranchView> {
        if self.message_id == message_id {
            return Some(self);
        }
        self.children
            .iter_mut()
            .find_map(|child| child.find_mut(message_id))
    }
}

/// An original message plus every branch forked from it.
#[derive(Serialize, Deserialize, Clone, Debug, PartialEq, Eq)]
pub struct Thread {
    pub root: BranchView,
}

impl Thread {
    /// Start a thread from an original message node.
    pub fn new(root: BranchView) -> Self {
        Self {
            root: root.with_thread_level(ROOT_THREAD_LEVEL),
        }
    }

    /// Id of the original message.
    pub fn original_message_id(&self) -> MessageId {
        self.root.message_id
    }

    /// Pre-order flattening of the tree. Element 0 is always the original.
    pub fn branches(&self) -> Vec<&BranchView> {
        let mut out = Vec::new();
        self.root.collect(&mut out);
        out
    }

    /// Number of entries in [`Thread::branches`]; never zero.
    pub fn branch_count(&self) -> usize {
        self.branches().len()
    }

    /// Entry `index` of [`Thread::branches`].
    pub fn branch(&self, index: usize) -> Option<&BranchView> {
        self.branches().into_iter().nth(index)
    }

    /// Position of a message within [`Thread::branches`].
    pub fn position_of(&self, message_id: MessageId) -> Option<usize> {
        self.branches()
            .iter()
            .position(|branch| branch.message_id == message_id)
    }

    pub fn contains(&self, message_id: MessageId) -> bool {
        self.root.find(message_id).is_some()
    }

    pub fn find(&self, message_id: MessageId) -> Option<&BranchView> {
        self.root.find(message_id)
    }

    pub fn find_mut(&mut self, message_id: MessageId) -> Option<&mut BranchView> {
        self.root.find_mut(message_id)
    }

    /// Append `branch` under the node whose id equals `parent_id`.
    ///
    /// Returns `false` (and drops the branch) when no such node exists.
    pub fn attach(&mut self, parent_id: MessageId, branch: BranchView) -> bool {
        match self.find_mut(parent_id) {
            Some(parent) => {
                parent.children.push(branch);
                true
            }
            None => false,
        }
    }

    /// Whether any node still waits for its response.
    pub fn has_pending(&self) -> bool {
        self.branches().iter().any(|branch| branch.is_pending())
    }
}
