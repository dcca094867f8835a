//! View transitions - the reducer applying events to the conversation view.
//!
//! Responses are matched by message id, never by position, so a placeholder
//! can be resolved after other threads were appended or the view reloaded.

use chat_core::{BranchView, Message, ResponseView, Thread};

use super::events::ViewEvent;
use super::states::{ConversationView, ThreadView};

/// Apply one event and return the next view.
pub fn reduce(mut state: ConversationView, event: ViewEvent) -> ConversationView {
    match event {
        ViewEvent::ConversationLoaded {
            conversation_id,
            threads,
        } => {
            state = ConversationView {
                conversation_id: Some(conversation_id),
                threads: threads.into_iter().map(ThreadView::new).collect(),
                input: state.input,
                ..ConversationView::default()
            };
            state.thread_level = state.edit_count();
        }

        ViewEvent::ConversationStarted { conversation_id } => {
            if state.conversation_id != Some(conversation_id) {
                state.threads.clear();
                state.thread_level = 0;
                state.last_sent = None;
            }
            state.conversation_id = Some(conversation_id);
        }

        ViewEvent::HistoryCleared => {
            state = ConversationView::default();
        }

        ViewEvent::InputChanged { text } => {
            state.input = text;
        }

        ViewEvent::SubmitRejected { error } => {
            state.validation_error = Some(error.to_string());
        }

        ViewEvent::MessageSent { message } if message.is_branch => {
            attach_branch(&mut state, &message);
        }

        ViewEvent::MessageSent { message } => {
            let thread = Thread::new(BranchView::from_message(&message, None));
            state.threads.push(ThreadView::new(thread));
            state.input.clear();
            state.validation_error = None;
            state.last_sent = Some(message.id);
        }

        ViewEvent::BranchCreated { message } => {
            attach_branch(&mut state, &message);
        }

        ViewEvent::ResponseResolved {
            message_id,
            content,
        } => {
            let node = state
                .thread_containing_mut(message_id)
                .and_then(|view| view.thread.find_mut(message_id));
            match node {
                Some(branch) => {
                    branch.response = Some(ResponseView { id: None, content });
                }
                None => tracing::debug!("response for message {} is no longer shown", message_id),
            }
        }

        ViewEvent::ResponsePersisted {
            message_id,
            response_id,
        } => {
            if let Some(response) = state
                .thread_containing_mut(message_id)
                .and_then(|view| view.thread.find_mut(message_id))
                .and_then(|branch| branch.response.as_mut())
            {
                response.id = Some(response_id);
            }
        }

        ViewEvent::BranchNavigated {
            original_message_id,
            direction,
        } => {
            if let Some(view) = state
                .threads
                .iter_mut()
                .find(|view| view.original_message_id() == original_message_id)
            {
                view.navigate(direction);
            }
        }
    }
    state
}

fn attach_branch(state: &mut ConversationView, message: &Message) {
    let Some(parent_id) = message.parent_id else {
        tracing::warn!("branch {} has no parent, ignoring", message.id);
        return;
    };
    let Some(view) = state.thread_containing_mut(parent_id) else {
        tracing::debug!("parent {} of branch {} is not shown", parent_id, message.id);
        return;
    };

    view.thread
        .attach(parent_id, BranchView::from_message(message, None));
    view.focus(message.id);
    state.thread_level += 1;
    state.validation_error = None;
    state.last_sent = Some(message.id);
}
