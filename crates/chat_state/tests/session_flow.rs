//! End-to-end send/edit/clear flows through `ChatSession` on the in-memory store.

use std::sync::Arc;
use std::time::Duration;

use chat_core::{CannedResponder, ValidationError, CANNED_RESPONSES};
use chat_state::{ChatSession, ExchangeState, NavDirection, ResponseOutcome, SessionError};
use chat_store::{ChatStore, InMemoryChatStore, StoreOperation};

const DELAY: Duration = Duration::from_millis(1000);

fn session() -> (Arc<InMemoryChatStore>, ChatSession) {
    let store = Arc::new(InMemoryChatStore::new());
    let session = ChatSession::new(store.clone(), Arc::new(CannedResponder), DELAY);
    (store, session)
}

#[tokio::test(start_paused = true)]
async fn test_trip_planning_send_scenario() {
    let (store, session) = session();

    let pending = session.send("Where should I go in July?").await.unwrap();

    let view = session.snapshot().await;
    assert_eq!(view.threads.len(), 1);
    assert_eq!(view.threads[0].thread.branch_count(), 1);
    assert!(view.threads[0].current_branch().response.is_none());
    assert_eq!(
        view.latest_exchange(),
        ExchangeState::Sent {
            message_id: pending.message_id()
        }
    );

    let conversations = store.fetch_conversations().await.unwrap();
    assert_eq!(conversations.len(), 1);
    assert_eq!(conversations[0].title, "Where should I go in July?");
    assert_eq!(view.conversation_id, Some(conversations[0].id));

    let message_id = pending.message_id();
    let outcome = pending.wait().await;
    let ResponseOutcome::Delivered {
        content,
        response_id,
    } = outcome
    else {
        panic!("response was not delivered");
    };
    assert!(CANNED_RESPONSES.contains(&content.as_str()));

    let view = session.snapshot().await;
    let shown = view.threads[0].current_branch().response.clone().unwrap();
    assert_eq!(shown.content, content);
    assert_eq!(shown.id, response_id);
    assert!(!view.is_loading());

    let stored = store.fetch_response(message_id).await.unwrap().unwrap();
    assert_eq!(stored.content, content);
    assert_eq!(Some(stored.id), response_id);
}

#[tokio::test(start_paused = true)]
async fn test_edit_scenario_adds_second_branch() {
    let (store, session) = session();
    let first = session.send("Where should I go in July?").await.unwrap();
    let original_id = first.message_id();
    first.wait().await;

    let edit = session
        .edit(original_id, "Where should I go in December?")
        .await
        .unwrap();
    let branch_id = edit.message_id();

    let view = session.snapshot().await;
    let thread = &view.threads[0];
    assert_eq!(thread.thread.branch_count(), 2);
    assert_eq!(thread.thread.branch(0).unwrap().content, "Where should I go in July?");
    assert!(thread.thread.branch(0).unwrap().response.is_some());
    let branch = thread.thread.branch(1).unwrap();
    assert_eq!(branch.thread_level, 1);
    assert_eq!(branch.parent_id, Some(original_id));
    assert_eq!(thread.current_branch().message_id, branch_id);
    assert_eq!(view.thread_level, 1);

    edit.wait().await;

    // The original row is untouched and the branch round-trips through assembly.
    let conversation_id = view.conversation_id.unwrap();
    let originals = store.fetch_messages(conversation_id).await.unwrap();
    assert_eq!(originals.len(), 1);
    assert_eq!(originals[0].content, "Where should I go in July?");

    session.select_conversation(conversation_id).await.unwrap();
    let reloaded = session.snapshot().await;
    let branches = reloaded.threads[0].thread.branches();
    assert_eq!(branches.len(), 2);
    assert_eq!(branches[1].thread_level, 1);
    assert_eq!(branches[1].parent_id, Some(original_id));
    assert!(branches[1].response.is_some());
}

#[tokio::test(start_paused = true)]
async fn test_editing_a_branch_forks_from_its_original() {
    let (store, session) = session();
    let first = session.send("one").await.unwrap();
    let original_id = first.message_id();
    let branch = session.edit(original_id, "two").await.unwrap();
    let again = session.edit(branch.message_id(), "three").await.unwrap();

    let children = store.fetch_children(original_id).await.unwrap();
    assert_eq!(children.len(), 2);
    assert!(children.iter().all(|m| m.parent_id == Some(original_id)));
    assert_eq!(children[1].id, again.message_id());
    assert_eq!(children[1].thread_level, 2);
}

#[tokio::test(start_paused = true)]
async fn test_second_message_joins_selected_conversation() {
    let (store, session) = session();
    session.send("first").await.unwrap().wait().await;
    session.send("second").await.unwrap().wait().await;

    assert_eq!(store.fetch_conversations().await.unwrap().len(), 1);
    let view = session.snapshot().await;
    assert_eq!(view.threads.len(), 2);
    assert_eq!(view.threads[1].current_branch().content, "second");
}

#[tokio::test(start_paused = true)]
async fn test_empty_input_is_rejected_locally() {
    let (store, session) = session();

    let err = session.send("").await.unwrap_err();
    assert_eq!(err, SessionError::Validation(ValidationError::EmptyMessage));

    let view = session.snapshot().await;
    assert_eq!(view.validation_error.as_deref(), Some("Please enter a message."));
    assert_eq!(store.row_counts().await, (0, 0, 0));
}

#[tokio::test(start_paused = true)]
async fn test_submit_sends_composer_buffer() {
    let (_store, session) = session();
    session.set_input("from the composer").await;

    let pending = session.submit().await.unwrap();
    let view = session.snapshot().await;
    assert!(view.input.is_empty());
    assert_eq!(view.threads[0].current_branch().content, "from the composer");
    pending.wait().await;
}

#[tokio::test(start_paused = true)]
async fn test_closing_cancels_pending_response() {
    let (store, session) = session();
    let pending = session.send("hello").await.unwrap();
    let message_id = pending.message_id();

    session.close();
    assert_eq!(pending.wait().await, ResponseOutcome::Cancelled);

    let view = session.snapshot().await;
    assert!(view.threads[0].current_branch().response.is_none());
    assert_eq!(store.fetch_response(message_id).await.unwrap(), None);
    assert_eq!(session.send("more").await.unwrap_err(), SessionError::Closed);
}

#[tokio::test(start_paused = true)]
async fn test_dropping_session_cancels_pending_response() {
    let (store, session) = session();
    let pending = session.send("hello").await.unwrap();
    let message_id = pending.message_id();

    drop(session);
    assert_eq!(pending.wait().await, ResponseOutcome::Cancelled);
    assert_eq!(store.fetch_response(message_id).await.unwrap(), None);
}

#[tokio::test(start_paused = true)]
async fn test_cancelling_one_response_leaves_others() {
    let (_store, session) = session();
    let first = session.send("a").await.unwrap();
    let second = session.send("b").await.unwrap();

    first.cancel();
    assert_eq!(first.wait().await, ResponseOutcome::Cancelled);
    assert!(matches!(
        second.wait().await,
        ResponseOutcome::Delivered { .. }
    ));
}

#[tokio::test(start_paused = true)]
async fn test_response_save_failure_is_not_surfaced() {
    let (store, session) = session();
    store.inject_failure(StoreOperation::SaveResponse).await;

    let pending = session.send("hello").await.unwrap();
    let message_id = pending.message_id();
    let outcome = pending.wait().await;
    assert!(matches!(
        outcome,
        ResponseOutcome::Delivered {
            response_id: None,
            ..
        }
    ));

    // Still shown, never stored.
    let view = session.snapshot().await;
    let shown = view.threads[0].current_branch().response.clone().unwrap();
    assert_eq!(shown.id, None);
    assert_eq!(store.fetch_response(message_id).await.unwrap(), None);
}

#[tokio::test(start_paused = true)]
async fn test_send_failure_is_surfaced() {
    let (store, session) = session();
    store.inject_failure(StoreOperation::SendMessage).await;

    let err = session.send("hello").await.unwrap_err();
    assert!(matches!(
        err,
        SessionError::Store(ref e) if e.operation == StoreOperation::SendMessage
    ));

    // The conversation created before the failure stays selected.
    let view = session.snapshot().await;
    assert!(view.conversation_id.is_some());
    assert!(view.threads.is_empty());
}

#[tokio::test(start_paused = true)]
async fn test_failed_assembly_keeps_previous_view() {
    let (store, session) = session();
    session.send("hello").await.unwrap().wait().await;
    let before = session.snapshot().await;

    store.inject_failure(StoreOperation::FetchResponse).await;
    let err = session
        .select_conversation(before.conversation_id.unwrap())
        .await
        .unwrap_err();
    assert!(matches!(err, SessionError::Fetch(_)));
    assert_eq!(session.snapshot().await, before);
}

#[tokio::test(start_paused = true)]
async fn test_edit_requires_known_message() {
    let (_store, session) = session();
    assert_eq!(
        session.edit(1, "text").await.unwrap_err(),
        SessionError::NoConversation
    );

    session.send("hello").await.unwrap();
    assert_eq!(
        session.edit(999, "text").await.unwrap_err(),
        SessionError::UnknownMessage(999)
    );
}

#[tokio::test(start_paused = true)]
async fn test_navigation_through_session() {
    let (_store, session) = session();
    let first = session.send("one").await.unwrap();
    let original_id = first.message_id();
    session.edit(original_id, "two").await.unwrap();

    session.navigate(original_id, NavDirection::Previous).await;
    assert_eq!(session.snapshot().await.threads[0].current_branch().content, "one");

    session.navigate(original_id, NavDirection::Previous).await;
    assert_eq!(session.snapshot().await.threads[0].current_branch_index, 0);

    session.navigate(original_id, NavDirection::Next).await;
    session.navigate(original_id, NavDirection::Next).await;
    assert_eq!(session.snapshot().await.threads[0].current_branch().content, "two");
}

#[tokio::test(start_paused = true)]
async fn test_clear_all_scenario() {
    let (store, session) = session();
    session.send("Trip planning").await.unwrap().wait().await;
    session.new_conversation().await.unwrap();
    session.send("another").await.unwrap().wait().await;

    session.clear_all().await.unwrap();

    assert!(store.fetch_conversations().await.unwrap().is_empty());
    assert_eq!(store.row_counts().await, (0, 0, 0));
    let view = session.snapshot().await;
    assert_eq!(view.conversation_id, None);
    assert!(view.is_empty());
}

#[tokio::test(start_paused = true)]
async fn test_clear_all_failure_names_stage() {
    let (store, session) = session();
    session.send("hello").await.unwrap().wait().await;
    store.inject_failure(StoreOperation::ClearConversations).await;

    let err = session.clear_all().await.unwrap_err();
    assert!(matches!(
        err,
        SessionError::Store(ref e) if e.operation == StoreOperation::ClearConversations
    ));
    // Earlier stages are not rolled back.
    assert_eq!(store.row_counts().await, (1, 0, 0));
}

#[tokio::test(start_paused = true)]
async fn test_reload_keeps_edit_levels_increasing() {
    let (store, session) = session();
    let first = session.send("one").await.unwrap();
    let second = session.send("two").await.unwrap();
    session.edit(first.message_id(), "one!").await.unwrap();
    session.edit(second.message_id(), "two!").await.unwrap();

    let conversation_id = session.snapshot().await.conversation_id.unwrap();
    session.select_conversation(conversation_id).await.unwrap();
    assert_eq!(session.snapshot().await.thread_level, 2);

    let third = session.edit(first.message_id(), "one!!").await.unwrap();
    let children = store.fetch_children(first.message_id()).await.unwrap();
    let stored = children.iter().find(|m| m.id == third.message_id()).unwrap();
    assert_eq!(stored.thread_level, 3);
}
