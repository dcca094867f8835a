//! Plain-terminal rendering of conversations and threads.

use chat_core::Conversation;
use chat_state::{ConversationView, ThreadView};
use colored::Colorize;

pub fn render_conversations(conversations: &[Conversation]) -> String {
    if conversations.is_empty() {
        return format!("{}", "No conversations yet".dimmed());
    }
    conversations
        .iter()
        .map(|c| {
            format!(
                "{} {}  {}",
                format!("#{}", c.id).cyan(),
                c.title,
                c.created_at.format("%Y-%m-%d %H:%M").to_string().dimmed()
            )
        })
        .collect::<Vec<_>>()
        .join("\n")
}

pub fn render_view(view: &ConversationView) -> String {
    let mut out = Vec::new();
    if let Some(id) = view.conversation_id {
        out.push(format!("{}", format!("Conversation #{id}").cyan().bold()));
    }
    if view.is_empty() {
        out.push(format!("{}", "No messages yet".dimmed()));
    }
    for (position, thread) in view.threads.iter().enumerate() {
        out.push(render_thread(position + 1, thread));
    }
    if let Some(error) = &view.validation_error {
        out.push(format!("{}", error.red()));
    }
    out.join("\n\n")
}

/// One thread, showing only its current branch.
pub fn render_thread(position: usize, thread: &ThreadView) -> String {
    let branch = thread.current_branch();
    let count = thread.thread.branch_count();

    let mut header = format!("[{position}] {}", "You:".cyan().bold());
    if count > 1 {
        header.push_str(&format!(
            " {}",
            format!("< {} / {} >", thread.current_branch_index + 1, count).dimmed()
        ));
    }

    let reply = match &branch.response {
        Some(response) => response.content.clone(),
        None => format!("{}", "...".dimmed()),
    };

    format!(
        "{header}\n{}\n{}\n{reply}",
        branch.content,
        "Assistant:".green().bold()
    )
}

#[cfg(test)]
mod tests {
    use super::*;
    use chat_core::{BranchView, ResponseView, Thread};

    fn node(id: i64, parent: Option<i64>, content: &str, reply: Option<&str>) -> BranchView {
        BranchView {
            message_id: id,
            parent_id: parent,
            content: content.to_string(),
            thread_level: parent.map(|_| 1).unwrap_or(0),
            response: reply.map(|r| ResponseView {
                id: Some(100 + id),
                content: r.to_string(),
            }),
            children: Vec::new(),
        }
    }

    #[test]
    fn test_thread_shows_current_branch_and_counter() {
        colored::control::set_override(false);
        let mut thread = Thread::new(node(1, None, "July?", Some("Tell me more.")));
        thread.attach(1, node(2, Some(1), "December?", None));
        let mut view = ThreadView::new(thread);
        view.current_branch_index = 1;

        let text = render_thread(1, &view);
        assert_eq!(text, "[1] You: < 2 / 2 >\nDecember?\nAssistant:\n...");
    }

    #[test]
    fn test_single_branch_has_no_counter() {
        colored::control::set_override(false);
        let view = ThreadView::new(Thread::new(node(1, None, "July?", Some("Tell me more."))));
        assert_eq!(
            render_thread(3, &view),
            "[3] You:\nJuly?\nAssistant:\nTell me more."
        );
    }

    #[test]
    fn test_empty_conversation_list() {
        colored::control::set_override(false);
        assert_eq!(render_conversations(&[]), "No conversations yet");
    }
}
