//! Interactive chat loop.

use std::io::{self, Write};

use anyhow::anyhow;
use chat_core::ConversationId;
use chat_state::{ChatSession, NavDirection};
use colored::Colorize;

use crate::render::{render_conversations, render_thread, render_view};

const HELP: &str = "\
  <text>                 send a message
  /edit <thread> <text>  branch the message shown in a thread
  /next <thread>         show the next branch of a thread
  /prev <thread>         show the previous branch of a thread
  /new                   start a new conversation
  /list                  list conversations
  /open <id>             open a conversation
  /show                  redraw the conversation
  /clear                 delete every conversation
  /quit                  leave";

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ReplCommand {
    Send(String),
    Edit { thread: usize, text: String },
    Navigate { thread: usize, direction: NavDirection },
    New,
    List,
    Open(ConversationId),
    Show,
    Clear,
    Help,
    Quit,
}

/// Parse one input line. Anything not starting with `/` is a message.
pub fn parse_command(line: &str) -> Result<ReplCommand, String> {
    let Some(command) = line.strip_prefix('/') else {
        return Ok(ReplCommand::Send(line.to_string()));
    };

    let (name, rest) = command
        .split_once(char::is_whitespace)
        .map(|(name, rest)| (name, rest.trim_start()))
        .unwrap_or((command, ""));

    match name {
        "edit" => {
            let (thread, text) = rest
                .split_once(char::is_whitespace)
                .ok_or("usage: /edit <thread> <text>")?;
            Ok(ReplCommand::Edit {
                thread: parse_thread(thread)?,
                text: text.trim_start().to_string(),
            })
        }
        "next" | "prev" => Ok(ReplCommand::Navigate {
            thread: parse_thread(rest.trim())?,
            direction: if name == "next" {
                NavDirection::Next
            } else {
                NavDirection::Previous
            },
        }),
        "new" => Ok(ReplCommand::New),
        "list" => Ok(ReplCommand::List),
        "open" => rest
            .trim()
            .parse()
            .map(ReplCommand::Open)
            .map_err(|_| "usage: /open <conversation id>".to_string()),
        "show" => Ok(ReplCommand::Show),
        "clear" => Ok(ReplCommand::Clear),
        "help" => Ok(ReplCommand::Help),
        "quit" | "exit" => Ok(ReplCommand::Quit),
        other => Err(format!("unknown command /{other}, try /help")),
    }
}

fn parse_thread(raw: &str) -> Result<usize, String> {
    match raw.parse::<usize>() {
        Ok(n) if n > 0 => Ok(n),
        _ => Err(format!("invalid thread number {raw:?}")),
    }
}

pub async fn run(
    session: &ChatSession,
    conversation: Option<ConversationId>,
) -> anyhow::Result<()> {
    println!("{}", "Branchchat".cyan().bold());
    println!("{}", "Type /help for commands, /quit to leave".dimmed());

    if let Some(id) = conversation {
        session.select_conversation(id).await?;
        println!("{}", render_view(&session.snapshot().await));
    }
    println!();

    loop {
        print!("{} ", "You:".cyan().bold());
        io::stdout().flush()?;

        let mut input = String::new();
        if io::stdin().read_line(&mut input)? == 0 {
            break;
        }
        let line = input.trim_end_matches(['\r', '\n']);

        let command = match parse_command(line) {
            Ok(command) => command,
            Err(message) => {
                println!("{}", message.red());
                continue;
            }
        };

        match execute(session, command).await {
            Ok(true) => {}
            Ok(false) => break,
            Err(e) => println!("{}", format!("Error: {e}").red()),
        }
        println!();
    }

    println!("{}", "Goodbye!".cyan());
    Ok(())
}

/// Run one command; `Ok(false)` ends the loop.
async fn execute(session: &ChatSession, command: ReplCommand) -> anyhow::Result<bool> {
    match command {
        ReplCommand::Send(text) => {
            let pending = session.send(&text).await?;
            print_exchange(session).await;
            pending.wait().await;
            print_last_thread(session).await;
        }
        ReplCommand::Edit { thread, text } => {
            let message_id = {
                let view = session.snapshot().await;
                let shown = view
                    .threads
                    .get(thread - 1)
                    .ok_or_else(|| anyhow!("No thread {thread}"))?;
                shown.current_branch().message_id
            };
            let pending = session.edit(message_id, &text).await?;
            print_exchange(session).await;
            pending.wait().await;
            print_thread(session, thread).await;
        }
        ReplCommand::Navigate { thread, direction } => {
            let original = session
                .snapshot()
                .await
                .threads
                .get(thread - 1)
                .map(|view| view.original_message_id());
            if let Some(original) = original {
                session.navigate(original, direction).await;
            }
            print_thread(session, thread).await;
        }
        ReplCommand::New => {
            let conversation = session.new_conversation().await?;
            println!("{}", format!("Started conversation #{}", conversation.id).green());
        }
        ReplCommand::List => {
            println!("{}", render_conversations(&session.conversations().await?));
        }
        ReplCommand::Open(id) => {
            session.select_conversation(id).await?;
            println!("{}", render_view(&session.snapshot().await));
        }
        ReplCommand::Show => println!("{}", render_view(&session.snapshot().await)),
        ReplCommand::Clear => {
            session.clear_all().await?;
            println!("{}", "All conversations cleared".yellow());
        }
        ReplCommand::Help => println!("{HELP}"),
        ReplCommand::Quit => return Ok(false),
    }
    Ok(true)
}

async fn print_exchange(session: &ChatSession) {
    let exchange = session.snapshot().await.latest_exchange();
    println!("{}", exchange.description().dimmed());
}

async fn print_last_thread(session: &ChatSession) {
    let view = session.snapshot().await;
    if let Some(thread) = view.threads.last() {
        println!("{}", render_thread(view.threads.len(), thread));
    }
}

async fn print_thread(session: &ChatSession, position: usize) {
    let view = session.snapshot().await;
    match view.threads.get(position - 1) {
        Some(thread) => println!("{}", render_thread(position, thread)),
        None => println!("{}", format!("No thread {position}").red()),
    }
}
