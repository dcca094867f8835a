mod render;
mod repl;
mod store;

use chat_core::{Config, ConversationId, MessageId};
use chat_state::{ChatSession, ResponseOutcome};
use clap::{Parser, Subcommand};
use colored::Colorize;
use tracing_subscriber::{fmt, layer::SubscriberExt, util::SubscriberInitExt, EnvFilter};

use crate::render::{render_conversations, render_view};

#[derive(Parser)]
#[command(name = "branchchat")]
#[command(about = "Chat client with branching message threads")]
#[command(version)]
struct Cli {
    /// Enable debug logging
    #[arg(long, short, default_value = "false")]
    debug: bool,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// List conversations, newest first
    Conversations,
    /// Print a conversation with its threads
    Show {
        conversation: ConversationId,
    },
    /// Send a single message
    Send {
        /// Conversation to append to; a new one is created when omitted
        #[arg(long, short)]
        conversation: Option<ConversationId>,
        /// Message content
        text: String,
    },
    /// Branch an existing message with new content
    Edit {
        conversation: ConversationId,
        message: MessageId,
        text: String,
    },
    /// Delete every conversation, message and response
    Clear {
        #[arg(long)]
        yes: bool,
    },
    /// Start interactive chat
    Chat {
        #[arg(long, short)]
        conversation: Option<ConversationId>,
    },
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    dotenvy::dotenv().ok();

    let cli = Cli::parse();
    init_tracing(cli.debug);

    let config = Config::load()?;
    let store = store::open_store(&config).await?;
    let session = ChatSession::from_config(store, &config);

    match cli.command {
        Commands::Conversations => {
            println!("{}", render_conversations(&session.conversations().await?));
        }
        Commands::Show { conversation } => {
            session.select_conversation(conversation).await?;
            println!("{}", render_view(&session.snapshot().await));
        }
        Commands::Send { conversation, text } => {
            if let Some(id) = conversation {
                session.select_conversation(id).await?;
            }
            let outcome = session.send(&text).await?.wait().await;
            report(&session, outcome).await;
        }
        Commands::Edit {
            conversation,
            message,
            text,
        } => {
            session.select_conversation(conversation).await?;
            let outcome = session.edit(message, &text).await?.wait().await;
            report(&session, outcome).await;
        }
        Commands::Clear { yes } => {
            if !yes {
                println!("{}", "Refusing to clear without --yes".yellow());
                return Ok(());
            }
            session.clear_all().await?;
            println!("{}", "All conversations cleared".green());
        }
        Commands::Chat { conversation } => repl::run(&session, conversation).await?,
    }

    session.close();
    Ok(())
}

fn init_tracing(debug: bool) {
    let default_level = if debug { "debug" } else { "warn" };
    tracing_subscriber::registry()
        .with(EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(default_level)))
        .with(
            fmt::layer()
                .with_writer(std::io::stderr)
                .with_target(true)
                .with_line_number(true)
                .with_file(false),
        )
        .init();
}

async fn report(session: &ChatSession, outcome: ResponseOutcome) {
    if let ResponseOutcome::Cancelled = outcome {
        println!("{}", "Response cancelled".yellow());
    }
    println!("{}", render_view(&session.snapshot().await));
}
