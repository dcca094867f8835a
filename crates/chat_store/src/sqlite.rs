//! SQLite store

use std::path::{Path, PathBuf};

use async_trait::async_trait;
use chat_core::{
    conversation_title, Conversation, ConversationId, Message, MessageId, NewMessage, Response,
};
use chrono::{DateTime, SecondsFormat, SubsecRound, Utc};
use rusqlite::types::Type;
use rusqlite::{params, Connection, OptionalExtension, Row};

use crate::error::{StoreError, StoreOperation, StoreResult};
use crate::storage::ChatStore;

const SCHEMA: &str = r#"
CREATE TABLE IF NOT EXISTS conversations (
    id INTEGER PRIMARY KEY AUTOINCREMENT,
    title TEXT NOT NULL,
    created_at TEXT NOT NULL
);

CREATE TABLE IF NOT EXISTS messages (
    id INTEGER PRIMARY KEY AUTOINCREMENT,
    conversation_id INTEGER NOT NULL REFERENCES conversations(id),
    content TEXT NOT NULL,
    is_branch INTEGER NOT NULL DEFAULT 0,
    parent_id INTEGER REFERENCES messages(id),
    thread_level INTEGER NOT NULL DEFAULT 0,
    created_at TEXT NOT NULL
);

CREATE TABLE IF NOT EXISTS responses (
    id INTEGER PRIMARY KEY AUTOINCREMENT,
    message_id INTEGER NOT NULL REFERENCES messages(id),
    content TEXT NOT NULL,
    created_at TEXT NOT NULL
);

CREATE INDEX IF NOT EXISTS idx_messages_conversation ON messages(conversation_id, created_at);
CREATE INDEX IF NOT EXISTS idx_messages_parent ON messages(parent_id);
CREATE INDEX IF NOT EXISTS idx_responses_message ON responses(message_id);
"#;

const MESSAGE_COLUMNS: &str =
    "id, conversation_id, content, is_branch, parent_id, thread_level, created_at";

/// Store backed by a local SQLite file.
///
/// Each call opens its own connection on the blocking pool.
#[derive(Debug, Clone)]
pub struct SqliteChatStore {
    db_path: PathBuf,
}

impl SqliteChatStore {
    pub fn new(db_path: impl AsRef<Path>) -> Self {
        Self {
            db_path: db_path.as_ref().to_path_buf(),
        }
    }

    pub fn db_path(&self) -> &Path {
        &self.db_path
    }

    /// Create the tables if they do not exist yet.
    pub async fn init(&self) -> StoreResult<()> {
        self.with_connection(StoreOperation::Init, |connection| {
            connection.execute_batch(SCHEMA)
        })
        .await
    }

    async fn with_connection<T, F>(&self, operation: StoreOperation, func: F) -> StoreResult<T>
    where
        T: Send + 'static,
        F: FnOnce(&Connection) -> rusqlite::Result<T> + Send + 'static,
    {
        let db_path = self.db_path.clone();
        tokio::task::spawn_blocking(move || {
            let connection = open_connection(&db_path)
                .map_err(StoreError::during(operation))?;
            func(&connection).map_err(StoreError::during(operation))
        })
        .await
        .map_err(StoreError::during(operation))?
    }
}

#[async_trait]
impl ChatStore for SqliteChatStore {
    async fn create_conversation(&self, title: &str) -> StoreResult<Conversation> {
        let title = conversation_title(title);
        tracing::debug!("creating conversation {:?}", title);

        self.with_connection(StoreOperation::CreateConversation, move |connection| {
            let created_at = now();
            connection.execute(
                "INSERT INTO conversations (title, created_at) VALUES (?1, ?2)",
                params![title, format_timestamp(created_at)],
            )?;
            Ok(Conversation {
                id: connection.last_insert_rowid(),
                title,
                created_at,
            })
        })
        .await
    }

    async fn send_message(&self, message: NewMessage) -> StoreResult<Message> {
        let op = StoreOperation::SendMessage;
        if !message.is_consistent() {
            return Err(StoreError::new(op, "is_branch and parent_id disagree"));
        }
        tracing::debug!(
            "storing message in conversation {} (branch of {:?})",
            message.conversation_id,
            message.parent_id
        );

        self.with_connection(op, move |connection| {
            let created_at = now();
            connection.execute(
                r#"
                INSERT INTO messages (
                    conversation_id, content, is_branch, parent_id, thread_level, created_at
                ) VALUES (?1, ?2, ?3, ?4, ?5, ?6)
                "#,
                params![
                    message.conversation_id,
                    message.content,
                    message.is_branch,
                    message.parent_id,
                    message.thread_level,
                    format_timestamp(created_at),
                ],
            )?;
            Ok(Message {
                id: connection.last_insert_rowid(),
                conversation_id: message.conversation_id,
                content: message.content,
                is_branch: message.is_branch,
                parent_id: message.parent_id,
                thread_level: message.thread_level,
                created_at,
            })
        })
        .await
    }

    async fn save_response(&self, message_id: MessageId, content: &str) -> StoreResult<Response> {
        let content = content.to_string();
        self.with_connection(StoreOperation::SaveResponse, move |connection| {
            let created_at = now();
            connection.execute(
                "INSERT INTO responses (message_id, content, created_at) VALUES (?1, ?2, ?3)",
                params![message_id, content, format_timestamp(created_at)],
            )?;
            Ok(Response {
                id: connection.last_insert_rowid(),
                message_id,
                content,
                created_at,
            })
        })
        .await
    }

    async fn fetch_conversations(&self) -> StoreResult<Vec<Conversation>> {
        self.with_connection(StoreOperation::FetchConversations, |connection| {
            let mut statement = connection.prepare(
                "SELECT id, title, created_at FROM conversations ORDER BY created_at DESC, id DESC",
            )?;
            let rows = statement.query_map([], conversation_from_row)?;
            rows.collect()
        })
        .await
    }

    async fn fetch_messages(&self, conversation_id: ConversationId) -> StoreResult<Vec<Message>> {
        self.with_connection(StoreOperation::FetchMessages, move |connection| {
            let mut statement = connection.prepare(&format!(
                "SELECT {MESSAGE_COLUMNS} FROM messages \
                 WHERE conversation_id = ?1 AND is_branch = 0 \
                 ORDER BY created_at ASC, id ASC"
            ))?;
            let rows = statement.query_map(params![conversation_id], message_from_row)?;
            rows.collect()
        })
        .await
    }

    async fn fetch_children(&self, parent_id: MessageId) -> StoreResult<Vec<Message>> {
        self.with_connection(StoreOperation::FetchChildren, move |connection| {
            let mut statement = connection.prepare(&format!(
                "SELECT {MESSAGE_COLUMNS} FROM messages WHERE parent_id = ?1 ORDER BY id ASC"
            ))?;
            let rows = statement.query_map(params![parent_id], message_from_row)?;
            rows.collect()
        })
        .await
    }

    async fn fetch_response(&self, message_id: MessageId) -> StoreResult<Option<Response>> {
        self.with_connection(StoreOperation::FetchResponse, move |connection| {
            connection
                .query_row(
                    "SELECT id, message_id, content, created_at FROM responses \
                     WHERE message_id = ?1 ORDER BY id ASC LIMIT 1",
                    params![message_id],
                    response_from_row,
                )
                .optional()
        })
        .await
    }

    async fn clear_all(&self) -> StoreResult<()> {
        for (operation, table) in [
            (StoreOperation::ClearResponses, "responses"),
            (StoreOperation::ClearMessages, "messages"),
            (StoreOperation::ClearConversations, "conversations"),
        ] {
            let deleted = self
                .with_connection(operation, move |connection| {
                    connection.execute(&format!("DELETE FROM {table}"), [])
                })
                .await?;
            tracing::info!("cleared {} rows from {}", deleted, table);
        }
        Ok(())
    }
}

fn open_connection(path: &Path) -> rusqlite::Result<Connection> {
    if let Some(parent) = path.parent() {
        if !parent.as_os_str().is_empty() {
            std::fs::create_dir_all(parent).map_err(|e| {
                rusqlite::Error::InvalidPath(PathBuf::from(format!("{}: {e}", parent.display())))
            })?;
        }
    }
    let connection = Connection::open(path)?;
    connection.execute_batch(
        r#"
        PRAGMA journal_mode = WAL;
        PRAGMA foreign_keys = ON;
        PRAGMA synchronous = NORMAL;
        "#,
    )?;
    Ok(connection)
}

// Stored precision is microseconds; returned rows must match what a fetch reads back.
fn now() -> DateTime<Utc> {
    Utc::now().trunc_subsecs(6)
}

// Fixed-width timestamps keep lexical order equal to chronological order.
fn format_timestamp(timestamp: DateTime<Utc>) -> String {
    timestamp.to_rfc3339_opts(SecondsFormat::Micros, true)
}

fn parse_timestamp(row: &Row<'_>, column: usize) -> rusqlite::Result<DateTime<Utc>> {
    let raw: String = row.get(column)?;
    DateTime::parse_from_rfc3339(&raw)
        .map(|timestamp| timestamp.with_timezone(&Utc))
        .map_err(|e| rusqlite::Error::FromSqlConversionFailure(column, Type::Text, Box::new(e)))
}

fn conversation_from_row(row: &Row<'_>) -> rusqlite::Result<Conversation> {
    Ok(Conversation {
        id: row.get(0)?,
        title: row.get(1)?,
        created_at: parse_timestamp(row, 2)?,
    })
}

fn message_from_row(row: &Row<'_>) -> rusqlite::Result<Message> {
    Ok(Message {
        id: row.get(0)?,
        conversation_id: row.get(1)?,
        content: row.get(2)?,
        is_branch: row.get(3)?,
        parent_id: row.get(4)?,
        thread_level: row.get(5)?,
        created_at: parse_timestamp(row, 6)?,
    })
}

fn response_from_row(row: &Row<'_>) -> rusqlite::Result<Response> {
    Ok(Response {
        id: row.get(0)?,
        message_id: row.get(1)?,
        content: row.get(2)?,
        created_at: parse_timestamp(row, 3)?,
    })
}
