//! Conversation persistence
//!
//! [`ConversationStore`] is the row-level CRUD contract the chat session
//! depends on; [`SqliteStorage`] is the shipped implementation. Deleting a
//! conversation cascades to its messages; appending a message or renaming
//! a conversation touches the owning row's `updated_at`, which drives the
//! most-recently-updated ordering of the history list.

use std::path::PathBuf;

use anyhow::Context;
use chrono::{DateTime, Utc};
use directories::ProjectDirs;
use rusqlite::{params, Connection, OptionalExtension};

use crate::error::{RegchatError, Result};
use crate::models::{Attachment, Conversation, Message, Role};

/// Row-level CRUD contract for conversations and messages
///
/// Conversations exclusively own their messages: deleting a conversation
/// removes its messages, and messages have no independent lifecycle.
pub trait ConversationStore: Send + Sync {
    /// Inserts a new conversation with the given title and returns it
    fn create_conversation(&self, title: &str) -> Result<Conversation>;

    /// Lists conversation summaries, most recently updated first
    fn list_conversations(&self) -> Result<Vec<Conversation>>;

    /// Looks up a single conversation summary by id
    fn get_conversation(&self, conversation_id: &str) -> Result<Option<Conversation>>;

    /// Loads a conversation's messages ordered by creation time ascending
    ///
    /// Returns an empty list for an unknown conversation id.
    fn load_messages(&self, conversation_id: &str) -> Result<Vec<Message>>;

    /// Appends a message and touches the conversation's `updated_at`
    fn insert_message(&self, conversation_id: &str, message: &Message) -> Result<()>;

    /// Updates a conversation's title and touches its `updated_at`
    fn update_title(&self, conversation_id: &str, title: &str) -> Result<()>;

    /// Deletes a conversation and, by cascade, its messages
    ///
    /// Deleting an unknown id is not an error.
    fn delete_conversation(&self, conversation_id: &str) -> Result<()>;

    /// Deletes every conversation and message
    fn delete_all(&self) -> Result<()>;
}

/// SQLite-backed conversation store
pub struct SqliteStorage {
    db_path: PathBuf,
}

impl SqliteStorage {
    /// Creates a storage instance at the default location
    ///
    /// The database lives in the user's data directory, or wherever the
    /// `REGCHAT_HISTORY_DB` environment variable points. The override
    /// makes it easy to aim the binary at a test DB or an alternate file
    /// without changing the application data dir.
    pub fn new() -> Result<Self> {
        if let Ok(override_path) = std::env::var("REGCHAT_HISTORY_DB") {
            return Self::new_with_path(override_path);
        }

        let proj_dirs = ProjectDirs::from("dev", "regchat", "regchat")
            .ok_or_else(|| RegchatError::Storage("Could not determine data directory".into()))?;

        let data_dir = proj_dirs.data_dir();
        std::fs::create_dir_all(data_dir)
            .context("Failed to create data directory")
            .map_err(|e| RegchatError::Storage(e.to_string()))?;

        let db_path = data_dir.join("history.db");
        let storage = Self { db_path };
        storage.init()?;

        Ok(storage)
    }

    /// Creates a storage instance using the specified database path
    ///
    /// Primarily useful for tests where the default application data
    /// directory is not desirable (for example, a temporary directory).
    ///
    /// # Examples
    ///
    /// ```
    /// use regchat::storage::SqliteStorage;
    ///
    /// let storage = SqliteStorage::new_with_path("/tmp/regchat_test_history.db").unwrap();
    /// ```
    pub fn new_with_path<P: Into<PathBuf>>(db_path: P) -> Result<Self> {
        let db_path = db_path.into();

        // Ensure parent directory exists so opening the DB file succeeds.
        if let Some(parent) = db_path.parent() {
            std::fs::create_dir_all(parent)
                .context("Failed to create parent directory for database")
                .map_err(|e| RegchatError::Storage(e.to_string()))?;
        }

        let storage = Self { db_path };
        storage.init()?;
        Ok(storage)
    }

    /// The path of the backing database file
    pub fn db_path(&self) -> &std::path::Path {
        &self.db_path
    }

    /// Opens a connection with foreign keys enabled
    ///
    /// Cascade deletion from conversations to messages depends on the
    /// `foreign_keys` pragma, which SQLite requires per connection.
    fn open(&self) -> Result<Connection> {
        let conn = Connection::open(&self.db_path)
            .context("Failed to open database")
            .map_err(|e| RegchatError::Storage(e.to_string()))?;
        conn.pragma_update(None, "foreign_keys", true)
            .context("Failed to enable foreign keys")
            .map_err(|e| RegchatError::Storage(e.to_string()))?;
        Ok(conn)
    }

    /// Initializes the database schema
    fn init(&self) -> Result<()> {
        let conn = self.open()?;

        conn.execute_batch(
            "CREATE TABLE IF NOT EXISTS conversations (
                id TEXT PRIMARY KEY,
                title TEXT NOT NULL,
                created_at TEXT NOT NULL,
                updated_at TEXT NOT NULL
            );
            CREATE TABLE IF NOT EXISTS messages (
                id INTEGER PRIMARY KEY AUTOINCREMENT,
                conversation_id TEXT NOT NULL
                    REFERENCES conversations(id) ON DELETE CASCADE,
                role TEXT NOT NULL,
                content TEXT NOT NULL,
                attachments JSON NOT NULL,
                created_at TEXT NOT NULL
            );
            CREATE INDEX IF NOT EXISTS idx_messages_conversation
                ON messages(conversation_id, created_at);",
        )
        .context("Failed to create tables")
        .map_err(|e| RegchatError::Storage(e.to_string()))?;

        Ok(())
    }
}

/// Parses a stored RFC 3339 timestamp, falling back to now
fn parse_timestamp(raw: &str) -> DateTime<Utc> {
    DateTime::parse_from_rfc3339(raw)
        .map(|dt| dt.with_timezone(&Utc))
        .unwrap_or_else(|_| Utc::now())
}

impl ConversationStore for SqliteStorage {
    fn create_conversation(&self, title: &str) -> Result<Conversation> {
        let conn = self.open()?;
        let now = Utc::now();
        let id = uuid::Uuid::new_v4().to_string();

        conn.execute(
            "INSERT INTO conversations (id, title, created_at, updated_at)
            VALUES (?, ?, ?, ?)",
            params![id, title, now.to_rfc3339(), now.to_rfc3339()],
        )
        .context("Failed to insert conversation")
        .map_err(|e| RegchatError::Storage(e.to_string()))?;

        Ok(Conversation {
            id,
            title: title.to_string(),
            created_at: now,
            updated_at: now,
        })
    }

    fn list_conversations(&self) -> Result<Vec<Conversation>> {
        let conn = self.open()?;

        let mut stmt = conn
            .prepare(
                "SELECT id, title, created_at, updated_at
                FROM conversations
                ORDER BY updated_at DESC",
            )
            .context("Failed to prepare statement")
            .map_err(|e| RegchatError::Storage(e.to_string()))?;

        let rows = stmt
            .query_map([], |row| {
                let id: String = row.get(0)?;
                let title: String = row.get(1)?;
                let created_at: String = row.get(2)?;
                let updated_at: String = row.get(3)?;
                Ok(Conversation {
                    id,
                    title,
                    created_at: parse_timestamp(&created_at),
                    updated_at: parse_timestamp(&updated_at),
                })
            })
            .context("Failed to query conversations")
            .map_err(|e| RegchatError::Storage(e.to_string()))?;

        let mut conversations = Vec::new();
        for row in rows.flatten() {
            conversations.push(row);
        }

        Ok(conversations)
    }

    fn get_conversation(&self, conversation_id: &str) -> Result<Option<Conversation>> {
        let conn = self.open()?;

        conn.query_row(
            "SELECT id, title, created_at, updated_at
            FROM conversations
            WHERE id = ?",
            params![conversation_id],
            |row| {
                let id: String = row.get(0)?;
                let title: String = row.get(1)?;
                let created_at: String = row.get(2)?;
                let updated_at: String = row.get(3)?;
                Ok(Conversation {
                    id,
                    title,
                    created_at: parse_timestamp(&created_at),
                    updated_at: parse_timestamp(&updated_at),
                })
            },
        )
        .optional()
        .context("Failed to query conversation")
        .map_err(|e| RegchatError::Storage(e.to_string()).into())
    }

    fn load_messages(&self, conversation_id: &str) -> Result<Vec<Message>> {
        let conn = self.open()?;

        let mut stmt = conn
            .prepare(
                "SELECT id, role, content, attachments, created_at
                FROM messages
                WHERE conversation_id = ?
                ORDER BY created_at ASC, id ASC",
            )
            .context("Failed to prepare statement")
            .map_err(|e| RegchatError::Storage(e.to_string()))?;

        let rows = stmt
            .query_map(params![conversation_id], |row| {
                let id: i64 = row.get(0)?;
                let role: String = row.get(1)?;
                let content: String = row.get(2)?;
                let attachments_json: String = row.get(3)?;
                let created_at: String = row.get(4)?;
                Ok((id, role, content, attachments_json, created_at))
            })
            .context("Failed to query messages")
            .map_err(|e| RegchatError::Storage(e.to_string()))?;

        let mut messages = Vec::new();
        for row in rows.flatten() {
            let (id, role, content, attachments_json, created_at) = row;
            let role: Role = role
                .parse()
                .map_err(|e: String| RegchatError::Storage(e))?;
            let attachments: Vec<Attachment> = serde_json::from_str(&attachments_json)
                .context("Failed to deserialize attachments")
                .map_err(|e| RegchatError::Storage(e.to_string()))?;
            messages.push(Message {
                id: Some(id),
                role,
                content,
                attachments,
                created_at: Some(parse_timestamp(&created_at)),
            });
        }

        Ok(messages)
    }

    fn insert_message(&self, conversation_id: &str, message: &Message) -> Result<()> {
        let mut conn = self.open()?;

        let attachments_json = serde_json::to_string(&message.attachments)
            .context("Failed to serialize attachments")
            .map_err(|e| RegchatError::Storage(e.to_string()))?;

        let now = Utc::now();
        let created_at = message.created_at.unwrap_or(now);

        let tx = conn
            .transaction()
            .context("Failed to start transaction")
            .map_err(|e| RegchatError::Storage(e.to_string()))?;

        tx.execute(
            "INSERT INTO messages (conversation_id, role, content, attachments, created_at)
            VALUES (?, ?, ?, ?, ?)",
            params![
                conversation_id,
                message.role.to_string(),
                message.content,
                attachments_json,
                created_at.to_rfc3339()
            ],
        )
        .context("Failed to insert message")
        .map_err(|e| RegchatError::Storage(e.to_string()))?;

        tx.execute(
            "UPDATE conversations SET updated_at = ? WHERE id = ?",
            params![now.to_rfc3339(), conversation_id],
        )
        .context("Failed to touch conversation")
        .map_err(|e| RegchatError::Storage(e.to_string()))?;

        tx.commit()
            .context("Failed to commit transaction")
            .map_err(|e| RegchatError::Storage(e.to_string()))?;

        Ok(())
    }

    fn update_title(&self, conversation_id: &str, title: &str) -> Result<()> {
        let conn = self.open()?;

        conn.execute(
            "UPDATE conversations SET title = ?, updated_at = ? WHERE id = ?",
            params![title, Utc::now().to_rfc3339(), conversation_id],
        )
        .context("Failed to update conversation title")
        .map_err(|e| RegchatError::Storage(e.to_string()))?;

        Ok(())
    }

    fn delete_conversation(&self, conversation_id: &str) -> Result<()> {
        let conn = self.open()?;

        conn.execute(
            "DELETE FROM conversations WHERE id = ?",
            params![conversation_id],
        )
        .context("Failed to delete conversation")
        .map_err(|e| RegchatError::Storage(e.to_string()))?;

        Ok(())
    }

    fn delete_all(&self) -> Result<()> {
        let conn = self.open()?;

        conn.execute("DELETE FROM conversations", [])
            .context("Failed to clear history")
            .map_err(|e| RegchatError::Storage(e.to_string()))?;

        Ok(())
    }
}
