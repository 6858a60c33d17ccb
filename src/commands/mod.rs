/*!
Command handlers for the CLI

This module provides command handlers invoked by the CLI entrypoint.

It exposes two top-level command modules:

- `chat`    — Interactive streaming chat session
- `history` — Conversation history management

These handlers are intentionally small and use the library components:
the chat session, the completion client, and the SQLite storage.
*/

use crate::config::StorageConfig;
use crate::error::Result;
use crate::storage::SqliteStorage;

pub mod chat;
pub mod history;

/// Open the history database configured for this invocation
///
/// Uses the configured path when present, otherwise the default
/// user data directory (subject to the `REGCHAT_HISTORY_DB` override).
pub(crate) fn open_storage(config: &StorageConfig) -> Result<SqliteStorage> {
    match &config.db_path {
        Some(path) => SqliteStorage::new_with_path(path),
        None => SqliteStorage::new(),
    }
}
