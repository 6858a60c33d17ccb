//! regchat - Streaming regulatory-intelligence chat CLI library
//!
//! This library provides the core functionality for regchat: a chat
//! session manager over a streaming completion endpoint, with local
//! conversation history.
//!
//! # Architecture
//!
//! The library is organized into the following modules:
//!
//! - `chat`: Session management and the SSE stream decoder
//! - `api`: HTTP client for the streaming completion endpoint
//! - `storage`: SQLite-backed conversation history
//! - `models`: Conversations, messages, and attachments
//! - `config`: Configuration management and validation
//! - `error`: Error types and result aliases
//! - `cli`: Command-line interface definition
//!
//! # Example
//!
//! ```no_run
//! use regchat::{ChatSession, CompletionClient, Config, SqliteStorage};
//! use std::sync::Arc;
//!
//! #[tokio::main]
//! async fn main() -> anyhow::Result<()> {
//!     let config = Config::load("config.yaml")?;
//!     config.validate()?;
//!
//!     let storage = Arc::new(SqliteStorage::new()?);
//!     let client = CompletionClient::from_config(&config.api)?;
//!     let mut session = ChatSession::new(storage, client);
//!
//!     session.send_message("What changed in Annex 1?", Vec::new()).await?;
//!     Ok(())
//! }
//! ```

pub mod api;
pub mod chat;
pub mod cli;
pub mod commands;
pub mod config;
pub mod error;
pub mod models;
pub mod storage;

pub use api::CompletionClient;
pub use chat::{ChatSession, TranscriptUpdate};
pub use config::Config;
pub use error::{RegchatError, Result};
pub use models::{Attachment, AttachmentKind, Conversation, Message, Role};
pub use storage::{ConversationStore, SqliteStorage};
