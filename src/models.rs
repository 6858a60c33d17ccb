//! Core data model for conversations, messages, and attachments
//!
//! A [`Conversation`] is a titled, timestamped container for an ordered
//! sequence of [`Message`] values. Messages carry a role, text content,
//! and an ordered list of [`Attachment`]s. Message bodies live in the
//! store; conversation values carry summary metadata only.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

/// Maximum number of characters of the first user message used for a
/// conversation title before the `...` suffix is applied.
pub const TITLE_MAX_CHARS: usize = 50;

/// Title used for a conversation created before its first message arrives.
pub const DEFAULT_CONVERSATION_TITLE: &str = "New Conversation";

/// Role of a message sender
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Role {
    /// Message authored by the human user
    User,
    /// Message produced by the completion endpoint
    Assistant,
}

impl std::fmt::Display for Role {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::User => write!(f, "user"),
            Self::Assistant => write!(f, "assistant"),
        }
    }
}

impl std::str::FromStr for Role {
    type Err = String;

    fn from_str(s: &str) -> std::result::Result<Self, Self::Err> {
        match s {
            "user" => Ok(Self::User),
            "assistant" => Ok(Self::Assistant),
            other => Err(format!("unknown role: {}", other)),
        }
    }
}

/// Kind of content an attachment carries
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum AttachmentKind {
    /// Image content (rendered inline by consumers that can)
    Image,
    /// Any other file content
    File,
}

/// A file or image carried by a message
///
/// Attachments are owned exclusively by the message that carries them and
/// are never shared. The `url` is a resolvable content reference: either a
/// base64 data URI holding the blob inline or a remotely hosted URL.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Attachment {
    /// Content kind
    #[serde(rename = "type")]
    pub kind: AttachmentKind,
    /// Display name
    pub name: String,
    /// Data URI or remote URL
    pub url: String,
}

impl Attachment {
    /// Creates an image attachment
    ///
    /// # Examples
    ///
    /// ```
    /// use regchat::models::{Attachment, AttachmentKind};
    ///
    /// let att = Attachment::image("scan.png", "data:image/png;base64,AAAA");
    /// assert_eq!(att.kind, AttachmentKind::Image);
    /// ```
    pub fn image(name: impl Into<String>, url: impl Into<String>) -> Self {
        Self {
            kind: AttachmentKind::Image,
            name: name.into(),
            url: url.into(),
        }
    }

    /// Creates a generic file attachment
    pub fn file(name: impl Into<String>, url: impl Into<String>) -> Self {
        Self {
            kind: AttachmentKind::File,
            name: name.into(),
            url: url.into(),
        }
    }
}

/// A single chat message
///
/// Belongs to exactly one conversation. Within a conversation, messages
/// are strictly ordered by creation time and alternate conceptually
/// between user and assistant turns (conventional, not enforced).
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Message {
    /// Store-assigned identifier, absent for messages not yet persisted
    #[serde(skip_serializing_if = "Option::is_none")]
    pub id: Option<i64>,
    /// Role of the sender
    pub role: Role,
    /// Textual content
    pub content: String,
    /// Ordered attachments, usually empty
    #[serde(default)]
    pub attachments: Vec<Attachment>,
    /// Creation timestamp, absent for messages not yet persisted
    #[serde(skip_serializing_if = "Option::is_none")]
    pub created_at: Option<DateTime<Utc>>,
}

impl Message {
    /// Creates a new user message
    ///
    /// # Examples
    ///
    /// ```
    /// use regchat::models::{Message, Role};
    ///
    /// let msg = Message::user("What is GMP?");
    /// assert_eq!(msg.role, Role::User);
    /// ```
    pub fn user(content: impl Into<String>) -> Self {
        Self {
            id: None,
            role: Role::User,
            content: content.into(),
            attachments: Vec::new(),
            created_at: None,
        }
    }

    /// Creates a new user message carrying attachments
    pub fn user_with_attachments(content: impl Into<String>, attachments: Vec<Attachment>) -> Self {
        Self {
            id: None,
            role: Role::User,
            content: content.into(),
            attachments,
            created_at: None,
        }
    }

    /// Creates a new assistant message
    ///
    /// # Examples
    ///
    /// ```
    /// use regchat::models::{Message, Role};
    ///
    /// let msg = Message::assistant("Good Manufacturing Practice.");
    /// assert_eq!(msg.role, Role::Assistant);
    /// ```
    pub fn assistant(content: impl Into<String>) -> Self {
        Self {
            id: None,
            role: Role::Assistant,
            content: content.into(),
            attachments: Vec::new(),
            created_at: None,
        }
    }
}

/// Conversation summary metadata
///
/// Message bodies are not carried here; load them through the store.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Conversation {
    /// Unique identifier (UUID v4)
    pub id: String,
    /// Human-readable title derived from the first user message
    pub title: String,
    /// Creation timestamp
    pub created_at: DateTime<Utc>,
    /// Timestamp of the most recent message append or title update
    pub updated_at: DateTime<Utc>,
}

/// Derives a conversation title from its first user message
///
/// Takes the first [`TITLE_MAX_CHARS`] characters and appends a literal
/// `"..."` only when the original content exceeds that length.
///
/// # Examples
///
/// ```
/// use regchat::models::derive_title;
///
/// assert_eq!(derive_title("What is GMP?"), "What is GMP?");
/// let long = "x".repeat(60);
/// assert_eq!(derive_title(&long), format!("{}...", "x".repeat(50)));
/// ```
pub fn derive_title(first_message: &str) -> String {
    let mut title: String = first_message.chars().take(TITLE_MAX_CHARS).collect();
    if first_message.chars().count() > TITLE_MAX_CHARS {
        title.push_str("...");
    }
    title
}
