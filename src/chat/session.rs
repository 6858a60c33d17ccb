//! Streaming chat session management
//!
//! [`ChatSession`] mediates between user input, persisted conversation
//! history, and the remote streaming completion source, presenting a
//! consistently updated transcript to the caller.
//!
//! A send moves through four phases: dispatch (ensure a conversation
//! exists, append and persist the user turn, derive the title on a
//! conversation's first message), streaming (append an empty assistant
//! placeholder and fold arriving deltas into it in place), finalizing
//! (persist the assistant turn, refresh the summary list), and failure
//! (drop the placeholder, surface the error, clear the loading flag).
//!
//! The session runs on a single task; every wait is a cooperative await
//! on the transport. An explicit in-flight guard rejects a second send
//! while one is running. There is no cancellation and no automatic retry.
//! Failures are returned as structured errors; the presentation layer
//! decides how to notify.

use std::sync::Arc;

use anyhow::Context;
use futures::StreamExt;
use tokio::sync::mpsc;

use crate::api::CompletionClient;
use crate::chat::sse::{classify_line, SseFrame, SseLineDecoder};
use crate::error::{RegchatError, Result};
use crate::models::{derive_title, Attachment, Conversation, Message, DEFAULT_CONVERSATION_TITLE};
use crate::storage::ConversationStore;

/// Live transcript notifications emitted while a send is streaming
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum TranscriptUpdate {
    /// A non-empty delta fragment arrived; the transcript's last entry
    /// now holds the accumulated assistant content
    AssistantDelta(String),
    /// The stream completed and the assistant message was finalized
    StreamFinished,
}

/// Owns the active transcript, the conversation list, and the send loop
///
/// # Examples
///
/// ```no_run
/// use std::sync::Arc;
/// use regchat::api::CompletionClient;
/// use regchat::chat::ChatSession;
/// use regchat::config::Config;
/// use regchat::storage::SqliteStorage;
///
/// # async fn run() -> anyhow::Result<()> {
/// let config = Config::load("config/config.yaml")?;
/// let storage = Arc::new(SqliteStorage::new()?);
/// let client = CompletionClient::from_config(&config.api)?;
/// let mut session = ChatSession::new(storage, client);
///
/// session.send_message("What is GMP?", Vec::new()).await?;
/// println!("{}", session.transcript().last().unwrap().content);
/// # Ok(())
/// # }
/// ```
pub struct ChatSession {
    store: Arc<dyn ConversationStore>,
    client: CompletionClient,
    transcript: Vec<Message>,
    conversations: Vec<Conversation>,
    active_conversation_id: Option<String>,
    in_flight: bool,
    update_tx: Option<mpsc::UnboundedSender<TranscriptUpdate>>,
}

impl ChatSession {
    /// Creates a session over the given store and completion client
    pub fn new(store: Arc<dyn ConversationStore>, client: CompletionClient) -> Self {
        Self {
            store,
            client,
            transcript: Vec::new(),
            conversations: Vec::new(),
            active_conversation_id: None,
            in_flight: false,
            update_tx: None,
        }
    }

    /// The in-memory transcript of the active conversation
    ///
    /// Entries are appended in send order; during streaming the last
    /// entry is the assistant's message and is replaced in place on each
    /// delta, never re-appended.
    pub fn transcript(&self) -> &[Message] {
        &self.transcript
    }

    /// Known conversation summaries, most recently updated first
    ///
    /// Refreshed by [`fetch_conversations`](Self::fetch_conversations)
    /// and after operations that change the set or its ordering.
    pub fn conversations(&self) -> &[Conversation] {
        &self.conversations
    }

    /// Id of the active conversation, if any
    pub fn active_conversation_id(&self) -> Option<&str> {
        self.active_conversation_id.as_deref()
    }

    /// True while a send is in flight
    pub fn is_loading(&self) -> bool {
        self.in_flight
    }

    /// Subscribes to live transcript updates
    ///
    /// Replaces any previous subscription. Updates are best-effort; a
    /// dropped receiver never fails a send.
    pub fn subscribe_updates(&mut self) -> mpsc::UnboundedReceiver<TranscriptUpdate> {
        let (tx, rx) = mpsc::unbounded_channel();
        self.update_tx = Some(tx);
        rx
    }

    fn emit(&self, update: TranscriptUpdate) {
        if let Some(tx) = &self.update_tx {
            let _ = tx.send(update);
        }
    }

    /// Refreshes the conversation summary list
    pub fn fetch_conversations(&mut self) -> Result<()> {
        self.conversations = self.store.list_conversations()?;
        Ok(())
    }

    /// Best-effort refresh used inside the send path
    fn refresh_conversations_logged(&mut self) {
        if let Err(e) = self.fetch_conversations() {
            tracing::warn!("Failed to refresh conversation list: {}", e);
        }
    }

    /// Replaces the transcript with a stored conversation's history
    ///
    /// Fails when no conversation with the given id exists; a nonexistent
    /// id must never become active. On any failure the previous transcript
    /// and active id are left untouched.
    pub fn load_conversation(&mut self, conversation_id: &str) -> Result<()> {
        self.store
            .get_conversation(conversation_id)?
            .ok_or_else(|| {
                RegchatError::Storage(format!("No conversation with id {}", conversation_id))
            })?;

        let messages = self
            .store
            .load_messages(conversation_id)
            .with_context(|| format!("Failed to load conversation {}", conversation_id))?;

        self.transcript = messages;
        self.active_conversation_id = Some(conversation_id.to_string());
        Ok(())
    }

    /// Clears the active conversation and transcript without deleting
    /// anything
    pub fn start_new_chat(&mut self) {
        self.active_conversation_id = None;
        self.transcript.clear();
    }

    /// Inserts a new conversation and makes it active
    ///
    /// Uses the default title when none is given. Returns the new id; on
    /// a store error nothing becomes active.
    pub fn create_conversation(&mut self, title: Option<&str>) -> Result<String> {
        let conversation = self
            .store
            .create_conversation(title.unwrap_or(DEFAULT_CONVERSATION_TITLE))?;

        self.active_conversation_id = Some(conversation.id.clone());
        self.transcript.clear();
        self.refresh_conversations_logged();
        Ok(conversation.id)
    }

    /// Deletes a conversation; the store cascades to its messages
    ///
    /// If the deleted conversation was active, the transcript is cleared
    /// and no conversation remains active.
    pub fn delete_conversation(&mut self, conversation_id: &str) -> Result<()> {
        self.store.delete_conversation(conversation_id)?;

        if self.active_conversation_id.as_deref() == Some(conversation_id) {
            self.active_conversation_id = None;
            self.transcript.clear();
        }

        self.fetch_conversations()?;
        Ok(())
    }

    /// Removes every conversation and clears all local state
    pub fn clear_all_history(&mut self) -> Result<()> {
        self.store.delete_all()?;

        self.conversations.clear();
        self.active_conversation_id = None;
        self.transcript.clear();
        Ok(())
    }

    /// Sends a user turn and streams the assistant's reply into the
    /// transcript
    ///
    /// A no-op when `content` is blank and `attachments` is empty.
    /// Returns once streaming completes or fails.
    ///
    /// # Errors
    ///
    /// Returns [`RegchatError::SendInFlight`] when a send is already
    /// running, the store error when no conversation could be created,
    /// and the transport or decode error when the stream fails, in which
    /// case the assistant placeholder has been removed and the loading
    /// flag cleared. Persistence failures for individual turns are logged
    /// and do not fail the send.
    pub async fn send_message(&mut self, content: &str, attachments: Vec<Attachment>) -> Result<()> {
        if content.trim().is_empty() && attachments.is_empty() {
            return Ok(());
        }
        if self.in_flight {
            return Err(RegchatError::SendInFlight.into());
        }

        self.in_flight = true;
        let result = self.send_inner(content, attachments).await;
        self.in_flight = false;
        result
    }

    async fn send_inner(&mut self, content: &str, attachments: Vec<Attachment>) -> Result<()> {
        let conversation_id = match &self.active_conversation_id {
            Some(id) => id.clone(),
            None => self.create_conversation(None)?,
        };

        let is_first_message = self.transcript.is_empty();
        let user_message = Message::user_with_attachments(content, attachments);
        self.transcript.push(user_message.clone());

        if let Err(e) = self.store.insert_message(&conversation_id, &user_message) {
            tracing::warn!("Failed to persist user message: {}", e);
        }

        if is_first_message {
            let title = derive_title(content);
            if let Err(e) = self.store.update_title(&conversation_id, &title) {
                tracing::warn!("Failed to update conversation title: {}", e);
            }
            self.refresh_conversations_logged();
        }

        // Request first, placeholder after: a dispatch failure must not
        // disturb the transcript beyond the user turn already appended.
        let response = self.client.stream_completion(&self.transcript).await?;
        let mut byte_stream = response.bytes_stream();

        self.transcript.push(Message::assistant(""));

        let mut decoder = SseLineDecoder::new();
        let mut assistant_content = String::new();
        let mut failure: Option<anyhow::Error> = None;

        'read: while let Some(chunk_result) = byte_stream.next().await {
            let chunk = match chunk_result {
                Ok(chunk) => chunk,
                Err(e) => {
                    failure = Some(
                        anyhow::Error::new(e).context("Failed to read completion stream"),
                    );
                    break 'read;
                }
            };

            if let Err(e) = decoder.push(&chunk) {
                failure = Some(e);
                break 'read;
            }

            while let Some(line) = decoder.next_line() {
                match classify_line(&line) {
                    Some(SseFrame::Delta(delta)) => {
                        assistant_content.push_str(&delta);
                        if let Some(last) = self.transcript.last_mut() {
                            last.content = assistant_content.clone();
                        }
                        self.emit(TranscriptUpdate::AssistantDelta(delta));
                    }
                    Some(SseFrame::Done) => break 'read,
                    None => {}
                }
            }
        }

        if let Some(error) = failure {
            // Drop the placeholder (always the last entry) so no partial
            // assistant message survives the failure.
            self.transcript.pop();
            return Err(error);
        }

        let assistant_message = Message::assistant(assistant_content);
        if let Err(e) = self.store.insert_message(&conversation_id, &assistant_message) {
            tracing::warn!("Failed to persist assistant message: {}", e);
        }

        self.refresh_conversations_logged();
        self.emit(TranscriptUpdate::StreamFinished);
        Ok(())
    }

    #[cfg(test)]
    pub(crate) fn force_in_flight(&mut self, value: bool) {
        self.in_flight = value;
    }
}
