//! Server-sent-event decoding for completion streams
//!
//! The completion endpoint replies with a streamed body of line-oriented
//! SSE frames: `data: <json>` lines carrying incremental deltas, blank
//! lines and `:` comments as keepalive, and a literal `data: [DONE]`
//! sentinel terminating the stream.
//!
//! Decoding happens in two layers:
//!
//! - [`SseLineDecoder`] reassembles complete lines from arbitrary network
//!   chunk boundaries. It accumulates raw bytes and only yields
//!   `\n`-terminated lines, so a JSON payload (or a multi-byte UTF-8
//!   sequence) split across chunks is never handed to the parser half-way.
//!   The pending, newline-less tail is bounded by
//!   [`MAX_PENDING_LINE_BYTES`]; a stream that never terminates a line
//!   fails instead of growing without limit.
//! - [`classify_line`] turns one complete line into an [`SseFrame`].
//!
//! The two layers together are chunk-boundary agnostic: any partition of
//! the byte stream produces the same frame sequence.

use bytes::BytesMut;
use serde::Deserialize;

use crate::error::{RegchatError, Result};

/// Maximum size of a pending (not yet newline-terminated) line.
///
/// A malformed stream that stops emitting newlines fails decoding once
/// its pending tail exceeds this bound.
pub const MAX_PENDING_LINE_BYTES: usize = 256 * 1024;

/// Stream-end sentinel payload.
const DONE_SENTINEL: &str = "[DONE]";

/// A classified SSE frame from the completion stream
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum SseFrame {
    /// A non-empty incremental text fragment of the assistant's reply
    Delta(String),
    /// The `[DONE]` terminator; no further frames follow
    Done,
}

/// Reassembles complete lines from a chunked byte stream
///
/// Feed raw network chunks with [`push`](Self::push), then drain complete
/// lines with [`next_line`](Self::next_line). Trailing `\r` is stripped
/// from each yielded line.
///
/// # Examples
///
/// ```
/// use regchat::chat::sse::SseLineDecoder;
///
/// let mut decoder = SseLineDecoder::new();
/// decoder.push(b"data: hel").unwrap();
/// assert!(decoder.next_line().is_none());
/// decoder.push(b"lo\n").unwrap();
/// assert_eq!(decoder.next_line().as_deref(), Some("data: hello"));
/// ```
#[derive(Debug, Default)]
pub struct SseLineDecoder {
    buffer: BytesMut,
}

impl SseLineDecoder {
    /// Creates an empty decoder
    pub fn new() -> Self {
        Self {
            buffer: BytesMut::new(),
        }
    }

    /// Appends a raw network chunk to the internal buffer
    ///
    /// # Errors
    ///
    /// Returns [`RegchatError::Stream`] when the pending tail after the
    /// last newline exceeds [`MAX_PENDING_LINE_BYTES`].
    pub fn push(&mut self, chunk: &[u8]) -> Result<()> {
        self.buffer.extend_from_slice(chunk);

        let pending = match self.buffer.iter().rposition(|&b| b == b'\n') {
            Some(pos) => self.buffer.len() - pos - 1,
            None => self.buffer.len(),
        };
        if pending > MAX_PENDING_LINE_BYTES {
            return Err(RegchatError::Stream(format!(
                "pending line exceeds {} bytes without a newline",
                MAX_PENDING_LINE_BYTES
            ))
            .into());
        }

        Ok(())
    }

    /// Yields the next complete line, or `None` if no full line is buffered
    ///
    /// The terminating `\n` (and a trailing `\r`, if present) are stripped.
    /// Each complete line is decoded as UTF-8 lossily; invalid sequences
    /// inside one line cannot be a chunk-boundary artifact at this point.
    pub fn next_line(&mut self) -> Option<String> {
        let pos = self.buffer.iter().position(|&b| b == b'\n')?;
        let mut line = self.buffer.split_to(pos + 1);
        // Drop '\n' and an optional preceding '\r'.
        line.truncate(pos);
        if line.last() == Some(&b'\r') {
            line.truncate(line.len() - 1);
        }
        Some(String::from_utf8_lossy(&line).into_owned())
    }

    /// Number of buffered bytes not yet yielded as a line
    pub fn pending_len(&self) -> usize {
        self.buffer.len()
    }
}

/// Incremental completion payload: `{"choices":[{"delta":{"content":...}}]}`
#[derive(Debug, Deserialize)]
struct DeltaPayload {
    #[serde(default)]
    choices: Vec<DeltaChoice>,
}

#[derive(Debug, Default, Deserialize)]
struct DeltaChoice {
    #[serde(default)]
    delta: DeltaContent,
}

#[derive(Debug, Default, Deserialize)]
struct DeltaContent {
    #[serde(default)]
    content: Option<String>,
}

/// Classifies one complete SSE line
///
/// Returns `None` for frames carrying nothing actionable:
///
/// - blank lines and `:` comments (keepalive),
/// - lines without the `data:` prefix,
/// - delta payloads with an absent or empty `content`,
/// - malformed JSON payloads, which are logged and skipped. Line framing
///   guarantees the payload was complete, so a parse failure here is
///   genuinely malformed input rather than a chunk-boundary split.
///
/// # Examples
///
/// ```
/// use regchat::chat::sse::{classify_line, SseFrame};
///
/// let frame = classify_line(r#"data: {"choices":[{"delta":{"content":"Hi"}}]}"#);
/// assert_eq!(frame, Some(SseFrame::Delta("Hi".to_string())));
/// assert_eq!(classify_line("data: [DONE]"), Some(SseFrame::Done));
/// assert_eq!(classify_line(": keepalive"), None);
/// ```
pub fn classify_line(line: &str) -> Option<SseFrame> {
    if line.trim().is_empty() || line.starts_with(':') {
        return None;
    }

    let payload = line.strip_prefix("data:")?.trim();
    if payload == DONE_SENTINEL {
        return Some(SseFrame::Done);
    }

    let parsed: DeltaPayload = match serde_json::from_str(payload) {
        Ok(p) => p,
        Err(e) => {
            tracing::warn!("Skipping malformed SSE data payload: {}", e);
            return None;
        }
    };

    parsed
        .choices
        .into_iter()
        .next()
        .and_then(|choice| choice.delta.content)
        .filter(|content| !content.is_empty())
        .map(SseFrame::Delta)
}
