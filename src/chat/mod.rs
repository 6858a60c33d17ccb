//! Streaming chat: session management and SSE decoding

pub mod session;
pub mod sse;

pub use session::{ChatSession, TranscriptUpdate};
pub use sse::{classify_line, SseFrame, SseLineDecoder};
