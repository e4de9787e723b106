//! Chat log port and the in-memory transcript.
//!
//! Every rule resolution reports its outcome as a single chat message
//! authored by the acting traveler. The `ChatLog` trait is the seam to
//! whatever actually displays those messages.

use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use thiserror::Error;
use tokio::sync::Mutex;

/// How a message should be presented.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum MessageKind {
    /// Narration attached to a roll or outcome.
    Flavor,
    /// A plain message body.
    Content,
}

/// A chat message attributed to a speaker.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ChatMessage {
    pub speaker: String,
    pub kind: MessageKind,
    pub text: String,
}

impl ChatMessage {
    pub fn flavor(speaker: impl Into<String>, text: impl Into<String>) -> Self {
        Self {
            speaker: speaker.into(),
            kind: MessageKind::Flavor,
            text: text.into(),
        }
    }

    pub fn content(speaker: impl Into<String>, text: impl Into<String>) -> Self {
        Self {
            speaker: speaker.into(),
            kind: MessageKind::Content,
            text: text.into(),
        }
    }
}

/// Errors from posting to the chat log.
#[derive(Debug, Error)]
pub enum ChatError {
    #[error("chat log unavailable: {0}")]
    Unavailable(String),
}

/// Destination for outcome messages.
#[async_trait]
pub trait ChatLog: Send + Sync {
    async fn post(&self, message: ChatMessage) -> Result<(), ChatError>;
}

/// An in-memory chat transcript.
pub struct Transcript {
    entries: Mutex<Vec<ChatMessage>>,
}

impl Transcript {
    pub fn new() -> Self {
        Self {
            entries: Mutex::new(Vec::new()),
        }
    }

    /// Copy of the transcript in posting order.
    pub async fn snapshot(&self) -> Vec<ChatMessage> {
        self.entries.lock().await.clone()
    }
}

impl Default for Transcript {
    fn default() -> Self {
        Self::new()
    }
}

#[async_trait]
impl ChatLog for Transcript {
    async fn post(&self, message: ChatMessage) -> Result<(), ChatError> {
        tracing::debug!(speaker = %message.speaker, "chat message posted");
        self.entries.lock().await.push(message);
        Ok(())
    }
}
