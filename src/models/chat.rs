use serde::{Deserialize, Serialize};
use chrono::{DateTime, Utc};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Sender {
    User,
    Assistant,
}

impl Sender {
    /// Role tag used on the wire to the model provider
    pub fn as_str(&self) -> &'static str {
        match self {
            Sender::User => "user",
            Sender::Assistant => "assistant",
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ChatMessage {
    pub role: Sender,
    pub content: String,
    pub timestamp: DateTime<Utc>,
    /// Set on a user turn whose reply never arrived
    #[serde(default)]
    pub failed: bool,
}

impl ChatMessage {
    pub fn user(content: &str) -> Self {
        Self {
            role: Sender::User,
            content: content.to_string(),
            timestamp: Utc::now(),
            failed: false,
        }
    }

    pub fn assistant(content: &str) -> Self {
        Self {
            role: Sender::Assistant,
            content: content.to_string(),
            timestamp: Utc::now(),
            failed: false,
        }
    }
}

/// What the chat panel gets back after a successful turn
#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ChatTurnResult {
    pub reply: String,
    pub history: Vec<ChatMessage>,
}
