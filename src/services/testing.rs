//! Scripted `ChatModel` for tests.

use std::collections::VecDeque;
use std::sync::Mutex;

use async_trait::async_trait;

use super::llm_client::{ChatMessage, ChatModel};
use crate::error::{AppError, AppResult};

/// Replies are handed out in order; every request is recorded.
/// Running out of replies behaves like a provider outage.
#[derive(Default)]
pub struct ScriptedModel {
    replies: Mutex<VecDeque<AppResult<String>>>,
    requests: Mutex<Vec<Vec<ChatMessage>>>,
}

impl ScriptedModel {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn reply(self, text: &str) -> Self {
        self.replies.lock().unwrap().push_back(Ok(text.to_string()));
        self
    }

    pub fn fail(self, status: u16) -> Self {
        self.replies
            .lock()
            .unwrap()
            .push_back(Err(AppError::llm(status, "scripted failure")));
        self
    }

    pub fn requests(&self) -> Vec<Vec<ChatMessage>> {
        self.requests.lock().unwrap().clone()
    }

    pub fn request_count(&self) -> usize {
        self.requests.lock().unwrap().len()
    }
}

#[async_trait]
impl ChatModel for ScriptedModel {
    async fn chat_completion(&self, messages: Vec<ChatMessage>) -> AppResult<String> {
        self.requests.lock().unwrap().push(messages);
        self.replies
            .lock()
            .unwrap()
            .pop_front()
            .unwrap_or_else(|| Err(AppError::llm(503, "no scripted reply left")))
    }
}
