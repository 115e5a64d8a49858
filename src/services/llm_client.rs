use async_trait::async_trait;
use reqwest::Client;
use serde::{Deserialize, Serialize};

use super::config_service::EffectiveConfig;
use crate::error::{AppError, AppResult};

/// OpenAI-compatible chat completion request
#[derive(Debug, Serialize)]
pub struct ChatCompletionRequest {
    pub model: String,
    pub messages: Vec<ChatMessage>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub temperature: Option<f32>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ChatMessage {
    pub role: String,
    pub content: String,
}

/// OpenAI-compatible chat completion response
#[derive(Debug, Deserialize)]
struct ChatCompletionResponse {
    choices: Vec<Choice>,
    #[serde(default)]
    usage: Option<Usage>,
}

#[derive(Debug, Deserialize)]
struct Choice {
    message: ResponseMessage,
}

#[derive(Debug, Deserialize)]
struct ResponseMessage {
    #[serde(default)]
    content: Option<String>,
}

#[derive(Debug, Deserialize)]
struct Usage {
    prompt_tokens: u32,
    completion_tokens: u32,
}

/// Anything that can answer a chat completion. The app talks to `LlmClient`;
/// tests script their own.
#[async_trait]
pub trait ChatModel: Send + Sync {
    async fn chat_completion(&self, messages: Vec<ChatMessage>) -> AppResult<String>;
}

/// LLM Client for OpenAI-compatible APIs
///
/// No client-side timeout: a stalled request stalls the session that made it.
pub struct LlmClient {
    client: Client,
    base_url: String,
    api_key: String,
    model: String,
    temperature: Option<f32>,
}

impl LlmClient {
    pub fn new(base_url: &str, api_key: &str, model: &str) -> AppResult<Self> {
        let client = Client::builder().build()?;

        Ok(Self {
            client,
            base_url: base_url.to_string(),
            api_key: api_key.to_string(),
            model: model.to_string(),
            temperature: None,
        })
    }

    pub fn from_config(config: &EffectiveConfig) -> AppResult<Self> {
        let mut client = Self::new(&config.base_url, &config.api_key, &config.model)?;
        client.temperature = config.temperature;
        Ok(client)
    }

    fn completions_url(&self) -> String {
        // Append /chat/completions unless the configured URL already points there
        if self.base_url.contains("/chat/completions") {
            self.base_url.clone()
        } else {
            format!("{}/chat/completions", self.base_url.trim_end_matches('/'))
        }
    }

    pub fn system_message(content: &str) -> ChatMessage {
        ChatMessage {
            role: "system".to_string(),
            content: content.to_string(),
        }
    }

    pub fn user_message(content: &str) -> ChatMessage {
        ChatMessage {
            role: "user".to_string(),
            content: content.to_string(),
        }
    }
}

#[async_trait]
impl ChatModel for LlmClient {
    async fn chat_completion(&self, messages: Vec<ChatMessage>) -> AppResult<String> {
        let request = ChatCompletionRequest {
            model: self.model.clone(),
            messages,
            temperature: self.temperature,
        };

        tracing::debug!(
            "Chat completion: model={}, messages={}",
            request.model,
            request.messages.len()
        );

        let response = self
            .client
            .post(self.completions_url())
            .header("Authorization", format!("Bearer {}", self.api_key))
            .header("Content-Type", "application/json")
            .json(&request)
            .send()
            .await?;

        let status = response.status();
        if !status.is_success() {
            let error_text = response.text().await.unwrap_or_default();
            return Err(AppError::llm(status.as_u16(), error_text));
        }

        let completion: ChatCompletionResponse = response.json().await?;
        extract_content(completion, status.as_u16())
    }
}

fn extract_content(completion: ChatCompletionResponse, status: u16) -> AppResult<String> {
    if let Some(usage) = &completion.usage {
        tracing::debug!(
            "Token usage: prompt={}, completion={}",
            usage.prompt_tokens,
            usage.completion_tokens
        );
    }

    completion
        .choices
        .into_iter()
        .next()
        .and_then(|c| c.message.content)
        .ok_or_else(|| AppError::llm(status, "No response content"))
}
