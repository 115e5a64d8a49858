//! Application State
//!
//! Managed by Tauri and handed to every command.

use std::sync::Arc;

use crate::error::AppResult;
use crate::services::config_service::{self, EffectiveConfig};
use crate::services::llm_client::{ChatModel, LlmClient};
use crate::services::session_service::SessionRegistry;

pub struct AppState {
    pub config: EffectiveConfig,
    pub model: Arc<dyn ChatModel>,
    pub sessions: SessionRegistry,
}

impl AppState {
    pub fn new(config: EffectiveConfig, model: Arc<dyn ChatModel>) -> Self {
        Self {
            config,
            model,
            sessions: SessionRegistry::new(),
        }
    }

    /// Resolve configuration and credentials. Fails when no API key is available.
    pub fn from_environment() -> AppResult<Self> {
        let config = config_service::get_effective_config()?;
        let model = LlmClient::from_config(&config)?;
        tracing::info!(
            "Using model {} at {} ({:?})",
            config.model,
            config.base_url,
            config.context_policy
        );
        Ok(Self::new(config, Arc::new(model)))
    }
}
