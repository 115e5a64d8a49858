use std::fs;
use serde::{Deserialize, Serialize};
use super::file_service::get_app_data_dir;
use crate::error::{AppError, AppResult};

pub const DEFAULT_BASE_URL: &str = "https://api.openai.com/v1";
pub const DEFAULT_MODEL: &str = "gpt-4o-mini";

const ENV_API_KEY: &str = "OPENAI_API_KEY";
const ENV_BASE_URL: &str = "OPENAI_BASE_URL";
const ENV_MODEL: &str = "CASE_ROLEPLAY_MODEL";
const ENV_HISTORY_WINDOW: &str = "CASE_ROLEPLAY_HISTORY_WINDOW";

/// On-disk configuration. Every field is optional; see `EffectiveConfig`.
#[derive(Debug, Clone, Serialize, Deserialize, Default)]
pub struct Config {
    #[serde(default)]
    pub api_key: Option<String>,
    #[serde(default)]
    pub base_url: Option<String>,
    #[serde(default)]
    pub model: Option<String>,
    #[serde(default)]
    pub history_window: Option<usize>,
    #[serde(default)]
    pub temperature: Option<f32>,
}

/// How much of a role's stored history goes out with each roleplay request.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(tag = "kind", content = "messages", rename_all = "camelCase")]
pub enum ContextPolicy {
    Full,
    SlidingWindow(usize),
}

impl ContextPolicy {
    pub fn from_window(window: Option<usize>) -> Self {
        match window {
            Some(n) if n > 0 => ContextPolicy::SlidingWindow(n),
            _ => ContextPolicy::Full,
        }
    }

    /// The tail of `history` this policy sends.
    pub fn apply<'a, T>(&self, history: &'a [T]) -> &'a [T] {
        match *self {
            ContextPolicy::Full => history,
            ContextPolicy::SlidingWindow(n) => &history[history.len().saturating_sub(n)..],
        }
    }
}

/// Defaults, then config file, then environment.
#[derive(Debug, Clone)]
pub struct EffectiveConfig {
    pub api_key: String,
    pub base_url: String,
    pub model: String,
    pub context_policy: ContextPolicy,
    pub temperature: Option<f32>,
}

/// What the settings panel may see; the key itself never leaves the backend.
#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ConfigView {
    pub has_api_key: bool,
    pub base_url: String,
    pub model: String,
    pub context_policy: ContextPolicy,
}

impl From<&EffectiveConfig> for ConfigView {
    fn from(config: &EffectiveConfig) -> Self {
        Self {
            has_api_key: !config.api_key.is_empty(),
            base_url: config.base_url.clone(),
            model: config.model.clone(),
            context_policy: config.context_policy,
        }
    }
}

fn get_config_path() -> AppResult<std::path::PathBuf> {
    Ok(get_app_data_dir()?.join("config.json"))
}

pub fn load_config() -> AppResult<Config> {
    let config_path = get_config_path()?;

    if !config_path.exists() {
        return Ok(Config::default());
    }

    let content = fs::read_to_string(&config_path)?;
    Ok(serde_json::from_str(&content)?)
}

fn non_empty(value: Option<String>) -> Option<String> {
    value.map(|v| v.trim().to_string()).filter(|v| !v.is_empty())
}

/// Merge the file config with environment values.
///
/// `env` is injected so the precedence rules can be tested without touching
/// the process environment. Fails when no API key is available anywhere.
pub fn resolve(file: Config, env: impl Fn(&str) -> Option<String>) -> AppResult<EffectiveConfig> {
    let api_key = non_empty(env(ENV_API_KEY))
        .or_else(|| non_empty(file.api_key))
        .ok_or_else(|| {
            AppError::config(format!(
                "No API key found. Set {} or add \"api_key\" to the config file.",
                ENV_API_KEY
            ))
        })?;

    let base_url = non_empty(env(ENV_BASE_URL))
        .or_else(|| non_empty(file.base_url))
        .unwrap_or_else(|| DEFAULT_BASE_URL.to_string());

    let model = non_empty(env(ENV_MODEL))
        .or_else(|| non_empty(file.model))
        .unwrap_or_else(|| DEFAULT_MODEL.to_string());

    let history_window = match non_empty(env(ENV_HISTORY_WINDOW)) {
        Some(raw) => Some(raw.parse::<usize>().map_err(|_| {
            AppError::config(format!("{} must be a whole number, got '{}'", ENV_HISTORY_WINDOW, raw))
        })?),
        None => file.history_window,
    };

    Ok(EffectiveConfig {
        api_key,
        base_url,
        model,
        context_policy: ContextPolicy::from_window(history_window),
        temperature: file.temperature,
    })
}

/// Resolve the configuration once at startup.
pub fn get_effective_config() -> AppResult<EffectiveConfig> {
    let file = load_config()?;
    resolve(file, |key| std::env::var(key).ok())
}
