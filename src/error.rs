//! Error Handling
//!
//! One error type for every service. Tauri commands turn it into a `String`
//! at the boundary.

use thiserror::Error;

#[derive(Error, Debug)]
pub enum AppError {
    /// Missing or unusable configuration (including credentials)
    #[error("Configuration error: {0}")]
    Config(String),

    /// Bad user input; nothing was changed
    #[error("{0}")]
    Validation(String),

    #[error("Not found: {0}")]
    NotFound(String),

    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    #[error("Serialization error: {0}")]
    Serialization(#[from] serde_json::Error),

    /// Transport-level failure talking to the model provider
    #[error("Request failed: {0}")]
    Http(#[from] reqwest::Error),

    /// The provider answered, but not with a usable completion
    #[error("API error ({status}): {message}")]
    Llm { status: u16, message: String },

    #[error("Text extraction failed: {0}")]
    Extraction(String),

    #[error("Export failed: {0}")]
    Export(String),

    #[error("Internal error: {0}")]
    Internal(String),
}

pub type AppResult<T> = Result<T, AppError>;

impl AppError {
    pub fn config(msg: impl Into<String>) -> Self {
        Self::Config(msg.into())
    }

    pub fn validation(msg: impl Into<String>) -> Self {
        Self::Validation(msg.into())
    }

    pub fn not_found(msg: impl Into<String>) -> Self {
        Self::NotFound(msg.into())
    }

    pub fn llm(status: u16, msg: impl Into<String>) -> Self {
        Self::Llm {
            status,
            message: msg.into(),
        }
    }

    pub fn export(msg: impl Into<String>) -> Self {
        Self::Export(msg.into())
    }
}

impl From<AppError> for String {
    fn from(err: AppError) -> String {
        err.to_string()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn validation_message_is_shown_verbatim() {
        let err = AppError::validation("Please upload a file or paste text first!");
        assert_eq!(err.to_string(), "Please upload a file or paste text first!");
    }

    #[test]
    fn llm_error_includes_status() {
        let msg: String = AppError::llm(429, "rate limited").into();
        assert_eq!(msg, "API error (429): rate limited");
    }

    #[test]
    fn io_error_converts() {
        let io_err = std::io::Error::new(std::io::ErrorKind::NotFound, "missing");
        let err: AppError = io_err.into();
        assert!(matches!(err, AppError::Io(_)));
    }
}
