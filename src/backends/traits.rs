use crate::types::gemini::{GenerateContentResponse, SafetySetting};
use async_trait::async_trait;
use thiserror::Error;

/// Failure raised by a generation call. Only the message is inspected when
/// deciding whether to retry.
#[derive(Debug, Clone, Error, PartialEq, Eq)]
#[error("{message}")]
pub struct ModelError {
    pub message: String,
}

impl ModelError {
    pub fn new(message: impl Into<String>) -> Self {
        Self {
            message: message.into(),
        }
    }
}

#[async_trait]
pub trait GenerativeModel: Send + Sync {
    async fn generate(
        &self,
        model: &str,
        prompt: &str,
        safety_settings: &[SafetySetting],
    ) -> Result<GenerateContentResponse, ModelError>;
}
