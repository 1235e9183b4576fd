use super::retry::is_server_error;
use crate::backends::ModelError;
use crate::transform::finalize_text;
use crate::types::gemini::GenerateContentResponse;
use serde_json::Value;

/// Classification of a single generation call.
#[derive(Debug, Clone, PartialEq)]
pub enum AttemptOutcome {
    Success(String),
    ServerError(String),
    /// The call succeeded but produced no text. Retried like a server error.
    EmptyText,
    ClientError(String),
    Blocked(Option<Value>),
}

impl AttemptOutcome {
    pub fn classify(
        result: Result<GenerateContentResponse, ModelError>,
        wants_structured_output: bool,
    ) -> Self {
        let response = match result {
            Ok(response) => response,
            Err(e) if is_server_error(&e.message) => return Self::ServerError(e.message),
            Err(e) => return Self::ClientError(e.message),
        };

        if response.is_blocked() {
            return Self::Blocked(response.prompt_feedback);
        }

        let text = finalize_text(&response.text(), wants_structured_output);
        if text.is_empty() {
            Self::EmptyText
        } else {
            Self::Success(text)
        }
    }

    pub fn is_retryable(&self) -> bool {
        matches!(self, Self::ServerError(_) | Self::EmptyText)
    }

    pub fn label(&self) -> &'static str {
        match self {
            Self::Success(_) => "success",
            Self::ServerError(_) => "server_error",
            Self::EmptyText => "empty_text",
            Self::ClientError(_) => "client_error",
            Self::Blocked(_) => "blocked",
        }
    }

    pub fn message(&self) -> String {
        match self {
            Self::Success(_) => String::new(),
            Self::ServerError(m) | Self::ClientError(m) => m.clone(),
            Self::EmptyText => "model returned empty text".to_string(),
            Self::Blocked(feedback) => match feedback {
                Some(f) => format!("response blocked: {}", f),
                None => "response blocked".to_string(),
            },
        }
    }
}
