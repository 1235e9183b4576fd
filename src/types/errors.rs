use axum::{
    http::StatusCode,
    response::{IntoResponse, Response},
    Json,
};
use serde_json::{json, Value};
use thiserror::Error;

#[derive(Debug, Error)]
pub enum GatewayError {
    #[error("Configuration error: {0}")]
    Config(String),

    #[error("Invalid request: {0}")]
    InvalidRequest(String),

    #[error("The model response was blocked by safety or policy filters")]
    Blocked {
        attempts: usize,
        feedback: Option<Value>,
    },

    #[error("Upstream error: {message}")]
    Upstream { attempts: usize, message: String },

    #[error("Empty response from the model after {attempts} attempts")]
    EmptyResponse { attempts: usize },

    #[error("Model call failed after {attempts} attempts: {last_error}")]
    ExhaustedRetries { attempts: usize, last_error: String },

    #[error("HTTP error: {0}")]
    Http(#[from] reqwest::Error),

    #[error("JSON parsing error: {0}")]
    Json(#[from] serde_json::Error),

    #[error("YAML parsing error: {0}")]
    Yaml(#[from] serde_yaml::Error),

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("Internal server error: {0}")]
    Internal(String),
}

impl GatewayError {
    pub fn status_code(&self) -> StatusCode {
        match self {
            GatewayError::Config(_) => StatusCode::INTERNAL_SERVER_ERROR,
            GatewayError::InvalidRequest(_) => StatusCode::BAD_REQUEST,
            GatewayError::Blocked { .. } => StatusCode::UNPROCESSABLE_ENTITY,
            GatewayError::Upstream { .. } => StatusCode::BAD_GATEWAY,
            GatewayError::EmptyResponse { .. } => StatusCode::BAD_GATEWAY,
            GatewayError::ExhaustedRetries { .. } => StatusCode::BAD_GATEWAY,
            GatewayError::Http(_) => StatusCode::BAD_GATEWAY,
            GatewayError::Json(_) => StatusCode::BAD_REQUEST,
            GatewayError::Yaml(_) => StatusCode::INTERNAL_SERVER_ERROR,
            GatewayError::Io(_) => StatusCode::INTERNAL_SERVER_ERROR,
            GatewayError::Internal(_) => StatusCode::INTERNAL_SERVER_ERROR,
        }
    }

    pub fn error_type(&self) -> &str {
        match self {
            GatewayError::Config(_) => "configuration_error",
            GatewayError::InvalidRequest(_) => "invalid_request",
            GatewayError::Blocked { .. } => "blocked",
            GatewayError::Upstream { .. } => "upstream_error",
            GatewayError::EmptyResponse { .. } => "empty_response",
            GatewayError::ExhaustedRetries { .. } => "max_retries_exceeded",
            GatewayError::Http(_) => "http_error",
            GatewayError::Json(_) => "json_error",
            GatewayError::Yaml(_) => "yaml_error",
            GatewayError::Io(_) => "io_error",
            GatewayError::Internal(_) => "internal_error",
        }
    }

    /// Number of model calls made before the dispatch gave up, for errors
    /// raised by the dispatcher.
    pub fn attempts(&self) -> Option<usize> {
        match self {
            GatewayError::Blocked { attempts, .. }
            | GatewayError::Upstream { attempts, .. }
            | GatewayError::EmptyResponse { attempts }
            | GatewayError::ExhaustedRetries { attempts, .. } => Some(*attempts),
            GatewayError::InvalidRequest(_) => Some(0),
            _ => None,
        }
    }

    fn details(&self) -> Option<&Value> {
        match self {
            GatewayError::Blocked { feedback, .. } => feedback.as_ref(),
            _ => None,
        }
    }

    pub fn to_body(&self) -> Value {
        let mut error = json!({
            "type": self.error_type(),
            "message": self.to_string(),
            "code": self.status_code().as_u16(),
        });

        if let Some(attempts) = self.attempts() {
            error["attempts"] = json!(attempts);
        }
        if let Some(details) = self.details() {
            error["details"] = details.clone();
        }

        json!({ "error": error })
    }
}

impl IntoResponse for GatewayError {
    fn into_response(self) -> Response {
        let status = self.status_code();

        tracing::error!(
            error_type = self.error_type(),
            status = status.as_u16(),
            attempts = ?self.attempts(),
            message = %self,
            "Request failed"
        );

        (status, Json(self.to_body())).into_response()
    }
}

pub type Result<T> = std::result::Result<T, GatewayError>;
