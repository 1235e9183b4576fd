use crate::config::LoggingConfig;
use chrono::{DateTime, Utc};
use serde::Serialize;
use std::time::Instant;

#[derive(Debug, Serialize)]
pub struct DispatchStartLog {
    pub timestamp: DateTime<Utc>,
    pub model: String,
    pub structured_output: bool,
    pub prompt_chars: usize,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub prompt: Option<String>,
}

#[derive(Debug, Serialize)]
pub struct AttemptFailureLog {
    pub timestamp: DateTime<Utc>,
    pub model: String,
    pub attempt: usize,
    pub max_attempts: usize,
    pub outcome: &'static str,
    pub message: String,
    pub elapsed_ms: u64,
}

#[derive(Debug, Serialize)]
pub struct DispatchResultLog {
    pub timestamp: DateTime<Utc>,
    pub model: String,
    pub attempts: usize,
    pub duration_ms: u64,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub response_chars: Option<usize>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub response: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub error_type: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub error: Option<String>,
}

/// Per-dispatch structured logger. One instance lives for one dispatch call.
pub struct DispatchLogger<'a> {
    config: &'a LoggingConfig,
    start_time: Instant,
}

impl<'a> DispatchLogger<'a> {
    pub fn new(config: &'a LoggingConfig) -> Self {
        Self {
            config,
            start_time: Instant::now(),
        }
    }

    fn elapsed_ms(&self) -> u64 {
        self.start_time.elapsed().as_millis() as u64
    }

    pub fn log_start(&self, model: &str, structured_output: bool, prompt: &str) {
        if !self.config.enabled {
            return;
        }

        let log = self.start_record(model, structured_output, prompt);
        tracing::info!(log = ?log, "Dispatch started");
    }

    fn start_record(&self, model: &str, structured_output: bool, prompt: &str) -> DispatchStartLog {
        DispatchStartLog {
            timestamp: Utc::now(),
            model: model.to_string(),
            structured_output,
            prompt_chars: prompt.chars().count(),
            prompt: self.config.include_prompt.then(|| prompt.to_string()),
        }
    }

    pub fn log_attempt_failure(
        &self,
        model: &str,
        attempt: usize,
        max_attempts: usize,
        outcome: &'static str,
        message: &str,
    ) {
        if !self.config.enabled {
            return;
        }

        let log = AttemptFailureLog {
            timestamp: Utc::now(),
            model: model.to_string(),
            attempt,
            max_attempts,
            outcome,
            message: message.to_string(),
            elapsed_ms: self.elapsed_ms(),
        };

        tracing::warn!(log = ?log, "Model call attempt failed");
    }

    pub fn log_fallback(&self, from: &str, to: &str, attempt: usize) {
        if !self.config.enabled {
            return;
        }

        tracing::warn!(
            from_model = from,
            to_model = to,
            attempt = attempt,
            "Primary model keeps failing, falling back"
        );
    }

    pub fn log_retry_delay(&self, attempt: usize, delay_ms: u128) {
        if !self.config.enabled {
            return;
        }

        tracing::info!(
            attempt = attempt,
            delay_ms = delay_ms,
            "Server error, retrying after delay"
        );
    }

    pub fn log_success(&self, model: &str, attempts: usize, text: &str) {
        if !self.config.enabled {
            return;
        }

        let log = self.success_record(model, attempts, text);
        tracing::info!(log = ?log, "Dispatch completed");
    }

    fn success_record(&self, model: &str, attempts: usize, text: &str) -> DispatchResultLog {
        DispatchResultLog {
            timestamp: Utc::now(),
            model: model.to_string(),
            attempts,
            duration_ms: self.elapsed_ms(),
            response_chars: Some(text.chars().count()),
            response: self.config.include_response.then(|| text.to_string()),
            error_type: None,
            error: None,
        }
    }

    pub fn log_failure(&self, model: &str, attempts: usize, error_type: &str, error: &str) {
        if !self.config.enabled {
            return;
        }

        let log = DispatchResultLog {
            timestamp: Utc::now(),
            model: model.to_string(),
            attempts,
            duration_ms: self.elapsed_ms(),
            response_chars: None,
            response: None,
            error_type: Some(error_type.to_string()),
            error: Some(error.to_string()),
        };

        tracing::error!(log = ?log, "Dispatch failed");
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn config(include: bool) -> LoggingConfig {
        LoggingConfig {
            enabled: true,
            include_prompt: include,
            include_response: include,
            level: "info".to_string(),
        }
    }

    #[test]
    fn test_logger_respects_disabled_config() {
        let config = LoggingConfig {
            enabled: false,
            ..LoggingConfig::default()
        };

        let logger = DispatchLogger::new(&config);

        // Should not panic even when logging is disabled
        logger.log_start("gemini-2.5-pro", false, "hello");
        logger.log_attempt_failure("gemini-2.5-pro", 1, 5, "server_error", "503");
        logger.log_failure("gemini-2.5-pro", 5, "max_retries_exceeded", "503");
    }

    #[test]
    fn test_start_record_omits_prompt_by_default() {
        let config = config(false);
        let logger = DispatchLogger::new(&config);

        let value = serde_json::to_value(logger.start_record("gemini-2.5-pro", true, "secret prompt")).unwrap();
        assert_eq!(value["prompt_chars"], 13);
        assert_eq!(value["structured_output"], true);
        assert!(value.get("prompt").is_none());
    }

    #[test]
    fn test_start_record_includes_prompt_when_enabled() {
        let config = config(true);
        let logger = DispatchLogger::new(&config);

        let value = serde_json::to_value(logger.start_record("gemini-2.5-pro", false, "hi")).unwrap();
        assert_eq!(value["prompt"], "hi");
        assert_eq!(value["prompt_chars"], 2);
    }

    #[test]
    fn test_success_record_omits_response_by_default() {
        let config = config(false);
        let logger = DispatchLogger::new(&config);

        let value = serde_json::to_value(logger.success_record("gemini-2.5-flash", 2, "hello")).unwrap();
        assert_eq!(value["response_chars"], 5);
        assert_eq!(value["attempts"], 2);
        assert!(value.get("response").is_none());
        assert!(value.get("error").is_none());
    }

    #[test]
    fn test_success_record_includes_response_when_enabled() {
        let config = config(true);
        let logger = DispatchLogger::new(&config);

        let value = serde_json::to_value(logger.success_record("gemini-2.5-flash", 1, "hello")).unwrap();
        assert_eq!(value["response"], "hello");
    }

    #[test]
    fn test_logger_measures_elapsed_time() {
        let config = config(false);
        let logger = DispatchLogger::new(&config);
        std::thread::sleep(std::time::Duration::from_millis(5));
        assert!(logger.elapsed_ms() >= 5);
    }
}
