use serde::{Deserialize, Serialize};
use std::time::Duration;

pub const API_KEY_ENV: &str = "GEMINI_API_KEY";

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct Config {
    #[serde(default)]
    pub server: ServerConfig,
    #[serde(default)]
    pub logging: LoggingConfig,
    #[serde(default)]
    pub gemini: GeminiConfig,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ServerConfig {
    #[serde(default = "default_host")]
    pub host: String,
    #[serde(default = "default_port")]
    pub port: u16,
}

impl Default for ServerConfig {
    fn default() -> Self {
        Self {
            host: default_host(),
            port: default_port(),
        }
    }
}

fn default_host() -> String {
    "0.0.0.0".to_string()
}

fn default_port() -> u16 {
    3001
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct LoggingConfig {
    #[serde(default = "default_true")]
    pub enabled: bool,
    /// Log the full outbound prompt instead of its length.
    #[serde(default)]
    pub include_prompt: bool,
    /// Log the final completion text instead of its length.
    #[serde(default)]
    pub include_response: bool,
    #[serde(default = "default_log_level")]
    pub level: String,
}

impl Default for LoggingConfig {
    fn default() -> Self {
        Self {
            enabled: true,
            include_prompt: false,
            include_response: false,
            level: default_log_level(),
        }
    }
}

fn default_true() -> bool {
    true
}

fn default_log_level() -> String {
    "info".to_string()
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct GeminiConfig {
    #[serde(default, skip_serializing)]
    pub api_key: Option<String>,
    #[serde(default = "default_base_url")]
    pub base_url: String,
    #[serde(default = "default_timeout")]
    pub timeout_seconds: u64,
    #[serde(default = "default_true")]
    pub ssl_verify: bool,
    /// Model substituted for a "pro" tier model after repeated server errors.
    #[serde(default = "default_fallback_model")]
    pub fallback_model: String,
    #[serde(default)]
    pub retry: RetryConfig,
}

impl Default for GeminiConfig {
    fn default() -> Self {
        Self {
            api_key: None,
            base_url: default_base_url(),
            timeout_seconds: default_timeout(),
            ssl_verify: true,
            fallback_model: default_fallback_model(),
            retry: RetryConfig::default(),
        }
    }
}

fn default_base_url() -> String {
    "https://generativelanguage.googleapis.com".to_string()
}

fn default_timeout() -> u64 {
    120
}

fn default_fallback_model() -> String {
    "gemini-2.5-flash".to_string()
}

impl GeminiConfig {
    pub fn timeout_duration(&self) -> Duration {
        Duration::from_secs(self.timeout_seconds)
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RetryConfig {
    #[serde(default = "default_max_attempts")]
    pub max_attempts: usize,
    #[serde(default = "default_backoff_ms")]
    pub backoff_ms: u64,
    #[serde(default = "default_max_backoff_ms")]
    pub max_backoff_ms: u64,
    /// Fraction of the delay applied as random +/- jitter. Zero keeps the
    /// schedule exact.
    #[serde(default)]
    pub jitter: f64,
}

impl Default for RetryConfig {
    fn default() -> Self {
        Self {
            max_attempts: default_max_attempts(),
            backoff_ms: default_backoff_ms(),
            max_backoff_ms: default_max_backoff_ms(),
            jitter: 0.0,
        }
    }
}

fn default_max_attempts() -> usize {
    5
}

fn default_backoff_ms() -> u64 {
    1000
}

fn default_max_backoff_ms() -> u64 {
    8000
}

impl Config {
    /// Fill the API key from the environment. The environment wins over the
    /// config file.
    pub fn apply_env_overrides(&mut self) {
        if let Ok(key) = std::env::var(API_KEY_ENV) {
            if !key.trim().is_empty() {
                self.gemini.api_key = Some(key);
            }
        }
    }

    pub fn validate(&self) -> Result<(), String> {
        let gemini = &self.gemini;

        match gemini.api_key.as_deref() {
            Some(key) if !key.trim().is_empty() => {}
            _ => {
                return Err(format!(
                    "Gemini API key is not set (export {} or set gemini.api_key)",
                    API_KEY_ENV
                ))
            }
        }

        if gemini.base_url.is_empty() {
            return Err("gemini.base_url must not be empty".to_string());
        }

        if gemini.timeout_seconds == 0 {
            return Err("gemini.timeout_seconds must be > 0".to_string());
        }

        if gemini.fallback_model.trim().is_empty() {
            return Err("gemini.fallback_model must not be empty".to_string());
        }

        if gemini.retry.max_attempts == 0 {
            return Err("gemini.retry.max_attempts must be > 0".to_string());
        }

        if !(0.0..1.0).contains(&gemini.retry.jitter) {
            return Err(format!(
                "gemini.retry.jitter must be in [0, 1), got {}",
                gemini.retry.jitter
            ));
        }

        Ok(())
    }
}
