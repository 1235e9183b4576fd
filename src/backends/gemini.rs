use super::traits::{GenerativeModel, ModelError};
use crate::config::GeminiConfig;
use crate::types::gemini::{GenerateContentRequest, GenerateContentResponse, SafetySetting};
use crate::types::{GatewayError, Result};
use async_trait::async_trait;
use reqwest::{Client, ClientBuilder};
use std::time::Duration;

const MAX_ERROR_TEXT_CHARS: usize = 1_024;
const API_KEY_HEADER: &str = "x-goog-api-key";

pub struct GeminiClient {
    client: Client,
    base_url: String,
    api_key: String,
}

impl GeminiClient {
    pub fn new(config: &GeminiConfig) -> Result<Self> {
        let api_key = config
            .api_key
            .clone()
            .filter(|k| !k.trim().is_empty())
            .ok_or_else(|| GatewayError::Config("Gemini API key is not set".to_string()))?;

        let mut builder = ClientBuilder::new()
            .timeout(config.timeout_duration())
            .connect_timeout(Duration::from_secs(10))
            .pool_max_idle_per_host(10)
            .pool_idle_timeout(Duration::from_secs(90));

        if !config.ssl_verify {
            tracing::warn!(
                base_url = %config.base_url,
                "SSL verification is disabled for the Gemini backend"
            );
            builder = builder.danger_accept_invalid_certs(true);
        }

        let client = builder.build()?;

        Ok(Self {
            client,
            base_url: config.base_url.trim_end_matches('/').to_string(),
            api_key,
        })
    }

    pub fn endpoint(&self, model: &str) -> String {
        format!("{}/v1beta/models/{}:generateContent", self.base_url, model)
    }
}

#[async_trait]
impl GenerativeModel for GeminiClient {
    async fn generate(
        &self,
        model: &str,
        prompt: &str,
        safety_settings: &[SafetySetting],
    ) -> std::result::Result<GenerateContentResponse, ModelError> {
        let body = GenerateContentRequest::from_prompt(prompt, safety_settings);

        let response = self
            .client
            .post(self.endpoint(model))
            .header(API_KEY_HEADER, &self.api_key)
            .json(&body)
            .send()
            .await
            .map_err(transport_error)?;

        let status = response.status();
        if !status.is_success() {
            let text = response.text().await.unwrap_or_default();
            return Err(ModelError::new(format!(
                "Gemini API error [{}]: {}",
                status,
                truncate(text.trim())
            )));
        }

        response
            .json::<GenerateContentResponse>()
            .await
            .map_err(|e| ModelError::new(format!("Failed to parse Gemini response: {}", e)))
    }
}

// Timeouts and refused connections are transient, so they are worded to take
// the server-error retry path.
fn transport_error(e: reqwest::Error) -> ModelError {
    if e.is_timeout() || e.is_connect() {
        ModelError::new(format!("server error: {}", e))
    } else {
        ModelError::new(format!("Gemini request failed: {}", e))
    }
}

fn truncate(text: &str) -> String {
    if text.is_empty() {
        return "<empty error response body>".to_string();
    }
    if text.chars().count() <= MAX_ERROR_TEXT_CHARS {
        return text.to_string();
    }
    let mut out: String = text.chars().take(MAX_ERROR_TEXT_CHARS).collect();
    out.push_str("...[truncated]");
    out
}
