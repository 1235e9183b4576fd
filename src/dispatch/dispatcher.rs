use super::outcome::AttemptOutcome;
use super::retry::calculate_backoff;
use crate::backends::GenerativeModel;
use crate::config::{GeminiConfig, LoggingConfig, RetryConfig};
use crate::logging::DispatchLogger;
use crate::transform::build_outbound_prompt;
use crate::types::gemini::SafetySetting;
use crate::types::{Completion, DispatchRequest, GatewayError, Result};
use std::sync::Arc;
use tokio::time::sleep;

/// Failed attempts a "pro" model gets before the fallback model takes over.
const PRO_TIER_ATTEMPTS: usize = 2;
const PRO_TIER_MARKER: &str = "pro";

/// Loop state carried from one attempt to the next.
#[derive(Debug, Clone, PartialEq, Eq)]
struct DispatchState {
    effective_model: String,
    attempt: usize,
    fell_back: bool,
}

impl DispatchState {
    fn new(model: &str) -> Self {
        Self {
            effective_model: model.to_string(),
            attempt: 1,
            fell_back: false,
        }
    }

    fn should_fall_back(&self) -> bool {
        !self.fell_back
            && self.attempt > PRO_TIER_ATTEMPTS
            && self.effective_model.contains(PRO_TIER_MARKER)
    }

    fn fall_back_to(self, fallback_model: &str) -> Self {
        Self {
            effective_model: fallback_model.to_string(),
            fell_back: true,
            ..self
        }
    }

    fn next_attempt(self) -> Self {
        Self {
            attempt: self.attempt + 1,
            ..self
        }
    }
}

/// Sends prompts to the model with bounded exponential backoff and a single
/// pro -> flash fallback. Holds no per-request state, so one instance serves
/// any number of concurrent dispatches.
pub struct Dispatcher {
    model: Arc<dyn GenerativeModel>,
    retry: RetryConfig,
    fallback_model: String,
    logging: LoggingConfig,
    safety_settings: Vec<SafetySetting>,
}

impl Dispatcher {
    pub fn new(
        model: Arc<dyn GenerativeModel>,
        retry: RetryConfig,
        fallback_model: impl Into<String>,
        logging: LoggingConfig,
    ) -> Self {
        Self {
            model,
            retry,
            fallback_model: fallback_model.into(),
            logging,
            safety_settings: SafetySetting::permissive(),
        }
    }

    pub fn from_config(
        model: Arc<dyn GenerativeModel>,
        gemini: &GeminiConfig,
        logging: &LoggingConfig,
    ) -> Self {
        Self::new(
            model,
            gemini.retry.clone(),
            gemini.fallback_model.clone(),
            logging.clone(),
        )
    }

    pub fn max_attempts(&self) -> usize {
        self.retry.max_attempts
    }

    pub async fn dispatch(&self, request: &DispatchRequest) -> Result<Completion> {
        validate(request)?;

        let logger = DispatchLogger::new(&self.logging);
        let max_attempts = self.retry.max_attempts;
        let prompt = build_outbound_prompt(&request.prompt, request.wants_structured_output);
        logger.log_start(&request.model_name, request.wants_structured_output, &prompt);

        let mut state = DispatchState::new(&request.model_name);

        let (state, outcome) = loop {
            let result = self
                .model
                .generate(&state.effective_model, &prompt, &self.safety_settings)
                .await;

            let outcome = match AttemptOutcome::classify(result, request.wants_structured_output) {
                AttemptOutcome::Success(text) => {
                    logger.log_success(&state.effective_model, state.attempt, &text);
                    return Ok(Completion {
                        text,
                        model: state.effective_model,
                        attempts: state.attempt,
                    });
                }
                failure => failure,
            };

            logger.log_attempt_failure(
                &state.effective_model,
                state.attempt,
                max_attempts,
                outcome.label(),
                &outcome.message(),
            );

            if !outcome.is_retryable() {
                break (state, outcome);
            }

            // Only switch when another attempt will run on the fallback model
            if state.should_fall_back() && state.attempt < max_attempts {
                logger.log_fallback(&state.effective_model, &self.fallback_model, state.attempt);
                state = state.fall_back_to(&self.fallback_model);
            }

            if state.attempt >= max_attempts {
                break (state, outcome);
            }

            let delay = calculate_backoff(state.attempt, &self.retry);
            logger.log_retry_delay(state.attempt, delay.as_millis());
            sleep(delay).await;

            state = state.next_attempt();
        };

        let error = terminal_error(outcome, state.attempt);
        logger.log_failure(
            &state.effective_model,
            state.attempt,
            error.error_type(),
            &error.to_string(),
        );
        Err(error)
    }
}

fn validate(request: &DispatchRequest) -> Result<()> {
    if request.model_name.trim().is_empty() || request.prompt.trim().is_empty() {
        return Err(GatewayError::InvalidRequest(
            "model_name and prompt are required".to_string(),
        ));
    }
    Ok(())
}

fn terminal_error(outcome: AttemptOutcome, attempts: usize) -> GatewayError {
    match outcome {
        AttemptOutcome::Blocked(feedback) => GatewayError::Blocked { attempts, feedback },
        AttemptOutcome::ClientError(message) => GatewayError::Upstream { attempts, message },
        AttemptOutcome::EmptyText => GatewayError::EmptyResponse { attempts },
        AttemptOutcome::ServerError(last_error) => {
            GatewayError::ExhaustedRetries { attempts, last_error }
        }
        AttemptOutcome::Success(_) => {
            GatewayError::Internal("dispatch ended on a successful attempt".to_string())
        }
    }
}
