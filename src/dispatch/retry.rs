use crate::config::RetryConfig;
use std::time::Duration;

const SERVER_ERROR_MARKERS: [&str; 3] = ["500", "503", "server error"];

/// Whether an upstream error message describes a transient server-side
/// failure.
pub fn is_server_error(message: &str) -> bool {
    let lower = message.to_lowercase();
    SERVER_ERROR_MARKERS.iter().any(|m| lower.contains(m))
}

/// Delay before the attempt that follows `attempt` (1-based):
/// `backoff_ms * 2^(attempt-1)`, capped at `max_backoff_ms`.
pub fn calculate_backoff(attempt: usize, config: &RetryConfig) -> Duration {
    let exponent = attempt.saturating_sub(1).min(32) as u32;
    let base_delay = config.backoff_ms.saturating_mul(2_u64.saturating_pow(exponent));
    let delay = base_delay.min(config.max_backoff_ms);

    if config.jitter <= 0.0 {
        return Duration::from_millis(delay);
    }

    let jitter = (delay as f64) * config.jitter;
    let jitter_range = rand::random::<f64>() * jitter * 2.0 - jitter;
    let final_delay = (delay as f64 + jitter_range).max(0.0) as u64;

    Duration::from_millis(final_delay)
}
