//! Retry with exponential backoff for vendor calls.
//!
//! Only the initial request is retried. Once a stream has started, errors are
//! handed to the caller unchanged.

use std::future::Future;
use std::time::Duration;

use crate::core::error::{SdkError, TransportError};

/// Backoff schedule for retrying failed requests.
#[derive(Debug, Clone)]
pub struct RetryConfig {
    /// Maximum number of retry attempts (not including the initial attempt)
    pub max_retries: u32,
    /// Initial backoff delay
    pub initial_interval: Duration,
    /// Maximum backoff delay
    pub max_interval: Duration,
    /// Multiplier for exponential backoff (typically 2.0)
    pub multiplier: f64,
}

impl RetryConfig {
    /// Vendor-client defaults: 500ms initial delay doubling up to 8s.
    pub fn with_max_retries(max_retries: u32) -> Self {
        Self {
            max_retries,
            initial_interval: Duration::from_millis(500),
            max_interval: Duration::from_secs(8),
            multiplier: 2.0,
        }
    }

    /// Backoff for the given 1-based attempt. A server `retry_after` hint wins
    /// over the computed delay but is still capped at `max_interval`.
    pub fn calculate_backoff(&self, attempt: u32, retry_after: Option<Duration>) -> Duration {
        if let Some(duration) = retry_after {
            return duration.min(self.max_interval);
        }
        let multiplier = self.multiplier.powi(attempt.saturating_sub(1) as i32);
        let backoff_ms = (self.initial_interval.as_millis() as f64 * multiplier) as u64;
        Duration::from_millis(backoff_ms).min(self.max_interval)
    }
}

impl Default for RetryConfig {
    fn default() -> Self {
        Self::with_max_retries(2)
    }
}

/// Errors that know whether a repeat attempt may succeed.
pub trait Retryable {
    fn is_retryable(&self) -> bool;

    /// Retry-after hint in milliseconds, if the server sent one.
    fn retry_after_ms(&self) -> Option<u64> {
        None
    }
}

impl Retryable for TransportError {
    fn is_retryable(&self) -> bool {
        match self {
            TransportError::HttpStatus { status, .. } => is_retryable_status(*status),
            TransportError::Network(_)
            | TransportError::ConnectTimeout(_)
            | TransportError::RequestTimeout(_)
            | TransportError::IdleReadTimeout(_) => true,
            TransportError::BodyRead(_) | TransportError::Other(_) => false,
        }
    }

    fn retry_after_ms(&self) -> Option<u64> {
        TransportError::retry_after_ms(self)
    }
}

impl Retryable for SdkError {
    fn is_retryable(&self) -> bool {
        match self {
            SdkError::RateLimited { .. } | SdkError::Timeout => true,
            SdkError::Upstream { status, .. } => is_retryable_status(*status),
            SdkError::Transport(te) => te.is_retryable(),
            _ => false,
        }
    }

    fn retry_after_ms(&self) -> Option<u64> {
        match self {
            SdkError::RateLimited { retry_after_ms, .. } => *retry_after_ms,
            SdkError::Transport(te) => Retryable::retry_after_ms(te),
            _ => None,
        }
    }
}

fn is_retryable_status(status: u16) -> bool {
    matches!(status, 408 | 409 | 429) || status >= 500
}

/// Run `operation`, retrying retryable failures per `config`.
/// `on_retry` sees the attempt number, the chosen delay and the error.
pub async fn retry_with_backoff<F, Fut, T, E, R>(
    config: &RetryConfig,
    mut operation: F,
    mut on_retry: R,
) -> Result<T, E>
where
    F: FnMut() -> Fut,
    Fut: Future<Output = Result<T, E>>,
    E: Retryable,
    R: FnMut(u32, Duration, &E),
{
    let mut attempt = 0u32;
    loop {
        match operation().await {
            Ok(result) => return Ok(result),
            Err(err) => {
                if !err.is_retryable() {
                    return Err(err);
                }
                attempt += 1;
                if attempt > config.max_retries {
                    return Err(err);
                }
                let retry_after = err.retry_after_ms().map(Duration::from_millis);
                let delay = config.calculate_backoff(attempt, retry_after);
                on_retry(attempt, delay, &err);
                tokio::time::sleep(delay).await;
            }
        }
    }
}
