//! Reconnect backoff for live subscriptions.
//!
//! One-shot operations never retry; only the subscription loop consults
//! [`RetryState`] after a transport or auth failure.

use crate::core::client::ClientConfig;
use crate::core::error::TreeError;
use std::time::Duration;

/// Backoff policy.
///
/// # Example
///
/// ```rust
/// use firetree::client::RetryConfig;
/// use firetree::ClientConfig;
/// use std::time::Duration;
///
/// let config = RetryConfig::from_client(&ClientConfig {
///     reconnect_max_attempts: Some(5),
///     reconnect_initial_backoff_ms: 250,
///     ..Default::default()
/// });
/// assert_eq!(config.max_retries, Some(5));
/// assert_eq!(config.initial_backoff, Duration::from_millis(250));
/// ```
#[derive(Debug, Clone, PartialEq)]
pub struct RetryConfig {
    /// Maximum number of consecutive retries (None = retry until cancelled)
    pub max_retries: Option<u32>,

    /// Delay before the first retry
    pub initial_backoff: Duration,

    /// Cap on the delay
    pub max_backoff: Duration,
}

impl Default for RetryConfig {
    fn default() -> Self {
        Self::from_client(&ClientConfig::default())
    }
}

impl RetryConfig {
    /// Policy taken from the client configuration.
    pub fn from_client(config: &ClientConfig) -> Self {
        Self {
            max_retries: config.reconnect_max_attempts,
            initial_backoff: Duration::from_millis(config.reconnect_initial_backoff_ms),
            max_backoff: Duration::from_millis(
                config
                    .reconnect_max_backoff_ms
                    .max(config.reconnect_initial_backoff_ms),
            ),
        }
    }
}

/// Result of a retry decision.
#[derive(Debug, Clone, PartialEq)]
pub enum RetryDecision {
    /// Reconnect after the given delay
    Retry(Duration),
    /// Give up
    DontRetry,
}

/// Consecutive-failure bookkeeping for one subscription.
#[derive(Debug, Clone)]
pub struct RetryState {
    /// Failures since the last successful connect
    pub attempts: u32,
    /// Delay the next retry will use
    pub current_backoff: Duration,
    config: RetryConfig,
}

impl RetryState {
    pub fn new(config: RetryConfig) -> Self {
        Self {
            attempts: 0,
            current_backoff: config.initial_backoff,
            config,
        }
    }

    /// Decide whether `error` warrants another connection attempt.
    ///
    /// Transport and auth failures retry; decode and config failures, and
    /// explicit aborts, do not.
    pub fn should_retry(&mut self, error: &TreeError) -> RetryDecision {
        if matches!(error, TreeError::Aborted) || !error.is_retryable() {
            return RetryDecision::DontRetry;
        }

        self.attempts += 1;
        if let Some(max) = self.config.max_retries {
            if self.attempts > max {
                return RetryDecision::DontRetry;
            }
        }

        let wait = self.current_backoff;
        self.current_backoff = std::cmp::min(
            self.current_backoff.saturating_mul(2),
            self.config.max_backoff,
        );
        RetryDecision::Retry(wait)
    }

    /// Forget past failures after a connection was established.
    pub fn reset(&mut self) {
        self.attempts = 0;
        self.current_backoff = self.config.initial_backoff;
    }
}
