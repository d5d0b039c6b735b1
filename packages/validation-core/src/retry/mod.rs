//! Retry policy with exponential/linear backoff and circuit-breaker
//! integration.
//!
//! Grounded on `RetryPolicy.execute_with_retry` in the Python prototype:
//! wraps any suspension-capable call, retries only transient failures, and
//! escalates consecutive failures to a circuit breaker. The Rust version
//! generalizes the Python's string-based `type(error).__name__` matching to
//! `ConnectorError::is_retryable`, since the error type here is a closed
//! enum rather than an open exception hierarchy.

pub mod circuit_breaker;

use std::future::Future;

use tracing::{info, warn};

use crate::error::ConnectorError;
use crate::types::config::RetryConfig;
use circuit_breaker::CircuitBreakerRegistry;

/// Wraps a call with bounded retries and circuit-breaker isolation.
pub struct RetryExecutor<'a> {
    config: RetryConfig,
    breakers: &'a CircuitBreakerRegistry,
}

impl<'a> RetryExecutor<'a> {
    pub fn new(config: RetryConfig, breakers: &'a CircuitBreakerRegistry) -> Self {
        Self { config, breakers }
    }

    /// Executes `call` up to `config.max_retries + 1` times, sleeping per
    /// the configured backoff between attempts. If the breaker for
    /// `connector` is open, fails immediately without invoking `call` and
    /// without consuming a retry attempt.
    pub async fn execute<T, F, Fut>(&self, connector: &str, mut call: F) -> Result<T, ConnectorError>
    where
        F: FnMut() -> Fut,
        Fut: Future<Output = Result<T, ConnectorError>>,
    {
        if self.breakers.is_open(connector) {
            return Err(ConnectorError::CircuitOpen(connector.to_string()));
        }

        let mut attempt = 0u32;
        loop {
            match call().await {
                Ok(value) => {
                    self.breakers.record_success(connector);
                    return Ok(value);
                }
                Err(err) if err.is_retryable() && attempt < self.config.max_retries => {
                    self.breakers.record_failure(connector);
                    if self.breakers.is_open(connector) {
                        return Err(ConnectorError::CircuitOpen(connector.to_string()));
                    }
                    let delay = self.config.delay_for_attempt(attempt);
                    warn!(connector, attempt, delay_ms = delay.as_millis() as u64, error = %err, "retrying after transient failure");
                    tokio::time::sleep(delay).await;
                    attempt += 1;
                }
                Err(err) => {
                    if err.is_retryable() {
                        self.breakers.record_failure(connector);
                    }
                    info!(connector, attempt, error = %err, "call finalized as failed");
                    return Err(err);
                }
            }
        }
    }
}
