//! Typed, builder-style configuration for the policy layer.
//!
//! Each config carries its own connector defaults rather than reading
//! environment variables directly — library code is constructed explicitly
//! by the caller; only the CLI binary loads from the environment.

use serde::{Deserialize, Serialize};
use std::time::Duration;

/// Sliding-window + per-second pacing limits for one connector.
#[derive(Debug, Clone, Copy, Serialize, Deserialize)]
pub struct RateLimitConfig {
    pub requests_per_second: f64,
    pub requests_per_minute: u32,
    pub window_size: Duration,
}

impl RateLimitConfig {
    pub fn new(requests_per_second: f64, requests_per_minute: u32) -> Self {
        Self {
            requests_per_second,
            requests_per_minute,
            window_size: Duration::from_secs(60),
        }
    }

    pub fn with_window_size(mut self, window_size: Duration) -> Self {
        self.window_size = window_size;
        self
    }

    pub fn identifier_registry() -> Self {
        Self::new(10.0, 600)
    }

    pub fn geocoder() -> Self {
        Self::new(10.0, 600)
    }

    pub fn ocr() -> Self {
        Self::new(10.0, 600)
    }

    pub fn licensing_board() -> Self {
        Self::new(0.5, 30)
    }

    pub fn enrichment() -> Self {
        Self::new(2.0, 120)
    }
}

/// Retry budget and backoff shape.
#[derive(Debug, Clone, Copy, Serialize, Deserialize)]
pub struct RetryConfig {
    pub max_retries: u32,
    pub base_delay: Duration,
    pub max_delay: Duration,
    pub exponential_backoff: bool,
}

impl RetryConfig {
    pub fn new(max_retries: u32, base_delay: Duration, max_delay: Duration) -> Self {
        Self {
            max_retries,
            base_delay,
            max_delay,
            exponential_backoff: true,
        }
    }

    pub fn with_exponential_backoff(mut self, exponential: bool) -> Self {
        self.exponential_backoff = exponential;
        self
    }

    /// Default for fast API sources (identifier registry, geocoder).
    pub fn fast_api() -> Self {
        Self::new(3, Duration::from_secs(1), Duration::from_secs(30))
    }

    /// Default for scraped sites (licensing boards).
    pub fn scraped_site() -> Self {
        Self::new(5, Duration::from_secs(2), Duration::from_secs(60))
    }

    /// Delay before attempt `n` (0-indexed), per the fixed formula:
    /// `min(base * 2^n, max)` when exponential, else `base * (n + 1)`.
    pub fn delay_for_attempt(&self, n: u32) -> Duration {
        let delay = if self.exponential_backoff {
            self.base_delay.saturating_mul(1u32.checked_shl(n).unwrap_or(u32::MAX))
        } else {
            self.base_delay.saturating_mul(n + 1)
        };
        delay.min(self.max_delay)
    }
}

/// Per-connector circuit breaker thresholds.
#[derive(Debug, Clone, Copy, Serialize, Deserialize)]
pub struct CircuitBreakerConfig {
    pub failure_threshold: u32,
    pub recovery_timeout: Duration,
    pub half_open_max_calls: u32,
}

impl CircuitBreakerConfig {
    pub fn new(failure_threshold: u32, recovery_timeout: Duration, half_open_max_calls: u32) -> Self {
        Self {
            failure_threshold,
            recovery_timeout,
            half_open_max_calls,
        }
    }

    pub fn generic() -> Self {
        Self::new(5, Duration::from_secs(60), 3)
    }

    pub fn scraped_site() -> Self {
        Self::new(3, Duration::from_secs(120), 3)
    }
}

/// Per-state configuration record parameterizing the license-board adapter,
/// so one adapter body services every state instead of per-state branches.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct StateBoardConfig {
    pub state_code: String,
    pub base_url: String,
    pub search_url: String,
    pub search_method: String,
    pub selectors: SelectorSet,
    pub robots_check_selectors: bool,
    pub rate_limit: RateLimitConfig,
    pub retry: RetryConfig,
    pub circuit_breaker: CircuitBreakerConfig,
    pub timeout: Duration,
    pub user_agent: String,
}

/// CSS/XPath-style selector strings for the per-state result page. The
/// adapter treats these as opaque lookup keys into whatever parsing
/// strategy the connector uses; this crate does not implement a scraper,
/// only the contract a real one would be plugged into.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct SelectorSet {
    pub provider_name: String,
    pub status: String,
    pub issue_date: String,
    pub expiry_date: String,
    pub specialty: String,
    pub board_actions: String,
}

impl StateBoardConfig {
    pub fn new(state_code: impl Into<String>, base_url: impl Into<String>, search_url: impl Into<String>) -> Self {
        Self {
            state_code: state_code.into(),
            base_url: base_url.into(),
            search_url: search_url.into(),
            search_method: "GET".into(),
            selectors: SelectorSet::default(),
            robots_check_selectors: false,
            rate_limit: RateLimitConfig::licensing_board(),
            retry: RetryConfig::scraped_site(),
            circuit_breaker: CircuitBreakerConfig::scraped_site(),
            timeout: Duration::from_secs(30),
            user_agent: "ProviderValidationBot/1.0 (+contact@example.com)".into(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn exponential_delay_caps_at_max() {
        let retry = RetryConfig::scraped_site();
        assert_eq!(retry.delay_for_attempt(0), Duration::from_secs(2));
        assert_eq!(retry.delay_for_attempt(1), Duration::from_secs(4));
        assert_eq!(retry.delay_for_attempt(10), Duration::from_secs(60));
    }

    #[test]
    fn linear_delay_grows_by_attempt() {
        let retry = RetryConfig::new(5, Duration::from_secs(2), Duration::from_secs(60))
            .with_exponential_backoff(false);
        assert_eq!(retry.delay_for_attempt(0), Duration::from_secs(2));
        assert_eq!(retry.delay_for_attempt(2), Duration::from_secs(6));
    }
}
