//! Per-connector circuit breaker.

use std::collections::HashMap;
use std::sync::Mutex;
use std::time::{Duration, Instant};

use serde::{Deserialize, Serialize};

use crate::types::config::CircuitBreakerConfig;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum CircuitState {
    Closed,
    Open,
    HalfOpen,
}

struct ConnectorBreaker {
    config: CircuitBreakerConfig,
    state: CircuitState,
    consecutive_failures: u32,
    last_failure: Option<Instant>,
    half_open_successes: u32,
}

impl ConnectorBreaker {
    fn new(config: CircuitBreakerConfig) -> Self {
        Self {
            config,
            state: CircuitState::Closed,
            consecutive_failures: 0,
            last_failure: None,
            half_open_successes: 0,
        }
    }

    fn poll_state(&mut self) -> CircuitState {
        if self.state == CircuitState::Open {
            if let Some(last_failure) = self.last_failure {
                if last_failure.elapsed() >= self.config.recovery_timeout {
                    self.state = CircuitState::HalfOpen;
                    self.half_open_successes = 0;
                }
            }
        }
        self.state
    }

    fn record_success(&mut self) {
        match self.state {
            CircuitState::HalfOpen => {
                self.half_open_successes += 1;
                if self.half_open_successes >= self.config.half_open_max_calls {
                    self.state = CircuitState::Closed;
                    self.consecutive_failures = 0;
                }
            }
            CircuitState::Closed => {
                self.consecutive_failures = 0;
            }
            CircuitState::Open => {}
        }
    }

    fn record_failure(&mut self) {
        self.last_failure = Some(Instant::now());
        match self.state {
            CircuitState::HalfOpen => {
                self.state = CircuitState::Open;
            }
            CircuitState::Closed => {
                self.consecutive_failures += 1;
                if self.consecutive_failures >= self.config.failure_threshold {
                    self.state = CircuitState::Open;
                }
            }
            CircuitState::Open => {}
        }
    }
}

/// Tracks circuit-breaker state for every connector that has ever recorded
/// an outcome. A call attempted while open fails immediately and does not
/// consume a retry attempt or count as a new failure.
pub struct CircuitBreakerRegistry {
    breakers: Mutex<HashMap<String, ConnectorBreaker>>,
    default_config: CircuitBreakerConfig,
}

impl CircuitBreakerRegistry {
    pub fn new(default_config: CircuitBreakerConfig) -> Self {
        Self {
            breakers: Mutex::new(HashMap::new()),
            default_config,
        }
    }

    pub fn set_config(&self, connector: impl Into<String>, config: CircuitBreakerConfig) {
        let mut guard = self.breakers.lock().unwrap();
        guard.insert(connector.into(), ConnectorBreaker::new(config));
    }

    /// Whether the breaker currently permits a call for this connector.
    pub fn is_open(&self, connector: &str) -> bool {
        let mut guard = self.breakers.lock().unwrap();
        let breaker = guard
            .entry(connector.to_string())
            .or_insert_with(|| ConnectorBreaker::new(self.default_config));
        breaker.poll_state() == CircuitState::Open
    }

    pub fn record_success(&self, connector: &str) {
        let mut guard = self.breakers.lock().unwrap();
        let breaker = guard
            .entry(connector.to_string())
            .or_insert_with(|| ConnectorBreaker::new(self.default_config));
        breaker.poll_state();
        breaker.record_success();
    }

    pub fn record_failure(&self, connector: &str) {
        let mut guard = self.breakers.lock().unwrap();
        let breaker = guard
            .entry(connector.to_string())
            .or_insert_with(|| ConnectorBreaker::new(self.default_config));
        breaker.poll_state();
        breaker.record_failure();
    }

    pub fn state_of(&self, connector: &str) -> CircuitState {
        let mut guard = self.breakers.lock().unwrap();
        let breaker = guard
            .entry(connector.to_string())
            .or_insert_with(|| ConnectorBreaker::new(self.default_config));
        breaker.poll_state()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::time::Duration;

    #[test]
    fn opens_after_threshold_consecutive_failures() {
        let registry = CircuitBreakerRegistry::new(CircuitBreakerConfig::new(3, Duration::from_secs(60), 2));
        for _ in 0..2 {
            registry.record_failure("state_board");
            assert!(!registry.is_open("state_board"));
        }
        registry.record_failure("state_board");
        assert!(registry.is_open("state_board"));
    }

    #[test]
    fn half_open_failure_reverts_to_open() {
        let registry = CircuitBreakerRegistry::new(CircuitBreakerConfig::new(1, Duration::from_millis(10), 2));
        registry.record_failure("state_board");
        assert!(registry.is_open("state_board"));
        std::thread::sleep(Duration::from_millis(20));
        assert_eq!(registry.state_of("state_board"), CircuitState::HalfOpen);
        registry.record_failure("state_board");
        assert_eq!(registry.state_of("state_board"), CircuitState::Open);
    }

    #[test]
    fn half_open_success_streak_closes_breaker() {
        let registry = CircuitBreakerRegistry::new(CircuitBreakerConfig::new(1, Duration::from_millis(10), 2));
        registry.record_failure("state_board");
        std::thread::sleep(Duration::from_millis(20));
        assert_eq!(registry.state_of("state_board"), CircuitState::HalfOpen);
        registry.record_success("state_board");
        registry.record_success("state_board");
        assert_eq!(registry.state_of("state_board"), CircuitState::Closed);
    }
}
