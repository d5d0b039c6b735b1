//! Per-connector sliding-window admission control.
//!
//! Grounded on `RateLimiter.check_rate_limit` in the Python prototype: a
//! sliding window of request timestamps bounds the per-minute count, and a
//! separate per-connector "last request" timestamp enforces per-second
//! pacing. Ported from Redis sorted-set primitives to an injected
//! `RateLimitStore` trait with an in-memory default, matching the
//! `Arc<RwLock<HashMap<...>>>` pattern used for in-memory stores elsewhere
//! in this crate.

use std::collections::HashMap;
use std::sync::Mutex;
use std::time::Duration;

use tracing::{debug, warn};

use crate::types::config::RateLimitConfig;

mod store;
pub use store::{InMemoryRateLimitStore, RateLimitStore};

/// Outcome of an admission check.
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum Admission {
    Allowed,
    Denied { wait: Duration },
}

/// Wraps a `RateLimitStore` with the window-trim-then-admit algorithm and
/// per-connector configuration.
pub struct RateLimiter<S: RateLimitStore> {
    store: S,
    configs: Mutex<HashMap<String, RateLimitConfig>>,
}

impl<S: RateLimitStore> RateLimiter<S> {
    pub fn new(store: S) -> Self {
        Self {
            store,
            configs: Mutex::new(default_configs()),
        }
    }

    pub fn set_config(&self, connector: impl Into<String>, config: RateLimitConfig) {
        self.configs.lock().unwrap().insert(connector.into(), config);
    }

    fn config_for(&self, connector: &str) -> RateLimitConfig {
        self.configs
            .lock()
            .unwrap()
            .get(connector)
            .copied()
            .unwrap_or(RateLimitConfig::new(1.0, 60))
    }

    /// A politeness-directive crawl delay overrides the connector's
    /// configured per-second rate whenever it implies a slower pace.
    pub fn apply_crawl_delay(&self, connector: &str, crawl_delay: Duration) {
        let mut configs = self.configs.lock().unwrap();
        let config = configs.entry(connector.to_string()).or_insert_with(|| RateLimitConfig::new(1.0, 60));
        let crawl_rps = 1.0 / crawl_delay.as_secs_f64().max(f64::MIN_POSITIVE);
        if crawl_rps < config.requests_per_second {
            config.requests_per_second = crawl_rps;
        }
    }

    /// Single admission check: trims the window, and if under the
    /// per-minute limit and the per-second gap has elapsed, records and
    /// admits. Otherwise returns the wait needed before the next check
    /// would succeed, without recording anything; a denied poll must not
    /// perturb the window or the pacing clock. Fails open (admits, logging
    /// a warning) if the store is unreachable.
    pub async fn check(&self, connector: &str) -> Admission {
        let config = self.config_for(connector);
        let now = chrono::Utc::now().timestamp_millis() as f64 / 1000.0;
        let window_start = now - config.window_size.as_secs_f64();
        let min_interval = 1.0 / config.requests_per_second;

        match self.store.admit(connector, now, window_start, config.requests_per_minute, min_interval).await {
            Ok(store::AdmitOutcome::Admitted) => Admission::Allowed,
            Ok(store::AdmitOutcome::Paced { wait }) => {
                debug!(connector, wait_ms = wait.as_millis() as u64, "rate limiter pacing delay");
                Admission::Denied { wait }
            }
            Ok(store::AdmitOutcome::WindowFull { retry_after }) => {
                Admission::Denied { wait: retry_after }
            }
            Err(err) => {
                warn!(connector, error = %err, "rate limit store unreachable, failing open");
                Admission::Allowed
            }
        }
    }

    /// Loops `check` with a sleep until admitted.
    pub async fn wait(&self, connector: &str) {
        loop {
            match self.check(connector).await {
                Admission::Allowed => return,
                Admission::Denied { wait } => {
                    tokio::time::sleep(wait).await;
                }
            }
        }
    }
}

fn default_configs() -> HashMap<String, RateLimitConfig> {
    use crate::types::task::TaskType;
    let mut map = HashMap::new();
    map.insert(TaskType::IdentifierCheck.source_name().to_string(), RateLimitConfig::identifier_registry());
    map.insert(TaskType::Geocode.source_name().to_string(), RateLimitConfig::geocoder());
    map.insert(TaskType::Ocr.source_name().to_string(), RateLimitConfig::ocr());
    map.insert(TaskType::LicenseCheck.source_name().to_string(), RateLimitConfig::licensing_board());
    map.insert(TaskType::Enrichment.source_name().to_string(), RateLimitConfig::enrichment());
    map
}
