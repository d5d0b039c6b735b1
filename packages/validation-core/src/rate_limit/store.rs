//! Storage backend for sliding-window rate limit state.

use async_trait::async_trait;
use std::collections::{HashMap, VecDeque};
use std::sync::Mutex;
use std::time::Duration;

/// Outcome of one atomic check-and-record operation. Exactly one variant,
/// `Admitted`, records the request; the other two leave the window and
/// `last_request` untouched so a denied poll can't drift either.
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum AdmitOutcome {
    Admitted,
    /// At or over the per-minute limit; `retry_after` is the time until the
    /// oldest window entry ages out.
    WindowFull { retry_after: Duration },
    /// Under the per-minute limit, but the per-second pacing gap since the
    /// last admitted request hasn't elapsed yet.
    Paced { wait: Duration },
}

/// Atomic sliding-window-plus-pacing admission, backed by whatever shared
/// store holds rate-limit state. The spec models this as a KV store with
/// sorted-set windowing and atomic increment; this trait is that contract,
/// narrowed to the one operation the rate limiter needs. Both the per-minute
/// window and the per-second pacing gap are checked before anything is
/// recorded, so a request that will end up denied on either count never
/// perturbs the stored state.
#[async_trait]
pub trait RateLimitStore: Send + Sync {
    async fn admit(
        &self,
        connector: &str,
        now: f64,
        window_start: f64,
        per_minute_limit: u32,
        min_interval: f64,
    ) -> Result<AdmitOutcome, StoreError>;
}

#[derive(Debug, thiserror::Error)]
#[error("rate limit store error: {0}")]
pub struct StoreError(pub String);

#[derive(Debug, Default)]
struct ConnectorState {
    window: VecDeque<f64>,
    last_request: f64,
}

/// In-process default store, keyed by connector name.
#[derive(Default)]
pub struct InMemoryRateLimitStore {
    state: Mutex<HashMap<String, ConnectorState>>,
}

#[async_trait]
impl RateLimitStore for InMemoryRateLimitStore {
    async fn admit(
        &self,
        connector: &str,
        now: f64,
        window_start: f64,
        per_minute_limit: u32,
        min_interval: f64,
    ) -> Result<AdmitOutcome, StoreError> {
        let mut guard = self.state.lock().map_err(|_| StoreError("poisoned lock".into()))?;
        let entry = guard.entry(connector.to_string()).or_default();

        while let Some(&front) = entry.window.front() {
            if front < window_start {
                entry.window.pop_front();
            } else {
                break;
            }
        }

        if entry.window.len() >= per_minute_limit as usize {
            let oldest = *entry.window.front().unwrap_or(&now);
            let retry_after = ((oldest + (now - window_start)) - now).max(0.0);
            return Ok(AdmitOutcome::WindowFull {
                retry_after: Duration::from_secs_f64(retry_after),
            });
        }

        let since_last = now - entry.last_request;
        if since_last < min_interval {
            return Ok(AdmitOutcome::Paced {
                wait: Duration::from_secs_f64(min_interval - since_last),
            });
        }

        entry.window.push_back(now);
        entry.last_request = now;
        Ok(AdmitOutcome::Admitted)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use proptest::prelude::*;

    const WINDOW_SIZE: f64 = 60.0;

    /// I6: per-connector admitted count over any rolling `window_size`
    /// never exceeds the per-minute limit, across randomized admission
    /// sequences with jittery inter-arrival gaps.
    fn admitted_never_exceeds_limit(deltas: Vec<f64>, per_minute_limit: u32) {
        let runtime = tokio::runtime::Runtime::new().unwrap();
        let store = InMemoryRateLimitStore::default();

        let mut now = 0.0;
        let mut admitted_at = Vec::new();
        for delta in deltas {
            now += delta;
            let window_start = now - WINDOW_SIZE;
            // min_interval 0.0: this invariant is about the per-minute window
            // alone, so pacing is disabled here rather than conflated in.
            let outcome = runtime.block_on(store.admit("conn", now, window_start, per_minute_limit, 0.0)).unwrap();
            if matches!(outcome, AdmitOutcome::Admitted) {
                admitted_at.push(now);
            }
        }

        for &t in &admitted_at {
            let count_in_window = admitted_at.iter().filter(|&&other| other > t - WINDOW_SIZE && other <= t).count();
            assert!(
                count_in_window <= per_minute_limit as usize,
                "window ending at {t} admitted {count_in_window} > limit {per_minute_limit}"
            );
        }
    }

    proptest! {
        #[test]
        fn rolling_window_respects_per_minute_limit(
            deltas in prop::collection::vec(0.0f64..5.0, 1..200),
            per_minute_limit in 1u32..30,
        ) {
            admitted_never_exceeds_limit(deltas, per_minute_limit);
        }
    }

    /// A request denied on pacing must not leave any trace in the window or
    /// move `last_request`. A hot poll loop (as `RateLimiter::wait` runs)
    /// would otherwise silently eat into the per-minute budget and keep
    /// resetting the pacing clock on every denied attempt.
    #[tokio::test]
    async fn paced_denial_does_not_record_into_window_or_move_last_request() {
        let store = InMemoryRateLimitStore::default();

        let first = store.admit("conn", 100.0, 40.0, 10, 5.0).await.unwrap();
        assert_eq!(first, AdmitOutcome::Admitted);

        // Within the pacing gap: must be denied, and must not touch state.
        let second = store.admit("conn", 101.0, 41.0, 10, 5.0).await.unwrap();
        assert!(matches!(second, AdmitOutcome::Paced { .. }));

        let third = store.admit("conn", 102.0, 42.0, 10, 5.0).await.unwrap();
        assert!(matches!(third, AdmitOutcome::Paced { .. }), "a second denied poll must see the same pacing state as the first");

        // Past the pacing gap, measured from the one genuinely admitted
        // request at t=100, not from either denied poll.
        let fourth = store.admit("conn", 106.0, 46.0, 10, 5.0).await.unwrap();
        assert_eq!(fourth, AdmitOutcome::Admitted);
    }
}
