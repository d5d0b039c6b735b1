//! Deduplicates batch submissions by a stable request fingerprint.
//!
//! Grounded on `IdempotencyManager` in the Python prototype:
//! `generate_idempotency_key` (key-sorted JSON + digest) and the
//! pending/processing/completed/failed/expired state machine in
//! `check_idempotency`/`create_idempotency_record`/`update_idempotency_record`.
//! The digest here is `sha2::Sha256` truncated to 128 bits rather than MD5 —
//! MD5 isn't an idiomatic choice for new Rust code, and truncated SHA-256
//! preserves the "128-bit digest" contract bit-for-bit.

mod store;

use chrono::{DateTime, Duration as ChronoDuration, Utc};
use serde::{Deserialize, Serialize};
use sha2::{Digest, Sha256};

use crate::error::{IdempotencyError, IdempotencyResult};
use crate::types::ids::JobId;

pub use store::{InMemoryIdempotencyStore, IdempotencyStore};

const DEFAULT_TTL: ChronoDuration = ChronoDuration::hours(24);

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum IdempotencyStatus {
    Pending,
    Processing,
    Completed,
    Failed,
    Expired,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct IdempotencyRecord {
    pub key: String,
    pub status: IdempotencyStatus,
    pub job_id: JobId,
    pub cached_response: Option<serde_json::Value>,
    pub error_message: Option<String>,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
    pub expires_at: DateTime<Utc>,
}

impl IdempotencyRecord {
    fn new(key: String, job_id: JobId) -> Self {
        let now = Utc::now();
        Self {
            key,
            status: IdempotencyStatus::Pending,
            job_id,
            cached_response: None,
            error_message: None,
            created_at: now,
            updated_at: now,
            expires_at: now + DEFAULT_TTL,
        }
    }

    fn is_expired(&self) -> bool {
        Utc::now() > self.expires_at
    }
}

/// Outcome of a submission's idempotency check, driving `submit_batch`'s
/// branch between "reuse prior job" and "start fresh."
#[derive(Debug, Clone)]
pub enum IdempotencyOutcome {
    /// No usable prior record; a new job should be created and bound to
    /// this key.
    New,
    /// A completed prior run; its cached response should be returned
    /// without doing any new work.
    CachedCompleted { job_id: JobId, cached_response: Option<serde_json::Value> },
    /// A run already in flight under this key.
    InFlight { job_id: JobId, status: IdempotencyStatus },
}

/// Computes request fingerprints and manages the record lifecycle, backed
/// by an injected `IdempotencyStore`.
pub struct IdempotencyManager<S: IdempotencyStore> {
    store: S,
}

impl<S: IdempotencyStore> IdempotencyManager<S> {
    pub fn new(store: S) -> Self {
        Self { store }
    }

    /// Canonical fingerprint: the request serialized with sorted object
    /// keys, hashed with truncated SHA-256, namespaced by `prefix`.
    /// Order-insensitive in map keys by construction (`serde_json::Value`
    /// serializes object keys via a `BTreeMap` when the `preserve_order`
    /// feature is off, which this crate does not enable).
    pub fn fingerprint(&self, request: &impl Serialize, prefix: &str) -> IdempotencyResult<String> {
        let canonical = serde_json::to_vec(request).map_err(IdempotencyError::Canonicalization)?;
        let mut hasher = Sha256::new();
        hasher.update(&canonical);
        let digest = hasher.finalize();
        let truncated = &digest[..16];
        let hex: String = truncated.iter().map(|b| format!("{:02x}", b)).collect();
        Ok(format!("{}_{}", prefix, hex))
    }

    /// Looks up `key`; returns `New` if absent or expired, the cached
    /// response if completed, or the in-flight status otherwise. A
    /// `failed` record is treated as absent, allowing a fresh attempt.
    pub async fn check(&self, key: &str) -> IdempotencyResult<IdempotencyOutcome> {
        match self.store.get(key).await? {
            None => Ok(IdempotencyOutcome::New),
            Some(record) if record.is_expired() => {
                self.store.delete(key).await?;
                Ok(IdempotencyOutcome::New)
            }
            Some(record) => match record.status {
                IdempotencyStatus::Completed => Ok(IdempotencyOutcome::CachedCompleted {
                    job_id: record.job_id,
                    cached_response: record.cached_response,
                }),
                IdempotencyStatus::Pending | IdempotencyStatus::Processing => {
                    Ok(IdempotencyOutcome::InFlight { job_id: record.job_id, status: record.status })
                }
                IdempotencyStatus::Failed | IdempotencyStatus::Expired => Ok(IdempotencyOutcome::New),
            },
        }
    }

    /// Binds a fresh job id to `key` with status `pending`.
    pub async fn bind(&self, key: &str, job_id: JobId) -> IdempotencyResult<()> {
        self.store.put(IdempotencyRecord::new(key.to_string(), job_id)).await
    }

    pub async fn mark_processing(&self, key: &str) -> IdempotencyResult<()> {
        self.transition(key, IdempotencyStatus::Processing, None, None).await
    }

    pub async fn mark_completed(&self, key: &str, response: serde_json::Value) -> IdempotencyResult<()> {
        self.transition(key, IdempotencyStatus::Completed, Some(response), None).await
    }

    pub async fn mark_failed(&self, key: &str, error: impl Into<String>) -> IdempotencyResult<()> {
        self.transition(key, IdempotencyStatus::Failed, None, Some(error.into())).await
    }

    async fn transition(
        &self,
        key: &str,
        status: IdempotencyStatus,
        response: Option<serde_json::Value>,
        error: Option<String>,
    ) -> IdempotencyResult<()> {
        if let Some(mut record) = self.store.get(key).await? {
            record.status = status;
            record.updated_at = Utc::now();
            if response.is_some() {
                record.cached_response = response;
            }
            if error.is_some() {
                record.error_message = error;
            }
            self.store.put(record).await?;
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[tokio::test]
    async fn fresh_key_reports_new() {
        let manager = IdempotencyManager::new(InMemoryIdempotencyStore::default());
        let outcome = manager.check("validation_abc").await.unwrap();
        assert!(matches!(outcome, IdempotencyOutcome::New));
    }

    #[tokio::test]
    async fn completed_record_returns_cached_response() {
        let manager = IdempotencyManager::new(InMemoryIdempotencyStore::default());
        let job_id = JobId::new();
        manager.bind("validation_abc", job_id).await.unwrap();
        manager.mark_completed("validation_abc", json!({"status": "ok"})).await.unwrap();

        match manager.check("validation_abc").await.unwrap() {
            IdempotencyOutcome::CachedCompleted { job_id: found, cached_response } => {
                assert_eq!(found, job_id);
                assert_eq!(cached_response.unwrap(), json!({"status": "ok"}));
            }
            other => panic!("expected cached completed, got {other:?}"),
        }
    }

    #[tokio::test]
    async fn failed_record_allows_fresh_attempt() {
        let manager = IdempotencyManager::new(InMemoryIdempotencyStore::default());
        let job_id = JobId::new();
        manager.bind("validation_abc", job_id).await.unwrap();
        manager.mark_failed("validation_abc", "boom").await.unwrap();

        let outcome = manager.check("validation_abc").await.unwrap();
        assert!(matches!(outcome, IdempotencyOutcome::New));
    }

    #[test]
    fn fingerprint_is_order_insensitive_in_object_keys() {
        let manager = IdempotencyManager::new(InMemoryIdempotencyStore::default());
        let a = json!({"b": 2, "a": 1});
        let b = json!({"a": 1, "b": 2});
        assert_eq!(
            manager.fingerprint(&a, "validation").unwrap(),
            manager.fingerprint(&b, "validation").unwrap()
        );
    }
}
