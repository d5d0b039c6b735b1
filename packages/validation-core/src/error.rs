//! Typed errors for the validation core.
//!
//! Follows the library convention of `thiserror` over `anyhow`: every
//! failure mode a caller might need to match on gets its own variant.

use thiserror::Error;

/// Errors raised by the orchestrator's own control-plane operations.
///
/// Per the error taxonomy, only infrastructural failures reach this type —
/// a worker failing its task never does; that becomes a `WorkerResult` with
/// `success = false` and is fed to fusion as negative evidence.
#[derive(Debug, Error)]
pub enum OrchestratorError {
    #[error("job queue is at capacity (depth {depth} >= high-water mark {high_water_mark})")]
    QueueFull { depth: usize, high_water_mark: usize },

    #[error("job not found: {0}")]
    JobNotFound(crate::types::ids::JobId),

    #[error("job store unreachable: {0}")]
    StoreUnreachable(#[source] Box<dyn std::error::Error + Send + Sync>),

    #[error("idempotency store error: {0}")]
    Idempotency(#[from] IdempotencyError),
}

/// Errors from the idempotency manager.
#[derive(Debug, Error)]
pub enum IdempotencyError {
    #[error("underlying store unreachable: {0}")]
    StoreUnreachable(#[source] Box<dyn std::error::Error + Send + Sync>),

    #[error("failed to canonicalize request for fingerprinting: {0}")]
    Canonicalization(#[from] serde_json::Error),
}

/// Transient-vs-permanent classification used by the retry policy.
///
/// A `ConnectorError` that doesn't classify as `Transient` is never
/// retried; it finalizes the task as failed on the first attempt.
#[derive(Debug, Error)]
pub enum ConnectorError {
    /// Connection reset, timeout, 5xx, or 429 — retried per policy.
    #[error("transient error: {0}")]
    Transient(String),

    /// 4xx (non-429), unrecoverable parse failure — never retried.
    #[error("permanent error: {0}")]
    Permanent(String),

    /// robots.txt disallowed the target path.
    #[error("robots.txt disallows: {path}")]
    RobotsBlocked { path: String },

    /// The circuit breaker for this connector is open.
    #[error("circuit open for connector: {0}")]
    CircuitOpen(String),

    /// The task exceeded its deadline.
    #[error("task timed out after {0:?}")]
    Timeout(std::time::Duration),

    /// Malformed input that fusion should flag, never sent upstream.
    #[error("invalid input: {0}")]
    InvalidInput(String),
}

impl ConnectorError {
    /// Whether the retry policy should attempt this call again.
    pub fn is_retryable(&self) -> bool {
        matches!(self, ConnectorError::Transient(_))
    }
}

pub type OrchestratorResult<T> = std::result::Result<T, OrchestratorError>;
pub type ConnectorResult<T> = std::result::Result<T, ConnectorError>;
pub type IdempotencyResult<T> = std::result::Result<T, IdempotencyError>;
