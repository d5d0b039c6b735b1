//! Persisted state traits: job records, the worker-result log, and a
//! shared key-value store for anything else that needs TTL/atomic
//! semantics. Each has an in-memory default, modeled directly on
//! `MemoryStore` in the crawler pack, so the orchestrator runs standalone
//! without an external database.

mod memory;

use async_trait::async_trait;

pub use memory::{MemoryJobStore, MemoryKvStore, MemoryReportStore, MemoryResultLog};

use crate::error::OrchestratorResult;
use crate::types::ids::{JobId, ProviderId};
use crate::types::job::Job;
use crate::types::report::ValidationReport;
use crate::types::result::WorkerResult;

/// Job records keyed by job id, with embedded progress counters and the
/// option set.
#[async_trait]
pub trait JobStore: Send + Sync {
    async fn get(&self, job_id: JobId) -> OrchestratorResult<Option<Job>>;
    async fn put(&self, job: Job) -> OrchestratorResult<()>;
}

/// The worker-result log, keyed by (job id, provider id), appended to
/// monotonically. ValidationReports are derivable from this log and may be
/// cached by the caller.
#[async_trait]
pub trait ResultLog: Send + Sync {
    async fn append(&self, result: WorkerResult) -> OrchestratorResult<()>;
    async fn for_provider(&self, job_id: JobId, provider_id: ProviderId) -> OrchestratorResult<Vec<WorkerResult>>;
}

/// Generic string-keyed store with TTL support, backing anything that
/// isn't a job record or result: reserved for future shared state beyond
/// what `JobStore`/`ResultLog` cover.
#[async_trait]
pub trait KvStore: Send + Sync {
    async fn get(&self, key: &str) -> OrchestratorResult<Option<String>>;
    async fn set(&self, key: &str, value: String, ttl: Option<std::time::Duration>) -> OrchestratorResult<()>;
    async fn delete(&self, key: &str) -> OrchestratorResult<()>;
}

/// Fused validation reports, keyed by (job id, provider id). Written once,
/// by the orchestrator, as soon as a provider's enabled tasks all reach a
/// terminal state.
#[async_trait]
pub trait ReportStore: Send + Sync {
    async fn put(&self, report: ValidationReport) -> OrchestratorResult<()>;
    async fn get(&self, job_id: JobId, provider_id: ProviderId) -> OrchestratorResult<Option<ValidationReport>>;
}
