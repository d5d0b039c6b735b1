//! Provider-validation orchestration core.
//!
//! Accepts batches of provider records, fans each provider out across the
//! five source-specific connectors (identifier registry, geocoder, OCR,
//! state licensing board, enrichment), and fuses the results into one
//! confidence-scored `ValidationReport` per provider. The job control
//! plane, policy layer (rate limiting, retries, circuit breakers,
//! politeness), and fusion engine are all usable independently of the
//! orchestrator for callers that want finer control.

pub mod connectors;
pub mod error;
pub mod fusion;
pub mod idempotency;
pub mod orchestrator;
pub mod politeness;
pub mod queue;
pub mod rate_limit;
pub mod retry;
pub mod store;
pub mod types;

pub use error::{ConnectorError, IdempotencyError, OrchestratorError, OrchestratorResult};
pub use fusion::fuse;
pub use orchestrator::{Orchestrator, OrchestratorConfig, SubmitOutcome};
pub use types::ids::{JobId, ProviderId, ReportId};
pub use types::job::{Job, JobRequest, JobStatus, JobStatusSummary, Priority, ValidationOptions};
pub use types::provider::ProviderInput;
pub use types::report::{FieldSummary, ValidationReport, ValidationStatus};
pub use types::result::{NormalizedValue, WorkerResult};
pub use types::task::{TaskState, TaskType, WorkerTask};
