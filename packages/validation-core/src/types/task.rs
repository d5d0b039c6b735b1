//! Worker task types and records.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use super::ids::{JobId, ProviderId};
use super::provider::ProviderInput;

/// The five source-specific worker contracts.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum TaskType {
    IdentifierCheck,
    Geocode,
    Ocr,
    LicenseCheck,
    Enrichment,
}

impl TaskType {
    pub const ALL: [TaskType; 5] = [
        TaskType::IdentifierCheck,
        TaskType::Geocode,
        TaskType::Ocr,
        TaskType::LicenseCheck,
        TaskType::Enrichment,
    ];

    /// Name of the logical queue this task type is routed to, per the
    /// fixed queue names in the external-interfaces contract.
    pub fn queue_name(self) -> &'static str {
        match self {
            TaskType::IdentifierCheck => "identifier_validation",
            TaskType::Geocode => "geocode_validation",
            TaskType::Ocr => "ocr_processing",
            TaskType::LicenseCheck => "license_validation",
            TaskType::Enrichment => "enrichment_lookup",
        }
    }

    /// Source name as used in `FAILED_<SOURCE>` flags and source-weight
    /// lookups.
    pub fn source_name(self) -> &'static str {
        match self {
            TaskType::IdentifierCheck => "identifier_check",
            TaskType::Geocode => "geocode",
            TaskType::Ocr => "ocr",
            TaskType::LicenseCheck => "license_check",
            TaskType::Enrichment => "enrichment",
        }
    }

    /// Per-task-type deadline: 5 minutes for everything but OCR, which gets
    /// 10.
    pub fn deadline(self) -> std::time::Duration {
        match self {
            TaskType::Ocr => std::time::Duration::from_secs(600),
            _ => std::time::Duration::from_secs(300),
        }
    }
}

/// State machine for an individual task: `queued -> running -> {succeeded,
/// failed}`, with the retry policy able to return it to `running` before
/// it finalizes.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum TaskState {
    Queued,
    Running,
    Succeeded,
    Failed,
}

impl TaskState {
    pub fn is_terminal(self) -> bool {
        matches!(self, TaskState::Succeeded | TaskState::Failed)
    }
}

/// One unit of work: one (job, provider, task type) triple, created once
/// and consumed exactly once by a worker.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct WorkerTask {
    pub task_type: TaskType,
    pub job_id: JobId,
    pub provider_id: ProviderId,
    pub payload: ProviderInput,
    pub attempt: u32,
    pub state: TaskState,
    pub enqueued_at: DateTime<Utc>,
}

impl WorkerTask {
    pub fn new(task_type: TaskType, job_id: JobId, provider_id: ProviderId, payload: ProviderInput) -> Self {
        Self {
            task_type,
            job_id,
            provider_id,
            payload,
            attempt: 0,
            state: TaskState::Queued,
            enqueued_at: Utc::now(),
        }
    }
}
