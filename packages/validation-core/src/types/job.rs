//! Job lifecycle types.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use super::ids::JobId;
use super::provider::ProviderInput;

/// Submission priority; governs dequeue order within each task-type queue.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Priority {
    Low,
    Normal,
    High,
    Urgent,
}

impl Default for Priority {
    fn default() -> Self {
        Priority::Normal
    }
}

/// Which sources are enabled for a batch. All default to on; `ocr` also
/// requires a `document_reference` on the provider or its task is skipped.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct ValidationOptions {
    pub identifier_check: bool,
    pub geocode: bool,
    pub ocr: bool,
    pub license_check: bool,
    pub enrichment: bool,
}

impl Default for ValidationOptions {
    fn default() -> Self {
        Self {
            identifier_check: true,
            geocode: true,
            ocr: true,
            license_check: true,
            enrichment: true,
        }
    }
}

impl ValidationOptions {
    /// Enabled task types for this option set, independent of any
    /// per-provider skip conditions (e.g. OCR without a document).
    pub fn enabled_task_types(&self) -> Vec<super::task::TaskType> {
        use super::task::TaskType;
        let mut types = Vec::new();
        if self.identifier_check {
            types.push(TaskType::IdentifierCheck);
        }
        if self.geocode {
            types.push(TaskType::Geocode);
        }
        if self.ocr {
            types.push(TaskType::Ocr);
        }
        if self.license_check {
            types.push(TaskType::LicenseCheck);
        }
        if self.enrichment {
            types.push(TaskType::Enrichment);
        }
        types
    }
}

/// A caller's submission, joined to a `Job` once accepted.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct JobRequest {
    pub providers: Vec<ProviderInput>,
    pub options: ValidationOptions,
    pub priority: Priority,
    pub idempotency_key: Option<String>,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum JobStatus {
    Pending,
    Running,
    Completed,
    Failed,
    Cancelled,
}

impl JobStatus {
    pub fn is_terminal(self) -> bool {
        matches!(self, JobStatus::Completed | JobStatus::Failed | JobStatus::Cancelled)
    }
}

/// Per-provider task progress, enough to compute overall job percentage.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct ProviderProgress {
    pub enabled_tasks: usize,
    /// Tasks that reached any terminal state (succeeded or failed).
    pub completed_tasks: usize,
    /// Of `completed_tasks`, how many finalized as failed.
    pub failed_tasks: usize,
}

impl ProviderProgress {
    pub fn is_fused(&self) -> bool {
        self.enabled_tasks > 0 && self.completed_tasks >= self.enabled_tasks
    }
}

/// The durable job record. Mutated only by the orchestrator; status
/// progresses monotonically except cancellation, which is terminal from
/// any non-terminal state.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Job {
    pub job_id: JobId,
    pub status: JobStatus,
    pub provider_count: usize,
    pub progress: std::collections::HashMap<String, ProviderProgress>,
    pub options: ValidationOptions,
    pub priority: Priority,
    /// Present when the submission supplied one; lets the orchestrator
    /// resolve the idempotency record to `completed` once this job is done.
    pub idempotency_key: Option<String>,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

impl Job {
    pub fn new(job_id: JobId, provider_count: usize, options: ValidationOptions, priority: Priority) -> Self {
        let now = Utc::now();
        Self {
            job_id,
            status: JobStatus::Pending,
            provider_count,
            progress: std::collections::HashMap::new(),
            options,
            priority,
            idempotency_key: None,
            created_at: now,
            updated_at: now,
        }
    }

    /// Completed + terminally-failed tasks across all providers.
    pub fn completed_count(&self) -> usize {
        self.progress.values().map(|p| p.completed_tasks).sum()
    }

    pub fn total_enabled_count(&self) -> usize {
        self.progress.values().map(|p| p.enabled_tasks).sum()
    }

    pub fn failed_count(&self) -> usize {
        self.progress.values().map(|p| p.failed_tasks).sum()
    }

    pub fn percentage(&self) -> f64 {
        let total = self.total_enabled_count();
        if total == 0 {
            0.0
        } else {
            self.completed_count() as f64 / total as f64 * 100.0
        }
    }
}

/// Summary block returned by `get_job_status`.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct JobStatusSummary {
    pub job_id: JobId,
    pub status: JobStatus,
    pub provider_count: usize,
    pub completed_count: usize,
    pub failed_count: usize,
    pub percentage: f64,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
    pub options: ValidationOptions,
}
