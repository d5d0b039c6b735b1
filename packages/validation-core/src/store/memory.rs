//! In-memory implementations of the persisted-state traits. Useful for
//! tests and the CLI's offline demo mode; not durable across restarts.

use async_trait::async_trait;
use std::collections::HashMap;
use std::sync::RwLock;
use std::time::{Duration, Instant};

use super::{JobStore, KvStore, ReportStore, ResultLog};
use crate::error::OrchestratorResult;
use crate::types::ids::{JobId, ProviderId};
use crate::types::job::Job;
use crate::types::report::ValidationReport;
use crate::types::result::WorkerResult;

#[derive(Default)]
pub struct MemoryJobStore {
    jobs: RwLock<HashMap<JobId, Job>>,
}

#[async_trait]
impl JobStore for MemoryJobStore {
    async fn get(&self, job_id: JobId) -> OrchestratorResult<Option<Job>> {
        Ok(self.jobs.read().unwrap().get(&job_id).cloned())
    }

    async fn put(&self, job: Job) -> OrchestratorResult<()> {
        self.jobs.write().unwrap().insert(job.job_id, job);
        Ok(())
    }
}

#[derive(Default)]
pub struct MemoryResultLog {
    results: RwLock<HashMap<(JobId, ProviderId), Vec<WorkerResult>>>,
}

#[async_trait]
impl ResultLog for MemoryResultLog {
    async fn append(&self, result: WorkerResult) -> OrchestratorResult<()> {
        self.results
            .write()
            .unwrap()
            .entry((result.job_id, result.provider_id))
            .or_default()
            .push(result);
        Ok(())
    }

    async fn for_provider(&self, job_id: JobId, provider_id: ProviderId) -> OrchestratorResult<Vec<WorkerResult>> {
        Ok(self
            .results
            .read()
            .unwrap()
            .get(&(job_id, provider_id))
            .cloned()
            .unwrap_or_default())
    }
}

struct Entry {
    value: String,
    expires_at: Option<Instant>,
}

#[derive(Default)]
pub struct MemoryKvStore {
    entries: RwLock<HashMap<String, Entry>>,
}

#[async_trait]
impl KvStore for MemoryKvStore {
    async fn get(&self, key: &str) -> OrchestratorResult<Option<String>> {
        let guard = self.entries.read().unwrap();
        Ok(guard.get(key).filter(|e| !is_expired(e)).map(|e| e.value.clone()))
    }

    async fn set(&self, key: &str, value: String, ttl: Option<Duration>) -> OrchestratorResult<()> {
        let expires_at = ttl.map(|d| Instant::now() + d);
        self.entries.write().unwrap().insert(key.to_string(), Entry { value, expires_at });
        Ok(())
    }

    async fn delete(&self, key: &str) -> OrchestratorResult<()> {
        self.entries.write().unwrap().remove(key);
        Ok(())
    }
}

fn is_expired(entry: &Entry) -> bool {
    entry.expires_at.map(|at| Instant::now() > at).unwrap_or(false)
}

#[derive(Default)]
pub struct MemoryReportStore {
    reports: RwLock<HashMap<(JobId, ProviderId), ValidationReport>>,
}

#[async_trait]
impl ReportStore for MemoryReportStore {
    async fn put(&self, report: ValidationReport) -> OrchestratorResult<()> {
        self.reports.write().unwrap().insert((report.job_id, report.provider_id), report);
        Ok(())
    }

    async fn get(&self, job_id: JobId, provider_id: ProviderId) -> OrchestratorResult<Option<ValidationReport>> {
        Ok(self.reports.read().unwrap().get(&(job_id, provider_id)).cloned())
    }
}
