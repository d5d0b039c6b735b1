//! Job control plane: accepts batches, fans work out across per-task-type
//! queues, and fuses each provider's results as soon as they're all
//! terminal.
//!
//! Grounded on `ValidationOrchestrator`/`ValidationService` in the Python
//! prototype's `services/validator.py`: one submission becomes N workers
//! per provider (one per enabled task type), routed to task-type-specific
//! queues so a slow licensing-board lookup never head-of-line blocks a
//! fast identifier check.

mod worker;

use std::collections::HashMap;
use std::sync::Arc;

use serde::Serialize;
use tokio::task::JoinHandle;
use tokio_util::sync::CancellationToken;
use tracing::{info, instrument, warn};

use crate::connectors::Connector;
use crate::error::{OrchestratorError, OrchestratorResult};
use crate::fusion;
use crate::idempotency::{IdempotencyManager, IdempotencyOutcome, IdempotencyStore};
use crate::queue::JobQueue;
use crate::rate_limit::{RateLimitStore, RateLimiter};
use crate::store::{JobStore, ReportStore, ResultLog};
use crate::types::ids::{JobId, ProviderId};
use crate::types::job::{Job, JobRequest, JobStatus, JobStatusSummary, ProviderProgress};
use crate::types::report::ValidationReport;
use crate::types::task::{TaskType, WorkerTask};

/// Queue depth and worker-pool sizing. One `workers_per_queue` count
/// applies uniformly; callers needing per-connector tuning (e.g. fewer
/// workers against a rate-limited licensing board) can still bound that
/// through the connector's own `RateLimitConfig` — the worker count only
/// governs parallelism, not the admitted rate.
#[derive(Debug, Clone, Copy)]
pub struct OrchestratorConfig {
    pub max_queue_depth: usize,
    pub workers_per_queue: usize,
}

impl Default for OrchestratorConfig {
    fn default() -> Self {
        Self {
            max_queue_depth: 10_000,
            workers_per_queue: 4,
        }
    }
}

/// Outcome of a submission: either a freshly minted job or a prior job
/// resolved through the idempotency layer.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SubmitOutcome {
    Created(JobId),
    Reused(JobId),
}

impl SubmitOutcome {
    pub fn job_id(self) -> JobId {
        match self {
            SubmitOutcome::Created(id) | SubmitOutcome::Reused(id) => id,
        }
    }
}

/// The part of a `JobRequest` that determines whether two submissions are
/// "the same batch" for default-key idempotency: the provider list and the
/// enabled task set, but not the priority or an explicit key (those don't
/// change what work would be done).
#[derive(Serialize)]
struct FingerprintInput<'a> {
    providers: &'a [crate::types::provider::ProviderInput],
    options: crate::types::job::ValidationOptions,
}

/// Coordinates the queue, connector pool, policy layer, and persisted
/// state for one deployment. Generic over every store trait so tests can
/// swap in-memory implementations for the same orchestrator logic a real
/// deployment would run against durable stores.
pub struct Orchestrator<J, R, RS, ID, RL>
where
    J: JobStore,
    R: ResultLog,
    RS: ReportStore,
    ID: IdempotencyStore,
    RL: RateLimitStore,
{
    config: OrchestratorConfig,
    queues: HashMap<TaskType, JobQueue>,
    connectors: HashMap<TaskType, Arc<dyn Connector>>,
    job_store: J,
    result_log: R,
    report_store: RS,
    idempotency: IdempotencyManager<ID>,
    rate_limiter: RateLimiter<RL>,
    cancellations: std::sync::Mutex<HashMap<JobId, CancellationToken>>,
}

impl<J, R, RS, ID, RL> Orchestrator<J, R, RS, ID, RL>
where
    J: JobStore + 'static,
    R: ResultLog + 'static,
    RS: ReportStore + 'static,
    ID: IdempotencyStore + 'static,
    RL: RateLimitStore + 'static,
{
    pub fn new(
        config: OrchestratorConfig,
        connectors: HashMap<TaskType, Arc<dyn Connector>>,
        job_store: J,
        result_log: R,
        report_store: RS,
        idempotency_store: ID,
        rate_limit_store: RL,
    ) -> Self {
        let queues = TaskType::ALL.into_iter().map(|t| (t, JobQueue::new())).collect();
        Self {
            config,
            queues,
            connectors,
            job_store,
            result_log,
            report_store,
            idempotency: IdempotencyManager::new(idempotency_store),
            rate_limiter: RateLimiter::new(rate_limit_store),
            cancellations: std::sync::Mutex::new(HashMap::new()),
        }
    }

    /// Accepts a batch submission. Every submission is idempotent: callers
    /// may supply an explicit `idempotency_key`, and when absent one is
    /// derived as a canonical fingerprint of the provider list and option
    /// set, so two identical batches submitted with no key still collapse
    /// onto one job instead of doubling the work.
    #[instrument(skip(self, request))]
    pub async fn submit_batch(&self, request: JobRequest) -> OrchestratorResult<SubmitOutcome> {
        let idempotency_key = match &request.idempotency_key {
            Some(key) => key.clone(),
            None => {
                let fingerprint_input = FingerprintInput { providers: &request.providers, options: request.options };
                self.idempotency.fingerprint(&fingerprint_input, "batch")?
            }
        };

        match self.idempotency.check(&idempotency_key).await? {
            IdempotencyOutcome::CachedCompleted { job_id, .. } => return Ok(SubmitOutcome::Reused(job_id)),
            IdempotencyOutcome::InFlight { job_id, .. } => return Ok(SubmitOutcome::Reused(job_id)),
            IdempotencyOutcome::New => {}
        }

        let mut per_provider_tasks: Vec<(ProviderId, Vec<TaskType>)> = Vec::with_capacity(request.providers.len());
        let mut total_new_tasks = 0usize;
        for provider in &request.providers {
            let mut enabled = request.options.enabled_task_types();
            if provider.document_reference.is_none() {
                enabled.retain(|t| *t != TaskType::Ocr);
            }
            total_new_tasks += enabled.len();
            per_provider_tasks.push((provider.provider_id, enabled));
        }

        let current_depth: usize = {
            let mut sum = 0;
            for queue in self.queues.values() {
                sum += queue.depth().await;
            }
            sum
        };
        if current_depth + total_new_tasks > self.config.max_queue_depth {
            return Err(OrchestratorError::QueueFull {
                depth: current_depth + total_new_tasks,
                high_water_mark: self.config.max_queue_depth,
            });
        }

        let job_id = JobId::new();
        let mut job = Job::new(job_id, request.providers.len(), request.options, request.priority);
        job.idempotency_key = Some(idempotency_key.clone());
        job.status = JobStatus::Running;

        for (provider, (provider_id, enabled)) in request.providers.iter().zip(per_provider_tasks.iter()) {
            job.progress.insert(
                provider_id.to_string(),
                ProviderProgress { enabled_tasks: enabled.len(), completed_tasks: 0, failed_tasks: 0 },
            );
            for task_type in enabled {
                let task = WorkerTask::new(*task_type, job_id, *provider_id, provider.clone());
                self.queues[task_type].push(task, request.priority).await;
            }
        }

        self.job_store.put(job).await?;
        self.cancellations.lock().unwrap().insert(job_id, CancellationToken::new());

        self.idempotency.bind(&idempotency_key, job_id).await?;
        self.idempotency.mark_processing(&idempotency_key).await?;

        info!(%job_id, providers = request.providers.len(), tasks = total_new_tasks, "batch submitted");
        Ok(SubmitOutcome::Created(job_id))
    }

    pub async fn get_job_status(&self, job_id: JobId) -> OrchestratorResult<JobStatusSummary> {
        let job = self.job_store.get(job_id).await?.ok_or(OrchestratorError::JobNotFound(job_id))?;
        Ok(JobStatusSummary {
            job_id: job.job_id,
            status: job.status,
            provider_count: job.provider_count,
            completed_count: job.completed_count(),
            failed_count: job.failed_count(),
            percentage: job.percentage(),
            created_at: job.created_at,
            updated_at: job.updated_at,
            options: job.options,
        })
    }

    pub async fn get_validation_report(&self, job_id: JobId, provider_id: ProviderId) -> OrchestratorResult<Option<ValidationReport>> {
        self.report_store.get(job_id, provider_id).await
    }

    /// Cancels a non-terminal job. Queued tasks for it are drained without
    /// being executed as their workers pop them; in-flight connector calls
    /// are allowed to finish so partial results still feed fusion.
    pub async fn cancel_job(&self, job_id: JobId) -> OrchestratorResult<()> {
        let mut job = self.job_store.get(job_id).await?.ok_or(OrchestratorError::JobNotFound(job_id))?;
        if job.status.is_terminal() {
            return Ok(());
        }
        job.status = JobStatus::Cancelled;
        job.updated_at = chrono::Utc::now();
        self.job_store.put(job).await?;

        if let Some(token) = self.cancellations.lock().unwrap().get(&job_id) {
            token.cancel();
        }
        warn!(%job_id, "job cancelled");
        Ok(())
    }

    fn is_cancelled(&self, job_id: JobId) -> bool {
        self.cancellations
            .lock()
            .unwrap()
            .get(&job_id)
            .map(|t| t.is_cancelled())
            .unwrap_or(false)
    }

    /// Spawns `config.workers_per_queue` tasks per task-type queue. Returns
    /// the join handles so callers can await clean shutdown.
    pub fn spawn_workers(self: &Arc<Self>) -> Vec<JoinHandle<()>> {
        let mut handles = Vec::new();
        for task_type in TaskType::ALL {
            for _ in 0..self.config.workers_per_queue {
                let orchestrator = Arc::clone(self);
                handles.push(tokio::spawn(async move {
                    worker::run(orchestrator, task_type).await;
                }));
            }
        }
        handles
    }

    /// Records one worker's result, advances the owning provider's
    /// progress, fuses it once all its enabled tasks are terminal, and
    /// finalizes the job once every provider has fused.
    async fn finish_task(&self, task: &WorkerTask, result: crate::types::result::WorkerResult) -> OrchestratorResult<()> {
        self.result_log.append(result.clone()).await?;

        let Some(mut job) = self.job_store.get(task.job_id).await? else {
            return Ok(());
        };
        let key = task.provider_id.to_string();
        if let Some(progress) = job.progress.get_mut(&key) {
            progress.completed_tasks += 1;
            if !result.success {
                progress.failed_tasks += 1;
            }
        }
        let provider_fused = job.progress.get(&key).map(|p| p.is_fused()).unwrap_or(false);
        let all_fused = job.progress.values().all(|p| p.is_fused());
        job.updated_at = chrono::Utc::now();
        if all_fused && job.status == JobStatus::Running {
            job.status = JobStatus::Completed;
        }
        let idempotency_key = job.idempotency_key.clone();
        self.job_store.put(job).await?;

        if provider_fused {
            let results = self.result_log.for_provider(task.job_id, task.provider_id).await?;
            let report = fusion::fuse(&results);
            self.report_store.put(report).await?;
        }

        if all_fused {
            if let Some(key) = idempotency_key {
                self.idempotency
                    .mark_completed(&key, serde_json::json!({ "job_id": task.job_id.to_string() }))
                    .await?;
            }
        }

        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::connectors::testing::{MockConnector, SlowMockConnector};
    use crate::idempotency::InMemoryIdempotencyStore;
    use crate::rate_limit::InMemoryRateLimitStore;
    use crate::store::{MemoryJobStore, MemoryReportStore, MemoryResultLog};
    use crate::types::job::{Priority, ValidationOptions};
    use crate::types::provider::ProviderInput;
    use crate::types::result::WorkerResult;
    use std::time::Duration;

    fn provider() -> ProviderInput {
        ProviderInput {
            provider_id: ProviderId::new(),
            given_name: "John".into(),
            family_name: "Smith".into(),
            identifier: Some("1234567897".into()),
            phone: None,
            email: None,
            address_line: None,
            city: None,
            state: None,
            postal_code: None,
            license_number: None,
            license_state: None,
            specialty: None,
            practice_name: None,
            document_reference: None,
        }
    }

    fn options_single(task_type: TaskType) -> ValidationOptions {
        ValidationOptions {
            identifier_check: task_type == TaskType::IdentifierCheck,
            geocode: task_type == TaskType::Geocode,
            ocr: task_type == TaskType::Ocr,
            license_check: task_type == TaskType::LicenseCheck,
            enrichment: task_type == TaskType::Enrichment,
        }
    }

    fn orchestrator_with(
        connector: Arc<dyn Connector>,
        task_type: TaskType,
    ) -> Orchestrator<MemoryJobStore, MemoryResultLog, MemoryReportStore, InMemoryIdempotencyStore, InMemoryRateLimitStore> {
        let mut connectors: HashMap<TaskType, Arc<dyn Connector>> = HashMap::new();
        connectors.insert(task_type, connector);
        Orchestrator::new(
            OrchestratorConfig { max_queue_depth: 100, workers_per_queue: 1 },
            connectors,
            MemoryJobStore::default(),
            MemoryResultLog::default(),
            MemoryReportStore::default(),
            InMemoryIdempotencyStore::default(),
            InMemoryRateLimitStore::default(),
        )
    }

    #[tokio::test]
    async fn submit_enqueues_one_task_per_enabled_source() {
        let orchestrator = Arc::new(orchestrator_with(
            Arc::new(MockConnector::new(WorkerResult::failure(TaskType::IdentifierCheck, JobId::new(), ProviderId::new(), "x"))),
            TaskType::IdentifierCheck,
        ));

        let outcome = orchestrator
            .submit_batch(JobRequest {
                providers: vec![provider()],
                options: options_single(TaskType::IdentifierCheck),
                priority: Priority::Normal,
                idempotency_key: None,
            })
            .await
            .unwrap();

        let SubmitOutcome::Created(job_id) = outcome else { panic!("expected new job") };
        let status = orchestrator.get_job_status(job_id).await.unwrap();
        assert_eq!(status.provider_count, 1);
    }

    #[tokio::test]
    async fn queue_full_rejects_submission() {
        let orchestrator = orchestrator_with(
            Arc::new(MockConnector::new(WorkerResult::failure(TaskType::IdentifierCheck, JobId::new(), ProviderId::new(), "x"))),
            TaskType::IdentifierCheck,
        );
        let mut orchestrator = orchestrator;
        orchestrator.config.max_queue_depth = 0;

        let result = orchestrator
            .submit_batch(JobRequest {
                providers: vec![provider()],
                options: options_single(TaskType::IdentifierCheck),
                priority: Priority::Normal,
                idempotency_key: None,
            })
            .await;

        assert!(matches!(result, Err(OrchestratorError::QueueFull { .. })));
    }

    #[tokio::test]
    async fn worker_fuses_report_once_provider_is_terminal() {
        let response = {
            let mut r = WorkerResult::failure(TaskType::IdentifierCheck, JobId::new(), ProviderId::new(), "unused");
            r.success = true;
            r.task_confidence = 0.9;
            r.fields.insert("given_name".into(), "John".into());
            r.field_confidence.insert("given_name".into(), 0.9);
            r
        };
        let orchestrator = Arc::new(orchestrator_with(Arc::new(MockConnector::new(response)), TaskType::IdentifierCheck));

        let outcome = orchestrator
            .submit_batch(JobRequest {
                providers: vec![provider()],
                options: options_single(TaskType::IdentifierCheck),
                priority: Priority::Normal,
                idempotency_key: None,
            })
            .await
            .unwrap();
        let job_id = outcome.job_id();

        let handles = orchestrator.spawn_workers();
        tokio::time::sleep(Duration::from_millis(100)).await;
        for handle in handles {
            handle.abort();
        }

        let status = orchestrator.get_job_status(job_id).await.unwrap();
        assert_eq!(status.status, JobStatus::Completed);
    }

    /// I5 / end-to-end scenario 6: resubmitting the same idempotency key
    /// while the first job is still in flight returns that job's id rather
    /// than enqueueing a second set of tasks.
    #[tokio::test]
    async fn idempotent_resubmit_reuses_in_flight_job() {
        let orchestrator = Arc::new(orchestrator_with(
            Arc::new(MockConnector::new(WorkerResult::failure(TaskType::IdentifierCheck, JobId::new(), ProviderId::new(), "x"))),
            TaskType::IdentifierCheck,
        ));

        let request = || JobRequest {
            providers: vec![provider()],
            options: options_single(TaskType::IdentifierCheck),
            priority: Priority::Normal,
            idempotency_key: Some("batch-1".into()),
        };

        let first = orchestrator.submit_batch(request()).await.unwrap();
        let SubmitOutcome::Created(first_job_id) = first else { panic!("expected new job") };

        let second = orchestrator.submit_batch(request()).await.unwrap();
        assert_eq!(second, SubmitOutcome::Reused(first_job_id));

        // No second job was created: only one job has any progress recorded.
        let status = orchestrator.get_job_status(first_job_id).await.unwrap();
        assert_eq!(status.provider_count, 1);
    }

    /// I5: once the first job completes, a resubmit with the same key still
    /// resolves to the original job id via the cached-completed path.
    #[tokio::test]
    async fn idempotent_resubmit_after_completion_reuses_job_id() {
        let response = {
            let mut r = WorkerResult::failure(TaskType::IdentifierCheck, JobId::new(), ProviderId::new(), "unused");
            r.success = true;
            r.task_confidence = 0.9;
            r.fields.insert("given_name".into(), "John".into());
            r.field_confidence.insert("given_name".into(), 0.9);
            r
        };
        let orchestrator = Arc::new(orchestrator_with(Arc::new(MockConnector::new(response)), TaskType::IdentifierCheck));

        let request = || JobRequest {
            providers: vec![provider()],
            options: options_single(TaskType::IdentifierCheck),
            priority: Priority::Normal,
            idempotency_key: Some("batch-2".into()),
        };

        let first = orchestrator.submit_batch(request()).await.unwrap();
        let first_job_id = first.job_id();

        let handles = orchestrator.spawn_workers();
        tokio::time::sleep(Duration::from_millis(100)).await;
        for handle in handles {
            handle.abort();
        }
        assert_eq!(orchestrator.get_job_status(first_job_id).await.unwrap().status, JobStatus::Completed);

        let second = orchestrator.submit_batch(request()).await.unwrap();
        assert_eq!(second, SubmitOutcome::Reused(first_job_id));
    }

    /// §4.7: with no explicit `idempotency_key`, two submissions of the
    /// byte-identical batch still collapse onto one job via the default
    /// request fingerprint, rather than creating two jobs and doubling the
    /// work.
    #[tokio::test]
    async fn identical_batches_with_no_explicit_key_collapse_onto_one_job() {
        let orchestrator = Arc::new(orchestrator_with(
            Arc::new(MockConnector::new(WorkerResult::failure(TaskType::IdentifierCheck, JobId::new(), ProviderId::new(), "x"))),
            TaskType::IdentifierCheck,
        ));

        let shared_provider = provider();
        let request = || JobRequest {
            providers: vec![shared_provider.clone()],
            options: options_single(TaskType::IdentifierCheck),
            priority: Priority::Normal,
            idempotency_key: None,
        };

        let first = orchestrator.submit_batch(request()).await.unwrap();
        let SubmitOutcome::Created(first_job_id) = first else { panic!("expected new job") };

        let second = orchestrator.submit_batch(request()).await.unwrap();
        assert_eq!(second, SubmitOutcome::Reused(first_job_id));
    }

    /// I9: after cancellation, a worker that pops an already-queued task for
    /// that job discards its result instead of persisting it.
    #[tokio::test]
    async fn cancelled_job_persists_no_new_worker_result() {
        let response = {
            let mut r = WorkerResult::failure(TaskType::IdentifierCheck, JobId::new(), ProviderId::new(), "unused");
            r.success = true;
            r
        };
        let orchestrator = Arc::new(orchestrator_with(Arc::new(MockConnector::new(response)), TaskType::IdentifierCheck));

        let submitted_provider = provider();
        let provider_id = submitted_provider.provider_id;
        let outcome = orchestrator
            .submit_batch(JobRequest {
                providers: vec![submitted_provider],
                options: options_single(TaskType::IdentifierCheck),
                priority: Priority::Normal,
                idempotency_key: None,
            })
            .await
            .unwrap();
        let job_id = outcome.job_id();

        orchestrator.cancel_job(job_id).await.unwrap();

        let handles = orchestrator.spawn_workers();
        tokio::time::sleep(Duration::from_millis(100)).await;
        for handle in handles {
            handle.abort();
        }

        let results = orchestrator.result_log.for_provider(job_id, provider_id).await.unwrap();
        assert!(results.is_empty(), "cancellation must not persist a WorkerResult");

        let report = orchestrator.get_validation_report(job_id, provider_id).await.unwrap();
        assert!(report.is_none());
        let status = orchestrator.get_job_status(job_id).await.unwrap();
        assert_eq!(status.status, JobStatus::Cancelled);
    }

    /// I9, mid-flight variant: a job cancelled while its one outstanding
    /// connector call is still running must still have that call's result
    /// discarded rather than persisted, even though the worker already
    /// passed the pre-call cancellation check.
    #[tokio::test]
    async fn cancellation_during_connector_call_discards_result() {
        let response = {
            let mut r = WorkerResult::failure(TaskType::IdentifierCheck, JobId::new(), ProviderId::new(), "unused");
            r.success = true;
            r
        };
        let connector = Arc::new(SlowMockConnector::new(Duration::from_millis(150), response));
        let orchestrator = Arc::new(orchestrator_with(connector, TaskType::IdentifierCheck));

        let submitted_provider = provider();
        let provider_id = submitted_provider.provider_id;
        let outcome = orchestrator
            .submit_batch(JobRequest {
                providers: vec![submitted_provider],
                options: options_single(TaskType::IdentifierCheck),
                priority: Priority::Normal,
                idempotency_key: None,
            })
            .await
            .unwrap();
        let job_id = outcome.job_id();

        let handles = orchestrator.spawn_workers();
        // Give the worker time to pop the task and enter the (slow) connector
        // call before cancelling, so cancellation lands mid-flight rather
        // than before the pre-call check.
        tokio::time::sleep(Duration::from_millis(50)).await;
        orchestrator.cancel_job(job_id).await.unwrap();
        tokio::time::sleep(Duration::from_millis(200)).await;
        for handle in handles {
            handle.abort();
        }

        let results = orchestrator.result_log.for_provider(job_id, provider_id).await.unwrap();
        assert!(results.is_empty(), "a result produced after cancellation must not be persisted");

        let report = orchestrator.get_validation_report(job_id, provider_id).await.unwrap();
        assert!(report.is_none());
    }
}
