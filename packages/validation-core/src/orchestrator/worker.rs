//! Per-queue worker loop: pop, pace, execute, record.

use std::sync::Arc;
use std::time::Duration;

use tracing::{debug, error};

use crate::idempotency::IdempotencyStore;
use crate::rate_limit::RateLimitStore;
use crate::store::{JobStore, ReportStore, ResultLog};
use crate::types::result::WorkerResult;
use crate::types::task::TaskType;

use super::Orchestrator;

/// Empty-queue backoff. Short enough that a freshly enqueued task is
/// picked up promptly, long enough to not spin the executor.
const IDLE_BACKOFF: Duration = Duration::from_millis(50);

pub(super) async fn run<J, R, RS, ID, RL>(orchestrator: Arc<Orchestrator<J, R, RS, ID, RL>>, task_type: TaskType)
where
    J: JobStore + 'static,
    R: ResultLog + 'static,
    RS: ReportStore + 'static,
    ID: IdempotencyStore + 'static,
    RL: RateLimitStore + 'static,
{
    loop {
        let Some(task) = orchestrator.queues[&task_type].pop().await else {
            tokio::time::sleep(IDLE_BACKOFF).await;
            continue;
        };

        if orchestrator.is_cancelled(task.job_id) {
            debug!(job_id = %task.job_id, "dropping task for cancelled job, no result recorded");
            continue;
        }

        orchestrator.rate_limiter.wait(task_type.source_name()).await;

        let result = match orchestrator.connectors.get(&task_type) {
            Some(connector) => {
                connector
                    .execute(task.job_id, task.provider_id, &task.payload, &orchestrator_options(&orchestrator, task.job_id).await)
                    .await
            }
            None => WorkerResult::failure(task_type, task.job_id, task.provider_id, "NO_CONNECTOR_REGISTERED"),
        };

        if orchestrator.is_cancelled(task.job_id) {
            debug!(job_id = %task.job_id, "discarding result for cancelled job, no result recorded");
            continue;
        }

        if let Err(err) = orchestrator.finish_task(&task, result).await {
            error!(job_id = %task.job_id, error = %err, "failed to record task result");
        }
    }
}

/// Workers execute against the job's submitted option set; tasks that
/// shouldn't run are never enqueued in the first place, so this only
/// matters for connectors that branch on `ValidationOptions` themselves.
async fn orchestrator_options<J, R, RS, ID, RL>(
    orchestrator: &Arc<Orchestrator<J, R, RS, ID, RL>>,
    job_id: crate::types::ids::JobId,
) -> crate::types::job::ValidationOptions
where
    J: JobStore + 'static,
    R: ResultLog + 'static,
    RS: ReportStore + 'static,
    ID: IdempotencyStore + 'static,
    RL: RateLimitStore + 'static,
{
    orchestrator
        .job_store
        .get(job_id)
        .await
        .ok()
        .flatten()
        .map(|job| job.options)
        .unwrap_or_default()
}
