//! `validate status` — print a job's status summary as JSON.
//!
//! This binary keeps no state across invocations (the orchestrator's
//! stores are in-memory and rebuilt fresh each run), so this command is
//! only useful when exercised against a job still live in the same
//! process as `submit` — it exists to demonstrate the read-path shape of
//! the orchestrator API, not as a standalone query tool.

use anyhow::Result;
use uuid::Uuid;

use validation_core::JobId;

pub async fn run(job_id: Uuid) -> Result<()> {
    let orchestrator = crate::app::build_orchestrator();
    let status = orchestrator.get_job_status(JobId::from(job_id)).await?;
    println!("{}", serde_json::to_string_pretty(&status)?);
    Ok(())
}
