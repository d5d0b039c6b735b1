//! `validate report` — print one provider's fused validation report as
//! JSON. See `cmd::status` for why this only resolves within a single
//! CLI process that also ran `submit`.

use anyhow::{Context, Result};
use uuid::Uuid;

use validation_core::{JobId, ProviderId};

pub async fn run(job_id: Uuid, provider_id: Uuid) -> Result<()> {
    let orchestrator = crate::app::build_orchestrator();
    let report = orchestrator
        .get_validation_report(JobId::from(job_id), ProviderId::from(provider_id))
        .await?
        .with_context(|| format!("no report for job {job_id} / provider {provider_id}"))?;
    println!("{}", serde_json::to_string_pretty(&report)?);
    Ok(())
}
