//! `validate submit` — load a batch of providers from disk, run it to
//! completion against an in-memory orchestrator, and print the job id
//! plus the per-provider reports fusion produced.

use std::path::Path;
use std::time::Duration;

use anyhow::{Context, Result};
use serde::Deserialize;
use tracing::info;

use validation_core::{JobRequest, JobStatus, Priority, ProviderInput, SubmitOutcome, ValidationOptions};

/// On-disk shape for a submission: either a bare array of providers (all
/// sources enabled, normal priority) or the full object form.
#[derive(Debug, Deserialize)]
#[serde(untagged)]
enum SubmissionFile {
    Providers(Vec<ProviderInput>),
    Full {
        providers: Vec<ProviderInput>,
        #[serde(default)]
        priority: Priority,
        #[serde(default)]
        idempotency_key: Option<String>,
    },
}

/// Polling budget while waiting for the batch to reach a terminal state.
/// Generous relative to the mock connectors' near-instant responses; a
/// real deployment would size this off `TaskType::deadline()` instead.
const POLL_INTERVAL: Duration = Duration::from_millis(50);
const POLL_TIMEOUT: Duration = Duration::from_secs(30);

pub async fn run(path: &Path, disable_source: &[String]) -> Result<()> {
    let raw = std::fs::read_to_string(path).with_context(|| format!("reading {}", path.display()))?;
    let parsed: SubmissionFile = serde_json::from_str(&raw).with_context(|| format!("parsing {}", path.display()))?;

    let (providers, priority, idempotency_key) = match parsed {
        SubmissionFile::Providers(providers) => (providers, Priority::default(), None),
        SubmissionFile::Full { providers, priority, idempotency_key } => (providers, priority, idempotency_key),
    };
    if providers.is_empty() {
        anyhow::bail!("{} contains no providers", path.display());
    }

    let options = options_with_disabled(disable_source)?;
    let provider_ids: Vec<_> = providers.iter().map(|p| p.provider_id).collect();
    let orchestrator = crate::app::build_orchestrator();
    let workers = orchestrator.spawn_workers();

    let outcome = orchestrator
        .submit_batch(JobRequest { providers, options, priority, idempotency_key })
        .await?;
    let job_id = outcome.job_id();
    match outcome {
        SubmitOutcome::Created(_) => info!(%job_id, "batch submitted"),
        SubmitOutcome::Reused(_) => info!(%job_id, "resolved to an in-flight or completed job via idempotency key"),
    }

    let deadline = std::time::Instant::now() + POLL_TIMEOUT;
    let status = loop {
        let status = orchestrator.get_job_status(job_id).await?;
        if status.status != JobStatus::Running && status.status != JobStatus::Pending {
            break status;
        }
        if std::time::Instant::now() >= deadline {
            anyhow::bail!("job {job_id} did not reach a terminal state within {:?}", POLL_TIMEOUT);
        }
        tokio::time::sleep(POLL_INTERVAL).await;
    };

    for handle in workers {
        handle.abort();
    }

    println!("{}", serde_json::to_string_pretty(&status)?);

    for provider_id in provider_ids {
        if let Some(report) = orchestrator.get_validation_report(job_id, provider_id).await? {
            println!("{}", serde_json::to_string_pretty(&report)?);
        }
    }

    Ok(())
}

fn options_with_disabled(disable_source: &[String]) -> Result<ValidationOptions> {
    let mut options = ValidationOptions::default();
    for source in disable_source {
        match source.as_str() {
            "identifier_check" => options.identifier_check = false,
            "geocode" => options.geocode = false,
            "ocr" => options.ocr = false,
            "license_check" => options.license_check = false,
            "enrichment" => options.enrichment = false,
            other => anyhow::bail!(
                "unknown source '{other}'; expected one of identifier_check, geocode, ocr, license_check, enrichment"
            ),
        }
    }
    Ok(options)
}
