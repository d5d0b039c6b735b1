//! Command-line front end for the provider-validation orchestrator.
//!
//! Demo/dev tooling: exercises `validation-core` end to end against an
//! in-memory orchestrator wired to offline connector stubs. Not a product
//! API — no auth, no persistence across invocations.

mod app;
mod cmd;
mod connectors_demo;

use std::path::PathBuf;
use std::process::ExitCode;

use clap::{Parser, Subcommand};
use uuid::Uuid;

#[derive(Parser)]
#[command(name = "validate")]
#[command(about = "Provider-validation orchestrator CLI")]
#[command(version)]
struct Cli {
    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Submit a batch of providers from a JSON file and run it to completion.
    Submit {
        /// Path to a JSON file: either a bare array of providers, or
        /// `{"providers": [...], "priority": "normal", "idempotency_key": null}`.
        providers: PathBuf,
        /// Disable a source for this batch; repeatable. One of:
        /// identifier_check, geocode, ocr, license_check, enrichment.
        #[arg(long = "source", value_name = "NAME=false")]
        disable_source: Vec<String>,
    },
    /// Print a job's status summary as JSON.
    Status {
        /// Job id minted by `submit`.
        job_id: Uuid,
    },
    /// Print one provider's fused validation report as JSON.
    Report {
        /// Job id minted by `submit`.
        job_id: Uuid,
        /// Provider id from the submitted batch.
        provider_id: Uuid,
    },
}

fn main() -> ExitCode {
    let _ = dotenvy::dotenv();
    tracing_subscriber::fmt()
        .with_env_filter(tracing_subscriber::EnvFilter::from_default_env())
        .init();

    let runtime = match tokio::runtime::Runtime::new() {
        Ok(rt) => rt,
        Err(err) => {
            eprintln!("validate: failed to start async runtime: {err:#}");
            return ExitCode::FAILURE;
        }
    };

    if let Err(err) = runtime.block_on(real_main()) {
        eprintln!("validate: {err:#}");
        return ExitCode::FAILURE;
    }
    ExitCode::SUCCESS
}

async fn real_main() -> anyhow::Result<()> {
    let cli = Cli::parse();

    match cli.command {
        Commands::Submit { providers, disable_source } => {
            let disabled = parse_disable_flags(&disable_source)?;
            cmd::submit::run(&providers, &disabled).await
        }
        Commands::Status { job_id } => cmd::status::run(job_id).await,
        Commands::Report { job_id, provider_id } => cmd::report::run(job_id, provider_id).await,
    }
}

/// Accepts either a bare source name (disables it) or `name=false`/`name=true`
/// (only `name=false` has any effect; `name=true` is a no-op since every
/// source defaults on).
fn parse_disable_flags(flags: &[String]) -> anyhow::Result<Vec<String>> {
    let mut disabled = Vec::with_capacity(flags.len());
    for flag in flags {
        match flag.split_once('=') {
            Some((name, value)) => {
                if value.eq_ignore_ascii_case("false") {
                    disabled.push(name.to_string());
                } else if !value.eq_ignore_ascii_case("true") {
                    anyhow::bail!("invalid --source value '{flag}', expected name=false or name=true");
                }
            }
            None => disabled.push(flag.clone()),
        }
    }
    Ok(disabled)
}
