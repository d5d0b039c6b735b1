//! State licensing-board connector.
//!
//! Grounded on `connectors/state_board_connector.py` and
//! `connectors/robots_compliance.py`: one adapter body parameterized by a
//! `StateBoardConfig` services every state instead of branching per state,
//! and every fetch is gated on a politeness check first — a disallowed
//! path never reaches the network.

use async_trait::async_trait;
use std::collections::HashMap;
use std::time::Instant;

use crate::error::ConnectorError;
use crate::politeness::{PolitenessDecision, PolitenessLayer};
use crate::retry::circuit_breaker::CircuitBreakerRegistry;
use crate::retry::RetryExecutor;
use crate::types::config::StateBoardConfig;
use crate::types::fields;
use crate::types::ids::{JobId, ProviderId};
use crate::types::job::ValidationOptions;
use crate::types::provider::ProviderInput;
use crate::types::result::WorkerResult;
use crate::types::task::TaskType;

use super::Connector;

/// What the board's search page yielded for one license lookup.
#[derive(Debug, Clone, Default)]
pub struct LicenseLookup {
    pub provider_name: Option<String>,
    pub status: Option<String>,
    pub issue_date: Option<String>,
    pub expiry_date: Option<String>,
    pub board_actions: Vec<String>,
}

/// Fetches and parses one state board's license-lookup page. The fetch is
/// injected so the adapter is exercisable without network access; a real
/// deployment plugs in a `reqwest` GET against `config.search_url` plus
/// whatever HTML-scraping the selectors in `config.selectors` drive.
pub struct LicenseBoardConnector<F> {
    config: StateBoardConfig,
    politeness: std::sync::Arc<PolitenessLayer>,
    fetch: F,
    breakers: CircuitBreakerRegistry,
}

impl<F, Fut> LicenseBoardConnector<F>
where
    F: Fn(String) -> Fut + Send + Sync,
    Fut: std::future::Future<Output = Result<Option<LicenseLookup>, ConnectorError>> + Send,
{
    pub fn new(config: StateBoardConfig, politeness: std::sync::Arc<PolitenessLayer>, fetch: F) -> Self {
        let breakers = CircuitBreakerRegistry::new(config.circuit_breaker);
        Self { config, politeness, fetch, breakers }
    }

    fn origin(&self) -> String {
        self.config.base_url.trim_end_matches('/').to_string()
    }

    fn path(&self) -> String {
        self.config
            .search_url
            .strip_prefix(&self.config.base_url)
            .unwrap_or(&self.config.search_url)
            .to_string()
    }
}

/// Canonical license-status vocabulary fusion's flag rules key off of.
const CANONICAL_STATUSES: &[&str] = &["active", "expired", "suspended", "revoked", "inactive", "pending", "probation"];

/// Normalizes a board's free-text status into the canonical lowercase set,
/// so downstream flag derivation (`SUSPENDED_LICENSE` etc.) matches
/// regardless of the board's own casing or punctuation (`"SUSPENDED"`,
/// `"Active"`, `"Resolved"` all show up across real board responses).
fn normalize_status(raw: &str) -> String {
    let lower = raw.trim().to_lowercase();
    if CANONICAL_STATUSES.contains(&lower.as_str()) {
        return lower;
    }
    match lower.as_str() {
        "resolved" | "in good standing" | "current" => "active".to_string(),
        "lapsed" => "expired".to_string(),
        "disciplinary action" | "disciplined" => "probation".to_string(),
        _ => lower,
    }
}

/// `base 0.80, +0.2 clear status text, +0.2 non-empty provider name,
/// -0.1 absent status`, clamped to `[0, 1]`.
fn confidence_for(lookup: &LicenseLookup) -> f64 {
    let mut confidence = 0.80;
    match &lookup.status {
        Some(status) if !status.trim().is_empty() => confidence += 0.2,
        _ => confidence -= 0.1,
    }
    if lookup.provider_name.as_deref().is_some_and(|n| !n.trim().is_empty()) {
        confidence += 0.2;
    }
    confidence.clamp(0.0, 1.0)
}

#[async_trait]
impl<F, Fut> Connector for LicenseBoardConnector<F>
where
    F: Fn(String) -> Fut + Send + Sync,
    Fut: std::future::Future<Output = Result<Option<LicenseLookup>, ConnectorError>> + Send,
{
    async fn execute(
        &self,
        job_id: JobId,
        provider_id: ProviderId,
        payload: &ProviderInput,
        _options: &ValidationOptions,
    ) -> WorkerResult {
        let started = Instant::now();
        let task_type = TaskType::LicenseCheck;

        let Some(license_state) = &payload.license_state else {
            return WorkerResult::failure(task_type, job_id, provider_id, "MISSING_LICENSE_STATE");
        };
        if !license_state.eq_ignore_ascii_case(&self.config.state_code) {
            return WorkerResult::failure(task_type, job_id, provider_id, "UNSUPPORTED_STATE");
        }

        let key = payload
            .license_number
            .clone()
            .unwrap_or_else(|| format!("{} {}", payload.given_name, payload.family_name));

        let origin = self.origin();
        let path = self.path();
        if self.politeness.check(&origin, &path).await == PolitenessDecision::Disallowed {
            return WorkerResult::failure(task_type, job_id, provider_id, "ROBOTS_BLOCKED");
        }

        let executor = RetryExecutor::new(self.config.retry, &self.breakers);
        let result = executor.execute(&format!("license_board_{}", self.config.state_code), || (self.fetch)(key.clone())).await;

        match result {
            Ok(Some(lookup)) => {
                let confidence = confidence_for(&lookup);
                if confidence <= 0.5 {
                    return WorkerResult::failure(task_type, job_id, provider_id, "LOW_CONFIDENCE_MATCH");
                }

                let mut fields_map = HashMap::new();
                let mut field_confidence = HashMap::new();

                if let Some(name) = &lookup.provider_name {
                    fields_map.insert(fields::PRACTICE_NAME.to_string(), name.clone().into());
                    field_confidence.insert(fields::PRACTICE_NAME.to_string(), confidence);
                }
                if let Some(status) = &lookup.status {
                    fields_map.insert(fields::LICENSE_STATUS.to_string(), normalize_status(status).into());
                    field_confidence.insert(fields::LICENSE_STATUS.to_string(), confidence);
                }
                if let Some(issue_date) = &lookup.issue_date {
                    fields_map.insert(fields::LICENSE_ISSUE_DATE.to_string(), issue_date.clone().into());
                    field_confidence.insert(fields::LICENSE_ISSUE_DATE.to_string(), confidence);
                }
                if let Some(expiry_date) = &lookup.expiry_date {
                    fields_map.insert(fields::LICENSE_EXPIRY_DATE.to_string(), expiry_date.clone().into());
                    field_confidence.insert(fields::LICENSE_EXPIRY_DATE.to_string(), confidence);
                }
                if !lookup.board_actions.is_empty() {
                    fields_map.insert(fields::BOARD_ACTIONS.to_string(), lookup.board_actions.clone().into());
                    field_confidence.insert(fields::BOARD_ACTIONS.to_string(), confidence);
                }
                if let Some(number) = &payload.license_number {
                    fields_map.insert(fields::LICENSE_NUMBER.to_string(), number.clone().into());
                    field_confidence.insert(fields::LICENSE_NUMBER.to_string(), confidence);
                }

                WorkerResult {
                    task_type,
                    job_id,
                    provider_id,
                    success: true,
                    fields: fields_map,
                    field_confidence,
                    task_confidence: confidence,
                    error: None,
                    processing_duration: started.elapsed(),
                    timestamp: chrono::Utc::now(),
                }
            }
            Ok(None) => WorkerResult::failure(task_type, job_id, provider_id, "NOT_FOUND"),
            Err(err) => WorkerResult::failure(task_type, job_id, provider_id, err.to_string()),
        }
    }
}
