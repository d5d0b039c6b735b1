//! Third-party enrichment connector.
//!
//! Grounded on `services/validator.py`'s `enrichment_lookup_worker`: a
//! best-effort supplemental lookup for phone, email, affiliations, and
//! services offered. Unlike the other connectors there's no hard negative
//! case here — an enrichment source either adds what it has or adds
//! nothing, always at moderate confidence.

use async_trait::async_trait;
use std::collections::HashMap;
use std::time::Instant;

use crate::error::ConnectorError;
use crate::retry::circuit_breaker::CircuitBreakerRegistry;
use crate::retry::RetryExecutor;
use crate::types::config::{CircuitBreakerConfig, RetryConfig};
use crate::types::fields;
use crate::types::ids::{JobId, ProviderId};
use crate::types::job::ValidationOptions;
use crate::types::provider::ProviderInput;
use crate::types::result::WorkerResult;
use crate::types::task::TaskType;

use super::Connector;

const ENRICHMENT_CONFIDENCE: f64 = 0.55;

/// Supplemental attributes a third-party enrichment source might add.
#[derive(Debug, Clone, Default)]
pub struct EnrichmentMatch {
    pub primary_phone: Option<String>,
    pub email: Option<String>,
    pub affiliations: Vec<String>,
    pub services_offered: Vec<String>,
}

pub struct EnrichmentConnector<F> {
    lookup: F,
    breakers: CircuitBreakerRegistry,
    retry: RetryConfig,
}

impl<F, Fut> EnrichmentConnector<F>
where
    F: Fn(String) -> Fut + Send + Sync,
    Fut: std::future::Future<Output = Result<EnrichmentMatch, ConnectorError>> + Send,
{
    pub fn new(lookup: F) -> Self {
        Self {
            lookup,
            breakers: CircuitBreakerRegistry::new(CircuitBreakerConfig::generic()),
            retry: RetryConfig::fast_api(),
        }
    }
}

#[async_trait]
impl<F, Fut> Connector for EnrichmentConnector<F>
where
    F: Fn(String) -> Fut + Send + Sync,
    Fut: std::future::Future<Output = Result<EnrichmentMatch, ConnectorError>> + Send,
{
    async fn execute(
        &self,
        job_id: JobId,
        provider_id: ProviderId,
        payload: &ProviderInput,
        _options: &ValidationOptions,
    ) -> WorkerResult {
        let started = Instant::now();
        let task_type = TaskType::Enrichment;

        let key = payload
            .identifier
            .clone()
            .unwrap_or_else(|| format!("{} {}", payload.given_name, payload.family_name));

        let executor = RetryExecutor::new(self.retry, &self.breakers);
        let result = executor.execute("enrichment", || (self.lookup)(key.clone())).await;

        match result {
            Ok(matched) => {
                let mut fields_map = HashMap::new();
                let mut field_confidence = HashMap::new();

                if let Some(phone) = &matched.primary_phone {
                    fields_map.insert(fields::PRIMARY_PHONE.to_string(), phone.clone().into());
                    field_confidence.insert(fields::PRIMARY_PHONE.to_string(), ENRICHMENT_CONFIDENCE);
                }
                if let Some(email) = &matched.email {
                    fields_map.insert(fields::EMAIL.to_string(), email.clone().into());
                    field_confidence.insert(fields::EMAIL.to_string(), ENRICHMENT_CONFIDENCE);
                }
                if !matched.affiliations.is_empty() {
                    fields_map.insert(fields::AFFILIATIONS.to_string(), matched.affiliations.clone().into());
                    field_confidence.insert(fields::AFFILIATIONS.to_string(), ENRICHMENT_CONFIDENCE);
                }
                if !matched.services_offered.is_empty() {
                    fields_map.insert(fields::SERVICES_OFFERED.to_string(), matched.services_offered.clone().into());
                    field_confidence.insert(fields::SERVICES_OFFERED.to_string(), ENRICHMENT_CONFIDENCE);
                }

                WorkerResult {
                    task_type,
                    job_id,
                    provider_id,
                    success: true,
                    fields: fields_map,
                    field_confidence,
                    task_confidence: ENRICHMENT_CONFIDENCE,
                    error: None,
                    processing_duration: started.elapsed(),
                    timestamp: chrono::Utc::now(),
                }
            }
            Err(err) => WorkerResult::failure(task_type, job_id, provider_id, err.to_string()),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn payload() -> ProviderInput {
        ProviderInput {
            provider_id: ProviderId::new(),
            given_name: "John".into(),
            family_name: "Smith".into(),
            identifier: None,
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

    #[tokio::test]
    async fn populated_match_succeeds_at_moderate_confidence() {
        let connector = EnrichmentConnector::new(|_key: String| async {
            Ok(EnrichmentMatch {
                primary_phone: Some("555-0100".into()),
                email: Some("john@example.com".into()),
                affiliations: vec!["General Hospital".into()],
                services_offered: Vec::new(),
            })
        });

        let result = connector
            .execute(JobId::new(), ProviderId::new(), &payload(), &ValidationOptions::default())
            .await;

        assert!(result.success);
        assert_eq!(result.task_confidence, ENRICHMENT_CONFIDENCE);
        assert!(result.fields.contains_key(fields::AFFILIATIONS));
    }

    #[tokio::test]
    async fn empty_match_still_succeeds_with_no_fields() {
        let connector = EnrichmentConnector::new(|_key: String| async { Ok(EnrichmentMatch::default()) });
        let result = connector
            .execute(JobId::new(), ProviderId::new(), &payload(), &ValidationOptions::default())
            .await;
        assert!(result.success);
        assert!(result.fields.is_empty());
    }

    #[tokio::test]
    async fn transport_error_fails() {
        let connector = EnrichmentConnector::new(|_key: String| async {
            Err(ConnectorError::Permanent("unreachable".into()))
        });
        let result = connector
            .execute(JobId::new(), ProviderId::new(), &payload(), &ValidationOptions::default())
            .await;
        assert!(!result.success);
    }
}
