//! National identifier registry connector.
//!
//! Grounded on `connectors/npi.py`'s `_validate_npi_format`: strip
//! non-digits, require exactly 10 digits, then a Luhn checksum. A 10-digit
//! identifier failing the checksum never reaches the remote lookup — it
//! fails fast with `INVALID_IDENTIFIER`.

use async_trait::async_trait;
use std::collections::HashMap;
use std::time::Instant;

use crate::retry::circuit_breaker::CircuitBreakerRegistry;
use crate::retry::RetryExecutor;
use crate::types::config::RetryConfig;
use crate::types::fields;
use crate::types::ids::{JobId, ProviderId};
use crate::types::job::ValidationOptions;
use crate::types::provider::ProviderInput;
use crate::types::result::WorkerResult;

use super::Connector;

/// Looks up a provider by their national identifier or by name. In this
/// crate the remote registry is represented by an injected closure so the
/// connector is exercisable offline; a real deployment would swap in an
/// HTTP-backed lookup behind the same signature.
pub struct IdentifierRegistryConnector<F> {
    lookup: F,
    breakers: CircuitBreakerRegistry,
    retry: RetryConfig,
}

/// Normalized fields the registry can return for a matched provider.
#[derive(Debug, Clone, Default)]
pub struct RegistryMatch {
    pub given_name: Option<String>,
    pub family_name: Option<String>,
    pub primary_specialty: Option<String>,
    pub practice_name: Option<String>,
    pub address_line: Option<String>,
    pub city: Option<String>,
    pub state: Option<String>,
    pub postal_code: Option<String>,
    pub primary_phone: Option<String>,
    pub email: Option<String>,
}

use crate::error::ConnectorError;

impl<F, Fut> IdentifierRegistryConnector<F>
where
    F: Fn(String) -> Fut + Send + Sync,
    Fut: std::future::Future<Output = Result<Option<RegistryMatch>, ConnectorError>> + Send,
{
    pub fn new(lookup: F) -> Self {
        Self {
            lookup,
            breakers: CircuitBreakerRegistry::new(crate::types::config::CircuitBreakerConfig::generic()),
            retry: RetryConfig::fast_api(),
        }
    }
}

/// Strip non-digits, require exactly 10 digits, Luhn checksum mod 10 == 0.
/// A malformed identifier never reaches the lookup; the caller fails fast.
pub fn validate_checksum(identifier: &str) -> bool {
    let digits: Vec<u32> = identifier.chars().filter_map(|c| c.to_digit(10)).collect();
    if digits.len() != 10 {
        return false;
    }

    let mut checksum = 0u32;
    for (i, &digit) in digits.iter().rev().enumerate() {
        if i % 2 == 0 {
            checksum += digit;
        } else {
            let doubled = digit * 2;
            checksum += doubled / 10 + doubled % 10;
        }
    }
    checksum % 10 == 0
}

#[async_trait]
impl<F, Fut> Connector for IdentifierRegistryConnector<F>
where
    F: Fn(String) -> Fut + Send + Sync,
    Fut: std::future::Future<Output = Result<Option<RegistryMatch>, ConnectorError>> + Send,
{
    async fn execute(
        &self,
        job_id: JobId,
        provider_id: ProviderId,
        payload: &ProviderInput,
        _options: &ValidationOptions,
    ) -> WorkerResult {
        let started = Instant::now();
        let task_type = crate::types::task::TaskType::IdentifierCheck;

        if let Some(identifier) = &payload.identifier {
            if !validate_checksum(identifier) {
                return WorkerResult::failure(task_type, job_id, provider_id, "INVALID_IDENTIFIER");
            }
        }

        let key = payload
            .identifier
            .clone()
            .unwrap_or_else(|| format!("{} {}", payload.given_name, payload.family_name));

        let executor = RetryExecutor::new(self.retry, &self.breakers);
        let result = executor.execute("identifier_check", || (self.lookup)(key.clone())).await;

        match result {
            Ok(Some(matched)) => {
                let direct_lookup = payload.identifier.is_some();
                let mut fields_map = HashMap::new();
                let mut confidence = HashMap::new();

                if let Some(id) = &payload.identifier {
                    fields_map.insert(fields::IDENTIFIER.to_string(), id.clone().into());
                    confidence.insert(fields::IDENTIFIER.to_string(), if direct_lookup { 0.97 } else { 0.0 });
                }
                insert_opt(&mut fields_map, &mut confidence, fields::GIVEN_NAME, &matched.given_name, 0.88);
                insert_opt(&mut fields_map, &mut confidence, fields::FAMILY_NAME, &matched.family_name, 0.88);
                insert_opt(&mut fields_map, &mut confidence, fields::PRIMARY_SPECIALTY, &matched.primary_specialty, 0.88);
                insert_opt(&mut fields_map, &mut confidence, fields::PRACTICE_NAME, &matched.practice_name, 0.85);
                insert_opt(&mut fields_map, &mut confidence, fields::ADDRESS_LINE, &matched.address_line, 0.85);
                insert_opt(&mut fields_map, &mut confidence, fields::CITY, &matched.city, 0.85);
                insert_opt(&mut fields_map, &mut confidence, fields::STATE, &matched.state, 0.85);
                insert_opt(&mut fields_map, &mut confidence, fields::POSTAL_CODE, &matched.postal_code, 0.85);
                insert_opt(&mut fields_map, &mut confidence, fields::PRIMARY_PHONE, &matched.primary_phone, 0.70);
                if let Some(email) = &matched.email {
                    fields_map.insert(fields::EMAIL.to_string(), email.clone().into());
                    confidence.insert(fields::EMAIL.to_string(), 0.60);
                }

                let task_confidence = confidence.values().copied().fold(0.0_f64, f64::max);

                WorkerResult {
                    task_type,
                    job_id,
                    provider_id,
                    success: true,
                    fields: fields_map,
                    field_confidence: confidence,
                    task_confidence,
                    error: None,
                    processing_duration: started.elapsed(),
                    timestamp: chrono::Utc::now(),
                }
            }
            Ok(None) => WorkerResult::failure(task_type, job_id, provider_id, "MISSING_IDENTIFIER"),
            Err(err) => WorkerResult::failure(task_type, job_id, provider_id, err.to_string()),
        }
    }
}

fn insert_opt(
    fields_map: &mut HashMap<String, crate::types::result::NormalizedValue>,
    confidence: &mut HashMap<String, f64>,
    key: &str,
    value: &Option<String>,
    field_confidence: f64,
) {
    if let Some(v) = value {
        fields_map.insert(key.to_string(), v.clone().into());
        confidence.insert(key.to_string(), field_confidence);
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn valid_npi_checksum_passes() {
        assert!(validate_checksum("1234567897"));
    }

    #[test]
    fn wrong_length_fails() {
        assert!(!validate_checksum("12345"));
    }

    #[test]
    fn bad_checksum_fails() {
        assert!(!validate_checksum("1234567891"));
    }

    #[tokio::test]
    async fn invalid_checksum_fails_fast_without_lookup() {
        use std::sync::atomic::{AtomicU32, Ordering};
        let calls = AtomicU32::new(0);
        let connector = IdentifierRegistryConnector::new(|_key: String| {
            calls.fetch_add(1, Ordering::SeqCst);
            async { Ok(None) }
        });

        let payload = ProviderInput {
            provider_id: ProviderId::new(),
            given_name: "John".into(),
            family_name: "Smith".into(),
            identifier: Some("1234567891".into()),
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
        };

        let result = connector
            .execute(JobId::new(), ProviderId::new(), &payload, &ValidationOptions::default())
            .await;

        assert!(!result.success);
        assert_eq!(result.error.as_deref(), Some("INVALID_IDENTIFIER"));
        assert_eq!(calls.load(Ordering::SeqCst), 0);
    }

    #[tokio::test]
    async fn successful_lookup_populates_fields() {
        let connector = IdentifierRegistryConnector::new(|_key: String| async {
            Ok(Some(RegistryMatch {
                given_name: Some("John".into()),
                family_name: Some("Smith".into()),
                ..Default::default()
            }))
        });

        let payload = ProviderInput {
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
        };

        let result = connector
            .execute(JobId::new(), ProviderId::new(), &payload, &ValidationOptions::default())
            .await;

        assert!(result.success);
        assert!(result.fields.contains_key(fields::GIVEN_NAME));
    }
}
