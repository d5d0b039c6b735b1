//! Document-OCR connector.
//!
//! Not retained in the filtered source pack as a standalone file, so this
//! adapter is built directly from the worker contract: input is a document
//! reference, output is whatever structured fields the OCR engine
//! extracted along with its own per-field confidences. No structured
//! fields extracted means the task fails.

use async_trait::async_trait;
use std::collections::HashMap;
use std::time::Instant;

use crate::error::ConnectorError;
use crate::retry::circuit_breaker::CircuitBreakerRegistry;
use crate::retry::RetryExecutor;
use crate::types::config::{CircuitBreakerConfig, RetryConfig};
use crate::types::ids::{JobId, ProviderId};
use crate::types::job::ValidationOptions;
use crate::types::provider::ProviderInput;
use crate::types::result::{NormalizedValue, WorkerResult};
use crate::types::task::TaskType;

use super::Connector;

/// One extracted field plus the OCR engine's own confidence in it.
#[derive(Debug, Clone)]
pub struct OcrField {
    pub name: String,
    pub value: NormalizedValue,
    pub confidence: f64,
}

pub struct OcrConnector<F> {
    extract: F,
    breakers: CircuitBreakerRegistry,
    retry: RetryConfig,
}

impl<F, Fut> OcrConnector<F>
where
    F: Fn(String) -> Fut + Send + Sync,
    Fut: std::future::Future<Output = Result<Vec<OcrField>, ConnectorError>> + Send,
{
    pub fn new(extract: F) -> Self {
        Self {
            extract,
            breakers: CircuitBreakerRegistry::new(CircuitBreakerConfig::generic()),
            retry: RetryConfig::fast_api(),
        }
    }
}

#[async_trait]
impl<F, Fut> Connector for OcrConnector<F>
where
    F: Fn(String) -> Fut + Send + Sync,
    Fut: std::future::Future<Output = Result<Vec<OcrField>, ConnectorError>> + Send,
{
    async fn execute(
        &self,
        job_id: JobId,
        provider_id: ProviderId,
        payload: &ProviderInput,
        _options: &ValidationOptions,
    ) -> WorkerResult {
        let started = Instant::now();
        let task_type = TaskType::Ocr;

        let Some(document_reference) = payload.document_reference.clone() else {
            return WorkerResult::failure(task_type, job_id, provider_id, "MISSING_DOCUMENT_REFERENCE");
        };

        let executor = RetryExecutor::new(self.retry, &self.breakers);
        let result = executor.execute("ocr", || (self.extract)(document_reference.clone())).await;

        match result {
            Ok(extracted) if !extracted.is_empty() => {
                let mut fields_map = HashMap::new();
                let mut field_confidence = HashMap::new();
                for field in &extracted {
                    fields_map.insert(field.name.clone(), field.value.clone());
                    field_confidence.insert(field.name.clone(), field.confidence);
                }
                let task_confidence = field_confidence.values().copied().sum::<f64>() / field_confidence.len() as f64;

                WorkerResult {
                    task_type,
                    job_id,
                    provider_id,
                    success: true,
                    fields: fields_map,
                    field_confidence,
                    task_confidence,
                    error: None,
                    processing_duration: started.elapsed(),
                    timestamp: chrono::Utc::now(),
                }
            }
            Ok(_) => WorkerResult::failure(task_type, job_id, provider_id, "NO_STRUCTURED_FIELDS"),
            Err(err) => WorkerResult::failure(task_type, job_id, provider_id, err.to_string()),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn payload(document_reference: Option<String>) -> ProviderInput {
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
            document_reference,
        }
    }

    #[tokio::test]
    async fn no_document_reference_skips_without_calling() {
        use std::sync::atomic::{AtomicU32, Ordering};
        let calls = AtomicU32::new(0);
        let connector = OcrConnector::new(|_doc: String| {
            calls.fetch_add(1, Ordering::SeqCst);
            async { Ok(Vec::new()) }
        });

        let result = connector
            .execute(JobId::new(), ProviderId::new(), &payload(None), &ValidationOptions::default())
            .await;

        assert!(!result.success);
        assert_eq!(calls.load(Ordering::SeqCst), 0);
    }

    #[tokio::test]
    async fn no_structured_fields_fails() {
        let connector = OcrConnector::new(|_doc: String| async { Ok(Vec::new()) });
        let result = connector
            .execute(JobId::new(), ProviderId::new(), &payload(Some("doc-1".into())), &ValidationOptions::default())
            .await;
        assert!(!result.success);
        assert_eq!(result.error.as_deref(), Some("NO_STRUCTURED_FIELDS"));
    }

    #[tokio::test]
    async fn extracted_fields_populate_result() {
        let connector = OcrConnector::new(|_doc: String| async {
            Ok(vec![OcrField {
                name: "license_number".into(),
                value: "A12345".into(),
                confidence: 0.8,
            }])
        });

        let result = connector
            .execute(JobId::new(), ProviderId::new(), &payload(Some("doc-1".into())), &ValidationOptions::default())
            .await;

        assert!(result.success);
        assert_eq!(result.task_confidence, 0.8);
    }
}
