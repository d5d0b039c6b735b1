//! Geocoder connector.
//!
//! Grounded on `connectors/google_places.py`'s `validate_address`: the
//! geometry-accuracy category maps to a per-field confidence, and success
//! requires match confidence strictly greater than 0.5.

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

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum GeometryAccuracy {
    Rooftop,
    RangeInterpolated,
    GeometricCenter,
    Approximate,
}

impl GeometryAccuracy {
    pub fn confidence(self) -> f64 {
        match self {
            GeometryAccuracy::Rooftop => 0.95,
            GeometryAccuracy::RangeInterpolated => 0.85,
            GeometryAccuracy::GeometricCenter => 0.75,
            GeometryAccuracy::Approximate => 0.60,
        }
    }

    fn label(self) -> &'static str {
        match self {
            GeometryAccuracy::Rooftop => "ROOFTOP",
            GeometryAccuracy::RangeInterpolated => "RANGE_INTERPOLATED",
            GeometryAccuracy::GeometricCenter => "GEOMETRIC_CENTER",
            GeometryAccuracy::Approximate => "APPROXIMATE",
        }
    }
}

#[derive(Debug, Clone)]
pub struct GeocodeResult {
    pub place_id: Option<String>,
    pub formatted_address: String,
    pub latitude: f64,
    pub longitude: f64,
    pub accuracy: GeometryAccuracy,
}

/// Resolves an address (or an existing place id, via a detail lookup) to a
/// `GeocodeResult`. The remote call is injected so the connector is
/// exercisable without network access.
pub struct GeocodeConnector<F> {
    geocode: F,
    breakers: CircuitBreakerRegistry,
    retry: RetryConfig,
}

impl<F, Fut> GeocodeConnector<F>
where
    F: Fn(String) -> Fut + Send + Sync,
    Fut: std::future::Future<Output = Result<Option<GeocodeResult>, ConnectorError>> + Send,
{
    pub fn new(geocode: F) -> Self {
        Self {
            geocode,
            breakers: CircuitBreakerRegistry::new(CircuitBreakerConfig::generic()),
            retry: RetryConfig::fast_api(),
        }
    }
}

#[async_trait]
impl<F, Fut> Connector for GeocodeConnector<F>
where
    F: Fn(String) -> Fut + Send + Sync,
    Fut: std::future::Future<Output = Result<Option<GeocodeResult>, ConnectorError>> + Send,
{
    async fn execute(
        &self,
        job_id: JobId,
        provider_id: ProviderId,
        payload: &ProviderInput,
        _options: &ValidationOptions,
    ) -> WorkerResult {
        let started = Instant::now();
        let task_type = TaskType::Geocode;

        let Some(address) = payload.address_text() else {
            return WorkerResult::failure(task_type, job_id, provider_id, "MISSING_ADDRESS");
        };

        let executor = RetryExecutor::new(self.retry, &self.breakers);
        let result = executor.execute("geocode", || (self.geocode)(address.clone())).await;

        match result {
            Ok(Some(geocode)) => {
                let confidence = geocode.accuracy.confidence();
                if confidence < 0.5 {
                    return WorkerResult::failure(task_type, job_id, provider_id, "LOW_MATCH_CONFIDENCE");
                }

                let mut fields_map = HashMap::new();
                let mut field_confidence = HashMap::new();

                fields_map.insert(fields::FORMATTED_ADDRESS.to_string(), geocode.formatted_address.clone().into());
                field_confidence.insert(fields::FORMATTED_ADDRESS.to_string(), confidence);

                if let Some(place_id) = &geocode.place_id {
                    fields_map.insert(fields::PLACE_ID.to_string(), place_id.clone().into());
                    field_confidence.insert(fields::PLACE_ID.to_string(), confidence);
                }

                fields_map.insert(fields::LATITUDE.to_string(), geocode.latitude.into());
                field_confidence.insert(fields::LATITUDE.to_string(), confidence);
                fields_map.insert(fields::LONGITUDE.to_string(), geocode.longitude.into());
                field_confidence.insert(fields::LONGITUDE.to_string(), confidence);
                fields_map.insert(fields::GEOMETRY_ACCURACY.to_string(), geocode.accuracy.label().into());
                field_confidence.insert(fields::GEOMETRY_ACCURACY.to_string(), confidence);

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
            Ok(None) => WorkerResult::failure(task_type, job_id, provider_id, "NO_MATCH"),
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
            address_line: Some("123 Main St".into()),
            city: Some("San Francisco".into()),
            state: Some("CA".into()),
            postal_code: Some("94102".into()),
            license_number: None,
            license_state: None,
            specialty: None,
            practice_name: None,
            document_reference: None,
        }
    }

    #[tokio::test]
    async fn rooftop_match_yields_highest_confidence() {
        let connector = GeocodeConnector::new(|_addr: String| async {
            Ok(Some(GeocodeResult {
                place_id: Some("place123".into()),
                formatted_address: "123 Main St, San Francisco, CA 94102".into(),
                latitude: 37.77,
                longitude: -122.41,
                accuracy: GeometryAccuracy::Rooftop,
            }))
        });

        let result = connector
            .execute(JobId::new(), ProviderId::new(), &payload(), &ValidationOptions::default())
            .await;

        assert!(result.success);
        assert_eq!(result.task_confidence, 0.95);
    }

    #[tokio::test]
    async fn approximate_match_still_succeeds_at_threshold() {
        let connector = GeocodeConnector::new(|_addr: String| async {
            Ok(Some(GeocodeResult {
                place_id: None,
                formatted_address: "San Francisco, CA".into(),
                latitude: 37.77,
                longitude: -122.41,
                accuracy: GeometryAccuracy::Approximate,
            }))
        });

        let result = connector
            .execute(JobId::new(), ProviderId::new(), &payload(), &ValidationOptions::default())
            .await;

        assert!(result.success);
        assert_eq!(result.task_confidence, 0.60);
    }

    #[tokio::test]
    async fn no_match_fails() {
        let connector = GeocodeConnector::new(|_addr: String| async { Ok(None) });
        let result = connector
            .execute(JobId::new(), ProviderId::new(), &payload(), &ValidationOptions::default())
            .await;
        assert!(!result.success);
    }

    #[tokio::test]
    async fn missing_address_fails_fast() {
        let connector = GeocodeConnector::new(|_addr: String| async { Ok(None) });
        let mut p = payload();
        p.address_line = None;
        p.city = None;
        p.state = None;
        p.postal_code = None;
        let result = connector
            .execute(JobId::new(), ProviderId::new(), &p, &ValidationOptions::default())
            .await;
        assert_eq!(result.error.as_deref(), Some("MISSING_ADDRESS"));
    }
}
