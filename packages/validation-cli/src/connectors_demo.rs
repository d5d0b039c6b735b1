//! Wires the five `Connector` implementations to deterministic, offline
//! lookup closures so the CLI is runnable without any network access or
//! real upstream registries, per the demo/dev-tooling scope this binary
//! covers.

use std::collections::HashMap;
use std::sync::Arc;

use validation_core::connectors::enrichment::{EnrichmentConnector, EnrichmentMatch};
use validation_core::connectors::geocode::{GeocodeConnector, GeocodeResult, GeometryAccuracy};
use validation_core::connectors::identifier::{validate_checksum, IdentifierRegistryConnector, RegistryMatch};
use validation_core::connectors::license::{LicenseBoardConnector, LicenseLookup};
use validation_core::connectors::ocr::{OcrConnector, OcrField};
use validation_core::connectors::Connector;
use validation_core::error::ConnectorError;
use validation_core::politeness::PolitenessLayer;
use validation_core::types::config::StateBoardConfig;
use validation_core::TaskType;

/// Builds the connector table the orchestrator dispatches to. Every
/// closure below answers from fixed, in-memory data instead of calling
/// out — a stand-in for the HTTP-backed registries a real deployment
/// would plug into the same `Connector::execute` signature.
pub fn build() -> HashMap<TaskType, Arc<dyn Connector>> {
    let mut connectors: HashMap<TaskType, Arc<dyn Connector>> = HashMap::new();

    connectors.insert(
        TaskType::IdentifierCheck,
        Arc::new(IdentifierRegistryConnector::new(|identifier: String| async move {
            if !validate_checksum(&identifier) {
                return Err(ConnectorError::InvalidInput("identifier fails checksum".into()));
            }
            Ok(Some(RegistryMatch {
                given_name: None,
                family_name: None,
                primary_specialty: Some("General Practice".into()),
                practice_name: None,
                address_line: None,
                city: None,
                state: None,
                postal_code: None,
                primary_phone: None,
                email: None,
            }))
        })),
    );

    connectors.insert(
        TaskType::Geocode,
        Arc::new(GeocodeConnector::new(|address: String| async move {
            Ok(Some(GeocodeResult {
                place_id: Some(format!("demo-place-{}", address.len())),
                formatted_address: address,
                latitude: 37.7749,
                longitude: -122.4194,
                accuracy: GeometryAccuracy::RangeInterpolated,
            }))
        })),
    );

    connectors.insert(
        TaskType::Ocr,
        Arc::new(OcrConnector::new(|_document_reference: String| async move {
            Ok::<Vec<OcrField>, ConnectorError>(Vec::new())
        })),
    );

    let politeness = Arc::new(PolitenessLayer::new(
        reqwest::Client::new(),
        "ProviderValidationBot/1.0",
        "contact@example.com",
    ));
    connectors.insert(
        TaskType::LicenseCheck,
        Arc::new(LicenseBoardConnector::new(
            StateBoardConfig::new("CA", "https://demo.example.com", "https://demo.example.com/search"),
            politeness,
            |_license_number: String| async move {
                Ok::<Option<LicenseLookup>, ConnectorError>(Some(LicenseLookup {
                    provider_name: None,
                    status: Some("ACTIVE".into()),
                    issue_date: None,
                    expiry_date: None,
                    board_actions: Vec::new(),
                }))
            },
        )),
    );

    connectors.insert(
        TaskType::Enrichment,
        Arc::new(EnrichmentConnector::new(|_name: String| async move {
            Ok::<EnrichmentMatch, ConnectorError>(EnrichmentMatch {
                primary_phone: None,
                email: None,
                affiliations: Vec::new(),
                services_offered: Vec::new(),
            })
        })),
    );

    connectors
}
