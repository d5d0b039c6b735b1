//! Source-specific worker adapters: one struct per task type, all
//! implementing the shared `Connector` trait so the orchestrator never
//! branches on a source string.

pub mod enrichment;
pub mod geocode;
pub mod identifier;
pub mod license;
pub mod ocr;

use async_trait::async_trait;

use crate::types::ids::{JobId, ProviderId};
use crate::types::job::ValidationOptions;
use crate::types::provider::ProviderInput;
use crate::types::result::WorkerResult;

pub use enrichment::EnrichmentConnector;
pub use geocode::GeocodeConnector;
pub use identifier::IdentifierRegistryConnector;
pub use license::LicenseBoardConnector;
pub use ocr::OcrConnector;

/// One uniform contract every source-specific adapter implements. Workers
/// never throw out to the orchestrator: all non-infrastructural failure
/// becomes `WorkerResult { success: false, .. }`.
#[async_trait]
pub trait Connector: Send + Sync {
    async fn execute(
        &self,
        job_id: JobId,
        provider_id: ProviderId,
        payload: &ProviderInput,
        options: &ValidationOptions,
    ) -> WorkerResult;
}
