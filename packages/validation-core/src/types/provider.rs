//! Provider input records.

use serde::{Deserialize, Serialize};

use super::ids::ProviderId;

/// A provider record as submitted by the caller.
///
/// Immutable once enclosed in a `JobRequest`. `provider_id` is minted when
/// absent, mirroring `original_source`'s
/// `provider_data.get("provider_id", str(uuid.uuid4()))`.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ProviderInput {
    #[serde(default = "ProviderId::new")]
    pub provider_id: ProviderId,
    pub given_name: String,
    pub family_name: String,
    /// National identifier, 10 digits, checksum validated before use.
    pub identifier: Option<String>,
    pub phone: Option<String>,
    pub email: Option<String>,
    pub address_line: Option<String>,
    pub city: Option<String>,
    pub state: Option<String>,
    pub postal_code: Option<String>,
    pub license_number: Option<String>,
    pub license_state: Option<String>,
    pub specialty: Option<String>,
    pub practice_name: Option<String>,
    /// Reference to a scanned document; required for the `ocr` task to run.
    pub document_reference: Option<String>,
}

impl ProviderInput {
    /// A single-line address suitable for geocoding when structured parts
    /// aren't already broken out.
    pub fn address_text(&self) -> Option<String> {
        let parts: Vec<&str> = [
            self.address_line.as_deref(),
            self.city.as_deref(),
            self.state.as_deref(),
            self.postal_code.as_deref(),
        ]
        .into_iter()
        .flatten()
        .collect();
        if parts.is_empty() {
            None
        } else {
            Some(parts.join(", "))
        }
    }
}
