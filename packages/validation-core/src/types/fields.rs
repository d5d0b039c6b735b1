//! Central field-name registry.
//!
//! Every normalized field produced by a connector and consumed by fusion is
//! named from this list, so no component branches on a string literal that
//! could drift between producer and consumer.

pub const IDENTIFIER: &str = "identifier";
pub const GIVEN_NAME: &str = "given_name";
pub const FAMILY_NAME: &str = "family_name";
pub const PRIMARY_SPECIALTY: &str = "primary_specialty";
pub const PRACTICE_NAME: &str = "practice_name";
pub const ADDRESS_LINE: &str = "address_line";
pub const CITY: &str = "city";
pub const STATE: &str = "state";
pub const POSTAL_CODE: &str = "postal_code";
pub const PRIMARY_PHONE: &str = "primary_phone";
pub const EMAIL: &str = "email";

pub const FORMATTED_ADDRESS: &str = "formatted_address";
pub const PLACE_ID: &str = "place_id";
pub const LATITUDE: &str = "latitude";
pub const LONGITUDE: &str = "longitude";
pub const GEOMETRY_ACCURACY: &str = "geometry_accuracy";

pub const LICENSE_NUMBER: &str = "license_number";
pub const LICENSE_STATE: &str = "license_state";
pub const LICENSE_STATUS: &str = "license_status";
pub const LICENSE_ISSUE_DATE: &str = "license_issue_date";
pub const LICENSE_EXPIRY_DATE: &str = "license_expiry_date";
pub const BOARD_ACTIONS: &str = "board_actions";

pub const AFFILIATIONS: &str = "affiliations";
pub const SERVICES_OFFERED: &str = "services_offered";

/// Fields whose absence from the aggregated map always raises a
/// `MISSING_<FIELD>` flag, per the fusion engine's critical-field rule.
pub const CRITICAL_FIELDS: &[&str] = &[IDENTIFIER, GIVEN_NAME, FAMILY_NAME, LICENSE_NUMBER];

/// Field-importance weights for overall confidence, before renormalization
/// over fields actually present. Fields not listed fall back to 0.05.
pub const IMPORTANCE_WEIGHTS: &[(&str, f64)] = &[
    (IDENTIFIER, 0.25),
    (GIVEN_NAME, 0.20),
    (FAMILY_NAME, 0.20),
    (LICENSE_NUMBER, 0.15),
    (PRIMARY_PHONE, 0.10),
    (EMAIL, 0.10),
];

pub const DEFAULT_IMPORTANCE_WEIGHT: f64 = 0.05;

/// Importance weight for a field, falling back to the catch-all default.
pub fn importance_weight(field: &str) -> f64 {
    IMPORTANCE_WEIGHTS
        .iter()
        .find(|(name, _)| *name == field)
        .map(|(_, weight)| *weight)
        .unwrap_or(DEFAULT_IMPORTANCE_WEIGHT)
}
