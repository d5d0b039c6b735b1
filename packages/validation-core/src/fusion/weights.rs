//! Source weights and field-importance lookups, built once as `const`
//! tables rather than a runtime-constructed `HashMap`.

use crate::types::fields;

/// Global per-source weight applied to a worker's field confidences when
/// selecting the winning contribution for a field.
const SOURCE_WEIGHTS: &[(&str, f64)] = &[
    ("identifier_check", 0.40),
    ("geocode", 0.25),
    ("enrichment", 0.20),
    ("license_check", 0.15),
];

/// Weight for a source name; unknown sources (e.g. from future adapters)
/// get a conservative default rather than panicking.
pub fn source_weight(source: &str) -> f64 {
    SOURCE_WEIGHTS
        .iter()
        .find(|(name, _)| *name == source)
        .map(|(_, weight)| *weight)
        .unwrap_or(0.10)
}

pub fn field_importance(field: &str) -> f64 {
    fields::importance_weight(field)
}
