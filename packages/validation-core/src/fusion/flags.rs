//! Flag derivation: turns worker results and the fused field map into the
//! fixed `SCREAMING_SNAKE_CASE` vocabulary from the flag-derivation rules.

use std::collections::HashMap;

use crate::types::fields;
use crate::types::report::FieldSummary;
use crate::types::result::WorkerResult;

/// Error codes a connector may set on a failed `WorkerResult` that map
/// directly to a format-invalid flag, rather than a generic `FAILED_<SOURCE>`.
const FORMAT_INVALID_CODES: &[&str] = &["INVALID_PHONE", "INVALID_EMAIL", "INVALID_IDENTIFIER"];

pub fn derive_flags(results: &[WorkerResult], field_summaries: &HashMap<String, FieldSummary>) -> Vec<String> {
    let mut flags = Vec::new();

    for field in fields::CRITICAL_FIELDS {
        if !field_summaries.contains_key(*field) {
            flags.push(format!("MISSING_{}", field.to_uppercase()));
        }
    }

    let mut low_confidence_fields: Vec<&String> = field_summaries
        .iter()
        .filter(|(_, summary)| summary.confidence < 0.5)
        .map(|(field, _)| field)
        .collect();
    low_confidence_fields.sort();
    for field in low_confidence_fields {
        flags.push(format!("LOW_CONFIDENCE_{}", field.to_uppercase()));
    }

    let mut failed_sources: Vec<&str> = results
        .iter()
        .filter(|r| !r.success)
        .map(|r| r.task_type.source_name())
        .collect();
    failed_sources.sort();
    failed_sources.dedup();
    for source in failed_sources {
        flags.push(format!("FAILED_{}", source.to_uppercase()));
    }

    if let Some(status) = field_summaries.get(fields::LICENSE_STATUS).and_then(|s| s.value.as_text()) {
        match status {
            "suspended" => flags.push("SUSPENDED_LICENSE".to_string()),
            "revoked" => flags.push("REVOKED_LICENSE".to_string()),
            "expired" => flags.push("EXPIRED_LICENSE".to_string()),
            _ => {}
        }
    }

    let mut format_flags: Vec<&str> = results
        .iter()
        .filter_map(|r| r.error.as_deref())
        .filter(|err| FORMAT_INVALID_CODES.contains(err))
        .collect();
    format_flags.sort();
    format_flags.dedup();
    for flag in format_flags {
        flags.push(flag.to_string());
    }

    flags
}
