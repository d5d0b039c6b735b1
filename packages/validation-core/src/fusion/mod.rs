//! Confidence-aggregation algebra: collapses a (job, provider)'s worker
//! results into one `ValidationReport`. A pure function — no I/O, no
//! async — so the same result set always fuses to a byte-identical report.

mod flags;
mod recommendations;
mod weights;

use std::collections::HashMap;

use crate::types::ids::ReportId;
use crate::types::report::{FieldSummary, ValidationReport, ValidationStatus};
use crate::types::result::{NormalizedValue, WorkerResult};

pub use weights::{field_importance, source_weight};

/// Runs fusion over every worker result collected so far for one (job,
/// provider). Call only once all enabled tasks for that provider are
/// terminal — the function doesn't itself know whether that's true.
pub fn fuse(results: &[WorkerResult]) -> ValidationReport {
    let started = std::time::Instant::now();
    let job_id = results.first().map(|r| r.job_id).unwrap_or_default();
    let provider_id = results.first().map(|r| r.provider_id).unwrap_or_default();

    let field_summaries = fuse_fields(results);

    let (overall_confidence, denominator) = overall_confidence(&field_summaries);
    let status = ValidationStatus::from_overall_confidence(overall_confidence);

    let flags = flags::derive_flags(results, &field_summaries);
    let recommendations = recommendations::derive_recommendations(&flags);

    let aggregated_fields = field_summaries
        .iter()
        .map(|(field, summary)| (field.clone(), summary.value.clone()))
        .collect();

    let insights = if denominator == 0.0 {
        vec!["no field received any successful contribution".to_string()]
    } else {
        Vec::new()
    };

    ValidationReport {
        report_id: ReportId::new(),
        provider_id,
        job_id,
        overall_confidence,
        status,
        field_summaries,
        aggregated_fields,
        flags,
        recommendations,
        insights,
        worker_results: results.to_vec(),
        processing_duration: started.elapsed(),
        generated_at: chrono::Utc::now(),
    }
}

/// Per-field fusion: among successful results, pick the contribution with
/// the highest `field_confidence * source_weight`; ties break by source
/// order in the weight table (higher-weight source wins, which a stable
/// sort over descending weighted-score already guarantees since the
/// weight table itself orders sources by weight).
fn fuse_fields(results: &[WorkerResult]) -> HashMap<String, FieldSummary> {
    let mut best: HashMap<String, (f64, FieldSummary)> = HashMap::new();

    for result in results.iter().filter(|r| r.success) {
        let source = result.task_type.source_name();
        let weight = source_weight(source);

        for (field, value) in &result.fields {
            let field_confidence = result.field_confidence.get(field).copied().unwrap_or(0.0);
            let weighted = field_confidence * weight;

            let replace = match best.get(field) {
                None => true,
                Some((existing_weighted, existing)) => {
                    weighted > *existing_weighted
                        || (weighted == *existing_weighted && weight > source_weight(&existing.source))
                }
            };

            if replace {
                best.insert(
                    field.clone(),
                    (
                        weighted,
                        FieldSummary {
                            value: value.clone(),
                            confidence: weighted,
                            source: source.to_string(),
                        },
                    ),
                );
            }
        }
    }

    best.into_iter().map(|(field, (_, summary))| (field, summary)).collect()
}

/// Weighted average of per-field confidences using the field-importance
/// table, renormalized over fields that actually received a contribution.
/// Returns `(overall, denominator)`; a zero denominator means no field was
/// ever populated.
fn overall_confidence(field_summaries: &HashMap<String, FieldSummary>) -> (f64, f64) {
    let mut numerator = 0.0;
    let mut denominator = 0.0;

    for (field, summary) in field_summaries {
        let importance = field_importance(field);
        numerator += summary.confidence * importance;
        denominator += importance;
    }

    if denominator == 0.0 {
        (0.0, 0.0)
    } else {
        (round3(numerator / denominator), denominator)
    }
}

fn round3(value: f64) -> f64 {
    (value * 1000.0).round() / 1000.0
}

/// A `NormalizedValue` placeholder so `fuse` can be called with an empty
/// result slice without special-casing the "no results at all" path.
impl Default for NormalizedValue {
    fn default() -> Self {
        NormalizedValue::Text(String::new())
    }
}
