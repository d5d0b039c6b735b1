//! Validation report output.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::collections::HashMap;

use super::ids::{JobId, ProviderId, ReportId};
use super::result::{NormalizedValue, WorkerResult};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ValidationStatus {
    Valid,
    Warning,
    Invalid,
}

impl ValidationStatus {
    /// Threshold rule from the confidence-to-status derivation: `valid` at
    /// or above 0.8, `warning` in `[0.6, 0.8)`, otherwise `invalid`.
    pub fn from_overall_confidence(overall: f64) -> Self {
        if overall >= 0.8 {
            ValidationStatus::Valid
        } else if overall >= 0.6 {
            ValidationStatus::Warning
        } else {
            ValidationStatus::Invalid
        }
    }
}

/// Per-field outcome of fusion: the winning value, its weighted
/// confidence, and which source contributed it.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct FieldSummary {
    pub value: NormalizedValue,
    pub confidence: f64,
    pub source: String,
}

/// The per-(job, provider) output of the fusion engine. Written once;
/// stable thereafter.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ValidationReport {
    pub report_id: ReportId,
    pub provider_id: ProviderId,
    pub job_id: JobId,
    pub overall_confidence: f64,
    pub status: ValidationStatus,
    pub field_summaries: HashMap<String, FieldSummary>,
    pub aggregated_fields: HashMap<String, NormalizedValue>,
    pub flags: Vec<String>,
    pub recommendations: Vec<String>,
    pub insights: Vec<String>,
    pub worker_results: Vec<WorkerResult>,
    pub processing_duration: std::time::Duration,
    pub generated_at: DateTime<Utc>,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn boundary_exactly_valid() {
        assert_eq!(ValidationStatus::from_overall_confidence(0.8), ValidationStatus::Valid);
    }

    #[test]
    fn boundary_exactly_warning() {
        assert_eq!(ValidationStatus::from_overall_confidence(0.6), ValidationStatus::Warning);
    }

    #[test]
    fn boundary_exactly_invalid() {
        assert_eq!(ValidationStatus::from_overall_confidence(0.0), ValidationStatus::Invalid);
        assert_eq!(ValidationStatus::from_overall_confidence(0.599), ValidationStatus::Invalid);
    }
}
