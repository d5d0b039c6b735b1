//! Normalized field values and worker results.

use chrono::{DateTime, Utc};
use indexmap::IndexMap;
use serde::{Deserialize, Serialize};
use std::collections::HashMap;

use super::ids::{JobId, ProviderId};
use super::task::TaskType;

/// A heterogeneous value produced by a connector's normalization step.
///
/// Sources disagree on shape (a geocoder returns floats, an OCR engine
/// returns nested structure, a registry returns plain strings), so the
/// aggregated field map is keyed by field name to a variant rather than a
/// fixed struct. `Object` uses `IndexMap` so serialization order matches
/// insertion order instead of hashing, keeping output deterministic.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum NormalizedValue {
    Text(String),
    Number(f64),
    Bool(bool),
    List(Vec<String>),
    Object(IndexMap<String, NormalizedValue>),
}

impl NormalizedValue {
    pub fn as_text(&self) -> Option<&str> {
        match self {
            NormalizedValue::Text(s) => Some(s),
            _ => None,
        }
    }

    pub fn as_number(&self) -> Option<f64> {
        match self {
            NormalizedValue::Number(n) => Some(*n),
            _ => None,
        }
    }
}

impl From<String> for NormalizedValue {
    fn from(s: String) -> Self {
        NormalizedValue::Text(s)
    }
}

impl From<&str> for NormalizedValue {
    fn from(s: &str) -> Self {
        NormalizedValue::Text(s.to_string())
    }
}

impl From<f64> for NormalizedValue {
    fn from(n: f64) -> Self {
        NormalizedValue::Number(n)
    }
}

impl From<bool> for NormalizedValue {
    fn from(b: bool) -> Self {
        NormalizedValue::Bool(b)
    }
}

impl From<Vec<String>> for NormalizedValue {
    fn from(items: Vec<String>) -> Self {
        NormalizedValue::List(items)
    }
}

/// The uniform result shape every worker, regardless of source, produces.
///
/// Append-only: the set of results for a (job, provider) pair is the sole
/// input to fusion.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct WorkerResult {
    pub task_type: TaskType,
    pub job_id: JobId,
    pub provider_id: ProviderId,
    pub success: bool,
    pub fields: HashMap<String, NormalizedValue>,
    /// Per-field confidence in [0, 1], keyed the same as `fields`.
    pub field_confidence: HashMap<String, f64>,
    /// Task-level confidence, used by fusion's source-weighted selection.
    pub task_confidence: f64,
    pub error: Option<String>,
    pub processing_duration: std::time::Duration,
    pub timestamp: DateTime<Utc>,
}

impl WorkerResult {
    pub fn failure(task_type: TaskType, job_id: JobId, provider_id: ProviderId, error: impl Into<String>) -> Self {
        Self {
            task_type,
            job_id,
            provider_id,
            success: false,
            fields: HashMap::new(),
            field_confidence: HashMap::new(),
            task_confidence: 0.0,
            error: Some(error.into()),
            processing_duration: std::time::Duration::ZERO,
            timestamp: Utc::now(),
        }
    }
}
