//! Confidence scoring for automated evaluations.
//!
//! The evaluator's own confidence is discounted by how complete the input
//! data looks:
//!
//! ```text
//! score = clamp(base × mean(resource_availability, evidence_quality, source_type), 0, 1)
//! ```
//!
//! Each factor lies in `[0, 1]`, so data quality can lower the evaluator's
//! estimate but never raise it.

use serde::{Deserialize, Serialize};

use crate::types::Evaluation;
use crate::workload::{SourceType, WorkloadModel};

/// Below this many resources the model is treated as likely incomplete.
const SPARSE_RESOURCE_THRESHOLD: usize = 5;

/// Data-quality adjustment factors, each in `[0, 1]`.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct ConfidenceFactors {
    pub resource_availability: f64,
    pub evidence_quality: f64,
    pub source_type: f64,
}

impl ConfidenceFactors {
    /// Derive the factors for `evaluation` against `model`.
    #[must_use]
    pub fn assess(evaluation: &Evaluation, model: &WorkloadModel) -> Self {
        Self {
            resource_availability: resource_availability_factor(model.resource_count()),
            evidence_quality: evidence_quality_factor(evaluation),
            source_type: source_type_factor(model.source_type),
        }
    }

    #[must_use]
    pub fn mean(&self) -> f64 {
        (self.resource_availability + self.evidence_quality + self.source_type) / 3.0
    }

    /// Apply the factors to a base confidence.
    #[must_use]
    pub fn apply(&self, base: f64) -> f64 {
        clamp_unit(clamp_unit(base) * clamp_unit(self.mean()))
    }
}

fn resource_availability_factor(resources: usize) -> f64 {
    match resources {
        0 => 0.0,
        n if n < SPARSE_RESOURCE_THRESHOLD => 0.7,
        _ => 1.0,
    }
}

fn evidence_quality_factor(evaluation: &Evaluation) -> f64 {
    if evaluation.evidence.is_empty() {
        0.5
    } else if evaluation.evidence.iter().any(|e| e.resource.is_some()) {
        1.0
    } else {
        0.7
    }
}

fn source_type_factor(source: SourceType) -> f64 {
    match source {
        SourceType::TerraformPlan => 1.0,
        SourceType::TerraformSource => 0.85,
        SourceType::Unknown => 0.7,
    }
}

fn clamp_unit(value: f64) -> f64 {
    if value.is_nan() {
        0.0
    } else {
        value.clamp(0.0, 1.0)
    }
}

/// Final confidence of `evaluation`, starting from its reported score.
#[must_use]
pub fn score(evaluation: &Evaluation, model: &WorkloadModel) -> f64 {
    ConfidenceFactors::assess(evaluation, model).apply(evaluation.confidence_score)
}
