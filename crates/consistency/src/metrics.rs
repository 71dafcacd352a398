use serde::{Deserialize, Serialize};
use xref_protocol::Severity;

use crate::cross_reference::{CrossReference, ValidationStatus};
use crate::violation::ConsistencyViolation;

/// Consistency scores for one validation pass, each in `[0, 1]`.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ConsistencyMetrics {
    pub overall_consistency: f64,
    pub component_consistency: f64,
    pub failure_consistency: f64,
    pub cross_reference_validity: f64,
    pub severity_weighted_consistency: f64,
}

impl Default for ConsistencyMetrics {
    /// The vacuous pass: nothing analysed, nothing wrong.
    fn default() -> Self {
        Self {
            overall_consistency: 1.0,
            component_consistency: 1.0,
            failure_consistency: 1.0,
            cross_reference_validity: 1.0,
            severity_weighted_consistency: 1.0,
        }
    }
}

fn inverse_rate(count: f64, total: usize) -> f64 {
    if total == 0 {
        return 1.0;
    }
    (1.0 - count / total as f64).clamp(0.0, 1.0)
}

/// Score a violation set against the number of analysed components and failures.
pub fn calculate_consistency_metrics(
    violations: &[ConsistencyViolation],
    cross_references: &[CrossReference],
    total_components: usize,
    total_failures: usize,
) -> ConsistencyMetrics {
    let total_items = total_components + total_failures;

    let component_violations = violations
        .iter()
        .filter(|v| v.violation_type.concerns_components())
        .count();
    let failure_violations = violations
        .iter()
        .filter(|v| v.violation_type.concerns_failures())
        .count();

    let cross_reference_validity = if cross_references.is_empty() {
        1.0
    } else {
        cross_references.iter().filter(|r| r.is_valid()).count() as f64 / cross_references.len() as f64
    };

    let weighted: u32 = violations.iter().map(|v| v.severity.weight()).sum();
    let max_weight = total_items * Severity::Critical.weight() as usize;

    ConsistencyMetrics {
        overall_consistency: inverse_rate(violations.len() as f64, total_items),
        component_consistency: inverse_rate(component_violations as f64, total_components),
        failure_consistency: inverse_rate(failure_violations as f64, total_failures),
        cross_reference_validity,
        severity_weighted_consistency: inverse_rate(weighted as f64, max_weight),
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(rename_all = "UPPERCASE")]
pub enum ConsistencyLevel {
    High,
    Medium,
    Low,
}

impl ConsistencyLevel {
    pub fn from_score(score: f64) -> Self {
        if score >= 0.8 {
            ConsistencyLevel::High
        } else if score >= 0.6 {
            ConsistencyLevel::Medium
        } else {
            ConsistencyLevel::Low
        }
    }
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct ViolationSummary {
    pub total_violations: usize,
    pub critical_violations: usize,
    pub high_violations: usize,
    pub medium_violations: usize,
    pub low_violations: usize,
    /// Distinct types, first occurrence first
    pub violation_types: Vec<String>,
}

impl ViolationSummary {
    pub fn from_violations(violations: &[ConsistencyViolation]) -> Self {
        let count = |severity: Severity| violations.iter().filter(|v| v.severity == severity).count();

        let mut violation_types: Vec<String> = Vec::new();
        for violation in violations {
            let name = violation.violation_type.as_str();
            if !violation_types.iter().any(|t| t == name) {
                violation_types.push(name.to_string());
            }
        }

        Self {
            total_violations: violations.len(),
            critical_violations: count(Severity::Critical),
            high_violations: count(Severity::High),
            medium_violations: count(Severity::Medium),
            low_violations: count(Severity::Low),
            violation_types,
        }
    }
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct CrossReferenceSummary {
    pub total_references: usize,
    pub valid_references: usize,
    pub invalid_references: usize,
    pub uncertain_references: usize,
    pub avg_reference_strength: f64,
}

impl CrossReferenceSummary {
    pub fn from_references(references: &[CrossReference]) -> Self {
        let count = |status: ValidationStatus| references.iter().filter(|r| r.validation_status == status).count();
        Self {
            total_references: references.len(),
            valid_references: count(ValidationStatus::Valid),
            invalid_references: count(ValidationStatus::Invalid),
            uncertain_references: count(ValidationStatus::Uncertain),
            avg_reference_strength: if references.is_empty() {
                0.0
            } else {
                references.iter().map(|r| r.strength).sum::<f64>() / references.len() as f64
            },
        }
    }
}
