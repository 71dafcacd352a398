use serde::{Deserialize, Serialize};
use xref_graph::{CanonicalEntity, DanglingReference, FailurePatternCorrelation};

use crate::cross_reference::CrossReference;
use crate::error::{ConsistencyError, Result};
use crate::metrics::{
    calculate_consistency_metrics, ConsistencyLevel, ConsistencyMetrics, CrossReferenceSummary, ViolationSummary,
};
use crate::rules;
use crate::violation::ConsistencyViolation;

pub const DEFAULT_CONSISTENCY_THRESHOLD: f64 = 0.7;

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ConsistencyValidation {
    pub overall_consistency_score: f64,
    pub consistency_level: ConsistencyLevel,
    pub meets_threshold: bool,
    pub consistency_metrics: ConsistencyMetrics,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ValidationMetadata {
    pub consistency_threshold: f64,
    pub components_analyzed: usize,
    pub failures_analyzed: usize,
}

/// Everything one validation pass found.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ValidationReport {
    pub consistency_validation: ConsistencyValidation,
    pub violations_found: Vec<ConsistencyViolation>,
    pub violation_summary: ViolationSummary,
    pub cross_references: Vec<CrossReference>,
    pub cross_reference_summary: CrossReferenceSummary,
    pub validation_metadata: ValidationMetadata,
}

/// Runs the rule set over resolved entities and failure correlations.
#[derive(Debug, Clone, Copy)]
pub struct ConsistencyValidator {
    threshold: f64,
}

impl ConsistencyValidator {
    pub fn new(threshold: f64) -> Result<Self> {
        if !(0.0..=1.0).contains(&threshold) {
            return Err(ConsistencyError::InvalidThreshold(threshold));
        }
        Ok(Self { threshold })
    }

    pub fn threshold(&self) -> f64 {
        self.threshold
    }

    /// Violations in rule order: entity rules, failure rules, then reference checks.
    pub fn violations(
        &self,
        entities: &[CanonicalEntity],
        failures: &[FailurePatternCorrelation],
        dangling: &[DanglingReference],
    ) -> (Vec<ConsistencyViolation>, Vec<CrossReference>) {
        let mut violations = Vec::new();
        violations.extend(rules::name_conflicts(entities));
        violations.extend(rules::missing_canonical_names(entities));
        violations.extend(rules::low_confidence_sources(entities));
        violations.extend(rules::severity_mismatches(failures));
        violations.extend(rules::overloaded_components(failures));

        let (mut references, broken) = rules::failure_references(entities, failures);
        violations.extend(broken);

        let (dangling_refs, dangling_violations) = rules::dangling_relationships(dangling);
        references.extend(dangling_refs);
        violations.extend(dangling_violations);

        (violations, references)
    }

    pub fn validate(
        &self,
        entities: &[CanonicalEntity],
        failures: &[FailurePatternCorrelation],
        dangling: &[DanglingReference],
    ) -> ValidationReport {
        let (violations, references) = self.violations(entities, failures, dangling);
        let metrics = calculate_consistency_metrics(&violations, &references, entities.len(), failures.len());
        let overall = metrics.overall_consistency;

        log::info!(
            "Validated {} components and {} failures: {} violations, {} cross-references",
            entities.len(),
            failures.len(),
            violations.len(),
            references.len()
        );

        ValidationReport {
            consistency_validation: ConsistencyValidation {
                overall_consistency_score: overall,
                consistency_level: ConsistencyLevel::from_score(overall),
                meets_threshold: overall >= self.threshold,
                consistency_metrics: metrics,
            },
            violation_summary: ViolationSummary::from_violations(&violations),
            cross_reference_summary: CrossReferenceSummary::from_references(&references),
            violations_found: violations,
            cross_references: references,
            validation_metadata: ValidationMetadata {
                consistency_threshold: self.threshold,
                components_analyzed: entities.len(),
                failures_analyzed: failures.len(),
            },
        }
    }
}

impl Default for ConsistencyValidator {
    fn default() -> Self {
        Self {
            threshold: DEFAULT_CONSISTENCY_THRESHOLD,
        }
    }
}
