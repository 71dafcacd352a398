use std::fmt;

use serde::{Deserialize, Serialize};
use sha2::{Digest, Sha256};
use xref_consistency::{ConflictingValues, ConsistencyViolation, ViolationType};
use xref_protocol::Severity;

#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ResolutionType {
    CanonicalNameAssignment,
    SeverityStandardization,
    ReferenceRepair,
    ManualReview,
}

impl ResolutionType {
    pub fn as_str(self) -> &'static str {
        match self {
            ResolutionType::CanonicalNameAssignment => "canonical_name_assignment",
            ResolutionType::SeverityStandardization => "severity_standardization",
            ResolutionType::ReferenceRepair => "reference_repair",
            ResolutionType::ManualReview => "manual_review",
        }
    }

    /// Types that can usually be applied without investigation.
    pub fn is_quick_win(self) -> bool {
        matches!(
            self,
            ResolutionType::CanonicalNameAssignment | ResolutionType::ReferenceRepair
        )
    }
}

impl fmt::Display for ResolutionType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

pub const REFERENCE_REPAIR_ACTIONS: [&str; 3] = [
    "Add missing component to component inventory",
    "Update failure pattern to reference existing component",
    "Remove invalid component reference",
];

/// What a resolution touches, shaped per resolution type.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum AffectedItems {
    NameConflict {
        name_variations: Vec<String>,
        suggested_canonical: String,
        affected_sources: Vec<String>,
    },
    SeverityConflict {
        pattern_type: String,
        conflicting_severities: Vec<Severity>,
        suggested_severity: Severity,
    },
    BrokenReference {
        missing_component: String,
        /// Failure pattern holding the reference
        #[serde(default, skip_serializing_if = "Option::is_none")]
        failure_pattern: Option<String>,
        /// Component whose stated relationship holds the reference
        #[serde(default, skip_serializing_if = "Option::is_none")]
        source_component: Option<String>,
        suggested_actions: Vec<String>,
    },
    Review(ConflictingValues),
}

/// One actionable fix for one violation.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ResolutionItem {
    /// Stable id derived from the violation content
    pub violation_id: String,
    pub violation_type: ViolationType,
    pub resolution_type: ResolutionType,
    pub priority: Severity,
    pub action: String,
    pub description: String,
    pub affected_items: AffectedItems,
    pub affected_sources: Vec<String>,
    pub confidence: f64,
}

fn sha256_hex(bytes: &[u8]) -> String {
    let mut hasher = Sha256::new();
    hasher.update(bytes);
    hasher.finalize().iter().map(|b| format!("{:02x}", b)).collect()
}

/// `<prefix>_<12 hex>` over the violation type, its sorted sources and its values.
pub fn stable_violation_id(prefix: &str, violation: &ConsistencyViolation) -> String {
    let mut sources: Vec<&str> = violation.affected_sources.iter().map(String::as_str).collect();
    sources.sort_unstable();
    let values = serde_json::to_string(&violation.conflicting_values).unwrap_or_default();

    let key = format!("{}|{}|{}", violation.violation_type, sources.join(","), values);
    let hash = sha256_hex(key.as_bytes());
    format!("{}_{}", prefix, &hash[..12.min(hash.len())])
}

fn item(
    violation: &ConsistencyViolation,
    prefix: &str,
    resolution_type: ResolutionType,
    action: String,
    description: String,
    affected_items: AffectedItems,
) -> ResolutionItem {
    ResolutionItem {
        violation_id: stable_violation_id(prefix, violation),
        violation_type: violation.violation_type.clone(),
        resolution_type,
        priority: violation.severity,
        action,
        description,
        affected_items,
        affected_sources: violation.affected_sources.clone(),
        confidence: violation.confidence,
    }
}

/// Fallback for every type without a dedicated generator, and for records
/// whose values do not have the shape their type implies.
fn manual_review(violation: &ConsistencyViolation) -> ResolutionItem {
    item(
        violation,
        violation.violation_type.as_str(),
        ResolutionType::ManualReview,
        violation.resolution_suggestion.clone(),
        violation.description.clone(),
        AffectedItems::Review(violation.conflicting_values.clone()),
    )
}

fn resolve_name_conflict(violation: &ConsistencyViolation) -> Option<ResolutionItem> {
    let ConflictingValues::NameVariations { name_variations } = &violation.conflicting_values else {
        return None;
    };
    // first of the shortest names wins
    let suggested = name_variations.iter().min_by_key(|name| name.chars().count())?.clone();

    Some(item(
        violation,
        "name_conflict",
        ResolutionType::CanonicalNameAssignment,
        format!("Set canonical name to \"{}\"", suggested),
        format!("Resolve naming conflict by standardizing on \"{}\"", suggested),
        AffectedItems::NameConflict {
            name_variations: name_variations.clone(),
            suggested_canonical: suggested,
            affected_sources: violation.affected_sources.clone(),
        },
    ))
}

fn resolve_severity_mismatch(violation: &ConsistencyViolation) -> Option<ResolutionItem> {
    let ConflictingValues::Severities { severities, pattern_type } = &violation.conflicting_values else {
        return None;
    };
    let suggested = severities.iter().copied().max()?;

    Some(item(
        violation,
        "severity_mismatch",
        ResolutionType::SeverityStandardization,
        format!("Standardize severity for pattern \"{}\" to \"{}\"", pattern_type, suggested),
        format!(
            "Use conservative approach and set severity to highest level: {}",
            suggested
        ),
        AffectedItems::SeverityConflict {
            pattern_type: pattern_type.clone(),
            conflicting_severities: severities.clone(),
            suggested_severity: suggested,
        },
    ))
}

fn resolve_broken_reference(violation: &ConsistencyViolation) -> Option<ResolutionItem> {
    let (missing, failure_pattern, source_component, description) = match &violation.conflicting_values {
        ConflictingValues::MissingComponent {
            missing_component,
            failure_pattern,
        } => (
            missing_component,
            Some(failure_pattern.clone()),
            None,
            "Repair broken reference from failure pattern to component",
        ),
        ConflictingValues::DanglingRelationship {
            source_component,
            missing_target,
        } => (
            missing_target,
            None,
            Some(source_component.clone()),
            "Repair broken relationship between components",
        ),
        _ => return None,
    };

    Some(item(
        violation,
        "broken_ref",
        ResolutionType::ReferenceRepair,
        format!(
            "Add component \"{}\" to component inventory or update reference",
            missing
        ),
        description.to_string(),
        AffectedItems::BrokenReference {
            missing_component: missing.clone(),
            failure_pattern,
            source_component,
            suggested_actions: REFERENCE_REPAIR_ACTIONS.iter().map(|a| a.to_string()).collect(),
        },
    ))
}

/// One resolution per violation.
pub fn resolve_violation(violation: &ConsistencyViolation) -> ResolutionItem {
    let dedicated = match violation.violation_type {
        ViolationType::ComponentNameConflict => resolve_name_conflict(violation),
        ViolationType::FailureSeverityMismatch => resolve_severity_mismatch(violation),
        ViolationType::BrokenCrossReference => resolve_broken_reference(violation),
        _ => None,
    };
    dedicated.unwrap_or_else(|| manual_review(violation))
}

/// Resolutions grouped by violation type (first appearance order), then
/// ordered most severe first. Both steps are stable.
pub fn generate_resolutions(violations: &[ConsistencyViolation]) -> Vec<ResolutionItem> {
    let mut groups: Vec<(&ViolationType, Vec<&ConsistencyViolation>)> = Vec::new();
    for violation in violations {
        match groups.iter_mut().find(|(kind, _)| **kind == violation.violation_type) {
            Some((_, members)) => members.push(violation),
            None => groups.push((&violation.violation_type, vec![violation])),
        }
    }

    let mut resolutions: Vec<ResolutionItem> = groups
        .into_iter()
        .flat_map(|(_, members)| members.into_iter().map(resolve_violation))
        .collect();
    resolutions.sort_by_key(|r| r.priority.rank());

    log::debug!(
        "Generated {} resolutions for {} violations",
        resolutions.len(),
        violations.len()
    );
    resolutions
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;

    fn violation(kind: ViolationType, values: ConflictingValues) -> ConsistencyViolation {
        ConsistencyViolation::new(kind, "desc", vec!["log_analysis".into(), "engineering_docs".into()], values, 0.8)
    }

    #[test]
    fn test_shortest_name_first_encountered() {
        let v = violation(
            ViolationType::ComponentNameConflict,
            ConflictingValues::NameVariations {
                name_variations: vec!["Mirror Assembly".into(), "Lens".into(), "Beam".into()],
            },
        );
        let resolution = resolve_violation(&v);
        assert_eq!(resolution.resolution_type, ResolutionType::CanonicalNameAssignment);
        assert_eq!(resolution.action, "Set canonical name to \"Lens\"");
        assert!(resolution.violation_id.starts_with("name_conflict_"));
        assert_eq!(resolution.violation_id.len(), "name_conflict_".len() + 12);
    }

    #[test]
    fn test_most_severe_is_suggested() {
        let v = violation(
            ViolationType::FailureSeverityMismatch,
            ConflictingValues::Severities {
                severities: vec![Severity::Medium, Severity::Critical, Severity::Low],
                pattern_type: "connection_timeout".into(),
            },
        );
        let resolution = resolve_violation(&v);
        assert_eq!(
            resolution.action,
            "Standardize severity for pattern \"connection_timeout\" to \"CRITICAL\""
        );
        match resolution.affected_items {
            AffectedItems::SeverityConflict { suggested_severity, .. } => {
                assert_eq!(suggested_severity, Severity::Critical)
            }
            other => panic!("unexpected affected items: {:?}", other),
        }
    }

    #[test]
    fn test_broken_reference_has_three_actions() {
        let v = violation(
            ViolationType::BrokenCrossReference,
            ConflictingValues::MissingComponent {
                missing_component: "Cooling Fan X9".into(),
                failure_pattern: "fan stall".into(),
            },
        );
        let resolution = resolve_violation(&v);
        assert_eq!(resolution.resolution_type, ResolutionType::ReferenceRepair);
        let json = serde_json::to_value(&resolution.affected_items).unwrap();
        assert_eq!(json["suggested_actions"].as_array().map(Vec::len), Some(3));
        assert_eq!(json["failure_pattern"], "fan stall");
        assert!(json.get("source_component").is_none());
    }

    #[test]
    fn test_other_types_get_manual_review() {
        let v = violation(
            ViolationType::DataSourceMismatch,
            ConflictingValues::LowConfidenceScores {
                low_confidence_scores: Default::default(),
            },
        );
        let resolution = resolve_violation(&v);
        assert_eq!(resolution.resolution_type, ResolutionType::ManualReview);
        assert_eq!(resolution.action, "Verify data source integrity and update if necessary");
        assert!(resolution.violation_id.starts_with("data_source_mismatch_"));
    }

    #[test]
    fn test_mismatched_shape_falls_back_to_review() {
        let v = violation(
            ViolationType::ComponentNameConflict,
            ConflictingValues::NameVariations { name_variations: Vec::new() },
        );
        assert_eq!(resolve_violation(&v).resolution_type, ResolutionType::ManualReview);
    }

    #[test]
    fn test_ids_ignore_source_order() {
        let values = ConflictingValues::NameVariations {
            name_variations: vec!["A".into()],
        };
        let a = ConsistencyViolation::new(
            ViolationType::ComponentNameConflict,
            "x",
            vec!["a".into(), "b".into()],
            values.clone(),
            0.9,
        );
        let b = ConsistencyViolation::new(ViolationType::ComponentNameConflict, "y", vec!["b".into(), "a".into()], values, 0.9);
        assert_eq!(stable_violation_id("name_conflict", &a), stable_violation_id("name_conflict", &b));
    }

    #[test]
    fn test_generated_in_severity_order() {
        let low = violation(
            ViolationType::MissingCanonicalName,
            ConflictingValues::CanonicalName {
                canonical_name: "A".into(),
                component_name: "A".into(),
            },
        );
        let high = violation(
            ViolationType::FailureSeverityMismatch,
            ConflictingValues::Severities {
                severities: vec![Severity::High, Severity::Low],
                pattern_type: "drift".into(),
            },
        );
        let resolutions = generate_resolutions(&[low, high]);
        assert_eq!(resolutions[0].priority, Severity::High);
        assert_eq!(resolutions[1].priority, Severity::Low);
    }
}
