//! Independent consistency rules. Each takes the resolved data and returns its
//! own violations; callers concatenate the outputs.

use std::collections::{BTreeMap, HashSet};

use xref_graph::{CanonicalEntity, DanglingReference, FailurePatternCorrelation};
use xref_protocol::Severity;

use crate::cross_reference::{
    link_component, CrossReference, ValidationStatus, COMPONENT_CORRELATION, COMPONENT_RELATIONSHIP,
    FAILURE_CORRELATION,
};
use crate::violation::{ConflictingValues, ConsistencyViolation, ViolationType};

/// More distinct raw names than this across sources is a naming conflict.
pub const MAX_NAME_VARIATIONS: usize = 3;

/// Per-source confidence below this on a multi-source entity is a mismatch.
pub const MIN_SOURCE_CONFIDENCE: f64 = 0.8;

/// A component tied to more failure patterns than this is suspicious.
pub const MAX_FAILURE_ASSOCIATIONS: usize = 3;

const FAILURE_ANALYSIS: &str = "failure_analysis";
const COMPONENT_INVENTORY: &str = "component_inventory";

fn strings(items: &[&str]) -> Vec<String> {
    items.iter().map(|s| s.to_string()).collect()
}

/// Multi-source entities with more than three distinct raw names.
pub fn name_conflicts(entities: &[CanonicalEntity]) -> Vec<ConsistencyViolation> {
    entities
        .iter()
        .filter(|entity| entity.is_multi_source())
        .filter_map(|entity| {
            let variations = entity.name_variations();
            (variations.len() > MAX_NAME_VARIATIONS).then(|| {
                ConsistencyViolation::new(
                    ViolationType::ComponentNameConflict,
                    format!(
                        "Component \"{}\" has {} different name variations across sources",
                        entity.original_name,
                        variations.len()
                    ),
                    entity.source_references.keys().cloned().collect(),
                    ConflictingValues::NameVariations {
                        name_variations: variations.iter().map(|s| s.to_string()).collect(),
                    },
                    0.9,
                )
            })
        })
        .collect()
}

/// Multi-source entities whose canonical name is empty or just the raw mention.
pub fn missing_canonical_names(entities: &[CanonicalEntity]) -> Vec<ConsistencyViolation> {
    entities
        .iter()
        .filter(|entity| entity.is_multi_source())
        .filter(|entity| entity.canonical_name.is_empty() || entity.canonical_name == entity.original_name)
        .map(|entity| {
            ConsistencyViolation::new(
                ViolationType::MissingCanonicalName,
                format!("Component \"{}\" lacks a proper canonical name", entity.original_name),
                entity.source_references.keys().cloned().collect(),
                ConflictingValues::CanonicalName {
                    canonical_name: entity.canonical_name.clone(),
                    component_name: entity.original_name.clone(),
                },
                0.8,
            )
        })
        .collect()
}

/// Multi-source entities with a weakly matched source.
pub fn low_confidence_sources(entities: &[CanonicalEntity]) -> Vec<ConsistencyViolation> {
    entities
        .iter()
        .filter(|entity| entity.is_multi_source())
        .filter_map(|entity| {
            let low: BTreeMap<String, f64> = entity
                .confidence_scores
                .iter()
                .filter(|(_, score)| **score < MIN_SOURCE_CONFIDENCE)
                .map(|(source, score)| (source.clone(), *score))
                .collect();
            if low.is_empty() {
                return None;
            }
            let sources: Vec<String> = low.keys().cloned().collect();
            Some(ConsistencyViolation::new(
                ViolationType::DataSourceMismatch,
                format!(
                    "Low confidence component identification in sources: {}",
                    sources.join(", ")
                ),
                sources,
                ConflictingValues::LowConfidenceScores {
                    low_confidence_scores: low,
                },
                0.7,
            ))
        })
        .collect()
}

/// Pattern types reported with more than one severity.
pub fn severity_mismatches(failures: &[FailurePatternCorrelation]) -> Vec<ConsistencyViolation> {
    // pattern type -> distinct severities, both in first-appearance order
    let mut groups: Vec<(&str, Vec<Severity>)> = Vec::new();
    for failure in failures {
        let pattern_type = if failure.pattern_type.is_empty() {
            "unknown"
        } else {
            failure.pattern_type.as_str()
        };
        match groups.iter_mut().find(|(t, _)| *t == pattern_type) {
            Some((_, severities)) => {
                if !severities.contains(&failure.severity) {
                    severities.push(failure.severity);
                }
            }
            None => groups.push((pattern_type, vec![failure.severity])),
        }
    }

    groups
        .into_iter()
        .filter(|(_, severities)| severities.len() > 1)
        .map(|(pattern_type, severities)| {
            let labels: Vec<&str> = severities.iter().map(|s| s.as_str()).collect();
            ConsistencyViolation::new(
                ViolationType::FailureSeverityMismatch,
                format!(
                    "Pattern type \"{}\" has inconsistent severity levels: {}",
                    pattern_type,
                    labels.join(", ")
                ),
                strings(&[FAILURE_ANALYSIS]),
                ConflictingValues::Severities {
                    severities,
                    pattern_type: pattern_type.to_string(),
                },
                0.8,
            )
        })
        .collect()
}

/// Components named by more than three distinct failure patterns.
pub fn overloaded_components(failures: &[FailurePatternCorrelation]) -> Vec<ConsistencyViolation> {
    let mut by_component: Vec<(&str, Vec<&str>)> = Vec::new();
    for failure in failures {
        let mut seen = HashSet::new();
        for component in failure.associated_components.iter().filter(|c| seen.insert(c.as_str())) {
            let pattern = failure.failure_pattern.as_str();
            match by_component.iter_mut().find(|(c, _)| *c == component.as_str()) {
                Some((_, patterns)) => {
                    if !patterns.contains(&pattern) {
                        patterns.push(pattern);
                    }
                }
                None => by_component.push((component.as_str(), vec![pattern])),
            }
        }
    }

    by_component
        .into_iter()
        .filter(|(_, patterns)| patterns.len() > MAX_FAILURE_ASSOCIATIONS)
        .map(|(component, patterns)| {
            ConsistencyViolation::new(
                ViolationType::InconsistentFailureAssociation,
                format!(
                    "Component \"{}\" is associated with {} different failure patterns",
                    component,
                    patterns.len()
                ),
                strings(&[FAILURE_ANALYSIS, COMPONENT_CORRELATION]),
                ConflictingValues::FailurePatterns {
                    component: component.to_string(),
                    failure_patterns: patterns.iter().map(|p| p.to_string()).collect(),
                },
                0.6,
            )
        })
        .collect()
}

/// Link every failure's components to entities; unknown ones become broken references.
pub fn failure_references(
    entities: &[CanonicalEntity],
    failures: &[FailurePatternCorrelation],
) -> (Vec<CrossReference>, Vec<ConsistencyViolation>) {
    let mut references = Vec::new();
    let mut violations = Vec::new();

    for failure in failures {
        for component in &failure.associated_components {
            let reference = link_component(&failure.failure_pattern, component, entities);
            if reference.validation_status == ValidationStatus::Invalid {
                violations.push(ConsistencyViolation::new(
                    ViolationType::BrokenCrossReference,
                    format!("Failure pattern references unknown component \"{}\"", component),
                    strings(&[FAILURE_CORRELATION, COMPONENT_CORRELATION]),
                    ConflictingValues::MissingComponent {
                        missing_component: component.clone(),
                        failure_pattern: failure.failure_pattern.clone(),
                    },
                    0.9,
                ));
            }
            references.push(reference);
        }
    }

    (references, violations)
}

/// Stated relationships whose target never resolved to an entity.
pub fn dangling_relationships(dangling: &[DanglingReference]) -> (Vec<CrossReference>, Vec<ConsistencyViolation>) {
    dangling
        .iter()
        .map(|reference| {
            let cross_reference = CrossReference {
                source_type: COMPONENT_RELATIONSHIP.to_string(),
                target_type: COMPONENT_CORRELATION.to_string(),
                source_item: reference.source.clone(),
                target_item: reference.target.clone(),
                strength: 0.0,
                validation_status: ValidationStatus::Invalid,
                source_component: reference.target.clone(),
            };
            let violation = ConsistencyViolation::new(
                ViolationType::BrokenCrossReference,
                format!(
                    "Relationship \"{}\" from \"{}\" references unknown component \"{}\"",
                    reference.relationship_type.as_str(),
                    reference.source,
                    reference.target
                ),
                strings(&[COMPONENT_INVENTORY, COMPONENT_CORRELATION]),
                ConflictingValues::DanglingRelationship {
                    source_component: reference.source.clone(),
                    missing_target: reference.target.clone(),
                },
                0.9,
            );
            (cross_reference, violation)
        })
        .unzip()
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;
    use xref_graph::RelationshipType;

    fn entity(canonical: &str, original: &str, refs: &[(&str, &[&str], f64)]) -> CanonicalEntity {
        let mut e = CanonicalEntity::new(canonical, original);
        for (source, names, score) in refs {
            e.source_references
                .insert(source.to_string(), names.iter().map(|n| n.to_string()).collect());
            e.confidence_scores.insert(source.to_string(), *score);
        }
        e
    }

    fn failure(pattern: &str, pattern_type: &str, severity: Severity, components: &[&str]) -> FailurePatternCorrelation {
        FailurePatternCorrelation {
            failure_pattern: pattern.into(),
            pattern_type: pattern_type.into(),
            severity,
            associated_components: strings(components),
            procedures: Vec::new(),
            correlation_strength: 0.8,
        }
    }

    #[test]
    fn test_mirror_aliases_conflict() {
        let mirror = entity(
            "Mirror",
            "Mirror",
            &[
                ("engineering_docs", &["Mirror", "Mirror Assembly"], 1.0),
                ("log_analysis", &["Reflector", "Beam Mirror"], 0.9),
            ],
        );
        let violations = name_conflicts(&[mirror]);
        assert_eq!(violations.len(), 1);
        assert_eq!(violations[0].severity, Severity::Medium);
        assert_eq!(
            violations[0].description,
            "Component \"Mirror\" has 4 different name variations across sources"
        );
    }

    #[test]
    fn test_single_source_entities_are_exempt() {
        let solo = entity("Pump", "Pump", &[("log_analysis", &["a", "b", "c", "d"], 0.1)]);
        let entities = [solo];
        assert!(name_conflicts(&entities).is_empty());
        assert!(missing_canonical_names(&entities).is_empty());
        assert!(low_confidence_sources(&entities).is_empty());
    }

    #[test]
    fn test_missing_canonical_and_low_confidence() {
        let e = entity(
            "Laser Diode",
            "Laser Diode",
            &[("engineering_docs", &["Laser Diode"], 0.95), ("log_analysis", &["Laser Module"], 0.75)],
        );
        let missing = missing_canonical_names(std::slice::from_ref(&e));
        assert_eq!(missing[0].severity, Severity::Low);

        let low = low_confidence_sources(&[e]);
        assert_eq!(low[0].affected_sources, vec!["log_analysis".to_string()]);
        assert_eq!(
            low[0].description,
            "Low confidence component identification in sources: log_analysis"
        );
    }

    #[test]
    fn test_severity_mismatch_by_pattern_type() {
        let failures = [
            failure("timeout on port 1", "connection_timeout", Severity::Critical, &[]),
            failure("timeout on port 2", "connection_timeout", Severity::Medium, &[]),
            failure("drift", "calibration_drift", Severity::Low, &[]),
        ];
        let violations = severity_mismatches(&failures);
        assert_eq!(violations.len(), 1);
        assert_eq!(violations[0].severity, Severity::High);
        assert_eq!(
            violations[0].conflicting_values,
            ConflictingValues::Severities {
                severities: vec![Severity::Critical, Severity::Medium],
                pattern_type: "connection_timeout".into(),
            }
        );
    }

    #[test]
    fn test_overloaded_component() {
        let failures: Vec<_> = ["a", "b", "c", "d"]
            .iter()
            .map(|p| failure(p, "generic", Severity::Low, &["Pump"]))
            .collect();
        assert_eq!(overloaded_components(&failures[..3]).len(), 0);
        let violations = overloaded_components(&failures);
        assert_eq!(violations.len(), 1);
        assert_eq!(violations[0].severity, Severity::High);
    }

    #[test]
    fn test_broken_failure_reference() {
        let entities = [entity("Laser Diode", "Laser Diode", &[])];
        let failures = [failure("fan stall", "thermal", Severity::High, &["Cooling Fan X9", "laser diode"])];
        let (references, violations) = failure_references(&entities, &failures);
        assert_eq!(references.len(), 2);
        assert_eq!(references[0].validation_status, ValidationStatus::Invalid);
        assert_eq!(references[1].validation_status, ValidationStatus::Valid);
        assert_eq!(violations.len(), 1);
        assert_eq!(violations[0].violation_type, ViolationType::BrokenCrossReference);
    }

    #[test]
    fn test_dangling_relationship_reported() {
        let dangling = [DanglingReference {
            source: "Controller".into(),
            target: "Cooling Fan X9".into(),
            relationship_type: RelationshipType::ExplicitlyRelated,
        }];
        let (references, violations) = dangling_relationships(&dangling);
        assert_eq!(references[0].source_type, COMPONENT_RELATIONSHIP);
        assert_eq!(violations[0].severity, Severity::Medium);
    }
}
