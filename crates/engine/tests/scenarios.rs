use std::collections::BTreeMap;

use pretty_assertions::assert_eq;
use xref_consistency::{ValidationStatus, ViolationType};
use xref_engine::{Engine, EngineConfig, ValidationInput};
use xref_graph::{CanonicalEntity, FailurePatternCorrelation};
use xref_planner::ResolutionType;
use xref_protocol::Severity;
use xref_resolver::{ConflictResolver, Matcher, Normalizer, ScoredMatch, SourceMatches};

fn engine() -> Engine {
    Engine::new(EngineConfig::default()).expect("default config is valid")
}

fn failure(pattern: &str, pattern_type: &str, severity: Severity, components: &[&str]) -> FailurePatternCorrelation {
    FailurePatternCorrelation {
        failure_pattern: pattern.into(),
        pattern_type: pattern_type.into(),
        severity,
        associated_components: components.iter().map(|c| c.to_string()).collect(),
        procedures: Vec::new(),
        correlation_strength: 0.0,
    }
}

#[test]
fn abbreviated_and_spelled_out_names_normalize_to_the_same_form() {
    let normalizer = Normalizer::new();
    assert_eq!(normalizer.normalize("Temp Ctrl Module"), "temperature control");
    assert_eq!(normalizer.normalize("Temperature Control Unit"), "temperature control");
    assert_eq!(
        Matcher::default().similarity("Temp Ctrl Module", "Temperature Control Unit"),
        1.0
    );
}

#[test]
fn engineering_docs_outweigh_log_analysis() {
    let mut matches = SourceMatches::new();
    matches.insert("engineering_docs".into(), vec![ScoredMatch::new("Laser Diode", 0.95)]);
    matches.insert("log_analysis".into(), vec![ScoredMatch::new("Laser Module", 0.75)]);

    let resolution = ConflictResolver::default().resolve(&matches);
    assert_eq!(resolution.canonical_name, "Laser Diode");
    assert!((resolution.confidence - 0.95).abs() < 1e-9);
}

#[test]
fn four_aliases_across_sources_conflict() {
    let mut mirror = CanonicalEntity::new("Mirror", "Mirror Assembly");
    mirror
        .source_references
        .insert("engineering_docs".into(), vec!["Mirror".into(), "Reflector".into()]);
    mirror
        .source_references
        .insert("log_analysis".into(), vec!["Mirror Assembly".into(), "Beam Mirror".into()]);
    mirror.confidence_scores = BTreeMap::from([("engineering_docs".into(), 0.95), ("log_analysis".into(), 0.9)]);

    let engine = engine();
    let report = engine.validate(&ValidationInput {
        component_correlations: vec![mirror],
        ..ValidationInput::default()
    });

    let conflicts: Vec<_> = report
        .violations_found
        .iter()
        .filter(|v| v.violation_type == ViolationType::ComponentNameConflict)
        .collect();
    assert_eq!(conflicts.len(), 1);
    assert_eq!(conflicts[0].severity, Severity::Medium);

    let plan = engine.plan(&report.violations_found);
    let rename = plan
        .resolution_plan
        .resolutions
        .iter()
        .find(|r| r.resolution_type == ResolutionType::CanonicalNameAssignment)
        .expect("name conflict gets a canonical name assignment");
    assert_eq!(rename.action, "Set canonical name to \"Mirror\"");
}

#[test]
fn mixed_severities_standardize_to_the_most_severe() {
    let engine = engine();
    let report = engine.validate(&ValidationInput {
        failure_correlations: vec![
            failure("Link dropped", "connection_timeout", Severity::Critical, &[]),
            failure("Handshake slow", "connection_timeout", Severity::Medium, &[]),
        ],
        ..ValidationInput::default()
    });

    let mismatch = report
        .violations_found
        .iter()
        .find(|v| v.violation_type == ViolationType::FailureSeverityMismatch)
        .expect("severity mismatch reported");
    assert_eq!(mismatch.severity, Severity::High);

    let plan = engine.plan(&report.violations_found);
    let standardize = &plan.resolution_plan.resolutions[0];
    assert_eq!(standardize.resolution_type, ResolutionType::SeverityStandardization);
    assert_eq!(
        standardize.action,
        "Standardize severity for pattern \"connection_timeout\" to \"CRITICAL\""
    );
}

#[test]
fn unknown_component_breaks_the_cross_reference() {
    let mut laser = CanonicalEntity::new("Laser Diode", "Laser Diode");
    laser
        .source_references
        .insert("component_inventory".into(), vec!["Laser Diode".into()]);
    laser.confidence_scores.insert("component_inventory".into(), 1.0);

    let engine = engine();
    let report = engine.validate(&ValidationInput {
        component_correlations: vec![laser],
        failure_correlations: vec![failure(
            "Fan stalled",
            "temperature_control",
            Severity::High,
            &["Cooling Fan X9"],
        )],
        ..ValidationInput::default()
    });

    assert!(report
        .violations_found
        .iter()
        .any(|v| v.violation_type == ViolationType::BrokenCrossReference && v.severity == Severity::Medium));
    assert_eq!(report.cross_references.len(), 1);
    assert_eq!(report.cross_references[0].target_item, "Cooling Fan X9");
    assert_eq!(report.cross_references[0].validation_status, ValidationStatus::Invalid);
    assert_eq!(report.cross_reference_summary.invalid_references, 1);

    let plan = engine.plan(&report.violations_found);
    assert!(plan
        .resolution_plan
        .resolutions
        .iter()
        .any(|r| r.resolution_type == ResolutionType::ReferenceRepair));
}

#[test]
fn serialized_violations_survive_a_bad_record() {
    let engine = engine();
    let report = engine.validate(&ValidationInput {
        failure_correlations: vec![
            failure("Link dropped", "connection_timeout", Severity::Critical, &[]),
            failure("Handshake slow", "connection_timeout", Severity::Low, &[]),
        ],
        ..ValidationInput::default()
    });
    let mut records: Vec<serde_json::Value> = report
        .violations_found
        .iter()
        .map(|v| serde_json::to_value(v).unwrap())
        .collect();
    records.insert(0, serde_json::json!({ "unexpected": "shape" }));

    let plan = engine.plan_json(&serde_json::to_string(&records).unwrap()).unwrap();
    assert_eq!(plan.plan_metadata.skipped_records, 1);
    assert_eq!(plan.plan_metadata.violations_processed, report.violations_found.len());
    assert_eq!(plan.resolution_plan.total_resolutions, report.violations_found.len());
}
