use std::collections::BTreeMap;
use std::fmt;

use serde::{Deserialize, Deserializer, Serialize, Serializer};
use xref_protocol::Severity;

use crate::error::{ConsistencyError, Result};

/// Kind of consistency problem. Unrecognised kinds from serialized records
/// are kept verbatim in `Other`.
#[derive(Debug, Clone, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub enum ViolationType {
    ComponentNameConflict,
    MissingCanonicalName,
    DataSourceMismatch,
    FailureSeverityMismatch,
    InconsistentFailureAssociation,
    BrokenCrossReference,
    Other(String),
}

impl ViolationType {
    pub fn as_str(&self) -> &str {
        match self {
            ViolationType::ComponentNameConflict => "component_name_conflict",
            ViolationType::MissingCanonicalName => "missing_canonical_name",
            ViolationType::DataSourceMismatch => "data_source_mismatch",
            ViolationType::FailureSeverityMismatch => "failure_severity_mismatch",
            ViolationType::InconsistentFailureAssociation => "inconsistent_failure_association",
            ViolationType::BrokenCrossReference => "broken_cross_reference",
            ViolationType::Other(name) => name,
        }
    }

    pub fn parse(raw: &str) -> Self {
        match raw {
            "component_name_conflict" => ViolationType::ComponentNameConflict,
            "missing_canonical_name" => ViolationType::MissingCanonicalName,
            "data_source_mismatch" => ViolationType::DataSourceMismatch,
            "failure_severity_mismatch" => ViolationType::FailureSeverityMismatch,
            "inconsistent_failure_association" => ViolationType::InconsistentFailureAssociation,
            "broken_cross_reference" => ViolationType::BrokenCrossReference,
            other => ViolationType::Other(other.to_string()),
        }
    }

    pub fn default_severity(&self) -> Severity {
        match self {
            ViolationType::MissingCanonicalName => Severity::Low,
            ViolationType::FailureSeverityMismatch | ViolationType::InconsistentFailureAssociation => Severity::High,
            _ => Severity::Medium,
        }
    }

    /// Suggested fix attached to every violation of this kind.
    pub fn resolution_suggestion(&self) -> &'static str {
        match self {
            ViolationType::ComponentNameConflict => "Use highest confidence source for canonical name",
            ViolationType::MissingCanonicalName => "Generate canonical name from most common variant",
            ViolationType::DataSourceMismatch => "Verify data source integrity and update if necessary",
            ViolationType::FailureSeverityMismatch => "Review failure analysis criteria and re-evaluate",
            ViolationType::InconsistentFailureAssociation => "Cross-validate with additional data sources",
            ViolationType::BrokenCrossReference => "Update references or mark as deprecated",
            ViolationType::Other(_) => "Review manually",
        }
    }

    /// Counted towards component consistency.
    pub fn concerns_components(&self) -> bool {
        self.as_str().contains("component")
    }

    /// Counted towards failure consistency.
    pub fn concerns_failures(&self) -> bool {
        self.as_str().contains("failure")
    }
}

impl fmt::Display for ViolationType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl Serialize for ViolationType {
    fn serialize<S: Serializer>(&self, serializer: S) -> std::result::Result<S::Ok, S::Error> {
        serializer.serialize_str(self.as_str())
    }
}

impl<'de> Deserialize<'de> for ViolationType {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> std::result::Result<Self, D::Error> {
        let raw = String::deserialize(deserializer)?;
        Ok(ViolationType::parse(&raw))
    }
}

/// The values that disagree, shaped per violation kind.
///
/// Serialized without a tag, as a plain object; decoding tries the shapes
/// in declaration order and keeps anything unrecognised as `Other`.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum ConflictingValues {
    CanonicalName {
        canonical_name: String,
        component_name: String,
    },
    Severities {
        severities: Vec<Severity>,
        pattern_type: String,
    },
    FailurePatterns {
        component: String,
        failure_patterns: Vec<String>,
    },
    MissingComponent {
        missing_component: String,
        failure_pattern: String,
    },
    DanglingRelationship {
        source_component: String,
        missing_target: String,
    },
    NameVariations {
        name_variations: Vec<String>,
    },
    LowConfidenceScores {
        low_confidence_scores: BTreeMap<String, f64>,
    },
    Other(BTreeMap<String, serde_json::Value>),
}

/// A detected contradiction between sources. Never mutated after creation.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ConsistencyViolation {
    pub violation_type: ViolationType,
    pub description: String,
    #[serde(default)]
    pub affected_sources: Vec<String>,
    pub conflicting_values: ConflictingValues,
    #[serde(default)]
    pub severity: Severity,
    #[serde(default)]
    pub resolution_suggestion: String,
    #[serde(default)]
    pub confidence: f64,
}

impl ConsistencyViolation {
    /// Violation with the kind's default severity and suggestion.
    pub fn new(
        violation_type: ViolationType,
        description: impl Into<String>,
        affected_sources: Vec<String>,
        conflicting_values: ConflictingValues,
        confidence: f64,
    ) -> Self {
        Self {
            severity: violation_type.default_severity(),
            resolution_suggestion: violation_type.resolution_suggestion().to_string(),
            violation_type,
            description: description.into(),
            affected_sources,
            conflicting_values,
            confidence,
        }
    }
}

/// Violations decoded from serialized records.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct DecodedViolations {
    pub violations: Vec<ConsistencyViolation>,
    /// Records that could not be decoded and were left out
    pub skipped_records: usize,
}

/// Decode a JSON array of violation records one by one.
///
/// A record that does not decode, or whose confidence lies outside [0, 1],
/// is logged and skipped; only a document that is not JSON or not an array
/// fails as a whole. Missing severity and suggestion fall back to the
/// kind's defaults.
pub fn decode_violations(raw: &str) -> Result<DecodedViolations> {
    let document: serde_json::Value = serde_json::from_str(raw)?;
    let serde_json::Value::Array(records) = document else {
        return Err(ConsistencyError::malformed("expected an array of violation records"));
    };

    let mut decoded = DecodedViolations::default();
    for (index, record) in records.into_iter().enumerate() {
        match decode_record(record) {
            Ok(violation) => decoded.violations.push(violation),
            Err(e) => {
                log::warn!("Skipping violation record {}: {}", index, e);
                decoded.skipped_records += 1;
            }
        }
    }
    Ok(decoded)
}

fn decode_record(record: serde_json::Value) -> Result<ConsistencyViolation> {
    let has_severity = record.get("severity").is_some_and(|v| !v.is_null());
    let mut violation: ConsistencyViolation = serde_json::from_value(record)?;
    if !(0.0..=1.0).contains(&violation.confidence) {
        return Err(ConsistencyError::malformed(format!(
            "confidence {} is outside [0, 1]",
            violation.confidence
        )));
    }
    if !has_severity {
        violation.severity = violation.violation_type.default_severity();
    }
    if violation.resolution_suggestion.is_empty() {
        violation.resolution_suggestion = violation.violation_type.resolution_suggestion().to_string();
    }
    Ok(violation)
}
