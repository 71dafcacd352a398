//! Timeline, effort, success and guidance estimates for a resolution list.

use serde::{Deserialize, Serialize};
use xref_consistency::{ConsistencyViolation, ViolationType};
use xref_protocol::Severity;

use crate::resolution::{ResolutionItem, ResolutionType};

const UNKNOWN_SUCCESS_RATE: f64 = 0.7;

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct TimelineBucket {
    pub timeframe: String,
    pub resolutions: Vec<ResolutionItem>,
}

impl TimelineBucket {
    fn new(timeframe: &str) -> Self {
        Self {
            timeframe: timeframe.to_string(),
            resolutions: Vec::new(),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ImplementationTimeline {
    pub immediate: TimelineBucket,
    pub short_term: TimelineBucket,
    pub medium_term: TimelineBucket,
    pub long_term: TimelineBucket,
}

impl Default for ImplementationTimeline {
    fn default() -> Self {
        Self {
            immediate: TimelineBucket::new("0-1 hours"),
            short_term: TimelineBucket::new("1-8 hours"),
            medium_term: TimelineBucket::new("1-3 days"),
            long_term: TimelineBucket::new("1+ weeks"),
        }
    }
}

impl ImplementationTimeline {
    /// Bucket each resolution by priority; quick-win types jump to short term.
    pub fn from_resolutions(resolutions: &[ResolutionItem]) -> Self {
        let mut timeline = Self::default();
        for resolution in resolutions {
            let bucket = match resolution.priority {
                Severity::Critical => &mut timeline.immediate,
                Severity::High => &mut timeline.short_term,
                _ if resolution.resolution_type.is_quick_win() => &mut timeline.short_term,
                Severity::Medium => &mut timeline.medium_term,
                Severity::Low => &mut timeline.long_term,
            };
            bucket.resolutions.push(resolution.clone());
        }
        timeline
    }

    pub fn len(&self) -> usize {
        [&self.immediate, &self.short_term, &self.medium_term, &self.long_term]
            .iter()
            .map(|b| b.resolutions.len())
            .sum()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "UPPERCASE")]
pub enum EffortLevel {
    Low,
    Medium,
    High,
}

impl EffortLevel {
    pub fn of(resolution_type: ResolutionType) -> Self {
        match resolution_type {
            ResolutionType::CanonicalNameAssignment => EffortLevel::Low,
            ResolutionType::SeverityStandardization | ResolutionType::ReferenceRepair => EffortLevel::Medium,
            ResolutionType::ManualReview => EffortLevel::High,
        }
    }

    pub fn hours(self) -> f64 {
        match self {
            EffortLevel::Low => 0.5,
            EffortLevel::Medium => 2.0,
            EffortLevel::High => 8.0,
        }
    }
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct EffortEstimate {
    pub total_resolutions: usize,
    pub low_effort: usize,
    pub medium_effort: usize,
    pub high_effort: usize,
    pub estimated_hours: f64,
}

impl EffortEstimate {
    pub fn from_resolutions(resolutions: &[ResolutionItem]) -> Self {
        let mut estimate = Self {
            total_resolutions: resolutions.len(),
            ..Self::default()
        };
        for resolution in resolutions {
            let level = EffortLevel::of(resolution.resolution_type);
            match level {
                EffortLevel::Low => estimate.low_effort += 1,
                EffortLevel::Medium => estimate.medium_effort += 1,
                EffortLevel::High => estimate.high_effort += 1,
            }
            estimate.estimated_hours += level.hours();
        }
        estimate
    }
}

/// Historical fix rate per violation type.
pub fn base_success_rate(violation_type: &ViolationType) -> f64 {
    match violation_type {
        ViolationType::ComponentNameConflict => 0.9,
        ViolationType::FailureSeverityMismatch => 0.7,
        ViolationType::BrokenCrossReference => 0.8,
        ViolationType::MissingCanonicalName => 0.95,
        ViolationType::InconsistentFailureAssociation => 0.6,
        ViolationType::DataSourceMismatch => 0.5,
        ViolationType::Other(_) => UNKNOWN_SUCCESS_RATE,
    }
}

/// Confidence-weighted mean of base success rates; 1.0 with nothing to fix.
pub fn success_probability(violations: &[ConsistencyViolation]) -> f64 {
    if violations.is_empty() {
        return 1.0;
    }
    let total_weight: f64 = violations.iter().map(|v| v.confidence).sum();
    if total_weight <= 0.0 {
        return UNKNOWN_SUCCESS_RATE;
    }
    let weighted: f64 = violations
        .iter()
        .map(|v| base_success_rate(&v.violation_type) * v.confidence)
        .sum();
    (weighted / total_weight).clamp(0.0, 1.0)
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ImplementationStep {
    pub step: String,
    pub description: String,
    pub prerequisites: Vec<String>,
    pub estimated_time: String,
    pub risk_level: Severity,
}

/// One step per resolution type with a known playbook, in first-appearance order.
pub fn implementation_guidance(resolutions: &[ResolutionItem]) -> Vec<ImplementationStep> {
    let mut counts: Vec<(ResolutionType, usize)> = Vec::new();
    for resolution in resolutions {
        match counts.iter_mut().find(|(kind, _)| *kind == resolution.resolution_type) {
            Some((_, n)) => *n += 1,
            None => counts.push((resolution.resolution_type, 1)),
        }
    }

    counts
        .into_iter()
        .filter_map(|(kind, n)| {
            let (step, description, prerequisite, minutes_each, risk) = match kind {
                ResolutionType::CanonicalNameAssignment => (
                    "Standardize component names",
                    "Update component inventory with canonical names",
                    "Access to component inventory system",
                    5,
                    Severity::Low,
                ),
                ResolutionType::SeverityStandardization => (
                    "Standardize failure severities",
                    "Review and update failure pattern severity levels",
                    "Domain expertise in failure analysis",
                    15,
                    Severity::Medium,
                ),
                ResolutionType::ReferenceRepair => (
                    "Repair broken references",
                    "Update or remove invalid cross-references",
                    "Access to all data sources",
                    10,
                    Severity::Medium,
                ),
                ResolutionType::ManualReview => return None,
            };
            Some(ImplementationStep {
                step: format!("{} ({} items)", step, n),
                description: description.to_string(),
                prerequisites: vec![prerequisite.to_string()],
                estimated_time: format!("{} minutes", n * minutes_each),
                risk_level: risk,
            })
        })
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::resolution::AffectedItems;
    use pretty_assertions::assert_eq;
    use xref_consistency::ConflictingValues;

    fn item(kind: ResolutionType, priority: Severity) -> ResolutionItem {
        ResolutionItem {
            violation_id: kind.as_str().into(),
            violation_type: ViolationType::Other("test".into()),
            resolution_type: kind,
            priority,
            action: String::new(),
            description: String::new(),
            affected_items: AffectedItems::Review(ConflictingValues::Other(Default::default())),
            affected_sources: Vec::new(),
            confidence: 0.5,
        }
    }

    fn violation(kind: ViolationType, confidence: f64) -> ConsistencyViolation {
        ConsistencyViolation::new(kind, "", Vec::new(), ConflictingValues::Other(Default::default()), confidence)
    }

    #[test]
    fn test_timeline_buckets() {
        let timeline = ImplementationTimeline::from_resolutions(&[
            item(ResolutionType::ManualReview, Severity::Critical),
            item(ResolutionType::ManualReview, Severity::High),
            item(ResolutionType::ReferenceRepair, Severity::Low),
            item(ResolutionType::SeverityStandardization, Severity::Medium),
            item(ResolutionType::ManualReview, Severity::Low),
        ]);
        assert_eq!(timeline.immediate.resolutions.len(), 1);
        assert_eq!(timeline.short_term.resolutions.len(), 2);
        assert_eq!(timeline.medium_term.resolutions.len(), 1);
        assert_eq!(timeline.long_term.resolutions.len(), 1);
        assert_eq!(timeline.len(), 5);
        assert_eq!(timeline.short_term.timeframe, "1-8 hours");
    }

    #[test]
    fn test_effort_hours() {
        let effort = EffortEstimate::from_resolutions(&[
            item(ResolutionType::CanonicalNameAssignment, Severity::Medium),
            item(ResolutionType::SeverityStandardization, Severity::High),
            item(ResolutionType::ReferenceRepair, Severity::Medium),
            item(ResolutionType::ManualReview, Severity::Low),
        ]);
        assert_eq!(effort.total_resolutions, 4);
        assert_eq!((effort.low_effort, effort.medium_effort, effort.high_effort), (1, 2, 1));
        assert_eq!(effort.estimated_hours, 12.5);
    }

    #[test]
    fn test_success_probability() {
        assert_eq!(success_probability(&[]), 1.0);
        assert_eq!(
            success_probability(&[violation(ViolationType::ComponentNameConflict, 0.0)]),
            0.7
        );
        let p = success_probability(&[
            violation(ViolationType::MissingCanonicalName, 0.8),
            violation(ViolationType::DataSourceMismatch, 0.2),
        ]);
        assert!((p - (0.95 * 0.8 + 0.5 * 0.2)).abs() < 1e-9);
        assert_eq!(
            success_probability(&[violation(ViolationType::Other("novel".into()), 1.0)]),
            0.7
        );
    }

    #[test]
    fn test_success_probability_stays_in_range() {
        let p = success_probability(&[
            violation(ViolationType::MissingCanonicalName, 1.0),
            violation(ViolationType::DataSourceMismatch, -0.5),
        ]);
        assert!((0.0..=1.0).contains(&p));
    }

    #[test]
    fn test_guidance_skips_manual_review() {
        let guidance = implementation_guidance(&[
            item(ResolutionType::ReferenceRepair, Severity::Medium),
            item(ResolutionType::ManualReview, Severity::Low),
            item(ResolutionType::ReferenceRepair, Severity::Medium),
        ]);
        assert_eq!(guidance.len(), 1);
        assert_eq!(guidance[0].step, "Repair broken references (2 items)");
        assert_eq!(guidance[0].estimated_time, "20 minutes");
    }
}
