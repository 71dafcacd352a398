//! Failure pattern -> troubleshooting procedure correlation.

use std::collections::{BTreeMap, HashSet};

use serde::{Deserialize, Serialize};
use xref_protocol::{LogAnalysisOutput, ProcedureRecord, Severity, StructuredSections};
use xref_resolver::{Lexicon, ResolverError};

use crate::error::Result;
use crate::mentions::MentionExtractor;
use crate::types::{FailurePattern, FailurePatternCorrelation};

/// Default minimum strength for a correlated pattern to be reported.
pub const DEFAULT_FAILURE_CORRELATION_THRESHOLD: f64 = 0.5;

const PROCEDURE_MATCH_FLOOR: f64 = 0.5;
const KEYWORD_WEIGHT: f64 = 0.6;
const OVERLAP_WEIGHT: f64 = 0.4;
const MAX_PROCEDURES: usize = 3;
const MAX_MATCHED_LINES: usize = 5;
const HIGH_CONFIDENCE: f64 = 0.8;
const RECOMMENDATION_FLOOR: f64 = 0.7;
const DEFAULT_PATTERN_CONFIDENCE: f64 = 0.5;

/// Flatten categorized indicators and top issues into one pattern list.
pub fn collect_failure_patterns(logs: &LogAnalysisOutput) -> Vec<FailurePattern> {
    let mut patterns = Vec::new();

    for (category, indicators) in &logs.categorized_indicators {
        for indicator in indicators {
            patterns.push(FailurePattern {
                pattern_type: indicator.indicator_type.clone().unwrap_or_else(|| category.clone()),
                description: indicator.description.clone(),
                severity: indicator.severity,
                confidence: indicator.confidence.unwrap_or(DEFAULT_PATTERN_CONFIDENCE),
                matched_lines: indicator.sample_lines.clone(),
                components: indicator.components.clone(),
            });
        }
    }

    for issue in &logs.top_issues {
        patterns.push(FailurePattern {
            pattern_type: issue.issue_type.clone().unwrap_or_else(|| "unknown".to_string()),
            description: issue.description.clone(),
            severity: issue.severity,
            confidence: issue.confidence.unwrap_or(DEFAULT_PATTERN_CONFIDENCE),
            matched_lines: issue.sample_matches.clone(),
            components: issue.components.clone(),
        });
    }

    patterns
}

/// Procedures from a guide, plus one synthetic procedure per symptom and per step.
pub fn collect_procedures(sections: &StructuredSections) -> Vec<ProcedureRecord> {
    let mut procedures = sections.procedures.clone();

    procedures.extend(sections.symptoms.iter().enumerate().map(|(i, symptom)| ProcedureRecord {
        title: format!("Symptom {} Resolution", i + 1),
        description: symptom.clone(),
        symptoms: vec![symptom.clone()],
        troubleshooting_steps: Vec::new(),
    }));

    procedures.extend(
        sections
            .troubleshooting_steps
            .iter()
            .enumerate()
            .map(|(i, step)| ProcedureRecord {
                title: format!("Troubleshooting Step {}", i + 1),
                description: step.clone(),
                symptoms: Vec::new(),
                troubleshooting_steps: vec![step.clone()],
            }),
    );

    procedures
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct CorrelationStatistics {
    pub total_failure_patterns: usize,
    pub total_procedures: usize,
    pub correlations_found: usize,
    pub correlation_rate: f64,
    pub avg_correlation_strength: f64,
    pub high_confidence_correlations: usize,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ProcedureRecommendation {
    pub failure_pattern: String,
    pub severity: Severity,
    pub procedure_title: String,
    pub procedure_description: String,
    pub correlation_strength: f64,
    pub associated_components: Vec<String>,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct FailureCorrelationReport {
    pub failure_correlations: Vec<FailurePatternCorrelation>,
    pub correlation_statistics: CorrelationStatistics,
    pub correlations_by_severity: BTreeMap<Severity, Vec<FailurePatternCorrelation>>,
    pub procedure_recommendations: Vec<ProcedureRecommendation>,
}

/// Scores failure patterns against procedures by keyword hits and word overlap.
pub struct FailureCorrelator<'a> {
    lexicon: &'static Lexicon,
    extractor: &'a dyn MentionExtractor,
    threshold: f64,
}

impl<'a> FailureCorrelator<'a> {
    pub fn new(lexicon: &'static Lexicon, extractor: &'a dyn MentionExtractor) -> Self {
        Self {
            lexicon,
            extractor,
            threshold: DEFAULT_FAILURE_CORRELATION_THRESHOLD,
        }
    }

    pub fn with_threshold(mut self, threshold: f64) -> Result<Self> {
        self.threshold = ResolverError::check_threshold(threshold)?;
        Ok(self)
    }

    /// `0.6 x keyword hit ratio + 0.4 x word Jaccard`, capped at 1.0.
    pub fn strength(&self, pattern: &FailurePattern, procedure: &ProcedureRecord) -> f64 {
        let text = procedure.text().to_lowercase();
        let mut score = 0.0;

        if let Some(keywords) = self.lexicon.failure_keywords(&pattern.pattern_type) {
            let hits = keywords.iter().filter(|keyword| text.contains(*keyword)).count();
            score += hits as f64 / keywords.len() as f64 * KEYWORD_WEIGHT;
        }

        let description = pattern.description.to_lowercase();
        let pattern_words: HashSet<&str> = description.split_whitespace().collect();
        let procedure_words: HashSet<&str> = text.split_whitespace().collect();
        if !pattern_words.is_empty() && !procedure_words.is_empty() {
            let shared = pattern_words.intersection(&procedure_words).count();
            let union = pattern_words.union(&procedure_words).count();
            score += shared as f64 / union as f64 * OVERLAP_WEIGHT;
        }

        score.min(1.0)
    }

    /// Correlate one pattern with every procedure; always returns a correlation,
    /// possibly with no procedures and zero strength.
    pub fn correlate_pattern(&self, pattern: &FailurePattern, procedures: &[ProcedureRecord]) -> FailurePatternCorrelation {
        let mut matching: Vec<(f64, &ProcedureRecord)> = procedures
            .iter()
            .map(|procedure| (self.strength(pattern, procedure), procedure))
            .filter(|(strength, _)| *strength > PROCEDURE_MATCH_FLOOR)
            .collect();
        matching.sort_by(|a, b| b.0.total_cmp(&a.0));

        let associated_components = if pattern.components.is_empty() {
            let lines: Vec<&str> = pattern
                .matched_lines
                .iter()
                .take(MAX_MATCHED_LINES)
                .map(String::as_str)
                .collect();
            self.extractor.extract(&lines.join(" "))
        } else {
            pattern.components.clone()
        };

        FailurePatternCorrelation {
            failure_pattern: pattern.description.clone(),
            pattern_type: pattern.pattern_type.clone(),
            severity: pattern.severity,
            associated_components,
            correlation_strength: matching.first().map_or(0.0, |(strength, _)| *strength),
            procedures: matching
                .into_iter()
                .take(MAX_PROCEDURES)
                .map(|(_, procedure)| procedure.clone())
                .collect(),
        }
    }

    pub fn correlate(&self, patterns: &[FailurePattern], procedures: &[ProcedureRecord]) -> FailureCorrelationReport {
        let correlations: Vec<FailurePatternCorrelation> = patterns
            .iter()
            .map(|pattern| self.correlate_pattern(pattern, procedures))
            .filter(|correlation| correlation.correlation_strength >= self.threshold)
            .collect();

        let found = correlations.len();
        let statistics = CorrelationStatistics {
            total_failure_patterns: patterns.len(),
            total_procedures: procedures.len(),
            correlations_found: found,
            correlation_rate: ratio(found, patterns.len()),
            avg_correlation_strength: if found == 0 {
                0.0
            } else {
                correlations.iter().map(|c| c.correlation_strength).sum::<f64>() / found as f64
            },
            high_confidence_correlations: correlations
                .iter()
                .filter(|c| c.correlation_strength > HIGH_CONFIDENCE)
                .count(),
        };

        let mut by_severity: BTreeMap<Severity, Vec<FailurePatternCorrelation>> = BTreeMap::new();
        for correlation in &correlations {
            by_severity.entry(correlation.severity).or_default().push(correlation.clone());
        }

        let recommendations = correlations
            .iter()
            .filter(|c| c.correlation_strength > RECOMMENDATION_FLOOR)
            .flat_map(|c| {
                c.procedures.iter().map(move |procedure| ProcedureRecommendation {
                    failure_pattern: c.failure_pattern.clone(),
                    severity: c.severity,
                    procedure_title: procedure.display_title().to_string(),
                    procedure_description: procedure.description.clone(),
                    correlation_strength: c.correlation_strength,
                    associated_components: c.associated_components.clone(),
                })
            })
            .collect();

        log::info!(
            "Correlated failures: {} of {} patterns matched {} procedures",
            found,
            patterns.len(),
            procedures.len()
        );

        FailureCorrelationReport {
            failure_correlations: correlations,
            correlation_statistics: statistics,
            correlations_by_severity: by_severity,
            procedure_recommendations: recommendations,
        }
    }
}

fn ratio(part: usize, whole: usize) -> f64 {
    if whole == 0 {
        0.0
    } else {
        part as f64 / whole as f64
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::mentions::PatternExtractor;
    use pretty_assertions::assert_eq;

    fn pattern(pattern_type: &str, description: &str, severity: Severity) -> FailurePattern {
        FailurePattern {
            pattern_type: pattern_type.into(),
            description: description.into(),
            severity,
            confidence: 0.5,
            matched_lines: vec![],
            components: vec![],
        }
    }

    fn procedure(title: &str, steps: &[&str]) -> ProcedureRecord {
        ProcedureRecord {
            title: title.into(),
            troubleshooting_steps: steps.iter().map(|s| s.to_string()).collect(),
            ..Default::default()
        }
    }

    #[test]
    fn test_collect_failure_patterns() {
        let logs: LogAnalysisOutput = serde_json::from_str(
            r#"{
                "categorized_indicators": {"memory_issues": [{"description": "heap exhausted", "severity": "HIGH"}]},
                "top_issues": [{"description": "link dropped", "type": "connection_timeout", "severity": "CRITICAL"}]
            }"#,
        )
        .unwrap();
        let patterns = collect_failure_patterns(&logs);
        assert_eq!(patterns.len(), 2);
        assert_eq!(patterns[0].pattern_type, "memory_issues");
        assert_eq!(patterns[0].confidence, 0.5);
        assert_eq!(patterns[1].pattern_type, "connection_timeout");
        assert_eq!(patterns[1].severity, Severity::Critical);
    }

    #[test]
    fn test_collect_procedures_synthesizes_titles() {
        let sections = StructuredSections {
            procedures: vec![procedure("Reseat cable", &[])],
            symptoms: vec!["no signal".into()],
            troubleshooting_steps: vec!["check fuse".into(), "replace fuse".into()],
        };
        let titles: Vec<String> = collect_procedures(&sections).into_iter().map(|p| p.title).collect();
        assert_eq!(
            titles,
            vec!["Reseat cable", "Symptom 1 Resolution", "Troubleshooting Step 1", "Troubleshooting Step 2"]
        );
    }

    #[test]
    fn test_strength_combines_keywords_and_overlap() {
        let extractor = PatternExtractor::new().unwrap();
        let correlator = FailureCorrelator::new(Lexicon::shared(), &extractor);
        let p = pattern("connection_timeout", "connection timeout", Severity::High);
        let proc = procedure("connection timeout", &["check cable communication"]);

        // all four keywords hit; words {connection, timeout} vs {connection, timeout, check, cable, communication}
        let expected = 0.6 + 0.4 * (2.0 / 5.0);
        assert!((correlator.strength(&p, &proc) - expected).abs() < 1e-9);
    }

    #[test]
    fn test_unrelated_procedure_is_not_attached() {
        let extractor = PatternExtractor::new().unwrap();
        let correlator = FailureCorrelator::new(Lexicon::shared(), &extractor);
        let p = pattern("disk_issues", "disk full", Severity::Medium);
        let correlation = correlator.correlate_pattern(&p, &[procedure("Align mirror", &["adjust screws"])]);
        assert!(correlation.procedures.is_empty());
        assert_eq!(correlation.correlation_strength, 0.0);
    }

    #[test]
    fn test_components_fall_back_to_matched_lines() {
        let extractor = PatternExtractor::new().unwrap();
        let correlator = FailureCorrelator::new(Lexicon::shared(), &extractor);
        let mut p = pattern("temperature_control", "overheat", Severity::High);
        p.matched_lines = vec!["ERROR temperature controller tripped".into()];
        let correlation = correlator.correlate_pattern(&p, &[]);
        assert_eq!(correlation.associated_components, vec!["temperature controller".to_string()]);
    }

    #[test]
    fn test_report_filters_and_groups() {
        let extractor = PatternExtractor::new().unwrap();
        let correlator = FailureCorrelator::new(Lexicon::shared(), &extractor);
        let patterns = vec![
            pattern("connection_timeout", "connection timeout", Severity::Critical),
            pattern("disk_issues", "disk full", Severity::Low),
        ];
        let procedures = vec![procedure("connection timeout", &["check cable communication"])];
        let report = correlator.correlate(&patterns, &procedures);

        assert_eq!(report.failure_correlations.len(), 1);
        assert_eq!(report.correlation_statistics.total_failure_patterns, 2);
        assert_eq!(report.correlation_statistics.correlation_rate, 0.5);
        assert_eq!(report.correlations_by_severity[&Severity::Critical].len(), 1);
        assert_eq!(report.procedure_recommendations.len(), 1);
        assert_eq!(report.procedure_recommendations[0].procedure_title, "connection timeout");
    }
}
