//! Unified view over the log, component and failure correlation results.

use serde::{Deserialize, Serialize};
use xref_graph::{CanonicalEntity, CorrelationSummary, FailureCorrelationReport, FailurePatternCorrelation};
use xref_protocol::{LogAnalysisOutput, Severity};

const MAX_UNIFIED_RECOMMENDATIONS: usize = 10;
const HIGH_CONSISTENCY: f64 = 0.8;
const HIGH_CORRELATION_STRENGTH: f64 = 0.8;
const HIGH_RISK_FAILURES: usize = 2;
const LOW_CONSISTENCY: f64 = 0.6;
const NEUTRAL_CONFIDENCE: f64 = 0.5;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "UPPERCASE")]
pub enum SystemStatus {
    Pass,
    Fail,
    Uncertain,
}

impl SystemStatus {
    /// Decisive risk levels map to a verdict; anything else stays open.
    pub fn from_risk(risk: Option<Severity>) -> Self {
        match risk {
            Some(Severity::High | Severity::Critical) => SystemStatus::Fail,
            Some(Severity::Low) => SystemStatus::Pass,
            _ => SystemStatus::Uncertain,
        }
    }
}

/// Three-step grade used for confidence and consistency labels (`> 0.8`, `> 0.6`).
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "UPPERCASE")]
pub enum Grade {
    High,
    Medium,
    Low,
}

impl Grade {
    pub fn from_score(score: f64) -> Self {
        Self::with_bounds(score, 0.8, 0.6)
    }

    pub fn with_bounds(score: f64, high: f64, medium: f64) -> Self {
        if score > high {
            Grade::High
        } else if score > medium {
            Grade::Medium
        } else {
            Grade::Low
        }
    }

    fn weight(self) -> f64 {
        match self {
            Grade::High => 1.0,
            Grade::Medium => 0.6,
            Grade::Low => 0.3,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(rename_all = "UPPERCASE")]
pub enum RecommendationPriority {
    Immediate,
    High,
    Medium,
    Low,
}

impl From<Severity> for RecommendationPriority {
    fn from(severity: Severity) -> Self {
        match severity {
            Severity::Critical => RecommendationPriority::Immediate,
            Severity::High => RecommendationPriority::High,
            Severity::Medium => RecommendationPriority::Medium,
            Severity::Low => RecommendationPriority::Low,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "UPPERCASE")]
pub enum RecommendationCategory {
    Safety,
    Component,
    Troubleshooting,
    Consistency,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Recommendation {
    pub priority: RecommendationPriority,
    pub category: RecommendationCategory,
    pub action: String,
    pub description: String,
    pub source: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub component: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub procedure: Option<String>,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct CrossSourceConsistency {
    /// Share of entities with consistency above 0.8
    pub component_consistency: f64,
    /// Share of failure correlations stronger than 0.8
    pub failure_pattern_consistency: f64,
    pub overall_consistency: f64,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct AnalysisMetadata {
    pub sources_analyzed: Vec<String>,
    pub total_components_identified: usize,
    pub total_failure_patterns: usize,
    pub confidence_level: Grade,
    pub consistency_level: Grade,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct UnifiedAnalysis {
    pub overall_status: SystemStatus,
    pub confidence_level: f64,
    pub component_correlations: Vec<CanonicalEntity>,
    pub failure_correlations: Vec<FailurePatternCorrelation>,
    pub cross_source_consistency: CrossSourceConsistency,
    pub unified_recommendations: Vec<Recommendation>,
    pub analysis_metadata: AnalysisMetadata,
}

impl UnifiedAnalysis {
    pub fn critical_failures(&self) -> impl Iterator<Item = &FailurePatternCorrelation> {
        self.failure_correlations
            .iter()
            .filter(|f| f.severity == Severity::Critical)
    }

    pub fn immediate_actions(&self) -> usize {
        self.unified_recommendations
            .iter()
            .filter(|r| r.priority == RecommendationPriority::Immediate)
            .count()
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct KeyFindings {
    pub components_analyzed: usize,
    pub failure_patterns_identified: usize,
    pub critical_issues: usize,
    pub immediate_actions_required: usize,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct UnifiedSummary {
    pub overall_status: SystemStatus,
    pub confidence_level: Grade,
    pub key_findings: KeyFindings,
    pub data_consistency: f64,
    pub recommendation_summary: String,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum InsightType {
    ComponentRisk,
    CriticalFailures,
    DataConsistency,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ActionableInsight {
    #[serde(rename = "type")]
    pub insight_type: InsightType,
    pub insight: String,
    pub action: String,
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub components: Vec<String>,
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub patterns: Vec<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub consistency_score: Option<f64>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SourceQuality {
    pub quality: Grade,
    /// Patterns detected or correlation rate, depending on the source
    pub measure: f64,
    /// Sources analysed or procedures matched, depending on the source
    pub count: usize,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct OverallQuality {
    pub quality: Grade,
    pub score: f64,
    pub recommendation: String,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct DataQualityAssessment {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub log_analysis: Option<SourceQuality>,
    pub component_correlations: SourceQuality,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub failure_correlations: Option<SourceQuality>,
    pub overall: OverallQuality,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct UnifiedReport {
    pub unified_analysis: UnifiedAnalysis,
    pub executive_summary: UnifiedSummary,
    pub actionable_insights: Vec<ActionableInsight>,
    pub data_quality_assessment: DataQualityAssessment,
}

/// Merge the stage outputs of one run. `failures` is `None` when no log
/// analysis was supplied.
pub fn unify(
    logs: Option<&LogAnalysisOutput>,
    entities: &[CanonicalEntity],
    summary: &CorrelationSummary,
    failures: Option<&FailureCorrelationReport>,
) -> UnifiedReport {
    let log_summary = logs.and_then(|l| l.analysis_summary.as_ref());
    let risk = log_summary.and_then(|s| s.risk_level);
    let status = SystemStatus::from_risk(risk);

    let mut factors = Vec::with_capacity(3);
    if log_summary.is_some() {
        factors.push(match risk {
            Some(Severity::High | Severity::Critical | Severity::Low) => 0.9,
            _ => 0.6,
        });
    }
    factors.push((summary.correlation_rate + 0.3).min(0.9));
    if let Some(report) = failures {
        factors.push((report.correlation_statistics.correlation_rate + 0.2).min(0.9));
    }
    let confidence = mean(&factors).unwrap_or(NEUTRAL_CONFIDENCE);

    let failure_correlations: Vec<FailurePatternCorrelation> =
        failures.map(|r| r.failure_correlations.clone()).unwrap_or_default();

    let component_consistency = share(entities, |e| e.consistency_score > HIGH_CONSISTENCY);
    let failure_pattern_consistency = share(&failure_correlations, |f| {
        f.correlation_strength > HIGH_CORRELATION_STRENGTH
    });
    let consistency = CrossSourceConsistency {
        component_consistency,
        failure_pattern_consistency,
        overall_consistency: (component_consistency + failure_pattern_consistency) / 2.0,
    };

    let consistency_level = Grade::from_score(consistency.overall_consistency);
    let recommendations = unified_recommendations(status, entities, &failure_correlations);

    let analysis = UnifiedAnalysis {
        overall_status: status,
        confidence_level: confidence,
        component_correlations: entities.to_vec(),
        cross_source_consistency: consistency,
        unified_recommendations: recommendations,
        analysis_metadata: AnalysisMetadata {
            sources_analyzed: summary.sources_analyzed.clone(),
            total_components_identified: entities.len(),
            total_failure_patterns: failure_correlations.len(),
            confidence_level: Grade::from_score(confidence),
            consistency_level,
        },
        failure_correlations,
    };

    log::info!(
        "Unified analysis: status {:?}, confidence {:.2}, {} recommendations",
        analysis.overall_status,
        analysis.confidence_level,
        analysis.unified_recommendations.len()
    );

    UnifiedReport {
        executive_summary: executive_summary(&analysis),
        actionable_insights: actionable_insights(&analysis),
        data_quality_assessment: data_quality(logs, summary, failures),
        unified_analysis: analysis,
    }
}

fn unified_recommendations(
    status: SystemStatus,
    entities: &[CanonicalEntity],
    failures: &[FailurePatternCorrelation],
) -> Vec<Recommendation> {
    let mut recommendations = Vec::new();

    if status == SystemStatus::Fail {
        recommendations.push(Recommendation {
            priority: RecommendationPriority::Immediate,
            category: RecommendationCategory::Safety,
            action: "Stop instrument operation immediately".into(),
            description: "Critical issues detected across multiple data sources".into(),
            source: "unified_analysis".into(),
            component: None,
            procedure: None,
        });
    }

    for entity in entities.iter().filter(|e| !e.failure_associations.is_empty()) {
        recommendations.push(Recommendation {
            priority: RecommendationPriority::High,
            category: RecommendationCategory::Component,
            action: format!("Investigate {}", entity.canonical_name),
            description: format!(
                "Component has {} associated failure patterns",
                entity.failure_associations.len()
            ),
            source: "component_correlation".into(),
            component: Some(entity.canonical_name.clone()),
            procedure: None,
        });
    }

    for failure in failures {
        if !matches!(failure.severity, Severity::Critical | Severity::High) {
            continue;
        }
        let Some(procedure) = failure.procedures.first() else {
            continue;
        };
        let title = if procedure.title.is_empty() {
            "Unnamed"
        } else {
            procedure.title.as_str()
        };
        recommendations.push(Recommendation {
            priority: if failure.severity == Severity::Critical {
                RecommendationPriority::High
            } else {
                RecommendationPriority::Medium
            },
            category: RecommendationCategory::Troubleshooting,
            action: format!("Execute procedure: {}", title),
            description: format!("Address {}", failure.failure_pattern),
            source: "failure_correlation".into(),
            component: None,
            procedure: Some(title.to_string()),
        });
    }

    recommendations.sort_by_key(|r| r.priority);
    recommendations.truncate(MAX_UNIFIED_RECOMMENDATIONS);
    recommendations
}

fn executive_summary(analysis: &UnifiedAnalysis) -> UnifiedSummary {
    UnifiedSummary {
        overall_status: analysis.overall_status,
        confidence_level: Grade::from_score(analysis.confidence_level),
        key_findings: KeyFindings {
            components_analyzed: analysis.component_correlations.len(),
            failure_patterns_identified: analysis.failure_correlations.len(),
            critical_issues: analysis.critical_failures().count(),
            immediate_actions_required: analysis.immediate_actions(),
        },
        data_consistency: analysis.cross_source_consistency.overall_consistency,
        recommendation_summary: format!(
            "{} actionable recommendations generated",
            analysis.unified_recommendations.len()
        ),
    }
}

fn actionable_insights(analysis: &UnifiedAnalysis) -> Vec<ActionableInsight> {
    let mut insights = Vec::new();

    let high_risk: Vec<String> = analysis
        .component_correlations
        .iter()
        .filter(|e| e.failure_associations.len() > HIGH_RISK_FAILURES)
        .map(|e| e.canonical_name.clone())
        .collect();
    if !high_risk.is_empty() {
        insights.push(ActionableInsight {
            insight_type: InsightType::ComponentRisk,
            insight: format!("{} components have multiple failure associations", high_risk.len()),
            action: "Prioritize inspection of high-risk components".into(),
            components: high_risk,
            patterns: Vec::new(),
            consistency_score: None,
        });
    }

    let critical: Vec<String> = analysis
        .critical_failures()
        .map(|f| f.failure_pattern.clone())
        .collect();
    if !critical.is_empty() {
        insights.push(ActionableInsight {
            insight_type: InsightType::CriticalFailures,
            insight: format!("{} critical failure patterns detected", critical.len()),
            action: "Address critical failures immediately".into(),
            components: Vec::new(),
            patterns: critical,
            consistency_score: None,
        });
    }

    let overall = analysis.cross_source_consistency.overall_consistency;
    if overall < LOW_CONSISTENCY {
        insights.push(ActionableInsight {
            insight_type: InsightType::DataConsistency,
            insight: "Low consistency between data sources detected".into(),
            action: "Verify data quality and consider additional diagnostics".into(),
            components: Vec::new(),
            patterns: Vec::new(),
            consistency_score: Some(overall),
        });
    }

    insights
}

fn data_quality(
    logs: Option<&LogAnalysisOutput>,
    summary: &CorrelationSummary,
    failures: Option<&FailureCorrelationReport>,
) -> DataQualityAssessment {
    let log_analysis = logs.and_then(|l| l.analysis_summary.as_ref()).map(|s| {
        let patterns = s.total_patterns;
        SourceQuality {
            quality: match patterns {
                0 => Grade::Low,
                1..=5 => Grade::Medium,
                _ => Grade::High,
            },
            measure: patterns as f64,
            count: patterns,
        }
    });

    let component_correlations = SourceQuality {
        quality: Grade::with_bounds(summary.correlation_rate, 0.8, 0.5),
        measure: summary.correlation_rate,
        count: summary.sources_analyzed.len(),
    };

    let failure_correlations = failures.map(|r| {
        let stats = &r.correlation_statistics;
        SourceQuality {
            quality: Grade::with_bounds(stats.correlation_rate, 0.7, 0.4),
            measure: stats.correlation_rate,
            count: stats.correlations_found,
        }
    });

    let mut weights = Vec::with_capacity(3);
    weights.extend(log_analysis.as_ref().map(|q| q.quality.weight()));
    weights.push(component_correlations.quality.weight());
    weights.extend(failure_correlations.as_ref().map(|q| q.quality.weight()));
    let score = mean(&weights).unwrap_or(0.0);

    DataQualityAssessment {
        log_analysis,
        component_correlations,
        failure_correlations,
        overall: OverallQuality {
            quality: Grade::with_bounds(score, 0.8, 0.5),
            score,
            recommendation: if score > 0.7 {
                "Data quality is sufficient for reliable analysis".into()
            } else {
                "Consider additional data collection for improved accuracy".into()
            },
        },
    }
}

fn mean(values: &[f64]) -> Option<f64> {
    if values.is_empty() {
        None
    } else {
        Some(values.iter().sum::<f64>() / values.len() as f64)
    }
}

fn share<T>(items: &[T], pred: impl Fn(&T) -> bool) -> f64 {
    if items.is_empty() {
        0.0
    } else {
        items.iter().filter(|item| pred(item)).count() as f64 / items.len() as f64
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;
    use xref_protocol::{AnalysisSummary, ProcedureRecord};

    fn logs(risk: Option<Severity>) -> LogAnalysisOutput {
        LogAnalysisOutput {
            analysis_summary: Some(AnalysisSummary {
                total_patterns: 2,
                risk_level: risk,
            }),
            ..LogAnalysisOutput::default()
        }
    }

    fn entity(name: &str, failures: usize, consistency: f64) -> CanonicalEntity {
        let mut entity = CanonicalEntity::new(name, name);
        entity.failure_associations = (0..failures).map(|i| format!("failure {}", i)).collect();
        entity.consistency_score = consistency;
        entity
    }

    fn failure(pattern: &str, severity: Severity, title: &str, strength: f64) -> FailurePatternCorrelation {
        FailurePatternCorrelation {
            failure_pattern: pattern.into(),
            pattern_type: "connection_timeout".into(),
            severity,
            associated_components: Vec::new(),
            procedures: vec![ProcedureRecord {
                title: title.into(),
                ..ProcedureRecord::default()
            }],
            correlation_strength: strength,
        }
    }

    fn failure_report(correlations: Vec<FailurePatternCorrelation>, rate: f64) -> FailureCorrelationReport {
        let mut report = FailureCorrelationReport {
            failure_correlations: correlations,
            ..FailureCorrelationReport::default()
        };
        report.correlation_statistics.correlation_rate = rate;
        report
    }

    fn summary(rate: f64) -> CorrelationSummary {
        CorrelationSummary {
            correlation_rate: rate,
            sources_analyzed: vec!["component_inventory".into(), "log_analysis".into()],
            ..CorrelationSummary::default()
        }
    }

    #[test]
    fn test_status_from_risk() {
        assert_eq!(SystemStatus::from_risk(Some(Severity::High)), SystemStatus::Fail);
        assert_eq!(SystemStatus::from_risk(Some(Severity::Low)), SystemStatus::Pass);
        assert_eq!(SystemStatus::from_risk(Some(Severity::Medium)), SystemStatus::Uncertain);
        assert_eq!(SystemStatus::from_risk(None), SystemStatus::Uncertain);
    }

    #[test]
    fn test_confidence_factors() {
        let logs = logs(Some(Severity::High));
        let report = failure_report(Vec::new(), 0.5);
        let unified = unify(Some(&logs), &[], &summary(1.0), Some(&report));
        // (0.9 + 0.9 + 0.7) / 3
        assert!((unified.unified_analysis.confidence_level - 2.5 / 3.0).abs() < 1e-9);
        assert_eq!(unified.unified_analysis.overall_status, SystemStatus::Fail);

        let unified = unify(None, &[], &summary(0.2), None);
        assert!((unified.unified_analysis.confidence_level - 0.5).abs() < 1e-9);
        assert_eq!(unified.unified_analysis.overall_status, SystemStatus::Uncertain);
    }

    #[test]
    fn test_cross_source_consistency_grade() {
        let entities = vec![entity("Laser Diode", 0, 0.9), entity("Fan", 0, 0.9)];
        let report = failure_report(vec![failure("timeout", Severity::High, "Reset link", 0.9)], 1.0);
        let unified = unify(None, &entities, &summary(1.0), Some(&report)).unified_analysis;
        assert_eq!(unified.cross_source_consistency.overall_consistency, 1.0);
        assert_eq!(unified.analysis_metadata.consistency_level, Grade::High);

        let unified = unify(None, &entities, &summary(1.0), None).unified_analysis;
        assert_eq!(unified.cross_source_consistency.overall_consistency, 0.5);
        assert_eq!(unified.analysis_metadata.consistency_level, Grade::Low);
    }

    #[test]
    fn test_recommendations_order() {
        let logs = logs(Some(Severity::High));
        let entities = vec![entity("Laser Diode", 1, 0.9), entity("Fan", 0, 0.9)];
        let report = failure_report(
            vec![
                failure("timeout", Severity::High, "Reset link", 0.9),
                failure("overheat", Severity::Critical, "", 0.6),
                failure("drift", Severity::Low, "Recalibrate", 0.9),
            ],
            1.0,
        );
        let unified = unify(Some(&logs), &entities, &summary(1.0), Some(&report));
        let actions: Vec<&str> = unified
            .unified_analysis
            .unified_recommendations
            .iter()
            .map(|r| r.action.as_str())
            .collect();
        assert_eq!(
            actions,
            vec![
                "Stop instrument operation immediately",
                "Investigate Laser Diode",
                "Execute procedure: Unnamed",
                "Execute procedure: Reset link",
            ]
        );
        assert_eq!(unified.executive_summary.key_findings.immediate_actions_required, 1);
        assert_eq!(unified.executive_summary.key_findings.critical_issues, 1);
    }

    #[test]
    fn test_cross_source_consistency_and_insights() {
        let entities = vec![entity("Heater", 3, 0.9), entity("Fan", 0, 0.5)];
        let report = failure_report(vec![failure("overheat", Severity::Critical, "Cool", 0.5)], 1.0);
        let unified = unify(None, &entities, &summary(1.0), Some(&report));
        let consistency = &unified.unified_analysis.cross_source_consistency;
        assert_eq!(consistency.component_consistency, 0.5);
        assert_eq!(consistency.failure_pattern_consistency, 0.0);
        assert_eq!(consistency.overall_consistency, 0.25);

        let kinds: Vec<InsightType> = unified.actionable_insights.iter().map(|i| i.insight_type).collect();
        assert_eq!(
            kinds,
            vec![
                InsightType::ComponentRisk,
                InsightType::CriticalFailures,
                InsightType::DataConsistency
            ]
        );
        assert_eq!(unified.actionable_insights[0].components, vec!["Heater"]);
    }

    #[test]
    fn test_data_quality() {
        let logs = logs(Some(Severity::Medium));
        let report = failure_report(Vec::new(), 0.8);
        let unified = unify(Some(&logs), &[], &summary(0.9), Some(&report));
        let quality = &unified.data_quality_assessment;
        assert_eq!(quality.log_analysis.as_ref().map(|q| q.quality), Some(Grade::Medium));
        assert_eq!(quality.component_correlations.quality, Grade::High);
        assert_eq!(quality.failure_correlations.as_ref().map(|q| q.quality), Some(Grade::High));
        assert!((quality.overall.score - (0.6 + 1.0 + 1.0) / 3.0).abs() < 1e-9);
        assert_eq!(quality.overall.quality, Grade::High);
    }
}
