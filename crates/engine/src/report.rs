//! Report compiler: folds the unified analysis, validation and plan into one
//! structured diagnostic report.

use serde::{Deserialize, Serialize};
use xref_consistency::{ConsistencyLevel, ValidationMetadata, ValidationReport, ViolationSummary};
use xref_graph::RelationshipAnalysis;
use xref_planner::{PlanReport, ResolutionSummary};

use crate::config::ReportFormat;
use crate::unified::{
    ActionableInsight, AnalysisMetadata, DataQualityAssessment, Grade, Recommendation, RecommendationCategory,
    RecommendationPriority, SystemStatus, UnifiedReport,
};

pub const REPORT_TYPE: &str = "Comprehensive Instrument Diagnostic Report";
const ANALYSIS_SCOPE: &str = "Cross-source correlation with consistency validation";
const KEY_RECOMMENDATIONS: usize = 5;
const REQUIRED_SECTIONS: f64 = 5.0;

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ReportHeader {
    pub report_type: String,
    pub format: ReportFormat,
    pub analysis_scope: String,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ReportFindings {
    pub components_identified: usize,
    pub failure_patterns_detected: usize,
    pub consistency_violations: usize,
    pub critical_issues: usize,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ExecutiveSummary {
    pub system_health: SystemStatus,
    pub confidence_assessment: Grade,
    pub data_consistency: ConsistencyLevel,
    pub key_findings: ReportFindings,
    pub immediate_actions_required: usize,
    pub overall_assessment: String,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct StatusSection {
    pub overall_status: SystemStatus,
    pub confidence_level: f64,
    pub consistency_level: ConsistencyLevel,
    pub data_quality: Grade,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ComponentFindings {
    pub total_components: usize,
    pub high_confidence_components: usize,
    pub components_with_failures: usize,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct FailureFindings {
    pub total_patterns: usize,
    pub critical_failures: usize,
    pub patterns_with_procedures: usize,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ConsistencyFindings {
    pub overall_score: f64,
    pub violations_by_severity: ViolationSummary,
    /// Number of valid cross-references
    pub cross_reference_validity: usize,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct DetailedFindings {
    pub component_analysis: ComponentFindings,
    pub failure_analysis: FailureFindings,
    pub consistency_analysis: ConsistencyFindings,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CorrelationCounts {
    pub component_correlations: usize,
    pub failure_correlations: usize,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct TechnicalAppendix {
    pub correlation_matrices: CorrelationCounts,
    pub validation_details: ValidationMetadata,
    pub processing_statistics: AnalysisMetadata,
    pub relationship_analysis: RelationshipAnalysis,
    pub data_quality_assessment: DataQualityAssessment,
    pub actionable_insights: Vec<ActionableInsight>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub resolution_summary: Option<ResolutionSummary>,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum DetailLevel {
    SummaryOnly,
    Comprehensive,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum ConsistencyIndicator {
    Excellent,
    Good,
    NeedsImprovement,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "UPPERCASE")]
pub enum Completeness {
    Comprehensive,
    Adequate,
    Limited,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct QualityIndicators {
    pub data_consistency: ConsistencyIndicator,
    pub analysis_confidence: Grade,
    pub analysis_completeness: Completeness,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ReportMetadata {
    pub format: ReportFormat,
    pub detail_level: DetailLevel,
    pub total_components_analyzed: usize,
    pub total_failure_patterns: usize,
    pub consistency_violations: usize,
    pub data_sources_integrated: usize,
    /// Share of the five core sections that are present and non-empty
    pub report_completeness: f64,
    pub quality_indicators: QualityIndicators,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct DiagnosticReport {
    pub report_header: ReportHeader,
    pub executive_summary: ExecutiveSummary,
    pub system_status: StatusSection,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub detailed_findings: Option<DetailedFindings>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub recommendations: Option<Vec<Recommendation>>,
    /// Executive format only: the first five recommendations
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub key_recommendations: Option<Vec<Recommendation>>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub technical_appendix: Option<TechnicalAppendix>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub technical_details: Option<TechnicalAppendix>,
    pub report_metadata: ReportMetadata,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ReportSummary {
    pub report_type: String,
    pub system_status: SystemStatus,
    pub confidence_level: f64,
    pub total_recommendations: usize,
    pub critical_issues: usize,
    pub report_completeness: f64,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CompiledReport {
    pub diagnostic_report: DiagnosticReport,
    pub report_summary: ReportSummary,
    pub follow_up_recommendations: Vec<String>,
}

/// Everything the compiler reads.
pub struct ReportInputs<'a> {
    pub unified: &'a UnifiedReport,
    pub validation: &'a ValidationReport,
    pub plan: Option<&'a PlanReport>,
    pub relationships: &'a RelationshipAnalysis,
}

pub fn compile(format: ReportFormat, inputs: ReportInputs<'_>) -> CompiledReport {
    let unified = &inputs.unified.unified_analysis;
    let validation = &inputs.validation.consistency_validation;
    let consistency_score = validation.overall_consistency_score;
    let confidence = unified.confidence_level;

    let recommendations = merge_recommendations(&unified.unified_recommendations, inputs.plan);
    let critical_issues = recommendations
        .iter()
        .filter(|r| r.priority == RecommendationPriority::Immediate)
        .count();

    let header = ReportHeader {
        report_type: REPORT_TYPE.to_string(),
        format,
        analysis_scope: ANALYSIS_SCOPE.to_string(),
    };

    let executive_summary = ExecutiveSummary {
        system_health: unified.overall_status,
        confidence_assessment: Grade::from_score(confidence),
        data_consistency: validation.consistency_level,
        key_findings: ReportFindings {
            components_identified: unified.component_correlations.len(),
            failure_patterns_detected: unified.failure_correlations.len(),
            consistency_violations: inputs.validation.violations_found.len(),
            critical_issues: unified.critical_failures().count(),
        },
        immediate_actions_required: unified.immediate_actions(),
        overall_assessment: overall_assessment(unified.overall_status, confidence, consistency_score).to_string(),
    };

    let system_status = StatusSection {
        overall_status: unified.overall_status,
        confidence_level: confidence,
        consistency_level: validation.consistency_level,
        data_quality: Grade::from_score((consistency_score + confidence) / 2.0),
    };

    let detailed_findings = DetailedFindings {
        component_analysis: ComponentFindings {
            total_components: unified.component_correlations.len(),
            high_confidence_components: unified
                .component_correlations
                .iter()
                .filter(|c| c.consistency_score > 0.8)
                .count(),
            components_with_failures: unified
                .component_correlations
                .iter()
                .filter(|c| !c.failure_associations.is_empty())
                .count(),
        },
        failure_analysis: FailureFindings {
            total_patterns: unified.failure_correlations.len(),
            critical_failures: unified.critical_failures().count(),
            patterns_with_procedures: unified
                .failure_correlations
                .iter()
                .filter(|f| !f.procedures.is_empty())
                .count(),
        },
        consistency_analysis: ConsistencyFindings {
            overall_score: consistency_score,
            violations_by_severity: inputs.validation.violation_summary.clone(),
            cross_reference_validity: inputs.validation.cross_reference_summary.valid_references,
        },
    };

    let appendix = TechnicalAppendix {
        correlation_matrices: CorrelationCounts {
            component_correlations: unified.component_correlations.len(),
            failure_correlations: unified.failure_correlations.len(),
        },
        validation_details: inputs.validation.validation_metadata.clone(),
        processing_statistics: unified.analysis_metadata.clone(),
        relationship_analysis: inputs.relationships.clone(),
        data_quality_assessment: inputs.unified.data_quality_assessment.clone(),
        actionable_insights: inputs.unified.actionable_insights.clone(),
        resolution_summary: inputs.plan.map(|p| p.resolution_summary.clone()),
    };

    let total_recommendations = recommendations.len();
    let (detailed_findings, recommendations, key_recommendations, technical_appendix, technical_details, detail_level) =
        match format {
            ReportFormat::Executive => (
                None,
                None,
                Some(recommendations.into_iter().take(KEY_RECOMMENDATIONS).collect()),
                None,
                None,
                DetailLevel::SummaryOnly,
            ),
            ReportFormat::Comprehensive => (
                Some(detailed_findings),
                Some(recommendations),
                None,
                Some(appendix),
                None,
                DetailLevel::Comprehensive,
            ),
            ReportFormat::Technical => (
                Some(detailed_findings),
                Some(recommendations),
                None,
                Some(appendix.clone()),
                Some(appendix),
                DetailLevel::Comprehensive,
            ),
        };

    let present = 3 + usize::from(detailed_findings.is_some())
        + usize::from(recommendations.as_ref().is_some_and(|r| !r.is_empty()));
    let completeness = present as f64 / REQUIRED_SECTIONS;

    let report = DiagnosticReport {
        report_header: header,
        executive_summary,
        system_status,
        detailed_findings,
        recommendations,
        key_recommendations,
        technical_appendix,
        technical_details,
        report_metadata: ReportMetadata {
            format,
            detail_level,
            total_components_analyzed: unified.component_correlations.len(),
            total_failure_patterns: unified.failure_correlations.len(),
            consistency_violations: inputs.validation.violations_found.len(),
            data_sources_integrated: unified.analysis_metadata.sources_analyzed.len(),
            report_completeness: completeness,
            quality_indicators: quality_indicators(
                consistency_score,
                confidence,
                unified.component_correlations.len(),
                unified.failure_correlations.len(),
            ),
        },
    };

    log::info!(
        "Compiled {} report: {} recommendations, completeness {:.0}%",
        format,
        total_recommendations,
        completeness * 100.0
    );

    CompiledReport {
        report_summary: ReportSummary {
            report_type: REPORT_TYPE.to_string(),
            system_status: unified.overall_status,
            confidence_level: confidence,
            total_recommendations,
            critical_issues,
            report_completeness: completeness,
        },
        follow_up_recommendations: follow_up_recommendations(unified.overall_status, confidence),
        diagnostic_report: report,
    }
}

pub fn overall_assessment(status: SystemStatus, confidence: f64, consistency: f64) -> &'static str {
    if status == SystemStatus::Fail || confidence < 0.5 || consistency < 0.5 {
        "CRITICAL - Immediate attention required"
    } else if status == SystemStatus::Uncertain || confidence < 0.7 || consistency < 0.7 {
        "CAUTION - Further investigation recommended"
    } else {
        "ACCEPTABLE - Continue monitoring"
    }
}

/// Unified recommendations followed by plan resolutions, first action wins,
/// stable-sorted by priority.
pub fn merge_recommendations(unified: &[Recommendation], plan: Option<&PlanReport>) -> Vec<Recommendation> {
    let from_plan = plan
        .into_iter()
        .flat_map(|p| p.resolution_plan.resolutions.iter())
        .map(|resolution| Recommendation {
            priority: resolution.priority.into(),
            category: RecommendationCategory::Consistency,
            action: resolution.action.clone(),
            description: resolution.description.clone(),
            source: "consistency_resolution".into(),
            component: None,
            procedure: None,
        });

    let mut merged: Vec<Recommendation> = Vec::new();
    for recommendation in unified.iter().cloned().chain(from_plan) {
        if !merged.iter().any(|r| r.action == recommendation.action) {
            merged.push(recommendation);
        }
    }
    merged.sort_by_key(|r| r.priority);
    merged
}

pub fn quality_indicators(consistency: f64, confidence: f64, components: usize, failures: usize) -> QualityIndicators {
    QualityIndicators {
        data_consistency: if consistency > 0.8 {
            ConsistencyIndicator::Excellent
        } else if consistency > 0.6 {
            ConsistencyIndicator::Good
        } else {
            ConsistencyIndicator::NeedsImprovement
        },
        analysis_confidence: Grade::from_score(confidence),
        analysis_completeness: if components > 5 && failures > 3 {
            Completeness::Comprehensive
        } else if components > 2 && failures > 1 {
            Completeness::Adequate
        } else {
            Completeness::Limited
        },
    }
}

pub fn follow_up_recommendations(status: SystemStatus, confidence: f64) -> Vec<String> {
    let mut steps: Vec<&str> = Vec::new();
    match status {
        SystemStatus::Fail => steps.extend([
            "Schedule immediate maintenance intervention",
            "Implement continuous monitoring until issues resolved",
        ]),
        SystemStatus::Uncertain => steps.extend(["Perform additional diagnostic tests", "Increase monitoring frequency"]),
        SystemStatus::Pass => {}
    }
    if confidence < 0.7 {
        steps.extend([
            "Collect additional data to improve analysis confidence",
            "Consider expert review of findings",
        ]);
    }
    steps.extend(["Schedule follow-up analysis in 24-48 hours", "Document all maintenance actions taken"]);
    steps.into_iter().map(String::from).collect()
}
