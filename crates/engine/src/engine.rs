use std::collections::BTreeMap;

use serde::{Deserialize, Serialize};
use xref_consistency::{ConsistencyValidator, ConsistencyViolation, ValidationReport};
use xref_graph::{
    collect_failure_patterns, collect_procedures, CanonicalEntity, Cluster, CorrelationGraph, CorrelationSummary,
    CrossSourceMetrics, DanglingReference, FailureCorrelationReport, FailureCorrelator, FailurePatternCorrelation,
    GraphBuilder, RelationshipAnalysis, RelationshipEdge,
};
use xref_planner::{PlanReport, ResolutionPlanner};
use xref_protocol::{AnalysisInput, Inventory, ProcedureRecord};
use xref_resolver::{Lexicon, Matcher, NameResolver, NamingResolution, Normalizer};

use crate::config::EngineConfig;
use crate::error::{EngineError, Result};
use crate::report::{compile, CompiledReport, ReportInputs};
use crate::unified::{unify, UnifiedReport};

/// Correlation stage output.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CorrelationResult {
    pub component_correlations: Vec<CanonicalEntity>,
    pub consistency_metrics: CrossSourceMetrics,
    pub correlation_summary: CorrelationSummary,
    pub relationship_analysis: RelationshipAnalysis,
    pub relationships: Vec<RelationshipEdge>,
    pub clusters: Vec<Cluster>,
    /// Relationship endpoints that matched no entity
    pub dangling_references: Vec<DanglingReference>,
}

/// Relationship-only view of a correlation run.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RelationshipReport {
    pub relationships: Vec<RelationshipEdge>,
    pub relationship_analysis: RelationshipAnalysis,
    pub relationship_matrix: BTreeMap<String, BTreeMap<String, String>>,
    pub clusters: Vec<Cluster>,
}

/// Validator input as produced by earlier stages, usually read back from JSON.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct ValidationInput {
    pub component_correlations: Vec<CanonicalEntity>,
    pub failure_correlations: Vec<FailurePatternCorrelation>,
    pub dangling_references: Vec<DanglingReference>,
}

impl ValidationInput {
    pub fn is_empty(&self) -> bool {
        self.component_correlations.is_empty()
            && self.failure_correlations.is_empty()
            && self.dangling_references.is_empty()
    }
}

/// Every stage of one full run.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PipelineOutput {
    pub correlation: CorrelationResult,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub failure_correlation: Option<FailureCorrelationReport>,
    pub validation: ValidationReport,
    pub plan: PlanReport,
    pub unified: UnifiedReport,
    pub report: CompiledReport,
}

/// Caller-owned pipeline. Holds configuration and the shared read-only
/// lexicon; no state survives between calls.
pub struct Engine {
    config: EngineConfig,
    lexicon: &'static Lexicon,
    builder: GraphBuilder,
    validator: ConsistencyValidator,
    planner: ResolutionPlanner,
}

impl Engine {
    pub fn new(config: EngineConfig) -> Result<Self> {
        Self::with_lexicon(config, Lexicon::shared())
    }

    pub fn with_lexicon(config: EngineConfig, lexicon: &'static Lexicon) -> Result<Self> {
        config.validate()?;
        let matcher = Matcher::new(Normalizer::with_lexicon(lexicon))
            .with_threshold(config.match_threshold)?
            .with_max_per_source(config.max_matches_per_source)?;
        let builder = GraphBuilder::new(matcher)?
            .with_correlation_threshold(config.correlation_threshold)?
            .with_relationship_filter(config.relationship_filter());
        let validator = ConsistencyValidator::new(config.consistency_threshold)?;
        let planner = ResolutionPlanner::new(config.resolution_strategy);

        Ok(Self {
            config,
            lexicon,
            builder,
            validator,
            planner,
        })
    }

    pub fn config(&self) -> &EngineConfig {
        &self.config
    }

    pub fn matcher(&self) -> &Matcher {
        self.builder.matcher()
    }

    /// Resolve mentions across sources into canonical entities.
    pub fn correlate(&self, input: &AnalysisInput) -> Result<CorrelationResult> {
        let graph = self.build_graph(input)?;
        Ok(self.correlation_result(&graph))
    }

    /// Match failure patterns from the log analysis against documented procedures.
    pub fn correlate_failures(&self, input: &AnalysisInput) -> Result<FailureCorrelationReport> {
        let logs = input
            .log_analysis
            .as_ref()
            .ok_or_else(|| EngineError::invalid_input("failure correlation requires log_analysis"))?;
        let patterns = collect_failure_patterns(logs);
        let procedures = self.procedures(input);
        Ok(self.failure_correlator()?.correlate(&patterns, &procedures))
    }

    pub fn validate(&self, input: &ValidationInput) -> ValidationReport {
        self.validator.validate(
            &input.component_correlations,
            &input.failure_correlations,
            &input.dangling_references,
        )
    }

    pub fn plan(&self, violations: &[ConsistencyViolation]) -> PlanReport {
        self.planner.plan(violations)
    }

    /// Plan from serialized violation records; bad records are skipped.
    pub fn plan_json(&self, raw: &str) -> Result<PlanReport> {
        Ok(self.planner.plan_from_json(raw)?)
    }

    pub fn resolve_name(&self, name: &str, inventory: &Inventory) -> Result<NamingResolution> {
        if name.trim().is_empty() {
            return Err(EngineError::invalid_input("component name is empty"));
        }
        Ok(NameResolver::new(self.lexicon).resolve(name, inventory)?)
    }

    pub fn relationships(&self, input: &AnalysisInput) -> Result<RelationshipReport> {
        let graph = self.build_graph(input)?;
        Ok(RelationshipReport {
            relationships: graph.edges().cloned().collect(),
            relationship_analysis: graph.relationship_analysis(),
            relationship_matrix: graph.relationship_matrix(),
            clusters: graph.clusters(),
        })
    }

    /// Full pipeline: correlate, validate, plan, unify and compile the report.
    pub fn run(&self, input: &AnalysisInput) -> Result<PipelineOutput> {
        let graph = self.build_graph(input)?;
        let correlation = self.correlation_result(&graph);

        let (failure_correlation, all_failures) = match &input.log_analysis {
            Some(logs) => {
                let patterns = collect_failure_patterns(logs);
                let procedures = self.procedures(input);
                let correlator = self.failure_correlator()?;
                // Validation looks at every pattern, not only the well-correlated ones.
                let all: Vec<FailurePatternCorrelation> = patterns
                    .iter()
                    .map(|pattern| correlator.correlate_pattern(pattern, &procedures))
                    .collect();
                (Some(correlator.correlate(&patterns, &procedures)), all)
            }
            None => (None, Vec::new()),
        };

        let validation = self.validator.validate(
            &correlation.component_correlations,
            &all_failures,
            &correlation.dangling_references,
        );
        let plan = self.planner.plan(&validation.violations_found);

        let unified = unify(
            input.log_analysis.as_ref(),
            &correlation.component_correlations,
            &correlation.correlation_summary,
            failure_correlation.as_ref(),
        );
        let report = compile(
            self.config.report_format,
            ReportInputs {
                unified: &unified,
                validation: &validation,
                plan: Some(&plan),
                relationships: &correlation.relationship_analysis,
            },
        );

        log::info!(
            "Pipeline finished: {} entities, {} violations, {} resolutions",
            correlation.component_correlations.len(),
            validation.violations_found.len(),
            plan.resolution_plan.total_resolutions
        );

        Ok(PipelineOutput {
            correlation,
            failure_correlation,
            validation,
            plan,
            unified,
            report,
        })
    }

    /// Full pipeline, keeping only the compiled report.
    pub fn analyze(&self, input: &AnalysisInput) -> Result<CompiledReport> {
        Ok(self.run(input)?.report)
    }

    fn build_graph(&self, input: &AnalysisInput) -> Result<CorrelationGraph> {
        if input.is_empty() {
            return Err(EngineError::invalid_input(
                "no log analysis, component inventory or document analysis to correlate",
            ));
        }
        Ok(self.builder.build(input)?)
    }

    fn correlation_result(&self, graph: &CorrelationGraph) -> CorrelationResult {
        CorrelationResult {
            component_correlations: graph.entities().cloned().collect(),
            consistency_metrics: graph.cross_source_metrics(self.builder.matcher()),
            correlation_summary: graph.correlation_summary(),
            relationship_analysis: graph.relationship_analysis(),
            relationships: graph.edges().cloned().collect(),
            clusters: graph.clusters(),
            dangling_references: graph.dangling.clone(),
        }
    }

    fn failure_correlator(&self) -> Result<FailureCorrelator<'_>> {
        Ok(FailureCorrelator::new(self.lexicon, self.builder.extractor())
            .with_threshold(self.config.failure_correlation_threshold)?)
    }

    fn procedures(&self, input: &AnalysisInput) -> Vec<ProcedureRecord> {
        input
            .document_analysis
            .as_ref()
            .map(|docs| collect_procedures(&docs.structured_sections))
            .unwrap_or_default()
    }
}
