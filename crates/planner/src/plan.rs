use serde::{Deserialize, Serialize};
use xref_consistency::{decode_violations, ConsistencyViolation};
use xref_protocol::Severity;

use crate::error::Result;
use crate::estimates::{
    implementation_guidance, success_probability, EffortEstimate, ImplementationStep, ImplementationTimeline,
};
use crate::resolution::{generate_resolutions, ResolutionItem};
use crate::strategy::PrioritizationStrategy;

pub const NO_VIOLATIONS_MESSAGE: &str = "No consistency violations found";

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum PlanStatus {
    ActionRequired,
    NoActionRequired,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ResolutionPlan {
    pub resolutions: Vec<ResolutionItem>,
    pub prioritization_strategy: PrioritizationStrategy,
    pub total_resolutions: usize,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub message: Option<String>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ResolutionSummary {
    pub status: PlanStatus,
    pub total_resolutions: usize,
    pub critical_resolutions: usize,
    pub high_priority_resolutions: usize,
    /// Distinct resolution types, first occurrence first
    pub resolution_types: Vec<String>,
    pub estimated_effort: EffortEstimate,
    pub success_probability: f64,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PlanMetadata {
    pub violations_processed: usize,
    pub resolution_strategy: PrioritizationStrategy,
    /// Serialized violation records that could not be decoded
    pub skipped_records: usize,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PlanReport {
    pub resolution_plan: ResolutionPlan,
    pub implementation_timeline: ImplementationTimeline,
    pub resolution_summary: ResolutionSummary,
    pub implementation_guidance: Vec<ImplementationStep>,
    pub plan_metadata: PlanMetadata,
}

/// Turns violations into an ordered, estimated remediation plan.
#[derive(Debug, Clone, Copy, Default)]
pub struct ResolutionPlanner {
    strategy: PrioritizationStrategy,
}

impl ResolutionPlanner {
    pub fn new(strategy: PrioritizationStrategy) -> Self {
        Self { strategy }
    }

    pub fn strategy(&self) -> PrioritizationStrategy {
        self.strategy
    }

    pub fn plan(&self, violations: &[ConsistencyViolation]) -> PlanReport {
        if violations.is_empty() {
            return self.empty_plan();
        }

        let mut resolutions = generate_resolutions(violations);
        self.strategy.apply(&mut resolutions);

        let mut resolution_types: Vec<String> = Vec::new();
        for resolution in &resolutions {
            let name = resolution.resolution_type.as_str();
            if !resolution_types.iter().any(|t| t == name) {
                resolution_types.push(name.to_string());
            }
        }
        let count = |priority: Severity| resolutions.iter().filter(|r| r.priority == priority).count();

        let summary = ResolutionSummary {
            status: PlanStatus::ActionRequired,
            total_resolutions: resolutions.len(),
            critical_resolutions: count(Severity::Critical),
            high_priority_resolutions: count(Severity::High),
            resolution_types,
            estimated_effort: EffortEstimate::from_resolutions(&resolutions),
            success_probability: success_probability(violations),
        };

        log::info!(
            "Planned {} resolutions ({} strategy), estimated {} hours",
            resolutions.len(),
            self.strategy,
            summary.estimated_effort.estimated_hours
        );

        PlanReport {
            implementation_timeline: ImplementationTimeline::from_resolutions(&resolutions),
            implementation_guidance: implementation_guidance(&resolutions),
            resolution_summary: summary,
            plan_metadata: PlanMetadata {
                violations_processed: violations.len(),
                resolution_strategy: self.strategy,
                skipped_records: 0,
            },
            resolution_plan: ResolutionPlan {
                total_resolutions: resolutions.len(),
                resolutions,
                prioritization_strategy: self.strategy,
                message: None,
            },
        }
    }

    /// Plan from a JSON array of serialized violations. Undecodable records
    /// are skipped and counted in `plan_metadata.skipped_records`.
    pub fn plan_from_json(&self, raw: &str) -> Result<PlanReport> {
        let decoded = decode_violations(raw)?;
        let mut report = self.plan(&decoded.violations);
        report.plan_metadata.skipped_records = decoded.skipped_records;
        Ok(report)
    }

    fn empty_plan(&self) -> PlanReport {
        PlanReport {
            resolution_plan: ResolutionPlan {
                resolutions: Vec::new(),
                prioritization_strategy: self.strategy,
                total_resolutions: 0,
                message: Some(NO_VIOLATIONS_MESSAGE.to_string()),
            },
            implementation_timeline: ImplementationTimeline::default(),
            resolution_summary: ResolutionSummary {
                status: PlanStatus::NoActionRequired,
                total_resolutions: 0,
                critical_resolutions: 0,
                high_priority_resolutions: 0,
                resolution_types: Vec::new(),
                estimated_effort: EffortEstimate::default(),
                success_probability: 1.0,
            },
            implementation_guidance: Vec::new(),
            plan_metadata: PlanMetadata {
                violations_processed: 0,
                resolution_strategy: self.strategy,
                skipped_records: 0,
            },
        }
    }
}
