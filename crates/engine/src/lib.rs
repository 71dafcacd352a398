//! # Cross-Reference Engine
//!
//! Caller-owned entry point over the whole resolution pipeline.
//!
//! ## Architecture
//!
//! ```text
//! EngineConfig (defaults | strict | lenient | TOML file)
//!     │
//!     └──> Engine
//!            ├─ correlate           AnalysisInput -> CorrelationResult
//!            ├─ correlate_failures  log analysis + procedures -> FailureCorrelationReport
//!            ├─ validate            entities + failures -> ValidationReport
//!            ├─ plan / plan_json    violations -> PlanReport
//!            ├─ resolve_name        one name against an inventory
//!            ├─ relationships       edges, matrix, clusters
//!            └─ run / analyze       all of the above
//!                   │
//!                   ├──> Unified analysis (status, confidence, recommendations)
//!                   └──> Report compiler (comprehensive | executive | technical)
//! ```
//!
//! Every entry point returns [`Result`]; [`EngineError::to_envelope`] turns a
//! failure into the `{"error", "code"}` value callers expect.

mod config;
mod engine;
mod error;
mod report;
mod unified;

pub use config::{EngineConfig, ReportFormat};
pub use engine::{CorrelationResult, Engine, PipelineOutput, RelationshipReport, ValidationInput};
pub use error::{EngineError, Result};
pub use report::{
    compile, follow_up_recommendations, merge_recommendations, overall_assessment, quality_indicators,
    CompiledReport, DetailLevel, DiagnosticReport, ExecutiveSummary, QualityIndicators, ReportInputs, ReportMetadata,
    ReportSummary, TechnicalAppendix, REPORT_TYPE,
};
pub use unified::{
    unify, ActionableInsight, CrossSourceConsistency, DataQualityAssessment, Grade, InsightType, Recommendation,
    RecommendationCategory, RecommendationPriority, SystemStatus, UnifiedAnalysis, UnifiedReport,
};
