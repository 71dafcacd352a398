//! # Resolution Planning
//!
//! Turns consistency violations into an ordered remediation plan.
//!
//! ## Architecture
//!
//! ```text
//! ConsistencyViolation[] (or serialized records)
//!     │
//!     ├──> Generators (grouped by violation type)
//!     │      ├─ component_name_conflict   -> canonical_name_assignment (shortest name)
//!     │      ├─ failure_severity_mismatch -> severity_standardization (most severe)
//!     │      ├─ broken_cross_reference    -> reference_repair (three suggested actions)
//!     │      └─ anything else             -> manual_review
//!     │
//!     ├──> PrioritizationStrategy (critical_first | high_impact | quick_wins)
//!     │
//!     └──> PlanReport
//!            ├─ ImplementationTimeline (immediate .. long term)
//!            ├─ EffortEstimate (0.5h / 2h / 8h per resolution)
//!            ├─ success probability (confidence-weighted)
//!            └─ implementation guidance
//! ```
//!
//! Resolution ids are `<prefix>_<12 hex>` SHA-256 digests of the violation
//! content, so identical input always yields identical ids.

mod error;
mod estimates;
mod plan;
mod resolution;
mod strategy;

pub use error::{PlannerError, Result};
pub use estimates::{
    base_success_rate, implementation_guidance, success_probability, EffortEstimate, EffortLevel,
    ImplementationStep, ImplementationTimeline, TimelineBucket,
};
pub use plan::{PlanMetadata, PlanReport, PlanStatus, ResolutionPlan, ResolutionPlanner, ResolutionSummary, NO_VIOLATIONS_MESSAGE};
pub use resolution::{
    generate_resolutions, resolve_violation, stable_violation_id, AffectedItems, ResolutionItem, ResolutionType,
    REFERENCE_REPAIR_ACTIONS,
};
pub use strategy::PrioritizationStrategy;
