use thiserror::Error;
use xref_consistency::ConsistencyError;

/// Result type for resolution planning
pub type Result<T> = std::result::Result<T, PlannerError>;

#[derive(Error, Debug)]
pub enum PlannerError {
    /// Prioritization strategy name not recognised
    #[error("Unknown prioritization strategy: {0} (expected critical_first, high_impact or quick_wins)")]
    UnknownStrategy(String),

    /// Violation records could not be read at all
    #[error("Cannot read violations: {0}")]
    Violations(#[from] ConsistencyError),
}
