use thiserror::Error;

/// Result type for resolver operations
pub type Result<T> = std::result::Result<T, ResolverError>;

#[derive(Error, Debug)]
pub enum ResolverError {
    /// Threshold outside `[0, 1]`
    #[error("Invalid threshold: {0} (expected a value in [0, 1])")]
    InvalidThreshold(f64),

    /// Result limit of zero
    #[error("Invalid match limit: must be greater than zero")]
    InvalidLimit,

    /// Name resolution against an inventory with no components
    #[error("Component inventory is empty")]
    EmptyInventory,

    #[error("{0}")]
    Other(String),
}

impl ResolverError {
    /// Reject thresholds outside `[0, 1]` (NaN included).
    pub fn check_threshold(threshold: f64) -> Result<f64> {
        if (0.0..=1.0).contains(&threshold) {
            Ok(threshold)
        } else {
            Err(Self::InvalidThreshold(threshold))
        }
    }
}
