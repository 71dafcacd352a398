use thiserror::Error;

/// Result type for consistency validation
pub type Result<T> = std::result::Result<T, ConsistencyError>;

#[derive(Error, Debug)]
pub enum ConsistencyError {
    /// Consistency threshold outside `[0, 1]`
    #[error("Invalid consistency threshold: {0}")]
    InvalidThreshold(f64),

    /// A violation record that cannot be decoded
    #[error("Malformed violation record: {0}")]
    MalformedRecord(String),

    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),
}

impl ConsistencyError {
    pub fn malformed(msg: impl Into<String>) -> Self {
        Self::MalformedRecord(msg.into())
    }
}
