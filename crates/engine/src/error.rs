use thiserror::Error;
use xref_consistency::ConsistencyError;
use xref_graph::GraphError;
use xref_planner::PlannerError;
use xref_protocol::ErrorEnvelope;
use xref_resolver::ResolverError;

/// Result type for engine entry points
pub type Result<T> = std::result::Result<T, EngineError>;

#[derive(Error, Debug)]
pub enum EngineError {
    /// Empty or malformed input collections, missing required sections
    #[error("Invalid input: {0}")]
    InvalidInput(String),

    /// Configuration rejected by validation
    #[error("Invalid configuration: {0}")]
    Config(String),

    #[error("Failed to read configuration: {0}")]
    ConfigIo(#[from] std::io::Error),

    #[error("Configuration is not valid TOML: {0}")]
    ConfigToml(#[from] toml::de::Error),

    #[error(transparent)]
    Resolver(#[from] ResolverError),

    #[error(transparent)]
    Graph(#[from] GraphError),

    #[error(transparent)]
    Consistency(#[from] ConsistencyError),

    #[error(transparent)]
    Planner(#[from] PlannerError),

    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),
}

impl EngineError {
    pub fn invalid_input(msg: impl Into<String>) -> Self {
        Self::InvalidInput(msg.into())
    }

    pub fn config(msg: impl Into<String>) -> Self {
        Self::Config(msg.into())
    }

    /// Stable machine-readable code
    pub fn code(&self) -> &'static str {
        match self {
            EngineError::InvalidInput(_) | EngineError::Json(_) => "invalid_input",
            EngineError::Config(_) | EngineError::ConfigIo(_) | EngineError::ConfigToml(_) => "invalid_config",
            EngineError::Resolver(_) => "resolver_error",
            EngineError::Graph(_) => "graph_error",
            EngineError::Consistency(_) => "consistency_error",
            EngineError::Planner(_) => "planner_error",
        }
    }

    /// `{"error": ..., "code": ...}` value for callers that want data, not a failure.
    pub fn to_envelope(&self) -> ErrorEnvelope {
        let envelope = ErrorEnvelope::new(self.code(), self.to_string());
        match self {
            EngineError::InvalidInput(_) => {
                envelope.with_hint("Input must match the extractor schema from xref_protocol::input_schema()")
            }
            EngineError::Planner(PlannerError::UnknownStrategy(_)) => {
                envelope.with_hint("Use critical_first, high_impact or quick_wins")
            }
            _ => envelope,
        }
    }
}
