use thiserror::Error;

pub type Result<T> = std::result::Result<T, GraphError>;

#[derive(Error, Debug)]
pub enum GraphError {
    #[error("Graph build error: {0}")]
    BuildError(String),

    #[error("Entity not found: {0}")]
    EntityNotFound(String),

    #[error("Invalid mention pattern: {0}")]
    InvalidPattern(#[from] regex::Error),

    #[error("Resolver error: {0}")]
    Resolver(#[from] xref_resolver::ResolverError),

    #[error("{0}")]
    Other(String),
}
