//! Wire shapes shared by every stage of the cross-source resolution pipeline.
//!
//! Inputs arrive from out-of-process extractors (log analyzer, component
//! recognizer, document parser) as JSON; this crate owns their serde shapes,
//! the [`Severity`] scale and the [`ErrorEnvelope`] returned at entry points.

use anyhow::Result;
use serde::Serialize;

pub mod error;
pub mod inputs;
pub mod severity;

pub use error::{ErrorEnvelope, ProtocolError};
pub use inputs::{
    AnalysisInput, AnalysisSummary, ComponentInventoryOutput, ComponentRecord, DocumentAnalysis,
    FailureIndicator, Inventory, LogAnalysisOutput, LogIssue, ProcedureRecord, StructuredSections,
};
pub use severity::Severity;

pub const INPUT_SCHEMA_VERSION: u32 = 1;

pub fn serialize_json<T: Serialize>(value: &T) -> Result<String> {
    serde_json::to_string(value).map_err(Into::into)
}

pub fn serialize_json_pretty<T: Serialize>(value: &T) -> Result<String> {
    serde_json::to_string_pretty(value).map_err(Into::into)
}

/// JSON schema of the bundled extractor input.
pub fn input_schema() -> serde_json::Value {
    let schema = schemars::schema_for!(AnalysisInput);
    serde_json::to_value(schema).unwrap_or(serde_json::Value::Null)
}
