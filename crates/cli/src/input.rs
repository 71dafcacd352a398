//! Reading JSON documents from files or stdin.

use std::fs;
use std::io::{self, Read};
use std::path::Path;

use anyhow::{Context, Result};
use serde::de::DeserializeOwned;
use serde_json::Value;
use xref_engine::EngineError;
use xref_protocol::{AnalysisInput, ComponentInventoryOutput, Inventory};

/// Raw text of `path`, or of stdin when the path is `-`.
pub fn read_source(path: &Path) -> Result<String> {
    if path.as_os_str() == "-" {
        let mut buf = String::new();
        io::stdin()
            .read_to_string(&mut buf)
            .context("Failed to read stdin")?;
        return Ok(buf);
    }
    fs::read_to_string(path).with_context(|| format!("Failed to read {}", path.display()))
}

/// Decode a document. Malformed JSON is an engine input error, not an I/O failure.
pub fn read_json<T: DeserializeOwned>(path: &Path) -> Result<T> {
    let raw = read_source(path)?;
    Ok(serde_json::from_str(&raw).map_err(EngineError::from)?)
}

/// Violation records to plan from: a bare array, or the `violations_found`
/// list of a validation report.
pub fn violation_records(path: &Path) -> Result<String> {
    let raw = read_source(path)?;
    let document: Value = serde_json::from_str(&raw).map_err(EngineError::from)?;
    match document {
        Value::Object(mut map) if map.contains_key("violations_found") => {
            let violations = map.remove("violations_found").unwrap_or(Value::Null);
            Ok(serde_json::to_string(&violations)?)
        }
        _ => Ok(raw),
    }
}

/// An inventory given bare, wrapped as recognizer output, or inside a full
/// analysis input.
pub fn inventory(path: &Path) -> Result<Inventory> {
    let document: Value = read_json(path)?;
    let inventory = if document.get("component_inventory").is_some() {
        let input: AnalysisInput = serde_json::from_value(document).map_err(EngineError::from)?;
        input.component_inventory.unwrap_or_default().inventory
    } else if document.get("inventory").is_some() {
        let output: ComponentInventoryOutput = serde_json::from_value(document).map_err(EngineError::from)?;
        output.inventory
    } else {
        serde_json::from_value(document).map_err(EngineError::from)?
    };
    Ok(inventory)
}
