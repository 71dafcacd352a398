//! Shapes produced by the upstream extractors.
//!
//! Every field is optional on the wire; missing keys deserialize to empty
//! values so a partially populated extractor result is still usable.

use std::collections::BTreeMap;

use schemars::JsonSchema;
use serde::{Deserialize, Serialize};

use crate::severity::Severity;

/// Output of the log analyzer.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize, JsonSchema)]
pub struct LogAnalysisOutput {
    #[serde(default)]
    pub top_issues: Vec<LogIssue>,

    /// Category name -> indicators detected for that category
    #[serde(default)]
    pub categorized_indicators: BTreeMap<String, Vec<FailureIndicator>>,

    #[serde(default)]
    pub analysis_summary: Option<AnalysisSummary>,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize, JsonSchema)]
pub struct LogIssue {
    #[serde(default)]
    pub description: String,

    #[serde(default)]
    pub sample_matches: Vec<String>,

    #[serde(rename = "type", alias = "pattern_type", default)]
    pub issue_type: Option<String>,

    #[serde(default)]
    pub severity: Severity,

    #[serde(default)]
    pub confidence: Option<f64>,

    /// Components named explicitly by the analyzer, if any
    #[serde(default)]
    pub components: Vec<String>,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize, JsonSchema)]
pub struct FailureIndicator {
    #[serde(rename = "type", alias = "pattern_type", default)]
    pub indicator_type: Option<String>,

    #[serde(default)]
    pub description: String,

    #[serde(default)]
    pub severity: Severity,

    #[serde(default)]
    pub confidence: Option<f64>,

    #[serde(default)]
    pub sample_lines: Vec<String>,

    #[serde(default)]
    pub components: Vec<String>,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize, JsonSchema)]
pub struct AnalysisSummary {
    #[serde(default)]
    pub total_patterns: usize,

    #[serde(default)]
    pub risk_level: Option<Severity>,
}

/// Output of the component recognizer.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize, JsonSchema)]
pub struct ComponentInventoryOutput {
    #[serde(default)]
    pub inventory: Inventory,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize, JsonSchema)]
pub struct Inventory {
    /// Component name -> record
    #[serde(default)]
    pub components: BTreeMap<String, ComponentRecord>,

    /// Alias -> canonical component name
    #[serde(default)]
    pub aliases: BTreeMap<String, String>,

    /// Component name -> names of components it is related to
    #[serde(default)]
    pub relationships: BTreeMap<String, Vec<String>>,
}

impl Inventory {
    /// Resolve a name through the alias table, falling back to the name itself.
    pub fn resolve_alias<'a>(&'a self, name: &'a str) -> &'a str {
        self.aliases.get(name).map(String::as_str).unwrap_or(name)
    }

    /// Function text of a component, looked up directly or through an alias.
    pub fn function_of(&self, name: &str) -> Option<&str> {
        self.components
            .get(self.resolve_alias(name))
            .map(|record| record.function.as_str())
            .filter(|function| !function.is_empty())
    }
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize, JsonSchema)]
pub struct ComponentRecord {
    #[serde(default)]
    pub name: String,

    #[serde(rename = "type", default)]
    pub component_type: String,

    #[serde(default)]
    pub function: String,

    #[serde(default)]
    pub aliases: Vec<String>,

    #[serde(default)]
    pub related_components: Vec<String>,

    #[serde(default)]
    pub failure_indicators: Vec<String>,

    #[serde(default)]
    pub confidence: Option<f64>,
}

/// Output of the document parser.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize, JsonSchema)]
pub struct DocumentAnalysis {
    #[serde(default)]
    pub structured_sections: StructuredSections,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize, JsonSchema)]
pub struct StructuredSections {
    #[serde(default)]
    pub procedures: Vec<ProcedureRecord>,

    #[serde(default)]
    pub symptoms: Vec<String>,

    #[serde(default)]
    pub troubleshooting_steps: Vec<String>,
}

impl StructuredSections {
    pub fn is_empty(&self) -> bool {
        self.procedures.is_empty() && self.symptoms.is_empty() && self.troubleshooting_steps.is_empty()
    }

    /// Every text fragment of every section, in document order.
    pub fn texts(&self) -> Vec<String> {
        let mut texts: Vec<String> = self.procedures.iter().map(ProcedureRecord::text).collect();
        texts.extend(self.symptoms.iter().cloned());
        texts.extend(self.troubleshooting_steps.iter().cloned());
        texts
    }
}

/// A troubleshooting procedure as found in a guide.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize, JsonSchema)]
pub struct ProcedureRecord {
    #[serde(default)]
    pub title: String,

    #[serde(default)]
    pub description: String,

    #[serde(default)]
    pub symptoms: Vec<String>,

    #[serde(default)]
    pub troubleshooting_steps: Vec<String>,
}

impl ProcedureRecord {
    /// Title, description, symptoms and steps joined with single spaces.
    pub fn text(&self) -> String {
        let mut parts: Vec<&str> = vec![self.title.as_str(), self.description.as_str()];
        parts.extend(self.symptoms.iter().map(String::as_str));
        parts.extend(self.troubleshooting_steps.iter().map(String::as_str));
        parts
            .into_iter()
            .filter(|part| !part.is_empty())
            .collect::<Vec<_>>()
            .join(" ")
    }

    pub fn display_title(&self) -> &str {
        if self.title.is_empty() {
            "Unnamed procedure"
        } else {
            &self.title
        }
    }
}

/// The three extractor outputs bundled for one analysis run.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize, JsonSchema)]
pub struct AnalysisInput {
    #[serde(default, alias = "log_analysis_output")]
    pub log_analysis: Option<LogAnalysisOutput>,

    #[serde(default)]
    pub component_inventory: Option<ComponentInventoryOutput>,

    #[serde(default)]
    pub document_analysis: Option<DocumentAnalysis>,
}

impl AnalysisInput {
    pub fn is_empty(&self) -> bool {
        let no_logs = self
            .log_analysis
            .as_ref()
            .map_or(true, |logs| logs.top_issues.is_empty() && logs.categorized_indicators.is_empty());
        let no_inventory = self
            .component_inventory
            .as_ref()
            .map_or(true, |inv| inv.inventory.components.is_empty());
        let no_docs = self
            .document_analysis
            .as_ref()
            .map_or(true, |docs| docs.structured_sections.is_empty());
        no_logs && no_inventory && no_docs
    }
}
