use std::fmt;
use std::path::Path;
use std::str::FromStr;

use serde::{Deserialize, Serialize};
use xref_consistency::DEFAULT_CONSISTENCY_THRESHOLD;
use xref_graph::{RelationshipFilter, RelationshipOrigin, DEFAULT_CORRELATION_THRESHOLD, DEFAULT_FAILURE_CORRELATION_THRESHOLD};
use xref_planner::PrioritizationStrategy;
use xref_resolver::{DEFAULT_MATCH_THRESHOLD, DEFAULT_MAX_MATCHES};

use crate::error::{EngineError, Result};

const STRICT_THRESHOLD: f64 = 0.8;
const LENIENT_MATCH_THRESHOLD: f64 = 0.4;
const LENIENT_CORRELATION_THRESHOLD: f64 = 0.3;
const LENIENT_CONSISTENCY_THRESHOLD: f64 = 0.5;

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ReportFormat {
    #[default]
    Comprehensive,
    /// Header, summary, status and the top five recommendations
    Executive,
    /// Comprehensive plus technical details
    Technical,
}

impl ReportFormat {
    pub fn as_str(self) -> &'static str {
        match self {
            ReportFormat::Comprehensive => "comprehensive",
            ReportFormat::Executive => "executive",
            ReportFormat::Technical => "technical",
        }
    }
}

impl fmt::Display for ReportFormat {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for ReportFormat {
    type Err = EngineError;

    fn from_str(s: &str) -> Result<Self> {
        match s.trim().to_ascii_lowercase().as_str() {
            "comprehensive" => Ok(ReportFormat::Comprehensive),
            "executive" => Ok(ReportFormat::Executive),
            "technical" => Ok(ReportFormat::Technical),
            other => Err(EngineError::config(format!(
                "unknown report format '{other}' (expected comprehensive, executive or technical)"
            ))),
        }
    }
}

/// Tunables for one engine instance. Every field has a default, so a TOML
/// file only needs the keys it changes.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct EngineConfig {
    /// Minimum similarity for a candidate to count as a match
    pub match_threshold: f64,
    /// Minimum resolution confidence for a mention to become an entity
    pub correlation_threshold: f64,
    /// Minimum strength for a failure/procedure correlation to be reported
    pub failure_correlation_threshold: f64,
    /// Overall consistency needed for `meets_threshold`
    pub consistency_threshold: f64,
    pub max_matches_per_source: usize,
    pub resolution_strategy: PrioritizationStrategy,
    pub report_format: ReportFormat,
    pub relationship_sources: Vec<RelationshipOrigin>,
    pub include_inferred_relationships: bool,
}

impl Default for EngineConfig {
    fn default() -> Self {
        Self {
            match_threshold: DEFAULT_MATCH_THRESHOLD,
            correlation_threshold: DEFAULT_CORRELATION_THRESHOLD,
            failure_correlation_threshold: DEFAULT_FAILURE_CORRELATION_THRESHOLD,
            consistency_threshold: DEFAULT_CONSISTENCY_THRESHOLD,
            max_matches_per_source: DEFAULT_MAX_MATCHES,
            resolution_strategy: PrioritizationStrategy::default(),
            report_format: ReportFormat::default(),
            relationship_sources: vec![RelationshipOrigin::Documentation, RelationshipOrigin::FunctionInference],
            include_inferred_relationships: true,
        }
    }
}

impl EngineConfig {
    /// Fewer, surer matches.
    pub fn strict() -> Self {
        Self {
            match_threshold: STRICT_THRESHOLD,
            correlation_threshold: STRICT_THRESHOLD,
            consistency_threshold: STRICT_THRESHOLD,
            ..Self::default()
        }
    }

    /// More matches from noisy sources.
    pub fn lenient() -> Self {
        Self {
            match_threshold: LENIENT_MATCH_THRESHOLD,
            correlation_threshold: LENIENT_CORRELATION_THRESHOLD,
            failure_correlation_threshold: LENIENT_CORRELATION_THRESHOLD,
            consistency_threshold: LENIENT_CONSISTENCY_THRESHOLD,
            ..Self::default()
        }
    }

    pub fn preset(name: &str) -> Option<Self> {
        match name {
            "default" => Some(Self::default()),
            "strict" => Some(Self::strict()),
            "lenient" => Some(Self::lenient()),
            _ => None,
        }
    }

    pub fn from_toml_str(raw: &str) -> Result<Self> {
        let config: Self = toml::from_str(raw)?;
        config.validate()?;
        Ok(config)
    }

    pub fn from_file(path: &Path) -> Result<Self> {
        let raw = std::fs::read_to_string(path)?;
        Self::from_toml_str(&raw)
    }

    pub fn validate(&self) -> Result<()> {
        let thresholds = [
            ("match_threshold", self.match_threshold),
            ("correlation_threshold", self.correlation_threshold),
            ("failure_correlation_threshold", self.failure_correlation_threshold),
            ("consistency_threshold", self.consistency_threshold),
        ];
        for (name, value) in thresholds {
            if !(0.0..=1.0).contains(&value) {
                return Err(EngineError::config(format!("{name} must be in [0, 1], got {value}")));
            }
        }
        if self.max_matches_per_source == 0 {
            return Err(EngineError::config("max_matches_per_source must be greater than zero"));
        }
        Ok(())
    }

    pub fn relationship_filter(&self) -> RelationshipFilter {
        RelationshipFilter {
            sources: self.relationship_sources.clone(),
            include_inferred: self.include_inferred_relationships,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;
    use std::io::Write;

    #[test]
    fn test_defaults() {
        let config = EngineConfig::default();
        assert_eq!(config.match_threshold, 0.6);
        assert_eq!(config.correlation_threshold, 0.6);
        assert_eq!(config.failure_correlation_threshold, 0.5);
        assert_eq!(config.consistency_threshold, 0.7);
        assert_eq!(config.max_matches_per_source, 5);
        assert!(config.validate().is_ok());
    }

    #[test]
    fn test_partial_toml_keeps_defaults() {
        let config = EngineConfig::from_toml_str(
            r#"
            consistency_threshold = 0.9
            resolution_strategy = "quick_wins"
            relationship_sources = ["documentation"]
            "#,
        )
        .unwrap();
        assert_eq!(config.consistency_threshold, 0.9);
        assert_eq!(config.resolution_strategy, PrioritizationStrategy::QuickWins);
        assert_eq!(config.match_threshold, 0.6);
        assert!(!config.relationship_filter().allows(RelationshipOrigin::FunctionInference));
    }

    #[test]
    fn test_rejects_bad_values() {
        assert!(matches!(
            EngineConfig::from_toml_str("match_threshold = 1.5"),
            Err(EngineError::Config(_))
        ));
        assert!(EngineConfig::from_toml_str("max_matches_per_source = 0").is_err());
        assert!(matches!(
            EngineConfig::from_toml_str("unknown_key = 1"),
            Err(EngineError::ConfigToml(_))
        ));
    }

    #[test]
    fn test_presets_validate() {
        for name in ["default", "strict", "lenient"] {
            let config = EngineConfig::preset(name).unwrap();
            assert!(config.validate().is_ok(), "{name}");
        }
        assert!(EngineConfig::preset("turbo").is_none());
        assert_eq!(EngineConfig::strict().correlation_threshold, 0.8);
    }

    #[test]
    fn test_from_file() {
        let mut file = tempfile::NamedTempFile::new().unwrap();
        writeln!(file, "report_format = \"executive\"").unwrap();
        let config = EngineConfig::from_file(file.path()).unwrap();
        assert_eq!(config.report_format, ReportFormat::Executive);
        assert!(EngineConfig::from_file(Path::new("/nonexistent/xref.toml")).is_err());
    }

    proptest::proptest! {
        #[test]
        fn proptest_threshold_range_decides_validity(
            threshold in -1.0f64..2.0,
            slot in 0usize..4,
        ) {
            let mut config = EngineConfig::default();
            match slot {
                0 => config.match_threshold = threshold,
                1 => config.correlation_threshold = threshold,
                2 => config.failure_correlation_threshold = threshold,
                _ => config.consistency_threshold = threshold,
            }
            proptest::prop_assert_eq!(config.validate().is_ok(), (0.0..=1.0).contains(&threshold));
        }
    }
}
