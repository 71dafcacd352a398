use std::cmp::Reverse;
use std::fmt;
use std::str::FromStr;

use serde::{Deserialize, Serialize};

use crate::error::PlannerError;
use crate::resolution::ResolutionItem;

/// Order in which resolutions should be worked through.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum PrioritizationStrategy {
    /// Most severe first, then most confident
    #[default]
    CriticalFirst,
    /// Widest reach (affected sources) first, then severity
    HighImpact,
    /// Cheap fixes first, then severity
    QuickWins,
}

impl PrioritizationStrategy {
    pub fn as_str(self) -> &'static str {
        match self {
            PrioritizationStrategy::CriticalFirst => "critical_first",
            PrioritizationStrategy::HighImpact => "high_impact",
            PrioritizationStrategy::QuickWins => "quick_wins",
        }
    }

    /// Stable sort; equal keys keep their incoming order.
    pub fn apply(self, resolutions: &mut [ResolutionItem]) {
        match self {
            PrioritizationStrategy::CriticalFirst => resolutions.sort_by(|a, b| {
                a.priority
                    .rank()
                    .cmp(&b.priority.rank())
                    .then_with(|| b.confidence.total_cmp(&a.confidence))
            }),
            PrioritizationStrategy::HighImpact => {
                resolutions.sort_by_key(|r| (Reverse(r.affected_sources.len()), r.priority.rank()))
            }
            PrioritizationStrategy::QuickWins => {
                resolutions.sort_by_key(|r| (!r.resolution_type.is_quick_win(), r.priority.rank()))
            }
        }
    }
}

impl fmt::Display for PrioritizationStrategy {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for PrioritizationStrategy {
    type Err = PlannerError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().replace('-', "_").as_str() {
            "critical_first" => Ok(PrioritizationStrategy::CriticalFirst),
            "high_impact" => Ok(PrioritizationStrategy::HighImpact),
            "quick_wins" => Ok(PrioritizationStrategy::QuickWins),
            _ => Err(PlannerError::UnknownStrategy(s.to_string())),
        }
    }
}
