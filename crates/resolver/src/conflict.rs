use std::cmp::Ordering;

use serde::{Deserialize, Serialize};

use crate::lexicon::Lexicon;
use crate::matcher::SourceMatches;

/// Outcome of weighing per-source matches against each other.
///
/// An empty `canonical_name` with confidence 0.0 means nothing matched;
/// that is a normal result, not an error.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Resolution {
    pub canonical_name: String,
    pub confidence: f64,
    /// Source the winning candidate came from
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub source: Option<String>,
}

impl Resolution {
    pub fn unresolved() -> Self {
        Self {
            canonical_name: String::new(),
            confidence: 0.0,
            source: None,
        }
    }

    pub fn is_resolved(&self) -> bool {
        !self.canonical_name.is_empty()
    }
}

struct Weighted<'a> {
    source: &'a str,
    candidate: &'a str,
    priority: f64,
    weighted: f64,
}

impl Weighted<'_> {
    /// Greater means preferred.
    fn preference(&self, other: &Self) -> Ordering {
        self.weighted
            .total_cmp(&other.weighted)
            .then_with(|| self.priority.total_cmp(&other.priority))
            .then_with(|| other.candidate.cmp(self.candidate))
            .then_with(|| other.source.cmp(self.source))
    }
}

/// Picks one canonical name out of competing source matches using source priority.
#[derive(Debug, Clone, Copy)]
pub struct ConflictResolver {
    lexicon: &'static Lexicon,
}

impl ConflictResolver {
    pub fn new(lexicon: &'static Lexicon) -> Self {
        Self { lexicon }
    }

    /// Highest `score x priority` wins; ties go to the higher-priority source,
    /// then the lexicographically smaller candidate, then the smaller source name.
    pub fn resolve(&self, matches: &SourceMatches) -> Resolution {
        let best = matches
            .iter()
            .flat_map(|(source, ranked)| {
                let priority = self.lexicon.source_priority(source);
                ranked.iter().map(move |m| Weighted {
                    source: source.as_str(),
                    candidate: m.candidate.as_str(),
                    priority,
                    weighted: m.score * priority,
                })
            })
            .max_by(|a, b| a.preference(b));

        match best {
            Some(winner) => Resolution {
                canonical_name: winner.candidate.to_string(),
                confidence: winner.weighted.clamp(0.0, 1.0),
                source: Some(winner.source.to_string()),
            },
            None => Resolution::unresolved(),
        }
    }
}

impl Default for ConflictResolver {
    fn default() -> Self {
        Self::new(Lexicon::shared())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::matcher::ScoredMatch;
    use pretty_assertions::assert_eq;

    fn matches(entries: &[(&str, &[(&str, f64)])]) -> SourceMatches {
        entries
            .iter()
            .map(|(source, ranked)| {
                (
                    source.to_string(),
                    ranked.iter().map(|(c, s)| ScoredMatch::new(*c, *s)).collect(),
                )
            })
            .collect()
    }

    #[test]
    fn test_priority_weighting_picks_docs() {
        let resolver = ConflictResolver::default();
        let resolution = resolver.resolve(&matches(&[
            ("engineering_docs", &[("Laser Diode", 0.95)]),
            ("log_analysis", &[("Laser Module", 0.75)]),
        ]));
        assert_eq!(resolution.canonical_name, "Laser Diode");
        assert!((resolution.confidence - 0.95).abs() < 1e-9);
        assert_eq!(resolution.source.as_deref(), Some("engineering_docs"));
    }

    #[test]
    fn test_tie_prefers_higher_priority_source() {
        let resolver = ConflictResolver::default();
        // 0.8 * 1.0 == 1.0 * 0.8
        let resolution = resolver.resolve(&matches(&[
            ("engineering_docs", &[("Pump A", 0.8)]),
            ("log_analysis", &[("Pump B", 1.0)]),
        ]));
        assert_eq!(resolution.canonical_name, "Pump A");
    }

    #[test]
    fn test_tie_prefers_lexicographic_candidate() {
        let resolver = ConflictResolver::default();
        let resolution = resolver.resolve(&matches(&[("log_analysis", &[("beta", 0.9), ("alpha", 0.9)])]));
        assert_eq!(resolution.canonical_name, "alpha");
    }

    #[test]
    fn test_unknown_source_uses_default_priority() {
        let resolver = ConflictResolver::default();
        let resolution = resolver.resolve(&matches(&[("vendor_portal", &[("Chiller", 1.0)])]));
        assert!((resolution.confidence - 0.5).abs() < 1e-9);
    }

    #[test]
    fn test_nothing_to_resolve() {
        let resolver = ConflictResolver::default();
        assert_eq!(resolver.resolve(&SourceMatches::new()), Resolution::unresolved());
        let resolution = resolver.resolve(&matches(&[("log_analysis", &[])]));
        assert!(!resolution.is_resolved());
        assert_eq!(resolution.confidence, 0.0);
    }
}
