//! Resolve a single component name against a component inventory.
//!
//! Lookup order: alias table, exact key, then naming variations
//! (abbreviation, regional spelling, shared words) ranked by confidence.

use std::collections::HashSet;

use serde::{Deserialize, Serialize};
use xref_protocol::Inventory;

use crate::error::{ResolverError, Result};
use crate::lexicon::Lexicon;

/// Default minimum confidence for a naming variation to count as resolved.
pub const DEFAULT_NAMING_THRESHOLD: f64 = 0.7;

const ABBREVIATION_SCORE: f64 = 0.9;
const SUBSTITUTION_SCORE: f64 = 0.95;
const ABBREVIATION_FLOOR: f64 = 0.8;
const PARTIAL_FLOOR: f64 = 0.7;
const MAX_VARIATIONS: usize = 5;
const MAX_SUGGESTIONS: usize = 3;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum MatchType {
    DirectAlias,
    ExactMatch,
    AbbreviationMatch,
    SubstitutionMatch,
    PartialMatch,
    NoMatch,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct NameCandidate {
    pub name: String,
    pub confidence: f64,
    pub match_type: MatchType,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct NamingResolution {
    pub resolved_name: Option<String>,
    pub match_type: MatchType,
    pub confidence: f64,
    pub alternatives: Vec<NameCandidate>,
    pub resolution_successful: bool,
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub suggestions: Vec<String>,
}

impl NamingResolution {
    fn certain(name: &str, match_type: MatchType) -> Self {
        Self {
            resolved_name: Some(name.to_string()),
            match_type,
            confidence: 1.0,
            alternatives: Vec::new(),
            resolution_successful: true,
            suggestions: Vec::new(),
        }
    }
}

#[derive(Debug, Clone, Copy)]
pub struct NameResolver {
    lexicon: &'static Lexicon,
    threshold: f64,
}

impl NameResolver {
    pub fn new(lexicon: &'static Lexicon) -> Self {
        Self {
            lexicon,
            threshold: DEFAULT_NAMING_THRESHOLD,
        }
    }

    pub fn with_threshold(mut self, threshold: f64) -> Result<Self> {
        self.threshold = ResolverError::check_threshold(threshold)?;
        Ok(self)
    }

    pub fn resolve(&self, target: &str, inventory: &Inventory) -> Result<NamingResolution> {
        if inventory.components.is_empty() {
            return Err(ResolverError::EmptyInventory);
        }

        if let Some(canonical) = inventory.aliases.get(target) {
            return Ok(NamingResolution::certain(canonical, MatchType::DirectAlias));
        }
        if inventory.components.contains_key(target) {
            return Ok(NamingResolution::certain(target, MatchType::ExactMatch));
        }

        let known: Vec<&str> = inventory.components.keys().map(String::as_str).collect();
        let mut accepted = self
            .variations(target, &known)
            .into_iter()
            .filter(|candidate| candidate.confidence >= self.threshold);

        let Some(best) = accepted.next() else {
            log::debug!("No naming variation of '{}' reached {:.2}", target, self.threshold);
            return Ok(NamingResolution {
                resolved_name: None,
                match_type: MatchType::NoMatch,
                confidence: 0.0,
                alternatives: Vec::new(),
                resolution_successful: false,
                suggestions: suggestions(target, &known),
            });
        };

        Ok(NamingResolution {
            resolved_name: Some(best.name),
            match_type: best.match_type,
            confidence: best.confidence,
            alternatives: accepted.collect(),
            resolution_successful: true,
            suggestions: Vec::new(),
        })
    }

    /// Best variation per known component, highest confidence first, at most five.
    pub fn variations(&self, target: &str, known: &[&str]) -> Vec<NameCandidate> {
        let target_lower = target.trim().to_lowercase();
        let mut found: Vec<NameCandidate> = known
            .iter()
            .filter_map(|name| {
                self.best_variation(&target_lower, &name.to_lowercase())
                    .map(|(confidence, match_type)| NameCandidate {
                        name: name.to_string(),
                        confidence,
                        match_type,
                    })
            })
            .collect();

        found.sort_by(|a, b| b.confidence.total_cmp(&a.confidence));
        found.truncate(MAX_VARIATIONS);
        found
    }

    fn best_variation(&self, a: &str, b: &str) -> Option<(f64, MatchType)> {
        if a == b {
            return Some((1.0, MatchType::ExactMatch));
        }

        let mut best: Option<(f64, MatchType)> = None;
        let mut consider = |score: f64, floor: f64, kind: MatchType| {
            if score > floor && best.map_or(true, |(current, _)| score > current) {
                best = Some((score, kind));
            }
        };

        consider(self.abbreviation_score(a, b), ABBREVIATION_FLOOR, MatchType::AbbreviationMatch);
        consider(self.substitution_score(a, b), ABBREVIATION_FLOOR, MatchType::SubstitutionMatch);
        consider(word_overlap(a, b), PARTIAL_FLOOR, MatchType::PartialMatch);
        best
    }

    fn abbreviation_score(&self, a: &str, b: &str) -> f64 {
        let words_a: HashSet<&str> = a.split_whitespace().collect();
        let words_b: HashSet<&str> = b.split_whitespace().collect();

        let abbreviates = |short: &HashSet<&str>, long: &HashSet<&str>| {
            self.lexicon.naming_abbreviations().iter().any(|(full, abbrevs)| {
                long.contains(full) && abbrevs.iter().any(|abbrev| short.contains(abbrev))
            })
        };

        if abbreviates(&words_a, &words_b) || abbreviates(&words_b, &words_a) {
            ABBREVIATION_SCORE
        } else {
            0.0
        }
    }

    fn substitution_score(&self, a: &str, b: &str) -> f64 {
        let substitute = |text: &str| {
            self.lexicon
                .substitutions()
                .iter()
                .fold(text.to_string(), |acc, (regional, canonical)| acc.replace(regional, canonical))
        };
        if substitute(a) == substitute(b) {
            SUBSTITUTION_SCORE
        } else {
            0.0
        }
    }
}

impl Default for NameResolver {
    fn default() -> Self {
        Self::new(Lexicon::shared())
    }
}

fn word_overlap(a: &str, b: &str) -> f64 {
    let words_a: HashSet<&str> = a.split_whitespace().collect();
    let words_b: HashSet<&str> = b.split_whitespace().collect();
    if words_a.is_empty() || words_b.is_empty() {
        return 0.0;
    }
    words_a.intersection(&words_b).count() as f64 / words_a.union(&words_b).count() as f64
}

fn suggestions(target: &str, known: &[&str]) -> Vec<String> {
    let lowered = target.to_lowercase();
    let target_words: HashSet<&str> = lowered.split_whitespace().collect();
    known
        .iter()
        .filter(|name| {
            name.to_lowercase()
                .split_whitespace()
                .any(|word| target_words.contains(word))
        })
        .take(MAX_SUGGESTIONS)
        .map(|name| name.to_string())
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;
    use xref_protocol::ComponentRecord;

    fn inventory(names: &[&str], aliases: &[(&str, &str)]) -> Inventory {
        Inventory {
            components: names
                .iter()
                .map(|n| (n.to_string(), ComponentRecord { name: n.to_string(), ..Default::default() }))
                .collect(),
            aliases: aliases.iter().map(|(a, c)| (a.to_string(), c.to_string())).collect(),
            relationships: Default::default(),
        }
    }

    #[test]
    fn test_direct_alias_and_exact() {
        let inv = inventory(&["Laser Diode"], &[("LD", "Laser Diode")]);
        let resolver = NameResolver::default();

        let alias = resolver.resolve("LD", &inv).unwrap();
        assert_eq!(alias.match_type, MatchType::DirectAlias);
        assert_eq!(alias.resolved_name.as_deref(), Some("Laser Diode"));

        let exact = resolver.resolve("Laser Diode", &inv).unwrap();
        assert_eq!(exact.match_type, MatchType::ExactMatch);
        assert_eq!(exact.confidence, 1.0);
    }

    #[test]
    fn test_abbreviation_match() {
        let inv = inventory(&["Temperature Controller", "Vacuum Pump"], &[]);
        let result = NameResolver::default().resolve("Temp Controller", &inv).unwrap();
        assert_eq!(result.resolved_name.as_deref(), Some("Temperature Controller"));
        assert_eq!(result.match_type, MatchType::AbbreviationMatch);
        assert_eq!(result.confidence, 0.9);
    }

    #[test]
    fn test_substitution_match() {
        let inv = inventory(&["Beam Center Detector"], &[]);
        let result = NameResolver::default().resolve("beam centre detector", &inv).unwrap();
        assert_eq!(result.match_type, MatchType::SubstitutionMatch);
        assert_eq!(result.confidence, 0.95);
    }

    #[test]
    fn test_case_only_difference_is_exact() {
        let inv = inventory(&["Vacuum Pump"], &[]);
        let result = NameResolver::default().resolve("vacuum pump", &inv).unwrap();
        assert_eq!(result.match_type, MatchType::ExactMatch);
    }

    #[test]
    fn test_unresolved_gets_suggestions() {
        let inv = inventory(&["Cooling Fan", "Vacuum Pump", "Fan Controller"], &[]);
        let result = NameResolver::default().resolve("Fan X9", &inv).unwrap();
        assert!(!result.resolution_successful);
        assert_eq!(result.match_type, MatchType::NoMatch);
        assert_eq!(result.suggestions, vec!["Cooling Fan".to_string(), "Fan Controller".to_string()]);
    }

    #[test]
    fn test_empty_inventory_is_error() {
        let result = NameResolver::default().resolve("anything", &Inventory::default());
        assert!(matches!(result, Err(ResolverError::EmptyInventory)));
    }
}
