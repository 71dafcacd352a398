use std::collections::{BTreeMap, HashSet};

use serde::{Deserialize, Serialize};

use crate::error::{ResolverError, Result};
use crate::normalizer::Normalizer;

/// Default minimum similarity for a candidate to be reported.
pub const DEFAULT_MATCH_THRESHOLD: f64 = 0.6;

/// Default number of ranked matches kept per source.
pub const DEFAULT_MAX_MATCHES: usize = 5;

const EXACT_SCORE: f64 = 1.0;
const CONTAINMENT_SCORE: f64 = 0.9;
const KEY_TERM_BONUS: f64 = 0.1;

/// A candidate mention and its similarity to the target.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ScoredMatch {
    pub candidate: String,
    pub score: f64,
}

impl ScoredMatch {
    pub fn new(candidate: impl Into<String>, score: f64) -> Self {
        Self {
            candidate: candidate.into(),
            score,
        }
    }
}

/// Source type -> ranked matches (best first).
pub type SourceMatches = BTreeMap<String, Vec<ScoredMatch>>;

/// Ranks candidate mentions from several sources against one target.
#[derive(Debug, Clone, Copy)]
pub struct Matcher {
    normalizer: Normalizer,
    threshold: f64,
    max_per_source: usize,
}

impl Matcher {
    pub fn new(normalizer: Normalizer) -> Self {
        Self {
            normalizer,
            threshold: DEFAULT_MATCH_THRESHOLD,
            max_per_source: DEFAULT_MAX_MATCHES,
        }
    }

    pub fn with_threshold(mut self, threshold: f64) -> Result<Self> {
        self.threshold = ResolverError::check_threshold(threshold)?;
        Ok(self)
    }

    pub fn with_max_per_source(mut self, max_per_source: usize) -> Result<Self> {
        if max_per_source == 0 {
            return Err(ResolverError::InvalidLimit);
        }
        self.max_per_source = max_per_source;
        Ok(self)
    }

    pub fn threshold(&self) -> f64 {
        self.threshold
    }

    pub fn normalizer(&self) -> &Normalizer {
        &self.normalizer
    }

    /// Similarity of two raw mentions after normalization, in `[0, 1]`.
    ///
    /// Exact match scores 1.0, containment 0.9, otherwise word-set Jaccard
    /// plus a 0.1 bonus when the shared words include a key technical term.
    pub fn similarity(&self, a: &str, b: &str) -> f64 {
        let a = self.normalizer.normalize(a);
        let b = self.normalizer.normalize(b);
        if a.is_empty() || b.is_empty() {
            return 0.0;
        }
        if a == b {
            return EXACT_SCORE;
        }
        if a.contains(b.as_str()) || b.contains(a.as_str()) {
            return CONTAINMENT_SCORE;
        }

        let words_a: HashSet<&str> = a.split_whitespace().collect();
        let words_b: HashSet<&str> = b.split_whitespace().collect();
        let shared: Vec<&str> = words_a.intersection(&words_b).copied().collect();
        let union = words_a.union(&words_b).count();
        if union == 0 {
            return 0.0;
        }

        let mut score = shared.len() as f64 / union as f64;
        let lexicon = self.normalizer.lexicon();
        if shared.iter().any(|word| lexicon.is_key_term(word)) {
            score += KEY_TERM_BONUS;
        }
        score.min(1.0)
    }

    /// Rank every candidate of every source against `target`.
    ///
    /// Every source key is present in the result, possibly with an empty list.
    pub fn find_matches(&self, target: &str, candidates_by_source: &BTreeMap<String, Vec<String>>) -> SourceMatches {
        let mut result = SourceMatches::new();

        for (source, candidates) in candidates_by_source {
            let mut ranked: Vec<ScoredMatch> = candidates
                .iter()
                .map(|candidate| ScoredMatch::new(candidate.clone(), self.similarity(target, candidate)))
                .filter(|m| m.score >= self.threshold)
                .collect();

            // stable: equal scores keep input order
            ranked.sort_by(|a, b| b.score.total_cmp(&a.score));
            ranked.truncate(self.max_per_source);

            log::debug!("{} candidate(s) from {} matched '{}'", ranked.len(), source, target);
            result.insert(source.clone(), ranked);
        }

        result
    }
}

impl Default for Matcher {
    fn default() -> Self {
        Self::new(Normalizer::default())
    }
}

/// Plain name similarity used for cross-reference checks.
///
/// Only case and surrounding whitespace are folded; abbreviations and
/// role words are compared as written.
pub fn name_similarity(a: &str, b: &str) -> f64 {
    let a = a.trim().to_lowercase();
    let b = b.trim().to_lowercase();
    if a.is_empty() || b.is_empty() {
        return 0.0;
    }
    if a == b {
        return EXACT_SCORE;
    }
    if a.contains(b.as_str()) || b.contains(a.as_str()) {
        return CONTAINMENT_SCORE;
    }

    let words_a: HashSet<&str> = a.split_whitespace().collect();
    let words_b: HashSet<&str> = b.split_whitespace().collect();
    let union = words_a.union(&words_b).count();
    if union == 0 {
        return 0.0;
    }
    words_a.intersection(&words_b).count() as f64 / union as f64
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;
    use proptest::prelude::*;

    fn sources(entries: &[(&str, &[&str])]) -> BTreeMap<String, Vec<String>> {
        entries
            .iter()
            .map(|(source, names)| (source.to_string(), names.iter().map(|n| n.to_string()).collect()))
            .collect()
    }

    #[test]
    fn test_exact_after_normalization() {
        let matcher = Matcher::default();
        assert_eq!(matcher.similarity("Temp Ctrl Module", "Temperature Control Unit"), 1.0);
    }

    #[test]
    fn test_containment() {
        let matcher = Matcher::default();
        assert_eq!(matcher.similarity("Laser", "Laser Diode"), 0.9);
    }

    #[test]
    fn test_jaccard_with_key_term_bonus() {
        let matcher = Matcher::default();
        // {laser, diode} vs {laser, driver}: 1/3 + 0.1
        let score = matcher.similarity("Laser Diode", "Laser Driver");
        assert!((score - (1.0 / 3.0 + 0.1)).abs() < 1e-9);
        // no key term shared
        let score = matcher.similarity("Beam Splitter", "Beam Dump");
        assert!((score - 1.0 / 3.0).abs() < 1e-9);
    }

    #[test]
    fn test_empty_inputs_score_zero() {
        let matcher = Matcher::default();
        assert_eq!(matcher.similarity("", "laser"), 0.0);
        assert_eq!(matcher.similarity("   ", "  "), 0.0);
    }

    #[test]
    fn test_find_matches_ranks_and_filters() {
        let matcher = Matcher::default();
        let candidates = sources(&[
            ("engineering_docs", &["Laser Diode Driver", "Laser Diode", "Vacuum Pump"]),
            ("log_analysis", &["pressure gauge"]),
        ]);
        let matches = matcher.find_matches("laser diode", &candidates);

        let docs = &matches["engineering_docs"];
        assert_eq!(docs[0], ScoredMatch::new("Laser Diode", 1.0));
        assert_eq!(docs[1], ScoredMatch::new("Laser Diode Driver", 0.9));
        assert_eq!(docs.len(), 2);
        assert!(matches["log_analysis"].is_empty());
    }

    #[test]
    fn test_find_matches_truncates() {
        let matcher = Matcher::default().with_max_per_source(1).unwrap();
        let candidates = sources(&[("log_analysis", &["laser", "laser diode", "LASER"])]);
        let matches = matcher.find_matches("laser", &candidates);
        assert_eq!(matches["log_analysis"], vec![ScoredMatch::new("laser", 1.0)]);
    }

    #[test]
    fn test_invalid_configuration() {
        assert!(Matcher::default().with_threshold(1.5).is_err());
        assert!(Matcher::default().with_threshold(f64::NAN).is_err());
        assert!(Matcher::default().with_max_per_source(0).is_err());
    }

    #[test]
    fn test_name_similarity_is_literal() {
        assert_eq!(name_similarity("Cooling Fan", "cooling fan "), 1.0);
        assert_eq!(name_similarity("Fan", "Cooling Fan X9"), 0.9);
        assert!(name_similarity("Cooling Fan X9", "Laser Diode") < 0.8);
    }

    proptest! {
        #[test]
        fn proptest_similarity_is_symmetric(a in "[A-Za-z ]{0,24}", b in "[A-Za-z ]{0,24}") {
            let matcher = Matcher::default();
            prop_assert_eq!(matcher.similarity(&a, &b), matcher.similarity(&b, &a));
            prop_assert_eq!(name_similarity(&a, &b), name_similarity(&b, &a));
        }

        #[test]
        fn proptest_similarity_in_unit_range(a in "[a-z ]{0,24}", b in "[a-z ]{0,24}") {
            let score = Matcher::default().similarity(&a, &b);
            prop_assert!((0.0..=1.0).contains(&score));
        }
    }
}
