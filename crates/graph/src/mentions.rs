//! Component mentions pulled out of extractor outputs.

use std::collections::HashSet;

use regex::Regex;
use xref_protocol::AnalysisInput;
use xref_resolver::sources;

use crate::error::Result;
use crate::types::SourceMentions;

/// Finds component mentions in free text.
pub trait MentionExtractor: Send + Sync {
    /// Mentions in order of first appearance, without duplicates.
    fn extract(&self, text: &str) -> Vec<String>;
}

const COMPONENT_PATTERNS: [&str; 3] = [
    r"(?i)\b\w+\s+(?:sensor|detector|controller|module|system|unit)\b",
    r"(?i)\b(?:laser|optical|temperature|pressure|flow)\s+\w+\b",
    r"(?i)\b\w+\s+(?:component|assembly|interface)\b",
];

/// Regex-based extractor for "<word> sensor", "laser <word>", "<word> assembly" shapes.
#[derive(Debug, Clone)]
pub struct PatternExtractor {
    patterns: Vec<Regex>,
}

impl PatternExtractor {
    pub fn new() -> Result<Self> {
        let patterns = COMPONENT_PATTERNS
            .iter()
            .map(|pattern| Regex::new(pattern))
            .collect::<std::result::Result<Vec<_>, _>>()?;
        Ok(Self { patterns })
    }
}

impl MentionExtractor for PatternExtractor {
    fn extract(&self, text: &str) -> Vec<String> {
        let mut found = Vec::new();
        for pattern in &self.patterns {
            for m in pattern.find_iter(text) {
                let mention = m.as_str().split_whitespace().collect::<Vec<_>>().join(" ");
                if !mention.is_empty() {
                    found.push(mention);
                }
            }
        }
        dedup_in_order(found)
    }
}

/// Drop repeated strings, keeping the first occurrence.
pub fn dedup_in_order(items: impl IntoIterator<Item = String>) -> Vec<String> {
    let mut seen = HashSet::new();
    items.into_iter().filter(|item| seen.insert(item.clone())).collect()
}

/// Gather mentions per source from whichever extractor outputs are present.
///
/// Log mentions come from issue descriptions and sample matches, inventory
/// mentions are the component keys, document mentions come from every
/// structured section.
pub fn collect_mentions(input: &AnalysisInput, extractor: &dyn MentionExtractor) -> SourceMentions {
    let mut mentions = SourceMentions::new();

    if let Some(logs) = &input.log_analysis {
        let found = logs.top_issues.iter().flat_map(|issue| {
            let mut text = issue.description.clone();
            for sample in &issue.sample_matches {
                text.push(' ');
                text.push_str(sample);
            }
            extractor.extract(&text)
        });
        mentions.insert(sources::LOG_ANALYSIS.to_string(), dedup_in_order(found));
    }

    if let Some(inventory) = &input.component_inventory {
        let keys = inventory.inventory.components.keys().cloned().collect();
        mentions.insert(sources::COMPONENT_INVENTORY.to_string(), keys);
    }

    if let Some(docs) = &input.document_analysis {
        let found = docs
            .structured_sections
            .texts()
            .into_iter()
            .flat_map(|text| extractor.extract(&text));
        mentions.insert(sources::DOCUMENT_ANALYSIS.to_string(), dedup_in_order(found));
    }

    log::debug!(
        "Collected mentions: {}",
        mentions
            .iter()
            .map(|(source, names)| format!("{}={}", source, names.len()))
            .collect::<Vec<_>>()
            .join(", ")
    );

    mentions
}

/// Case-insensitive containment of `needle` in `haystack` on word boundaries.
pub fn contains_phrase(haystack: &str, needle: &str) -> bool {
    let needle = needle.trim().to_lowercase();
    if needle.is_empty() {
        return false;
    }
    let haystack = haystack.to_lowercase();
    let is_word = |c: char| c.is_alphanumeric() || c == '_';

    haystack.match_indices(needle.as_str()).any(|(start, matched)| {
        let end = start + matched.len();
        let before_ok = haystack[..start].chars().next_back().map_or(true, |c| !is_word(c));
        let after_ok = haystack[end..].chars().next().map_or(true, |c| !is_word(c));
        before_ok && after_ok
    })
}
