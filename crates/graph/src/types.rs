use std::collections::{BTreeMap, HashSet};

use petgraph::graph::{DiGraph, NodeIndex};
use serde::{Deserialize, Serialize};
use xref_protocol::{ProcedureRecord, Severity};

/// Source type -> mentions found in that source, in discovery order.
pub type SourceMentions = BTreeMap<String, Vec<String>>;

/// One resolved component identity and everything known about it.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CanonicalEntity {
    pub canonical_name: String,

    /// First raw mention that resolved to this entity
    #[serde(alias = "component_name")]
    pub original_name: String,

    /// Source type -> matched raw mentions
    #[serde(default)]
    pub source_references: BTreeMap<String, Vec<String>>,

    /// Source type -> best match score in that source
    #[serde(default)]
    pub confidence_scores: BTreeMap<String, f64>,

    #[serde(default)]
    pub failure_associations: Vec<String>,

    #[serde(default, alias = "troubleshooting_procedures")]
    pub related_procedures: Vec<String>,

    #[serde(default)]
    pub consistency_score: f64,

    /// Inventory aliases pointing at any referenced component
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub known_aliases: Vec<String>,
}

impl CanonicalEntity {
    pub fn new(canonical_name: impl Into<String>, original_name: impl Into<String>) -> Self {
        Self {
            canonical_name: canonical_name.into(),
            original_name: original_name.into(),
            source_references: BTreeMap::new(),
            confidence_scores: BTreeMap::new(),
            failure_associations: Vec::new(),
            related_procedures: Vec::new(),
            consistency_score: 0.0,
            known_aliases: Vec::new(),
        }
    }

    pub fn is_multi_source(&self) -> bool {
        self.source_references.len() > 1
    }

    /// Distinct raw mentions across all sources, first occurrence first.
    pub fn name_variations(&self) -> Vec<&str> {
        let mut seen = HashSet::new();
        self.source_references
            .values()
            .flatten()
            .map(String::as_str)
            .filter(|name| seen.insert(*name))
            .collect()
    }

    /// Every name this entity is known by: canonical, original, references and aliases.
    pub fn all_names(&self) -> Vec<&str> {
        let mut seen = HashSet::new();
        std::iter::once(self.canonical_name.as_str())
            .chain(std::iter::once(self.original_name.as_str()))
            .chain(self.source_references.values().flatten().map(String::as_str))
            .chain(self.known_aliases.iter().map(String::as_str))
            .filter(|name| !name.is_empty() && seen.insert(*name))
            .collect()
    }

    /// Mean of the per-source confidences, 0.0 without any.
    pub fn mean_confidence(&self) -> f64 {
        if self.confidence_scores.is_empty() {
            return 0.0;
        }
        self.confidence_scores.values().sum::<f64>() / self.confidence_scores.len() as f64
    }

    /// Fold another resolution of the same canonical name into this one.
    pub fn merge(&mut self, other: CanonicalEntity) {
        for (source, refs) in other.source_references {
            let existing = self.source_references.entry(source).or_default();
            for name in refs {
                if !existing.contains(&name) {
                    existing.push(name);
                }
            }
        }
        for (source, score) in other.confidence_scores {
            let slot = self.confidence_scores.entry(source).or_insert(score);
            *slot = slot.max(score);
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum RelationshipType {
    ExplicitlyRelated,
    Controls,
    ProcessesDataFrom,
    InterfacesWith,
    Monitors,
    Contains,
    DependsOn,
}

impl RelationshipType {
    pub fn as_str(self) -> &'static str {
        match self {
            RelationshipType::ExplicitlyRelated => "explicitly_related",
            RelationshipType::Controls => "controls",
            RelationshipType::ProcessesDataFrom => "processes_data_from",
            RelationshipType::InterfacesWith => "interfaces_with",
            RelationshipType::Monitors => "monitors",
            RelationshipType::Contains => "contains",
            RelationshipType::DependsOn => "depends_on",
        }
    }
}

/// Where a relationship came from.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum RelationshipOrigin {
    /// Stated directly in a source document
    Documentation,
    /// Derived from component function text
    FunctionInference,
}

/// Directed relationship between two canonical entities.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RelationshipEdge {
    pub source_entity: String,
    pub target_entity: String,
    #[serde(rename = "type")]
    pub relationship_type: RelationshipType,
    pub confidence: f64,
    pub origin_source: RelationshipOrigin,
}

/// A stated relationship whose endpoint does not resolve to any entity.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct DanglingReference {
    pub source: String,
    pub target: String,
    pub relationship_type: RelationshipType,
}

/// A failure pattern lifted out of the log analyzer output.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct FailurePattern {
    pub pattern_type: String,
    pub description: String,
    pub severity: Severity,
    pub confidence: f64,
    pub matched_lines: Vec<String>,
    pub components: Vec<String>,
}

/// A failure pattern linked to components and the procedures that address it.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct FailurePatternCorrelation {
    pub failure_pattern: String,
    #[serde(default)]
    pub pattern_type: String,
    #[serde(default)]
    pub severity: Severity,
    #[serde(default)]
    pub associated_components: Vec<String>,
    #[serde(default, alias = "troubleshooting_procedures")]
    pub procedures: Vec<ProcedureRecord>,
    #[serde(default)]
    pub correlation_strength: f64,
}

/// Connected group of entities.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Cluster {
    pub cluster_id: usize,
    pub components: Vec<String>,
    pub size: usize,
    /// Member with the most outgoing relationships
    pub primary_component: String,
}

/// Resolved entities and their relationships for one run.
pub struct CorrelationGraph {
    /// Entity -> entity relationships
    pub graph: DiGraph<CanonicalEntity, RelationshipEdge>,

    /// Canonical name -> NodeIndex mapping for fast lookup
    pub entity_index: BTreeMap<String, NodeIndex>,

    /// Stated relationships that could not be attached
    pub dangling: Vec<DanglingReference>,

    /// Mentions collected per source before resolution
    pub source_mentions: SourceMentions,

    /// Distinct mentions across all sources
    pub mentions_found: usize,
}

impl CorrelationGraph {
    pub fn new() -> Self {
        Self {
            graph: DiGraph::new(),
            entity_index: BTreeMap::new(),
            dangling: Vec::new(),
            source_mentions: SourceMentions::new(),
            mentions_found: 0,
        }
    }

    /// Insert an entity, merging into an existing one with the same canonical name.
    pub fn upsert_entity(&mut self, entity: CanonicalEntity) -> NodeIndex {
        if let Some(&idx) = self.entity_index.get(&entity.canonical_name) {
            if let Some(existing) = self.graph.node_weight_mut(idx) {
                existing.merge(entity);
            }
            return idx;
        }
        let name = entity.canonical_name.clone();
        let idx = self.graph.add_node(entity);
        self.entity_index.insert(name, idx);
        idx
    }

    pub fn add_edge(&mut self, from: NodeIndex, to: NodeIndex, edge: RelationshipEdge) {
        self.graph.add_edge(from, to, edge);
    }

    pub fn find_entity(&self, canonical_name: &str) -> Option<NodeIndex> {
        self.entity_index.get(canonical_name).copied()
    }

    pub fn get_entity(&self, idx: NodeIndex) -> Option<&CanonicalEntity> {
        self.graph.node_weight(idx)
    }

    /// Entities in insertion order.
    pub fn entities(&self) -> impl Iterator<Item = &CanonicalEntity> {
        self.graph.node_indices().filter_map(move |idx| self.graph.node_weight(idx))
    }

    /// Edges in insertion order.
    pub fn edges(&self) -> impl Iterator<Item = &RelationshipEdge> {
        self.graph.edge_indices().filter_map(move |idx| self.graph.edge_weight(idx))
    }

    pub fn entity_count(&self) -> usize {
        self.graph.node_count()
    }

    pub fn edge_count(&self) -> usize {
        self.graph.edge_count()
    }
}

impl Default for CorrelationGraph {
    fn default() -> Self {
        Self::new()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;

    fn entity(canonical: &str, refs: &[(&str, &[&str], f64)]) -> CanonicalEntity {
        let mut e = CanonicalEntity::new(canonical, canonical);
        for (source, names, score) in refs {
            e.source_references
                .insert(source.to_string(), names.iter().map(|n| n.to_string()).collect());
            e.confidence_scores.insert(source.to_string(), *score);
        }
        e
    }

    #[test]
    fn test_name_variations_dedup_across_sources() {
        let e = entity(
            "Mirror",
            &[
                ("engineering_docs", &["Mirror", "Mirror Assembly"], 1.0),
                ("log_analysis", &["Mirror", "Beam Mirror"], 0.9),
            ],
        );
        assert_eq!(e.name_variations(), vec!["Mirror", "Mirror Assembly", "Beam Mirror"]);
        assert!(e.is_multi_source());
    }

    #[test]
    fn test_merge_unions_and_keeps_max() {
        let mut a = entity("Pump", &[("log_analysis", &["pump"], 0.7)]);
        let b = entity(
            "Pump",
            &[("log_analysis", &["pump", "vacuum pump"], 0.9), ("component_inventory", &["Pump"], 1.0)],
        );
        a.merge(b);
        assert_eq!(a.source_references["log_analysis"], vec!["pump", "vacuum pump"]);
        assert_eq!(a.confidence_scores["log_analysis"], 0.9);
        assert_eq!(a.confidence_scores.len(), 2);
    }

    #[test]
    fn test_upsert_never_duplicates_canonical_name() {
        let mut graph = CorrelationGraph::new();
        let first = graph.upsert_entity(entity("Laser Diode", &[("log_analysis", &["laser"], 0.9)]));
        let second = graph.upsert_entity(entity("Laser Diode", &[("engineering_docs", &["Laser Diode"], 1.0)]));
        assert_eq!(first, second);
        assert_eq!(graph.entity_count(), 1);
        assert_eq!(graph.get_entity(first).map(|e| e.source_references.len()), Some(2));
    }

    #[test]
    fn test_mean_confidence() {
        let e = entity("X", &[("a", &["x"], 1.0), ("b", &["x"], 0.5)]);
        assert_eq!(e.mean_confidence(), 0.75);
        assert_eq!(CanonicalEntity::new("Y", "Y").mean_confidence(), 0.0);
    }
}
