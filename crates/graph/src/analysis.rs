//! Summaries computed over a finished correlation graph.

use std::collections::BTreeMap;

use serde::{Deserialize, Serialize};
use xref_resolver::Matcher;

use crate::types::{CorrelationGraph, RelationshipType};

const MOST_CONNECTED: usize = 5;
const HIGH_CONSISTENCY: f64 = 0.8;
const SOURCE_AGREEMENT_SIMILARITY: f64 = 0.7;
const FAILURE_COVERAGE_TARGET: f64 = 3.0;

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct RelationshipAnalysis {
    pub total_relationships: usize,
    pub relationship_types: BTreeMap<RelationshipType, usize>,
    /// (canonical name, outgoing relationships), most connected first
    pub most_connected_components: Vec<(String, usize)>,
    pub average_connections_per_component: f64,
    /// Edges over possible directed pairs `n * (n - 1)`
    pub relationship_density: f64,
}

/// Agreement of the sources feeding the correlation result.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct CrossSourceMetrics {
    /// Share of entities with consistency above 0.8
    pub component_identification: f64,
    /// Mean pairwise agreement between sources of multi-source entities
    pub source_agreement: f64,
    /// Average failure associations per entity, scaled so three is full coverage
    pub failure_pattern_coverage: f64,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct CorrelationSummary {
    pub total_components_found: usize,
    pub components_correlated: usize,
    pub correlation_rate: f64,
    pub sources_analyzed: Vec<String>,
    pub avg_consistency_score: f64,
}

impl CorrelationGraph {
    pub fn relationship_analysis(&self) -> RelationshipAnalysis {
        let total = self.edge_count();
        let n = self.entity_count();

        let mut relationship_types = BTreeMap::new();
        for edge in self.edges() {
            *relationship_types.entry(edge.relationship_type).or_insert(0) += 1;
        }

        let mut connections: Vec<(String, usize)> = self
            .graph
            .node_indices()
            .filter_map(|idx| {
                self.get_entity(idx)
                    .map(|entity| (entity.canonical_name.clone(), self.out_degree(idx)))
            })
            .collect();
        connections.sort_by(|a, b| b.1.cmp(&a.1));
        connections.truncate(MOST_CONNECTED);

        RelationshipAnalysis {
            total_relationships: total,
            relationship_types,
            most_connected_components: connections,
            average_connections_per_component: if n == 0 { 0.0 } else { total as f64 / n as f64 },
            relationship_density: if n <= 1 {
                0.0
            } else {
                total as f64 / (n * (n - 1)) as f64
            },
        }
    }

    /// `matrix[a][b]` is the first relationship type from `a` to `b`, `"self"` on
    /// the diagonal and `"none"` when unrelated.
    pub fn relationship_matrix(&self) -> BTreeMap<String, BTreeMap<String, String>> {
        let names: Vec<&str> = self.entities().map(|e| e.canonical_name.as_str()).collect();
        let mut matrix = BTreeMap::new();

        for from in &names {
            let mut row = BTreeMap::new();
            for to in &names {
                let cell = if from == to {
                    "self"
                } else {
                    self.edges()
                        .find(|e| e.source_entity == *from && e.target_entity == *to)
                        .map_or("none", |e| e.relationship_type.as_str())
                };
                row.insert(to.to_string(), cell.to_string());
            }
            matrix.insert(from.to_string(), row);
        }

        matrix
    }

    /// Identification, agreement and failure coverage metrics; all zero without entities.
    pub fn cross_source_metrics(&self, matcher: &Matcher) -> CrossSourceMetrics {
        let entities: Vec<_> = self.entities().collect();
        if entities.is_empty() {
            return CrossSourceMetrics::default();
        }
        let total = entities.len() as f64;

        let identified = entities
            .iter()
            .filter(|e| e.consistency_score > HIGH_CONSISTENCY)
            .count();

        let agreements: Vec<f64> = entities
            .iter()
            .filter(|e| e.is_multi_source())
            .map(|entity| {
                let refs: Vec<&Vec<String>> = entity.source_references.values().collect();
                let mut agreed = 0usize;
                let mut compared = 0usize;
                for i in 0..refs.len() {
                    for j in (i + 1)..refs.len() {
                        compared += 1;
                        let agree = refs[i].iter().any(|a| {
                            refs[j]
                                .iter()
                                .any(|b| matcher.similarity(a, b) > SOURCE_AGREEMENT_SIMILARITY)
                        });
                        if agree {
                            agreed += 1;
                        }
                    }
                }
                agreed as f64 / compared as f64
            })
            .collect();

        let avg_failures = entities
            .iter()
            .map(|e| e.failure_associations.len())
            .sum::<usize>() as f64
            / total;

        CrossSourceMetrics {
            component_identification: identified as f64 / total,
            source_agreement: if agreements.is_empty() {
                0.0
            } else {
                agreements.iter().sum::<f64>() / agreements.len() as f64
            },
            failure_pattern_coverage: (avg_failures / FAILURE_COVERAGE_TARGET).min(1.0),
        }
    }

    pub fn correlation_summary(&self) -> CorrelationSummary {
        let correlated = self.entity_count();
        CorrelationSummary {
            total_components_found: self.mentions_found,
            components_correlated: correlated,
            correlation_rate: if self.mentions_found == 0 {
                0.0
            } else {
                correlated as f64 / self.mentions_found as f64
            },
            sources_analyzed: self.source_mentions.keys().cloned().collect(),
            avg_consistency_score: if correlated == 0 {
                0.0
            } else {
                self.entities().map(|e| e.consistency_score).sum::<f64>() / correlated as f64
            },
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::types::{CanonicalEntity, RelationshipEdge, RelationshipOrigin};
    use pretty_assertions::assert_eq;

    fn edge(from: &str, to: &str, kind: RelationshipType) -> RelationshipEdge {
        RelationshipEdge {
            source_entity: from.into(),
            target_entity: to.into(),
            relationship_type: kind,
            confidence: 0.7,
            origin_source: RelationshipOrigin::FunctionInference,
        }
    }

    fn sample() -> CorrelationGraph {
        let mut graph = CorrelationGraph::new();
        let a = graph.upsert_entity(CanonicalEntity::new("Controller", "Controller"));
        let b = graph.upsert_entity(CanonicalEntity::new("Heater", "Heater"));
        let c = graph.upsert_entity(CanonicalEntity::new("Fan", "Fan"));
        graph.add_edge(a, b, edge("Controller", "Heater", RelationshipType::Controls));
        graph.add_edge(a, c, edge("Controller", "Fan", RelationshipType::InterfacesWith));
        graph.add_edge(b, c, edge("Heater", "Fan", RelationshipType::InterfacesWith));
        graph
    }

    #[test]
    fn test_relationship_analysis() {
        let analysis = sample().relationship_analysis();
        assert_eq!(analysis.total_relationships, 3);
        assert_eq!(analysis.relationship_types[&RelationshipType::InterfacesWith], 2);
        assert_eq!(analysis.most_connected_components[0], ("Controller".to_string(), 2));
        assert_eq!(analysis.average_connections_per_component, 1.0);
        assert_eq!(analysis.relationship_density, 0.5);
    }

    #[test]
    fn test_relationship_matrix() {
        let matrix = sample().relationship_matrix();
        assert_eq!(matrix["Controller"]["Controller"], "self");
        assert_eq!(matrix["Controller"]["Heater"], "controls");
        assert_eq!(matrix["Fan"]["Controller"], "none");
    }

    #[test]
    fn test_empty_graph_metrics() {
        let graph = CorrelationGraph::new();
        assert_eq!(graph.relationship_analysis().relationship_density, 0.0);
        assert_eq!(graph.cross_source_metrics(&Matcher::default()), CrossSourceMetrics::default());
        assert_eq!(graph.correlation_summary().correlation_rate, 0.0);
    }

    #[test]
    fn test_cross_source_metrics() {
        let mut graph = CorrelationGraph::new();
        let mut entity = CanonicalEntity::new("Laser Diode", "Laser Diode");
        entity.source_references.insert("engineering_docs".into(), vec!["Laser Diode".into()]);
        entity.source_references.insert("log_analysis".into(), vec!["laser diode".into()]);
        entity.consistency_score = 0.9;
        entity.failure_associations = vec!["a".into(), "b".into(), "c".into(), "d".into()];
        graph.upsert_entity(entity);
        graph.upsert_entity(CanonicalEntity::new("Pump", "Pump"));

        let metrics = graph.cross_source_metrics(&Matcher::default());
        assert_eq!(metrics.component_identification, 0.5);
        assert_eq!(metrics.source_agreement, 1.0);
        assert_eq!(metrics.failure_pattern_coverage, 4.0 / 2.0 / 3.0);
    }
}
