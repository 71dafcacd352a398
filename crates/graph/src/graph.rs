use std::collections::{HashSet, VecDeque};

use petgraph::graph::NodeIndex;
use petgraph::visit::EdgeRef;

use crate::error::{GraphError, Result};
use crate::types::{Cluster, CorrelationGraph, RelationshipType};

impl CorrelationGraph {
    /// Entities this entity points at (outgoing edges of any type)
    pub fn get_targets(&self, node: NodeIndex) -> Vec<NodeIndex> {
        self.graph.edges(node).map(|e| e.target()).collect()
    }

    /// Entities reached through outgoing edges of one relationship type
    pub fn get_nodes_by_relationship(&self, node: NodeIndex, rel_type: RelationshipType) -> Vec<NodeIndex> {
        self.graph
            .edges(node)
            .filter(|e| e.weight().relationship_type == rel_type)
            .map(|e| e.target())
            .collect()
    }

    /// Number of outgoing relationships
    pub fn out_degree(&self, node: NodeIndex) -> usize {
        self.graph.edges(node).count()
    }

    /// Canonical names of entities related to `canonical_name`, first-hop only
    pub fn related_names(&self, canonical_name: &str) -> Result<Vec<String>> {
        let node = self
            .find_entity(canonical_name)
            .ok_or_else(|| GraphError::EntityNotFound(canonical_name.to_string()))?;

        let mut seen = HashSet::new();
        Ok(self
            .get_targets(node)
            .into_iter()
            .filter(|target| seen.insert(*target))
            .filter_map(|target| self.get_entity(target).map(|e| e.canonical_name.clone()))
            .collect())
    }

    /// Breadth-first visit along outgoing edges, skipping anything already visited.
    ///
    /// `visited` is shared across calls so each entity is claimed by exactly one group.
    fn collect_reachable(&self, start: NodeIndex, visited: &mut HashSet<NodeIndex>) -> Vec<NodeIndex> {
        let mut group = Vec::new();
        let mut queue = VecDeque::from([start]);

        while let Some(current) = queue.pop_front() {
            if !visited.insert(current) {
                continue;
            }
            group.push(current);

            // Targets come back newest-edge-first; reverse for insertion order
            let mut targets = self.get_targets(current);
            targets.reverse();
            queue.extend(targets.into_iter().filter(|target| !visited.contains(target)));
        }

        group
    }

    /// Every entity in exactly one group, singletons included, in node order.
    pub fn partition(&self) -> Vec<Vec<NodeIndex>> {
        let mut visited = HashSet::new();
        let mut groups = Vec::new();

        for node in self.graph.node_indices() {
            if !visited.contains(&node) {
                groups.push(self.collect_reachable(node, &mut visited));
            }
        }

        groups
    }

    /// Groups of two or more entities connected through relationships.
    pub fn clusters(&self) -> Vec<Cluster> {
        let clusters: Vec<Cluster> = self
            .partition()
            .into_iter()
            .filter(|group| group.len() > 1)
            .enumerate()
            .map(|(i, group)| {
                let primary = group
                    .iter()
                    .copied()
                    .fold(None::<(NodeIndex, usize)>, |best, node| {
                        let degree = self.out_degree(node);
                        match best {
                            Some((_, best_degree)) if best_degree >= degree => best,
                            _ => Some((node, degree)),
                        }
                    })
                    .and_then(|(node, _)| self.get_entity(node))
                    .map(|e| e.canonical_name.clone())
                    .unwrap_or_default();

                let components: Vec<String> = group
                    .iter()
                    .filter_map(|node| self.get_entity(*node).map(|e| e.canonical_name.clone()))
                    .collect();

                Cluster {
                    cluster_id: i + 1,
                    size: components.len(),
                    components,
                    primary_component: primary,
                }
            })
            .collect();

        log::debug!("Identified {} entity clusters", clusters.len());
        clusters
    }
}
