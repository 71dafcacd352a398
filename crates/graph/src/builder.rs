use std::collections::HashMap;

use petgraph::graph::NodeIndex;
use serde::{Deserialize, Serialize};
use xref_protocol::{AnalysisInput, Inventory};
use xref_resolver::{sources, ConflictResolver, Lexicon, Matcher, ResolverError};

use crate::error::Result;
use crate::failures::collect_failure_patterns;
use crate::mentions::{collect_mentions, contains_phrase, dedup_in_order, MentionExtractor, PatternExtractor};
use crate::types::*;

/// Default minimum resolution confidence for a mention to become an entity.
pub const DEFAULT_CORRELATION_THRESHOLD: f64 = 0.6;

const EXPLICIT_CONFIDENCE: f64 = 0.9;
const CONTROLS_CONFIDENCE: f64 = 0.7;
const PROCESSES_CONFIDENCE: f64 = 0.6;
const INTERFACES_CONFIDENCE: f64 = 0.5;

/// Which relationship origins end up in the graph.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct RelationshipFilter {
    pub sources: Vec<RelationshipOrigin>,
    pub include_inferred: bool,
}

impl RelationshipFilter {
    pub fn allows(&self, origin: RelationshipOrigin) -> bool {
        if origin == RelationshipOrigin::FunctionInference && !self.include_inferred {
            return false;
        }
        self.sources.contains(&origin)
    }
}

impl Default for RelationshipFilter {
    fn default() -> Self {
        Self {
            sources: vec![RelationshipOrigin::Documentation, RelationshipOrigin::FunctionInference],
            include_inferred: true,
        }
    }
}

/// Build a correlation graph from extractor outputs
pub struct GraphBuilder {
    matcher: Matcher,
    resolver: ConflictResolver,
    extractor: Box<dyn MentionExtractor>,
    correlation_threshold: f64,
    filter: RelationshipFilter,
}

impl GraphBuilder {
    pub fn new(matcher: Matcher) -> Result<Self> {
        let lexicon = matcher.normalizer().lexicon();
        Ok(Self {
            matcher,
            resolver: ConflictResolver::new(lexicon),
            extractor: Box::new(PatternExtractor::new()?),
            correlation_threshold: DEFAULT_CORRELATION_THRESHOLD,
            filter: RelationshipFilter::default(),
        })
    }

    pub fn with_extractor(mut self, extractor: Box<dyn MentionExtractor>) -> Self {
        self.extractor = extractor;
        self
    }

    pub fn with_correlation_threshold(mut self, threshold: f64) -> Result<Self> {
        self.correlation_threshold = ResolverError::check_threshold(threshold)?;
        Ok(self)
    }

    pub fn with_relationship_filter(mut self, filter: RelationshipFilter) -> Self {
        self.filter = filter;
        self
    }

    pub fn extractor(&self) -> &dyn MentionExtractor {
        self.extractor.as_ref()
    }

    pub fn matcher(&self) -> &Matcher {
        &self.matcher
    }

    fn lexicon(&self) -> &'static Lexicon {
        self.matcher.normalizer().lexicon()
    }

    /// Resolve mentions into entities, link failures and procedures, then add edges.
    pub fn build(&self, input: &AnalysisInput) -> Result<CorrelationGraph> {
        let mut graph = CorrelationGraph::new();
        let mentions = collect_mentions(input, self.extractor());
        let all_mentions = dedup_in_order(mentions.values().flatten().cloned());

        // Phase 1: one entity per canonical name
        for mention in &all_mentions {
            if let Some(entity) = self.resolve_mention(mention, &mentions) {
                graph.upsert_entity(entity);
            }
        }
        log::debug!(
            "Resolved {} mentions into {} entities",
            all_mentions.len(),
            graph.entity_count()
        );

        // Phase 2: aliases, failure associations, procedures, scores
        let inventory = input.component_inventory.as_ref().map(|c| &c.inventory);
        self.enrich_entities(&mut graph, input, inventory);

        // Phase 3: relationships
        if let Some(inventory) = inventory {
            let lookup = NameLookup::new(&graph, inventory);
            if self.filter.allows(RelationshipOrigin::Documentation) {
                self.add_explicit_edges(&mut graph, inventory, &lookup);
            }
            if self.filter.allows(RelationshipOrigin::FunctionInference) {
                self.add_inferred_edges(&mut graph, inventory);
            }
        }

        graph.mentions_found = all_mentions.len();
        graph.source_mentions = mentions;

        log::info!(
            "Built correlation graph: {} entities, {} edges, {} dangling references",
            graph.entity_count(),
            graph.edge_count(),
            graph.dangling.len()
        );

        Ok(graph)
    }

    fn resolve_mention(&self, mention: &str, mentions: &SourceMentions) -> Option<CanonicalEntity> {
        let matches = self.matcher.find_matches(mention, mentions);
        let resolution = self.resolver.resolve(&matches);
        if resolution.confidence < self.correlation_threshold {
            log::debug!(
                "Dropping '{}': resolution confidence {:.2} below {:.2}",
                mention,
                resolution.confidence,
                self.correlation_threshold
            );
            return None;
        }

        let canonical = if resolution.is_resolved() {
            resolution.canonical_name
        } else {
            mention.to_string()
        };
        let mut entity = CanonicalEntity::new(canonical, mention);
        for (source, ranked) in matches {
            let Some(best) = ranked.iter().map(|m| m.score).max_by(f64::total_cmp) else {
                continue;
            };
            entity.confidence_scores.insert(source.clone(), best);
            entity
                .source_references
                .insert(source, ranked.into_iter().map(|m| m.candidate).collect());
        }
        Some(entity)
    }

    fn enrich_entities(&self, graph: &mut CorrelationGraph, input: &AnalysisInput, inventory: Option<&Inventory>) {
        let failure_descriptions = input
            .log_analysis
            .as_ref()
            .map(|logs| {
                dedup_in_order(
                    collect_failure_patterns(logs)
                        .into_iter()
                        .map(|p| p.description)
                        .filter(|d| !d.is_empty()),
                )
            })
            .unwrap_or_default();
        let procedures = input
            .document_analysis
            .as_ref()
            .map(|docs| docs.structured_sections.procedures.as_slice())
            .unwrap_or_default();

        let indices: Vec<NodeIndex> = graph.graph.node_indices().collect();
        for idx in indices {
            let Some(entity) = graph.graph.node_weight_mut(idx) else {
                continue;
            };

            if let Some(inventory) = inventory {
                entity.known_aliases = inventory_aliases(entity, inventory);
            }

            let names: Vec<String> = entity.all_names().into_iter().map(str::to_string).collect();
            let mentioned_in = |text: &str| names.iter().any(|name| contains_phrase(text, name));

            entity.failure_associations = failure_descriptions
                .iter()
                .filter(|description| mentioned_in(description))
                .cloned()
                .collect();
            entity.related_procedures = dedup_in_order(
                procedures
                    .iter()
                    .filter(|procedure| mentioned_in(&procedure.text()))
                    .map(|procedure| procedure.display_title().to_string()),
            );
            entity.consistency_score = entity.mean_confidence();
        }
    }

    fn add_explicit_edges(&self, graph: &mut CorrelationGraph, inventory: &Inventory, lookup: &NameLookup) {
        for (component, record) in &inventory.components {
            let stated = inventory
                .relationships
                .get(component)
                .into_iter()
                .flatten()
                .chain(record.related_components.iter())
                .cloned();

            for target in dedup_in_order(stated) {
                match (lookup.find(component), lookup.find(&target)) {
                    (Some(from), Some(to)) if from != to => {
                        connect(graph, from, to, RelationshipType::ExplicitlyRelated, EXPLICIT_CONFIDENCE, RelationshipOrigin::Documentation);
                    }
                    (Some(_), Some(_)) => {}
                    _ => {
                        log::debug!("Dangling relationship: {} -> {}", component, target);
                        graph.dangling.push(DanglingReference {
                            source: component.clone(),
                            target,
                            relationship_type: RelationshipType::ExplicitlyRelated,
                        });
                    }
                }
            }
        }
    }

    fn add_inferred_edges(&self, graph: &mut CorrelationGraph, inventory: &Inventory) {
        let lexicon = self.lexicon();
        let functions: Vec<(NodeIndex, Option<String>)> = graph
            .graph
            .node_indices()
            .map(|idx| {
                let function = graph.get_entity(idx).and_then(|entity| {
                    entity
                        .all_names()
                        .into_iter()
                        .find_map(|name| inventory.function_of(name))
                        .map(str::to_lowercase)
                });
                (idx, function)
            })
            .collect();

        for (from, function) in &functions {
            let Some(function) = function else { continue };
            let controls = function.contains("control");
            let processes = function.contains("process");
            let interfaces = lexicon.interface_cues().iter().any(|cue| function.contains(cue));

            for (to, other) in &functions {
                if from == to {
                    continue;
                }
                let other = other.as_deref().unwrap_or("");
                if controls && lexicon.controlled_terms().iter().any(|term| other.contains(term)) {
                    connect(graph, *from, *to, RelationshipType::Controls, CONTROLS_CONFIDENCE, RelationshipOrigin::FunctionInference);
                }
                if processes && other.contains("detect") {
                    connect(graph, *from, *to, RelationshipType::ProcessesDataFrom, PROCESSES_CONFIDENCE, RelationshipOrigin::FunctionInference);
                }
                if interfaces {
                    connect(graph, *from, *to, RelationshipType::InterfacesWith, INTERFACES_CONFIDENCE, RelationshipOrigin::FunctionInference);
                }
            }
        }
    }
}

fn connect(
    graph: &mut CorrelationGraph,
    from: NodeIndex,
    to: NodeIndex,
    relationship_type: RelationshipType,
    confidence: f64,
    origin_source: RelationshipOrigin,
) {
    let (Some(source), Some(target)) = (graph.get_entity(from), graph.get_entity(to)) else {
        return;
    };
    let edge = RelationshipEdge {
        source_entity: source.canonical_name.clone(),
        target_entity: target.canonical_name.clone(),
        relationship_type,
        confidence,
        origin_source,
    };
    graph.add_edge(from, to, edge);
}

/// Inventory aliases of every inventory component the entity refers to.
fn inventory_aliases(entity: &CanonicalEntity, inventory: &Inventory) -> Vec<String> {
    let mut keys: Vec<&str> = entity
        .source_references
        .get(sources::COMPONENT_INVENTORY)
        .into_iter()
        .flatten()
        .map(String::as_str)
        .collect();
    keys.push(entity.canonical_name.as_str());

    let mut aliases = Vec::new();
    for key in keys {
        if let Some(record) = inventory.components.get(key) {
            aliases.extend(record.aliases.iter().cloned());
        }
        aliases.extend(
            inventory
                .aliases
                .iter()
                .filter(|(_, target)| target.as_str() == key)
                .map(|(alias, _)| alias.clone()),
        );
    }
    dedup_in_order(aliases)
}

/// Case-insensitive name -> entity lookup, falling back to the inventory alias table.
struct NameLookup<'a> {
    by_name: HashMap<String, NodeIndex>,
    inventory: &'a Inventory,
}

impl<'a> NameLookup<'a> {
    fn new(graph: &CorrelationGraph, inventory: &'a Inventory) -> Self {
        let mut by_name = HashMap::new();
        for idx in graph.graph.node_indices() {
            if let Some(entity) = graph.get_entity(idx) {
                for name in entity.all_names() {
                    by_name.entry(name.to_lowercase()).or_insert(idx);
                }
            }
        }
        Self { by_name, inventory }
    }

    fn find(&self, name: &str) -> Option<NodeIndex> {
        self.by_name
            .get(&name.to_lowercase())
            .or_else(|| self.by_name.get(&self.inventory.resolve_alias(name).to_lowercase()))
            .copied()
    }
}
