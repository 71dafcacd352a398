use serde::{Deserialize, Serialize};
use xref_graph::CanonicalEntity;
use xref_resolver::name_similarity;

/// Similarity a failure's component name needs against an entity name to count as a match.
pub const COMPONENT_MATCH_THRESHOLD: f64 = 0.8;

/// Reference strength above which a resolved reference is `VALID`.
pub const VALID_REFERENCE_STRENGTH: f64 = 0.7;

const SIMILARITY_WEIGHT: f64 = 0.7;
const CONFIDENCE_WEIGHT: f64 = 0.3;
const NEUTRAL_CONFIDENCE: f64 = 0.5;

pub const FAILURE_CORRELATION: &str = "failure_correlation";
pub const COMPONENT_CORRELATION: &str = "component_correlation";
pub const COMPONENT_RELATIONSHIP: &str = "component_relationship";

#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(rename_all = "UPPERCASE")]
pub enum ValidationStatus {
    Valid,
    Invalid,
    Uncertain,
}

/// A link from a failure pattern (or a stated relationship) to a canonical entity.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CrossReference {
    pub source_type: String,
    pub target_type: String,
    pub source_item: String,
    /// Canonical name when resolved, the raw component name otherwise
    pub target_item: String,
    #[serde(alias = "reference_strength")]
    pub strength: f64,
    pub validation_status: ValidationStatus,
    /// Component string as it appeared in the referring item
    pub source_component: String,
}

impl CrossReference {
    pub fn is_valid(&self) -> bool {
        self.validation_status == ValidationStatus::Valid
    }
}

/// Whether `component` names `entity`: similarity of at least
/// [`COMPONENT_MATCH_THRESHOLD`] to any of its names (canonical, original,
/// source references, known aliases).
pub fn components_match(component: &str, entity: &CanonicalEntity) -> bool {
    entity
        .all_names()
        .into_iter()
        .any(|name| name_similarity(component, name) >= COMPONENT_MATCH_THRESHOLD)
}

/// Name similarity to the canonical name blended with the entity's mean source confidence.
pub fn reference_strength(component: &str, entity: &CanonicalEntity) -> f64 {
    let similarity = name_similarity(component, &entity.canonical_name);
    let confidence = if entity.confidence_scores.is_empty() {
        NEUTRAL_CONFIDENCE
    } else {
        entity.mean_confidence()
    };
    (similarity * SIMILARITY_WEIGHT + confidence * CONFIDENCE_WEIGHT).min(1.0)
}

/// Resolve `component` against `entities`, first match wins. Unmatched
/// components yield an `INVALID` reference with zero strength.
pub fn link_component(source_item: &str, component: &str, entities: &[CanonicalEntity]) -> CrossReference {
    match entities.iter().find(|entity| components_match(component, entity)) {
        Some(entity) => {
            let strength = reference_strength(component, entity);
            CrossReference {
                source_type: FAILURE_CORRELATION.to_string(),
                target_type: COMPONENT_CORRELATION.to_string(),
                source_item: source_item.to_string(),
                target_item: entity.canonical_name.clone(),
                strength,
                validation_status: if strength > VALID_REFERENCE_STRENGTH {
                    ValidationStatus::Valid
                } else {
                    ValidationStatus::Uncertain
                },
                source_component: component.to_string(),
            }
        }
        None => CrossReference {
            source_type: FAILURE_CORRELATION.to_string(),
            target_type: COMPONENT_CORRELATION.to_string(),
            source_item: source_item.to_string(),
            target_item: component.to_string(),
            strength: 0.0,
            validation_status: ValidationStatus::Invalid,
            source_component: component.to_string(),
        },
    }
}
