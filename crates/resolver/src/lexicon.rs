use std::collections::{BTreeMap, HashMap, HashSet};

use once_cell::sync::Lazy;

/// Well-known source type names.
pub mod sources {
    pub const ENGINEERING_DOCS: &str = "engineering_docs";
    pub const TROUBLESHOOTING_GUIDES: &str = "troubleshooting_guides";
    pub const LOG_ANALYSIS: &str = "log_analysis";
    pub const COMPONENT_INVENTORY: &str = "component_inventory";
    pub const DOCUMENT_ANALYSIS: &str = "document_analysis";
}

/// Priority applied to sources missing from the priority table.
pub const DEFAULT_SOURCE_PRIORITY: f64 = 0.5;

static SHARED: Lazy<Lexicon> = Lazy::new(Lexicon::builtin);

/// Fixed lookup tables used across the pipeline.
///
/// Built once per process and never mutated afterwards, so a `&'static Lexicon`
/// can be handed to any number of concurrently running engines.
#[derive(Debug)]
pub struct Lexicon {
    abbreviations: HashMap<&'static str, &'static str>,
    qualifiers: HashSet<&'static str>,
    role_suffixes: HashSet<&'static str>,
    key_terms: HashSet<&'static str>,
    source_priorities: HashMap<&'static str, f64>,
    naming_abbreviations: Vec<(&'static str, &'static [&'static str])>,
    substitutions: Vec<(&'static str, &'static str)>,
    failure_keywords: BTreeMap<&'static str, &'static [&'static str]>,
    controlled_terms: &'static [&'static str],
    interface_cues: &'static [&'static str],
}

impl Lexicon {
    /// Shared process-wide instance.
    pub fn shared() -> &'static Lexicon {
        &SHARED
    }

    fn builtin() -> Self {
        let abbreviations = [
            ("temp", "temperature"),
            ("ctrl", "control"),
            ("sys", "system"),
            ("mod", "module"),
            ("det", "detector"),
            ("opt", "optical"),
            ("proc", "processor"),
            ("mgmt", "management"),
            ("intf", "interface"),
        ]
        .into_iter()
        .collect();

        let source_priorities = [
            (sources::ENGINEERING_DOCS, 1.0),
            (sources::TROUBLESHOOTING_GUIDES, 0.9),
            (sources::LOG_ANALYSIS, 0.8),
            (sources::COMPONENT_INVENTORY, 0.7),
        ]
        .into_iter()
        .collect();

        let failure_keywords: BTreeMap<&'static str, &'static [&'static str]> = [
            ("connection_timeout", &["connection", "cable", "communication", "timeout"] as &[&str]),
            ("service_failures", &["service", "software", "restart", "process"] as &[&str]),
            ("memory_issues", &["memory", "ram", "allocation", "leak"] as &[&str]),
            ("disk_issues", &["disk", "storage", "space", "write"] as &[&str]),
            ("performance_degradation", &["performance", "slow", "optimization", "speed"] as &[&str]),
            ("driver_issues", &["driver", "version", "compatibility", "update"] as &[&str]),
            ("optical_alignment", &["optical", "alignment", "laser", "mirror"] as &[&str]),
            ("temperature_control", &["temperature", "heating", "cooling", "thermal"] as &[&str]),
        ]
        .into_iter()
        .collect();

        Self {
            abbreviations,
            qualifiers: ["main", "primary", "secondary", "backup"].into_iter().collect(),
            role_suffixes: ["unit", "module", "system", "component"].into_iter().collect(),
            key_terms: [
                "laser",
                "detector",
                "sensor",
                "controller",
                "optical",
                "temperature",
                "pressure",
            ]
            .into_iter()
            .collect(),
            source_priorities,
            naming_abbreviations: vec![
                ("temperature", &["temp", "tmp"] as &[&str]),
                ("control", &["ctrl", "ctl"] as &[&str]),
                ("system", &["sys"] as &[&str]),
                ("module", &["mod"] as &[&str]),
                ("interface", &["if", "intf"] as &[&str]),
                ("management", &["mgmt", "mgr"] as &[&str]),
                ("processor", &["proc"] as &[&str]),
                ("detector", &["det"] as &[&str]),
                ("optical", &["opt"] as &[&str]),
            ],
            substitutions: vec![
                ("centre", "center"),
                ("colour", "color"),
                ("analogue", "analog"),
                ("programme", "program"),
            ],
            failure_keywords,
            controlled_terms: &["temperature", "pressure", "flow"],
            interface_cues: &["interface", "communication"],
        }
    }

    /// Expansion of a single lowercase token, if it is a known abbreviation.
    pub fn expand(&self, token: &str) -> Option<&'static str> {
        self.abbreviations.get(token).copied()
    }

    pub fn is_qualifier(&self, token: &str) -> bool {
        self.qualifiers.contains(token)
    }

    pub fn is_role_suffix(&self, token: &str) -> bool {
        self.role_suffixes.contains(token)
    }

    pub fn is_key_term(&self, token: &str) -> bool {
        self.key_terms.contains(token)
    }

    pub fn source_priority(&self, source: &str) -> f64 {
        self.source_priorities
            .get(source)
            .copied()
            .unwrap_or(DEFAULT_SOURCE_PRIORITY)
    }

    /// Full word -> accepted abbreviations, used by inventory name resolution.
    pub fn naming_abbreviations(&self) -> &[(&'static str, &'static [&'static str])] {
        &self.naming_abbreviations
    }

    /// Regional spelling -> canonical spelling.
    pub fn substitutions(&self) -> &[(&'static str, &'static str)] {
        &self.substitutions
    }

    /// Keywords expected in a procedure addressing the given failure pattern type.
    pub fn failure_keywords(&self, pattern_type: &str) -> Option<&'static [&'static str]> {
        self.failure_keywords.get(pattern_type).copied()
    }

    /// Function terms that make a component the target of a `controls` edge.
    pub fn controlled_terms(&self) -> &'static [&'static str] {
        self.controlled_terms
    }

    /// Function terms that make a component interface with every other component.
    pub fn interface_cues(&self) -> &'static [&'static str] {
        self.interface_cues
    }
}
