//! # Correlation Graph
//!
//! Cross-source entity resolution: raw component mentions from several
//! extractors become canonical entities connected by relationships and
//! linked to the failure patterns that mention them.
//!
//! ## Architecture
//!
//! ```text
//! AnalysisInput (logs, inventory, documents)
//!     │
//!     ├──> Mention collection (MentionExtractor)
//!     │      └─ source -> mentions, first occurrence order
//!     │
//!     ├──> Graph Builder
//!     │      ├─ Matcher + ConflictResolver -> CanonicalEntity (merged by name)
//!     │      ├─ Failure associations, related procedures, aliases
//!     │      ├─ Explicit edges (inventory relationships, 0.9)
//!     │      ├─ Inferred edges (function text heuristics, 0.7 / 0.6 / 0.5)
//!     │      └─ Dangling references for unresolvable endpoints
//!     │
//!     ├──> Correlation Graph (petgraph)
//!     │      ├─ Nodes: CanonicalEntity
//!     │      ├─ Edges: RelationshipEdge
//!     │      └─ Clusters, analytics, cross-source metrics
//!     │
//!     └──> Failure Correlator
//!            └─ failure pattern -> troubleshooting procedures
//! ```

mod analysis;
mod builder;
mod error;
mod failures;
mod graph;
mod mentions;
mod types;

pub use analysis::{CorrelationSummary, CrossSourceMetrics, RelationshipAnalysis};
pub use builder::{GraphBuilder, RelationshipFilter, DEFAULT_CORRELATION_THRESHOLD};
pub use error::{GraphError, Result};
pub use failures::{
    collect_failure_patterns, collect_procedures, CorrelationStatistics, FailureCorrelationReport,
    FailureCorrelator, ProcedureRecommendation, DEFAULT_FAILURE_CORRELATION_THRESHOLD,
};
pub use mentions::{collect_mentions, contains_phrase, dedup_in_order, MentionExtractor, PatternExtractor};
pub use types::{
    CanonicalEntity, Cluster, CorrelationGraph, DanglingReference, FailurePattern, FailurePatternCorrelation,
    RelationshipEdge, RelationshipOrigin, RelationshipType, SourceMentions,
};
