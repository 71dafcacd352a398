//! # Mention Resolver
//!
//! Turns raw, source-specific component mentions into canonical names.
//!
//! ## Architecture
//!
//! ```text
//! raw mention
//!     │
//!     ├──> Normalizer
//!     │      ├─ lowercase, expand abbreviations (temp -> temperature)
//!     │      └─ strip qualifiers (main, backup) and role words (unit, module)
//!     │
//!     ├──> Matcher
//!     │      ├─ exact 1.0 / containment 0.9 / word Jaccard (+0.1 key term)
//!     │      └─ ranked matches per source, threshold + top-N
//!     │
//!     └──> ConflictResolver
//!            └─ score x source priority -> canonical name + confidence
//! ```
//!
//! All lookup tables live in a process-wide [`Lexicon`] that is built once and
//! only read afterwards.

mod conflict;
mod error;
mod lexicon;
mod matcher;
mod naming;
mod normalizer;

pub use conflict::{ConflictResolver, Resolution};
pub use error::{ResolverError, Result};
pub use lexicon::{sources, Lexicon, DEFAULT_SOURCE_PRIORITY};
pub use matcher::{
    name_similarity, Matcher, ScoredMatch, SourceMatches, DEFAULT_MATCH_THRESHOLD, DEFAULT_MAX_MATCHES,
};
pub use naming::{MatchType, NameCandidate, NameResolver, NamingResolution, DEFAULT_NAMING_THRESHOLD};
pub use normalizer::Normalizer;
