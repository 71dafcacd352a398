//! # Consistency Validation
//!
//! Checks resolved entities and failure correlations for contradictions
//! between sources and scores the result.
//!
//! ## Architecture
//!
//! ```text
//! CanonicalEntity[] + FailurePatternCorrelation[] + DanglingReference[]
//!     │
//!     ├──> Entity rules
//!     │      ├─ component_name_conflict  (> 3 raw names, MEDIUM)
//!     │      ├─ missing_canonical_name   (LOW)
//!     │      └─ data_source_mismatch     (source confidence < 0.8, MEDIUM)
//!     │
//!     ├──> Failure rules
//!     │      ├─ failure_severity_mismatch        (HIGH)
//!     │      └─ inconsistent_failure_association (> 3 patterns, HIGH)
//!     │
//!     ├──> Cross-references
//!     │      └─ failure -> entity links; unknown targets -> broken_cross_reference
//!     │
//!     └──> ValidationReport
//!            ├─ ConsistencyMetrics (all in [0, 1], 1.0 when nothing analysed)
//!            ├─ ConsistencyLevel (HIGH >= 0.8, MEDIUM >= 0.6)
//!            └─ violation / cross-reference summaries
//! ```
//!
//! Rules are independent; the violation list is their concatenation.

mod cross_reference;
mod error;
mod metrics;
pub mod rules;
mod validator;
mod violation;

pub use cross_reference::{
    components_match, link_component, reference_strength, CrossReference, ValidationStatus,
    COMPONENT_MATCH_THRESHOLD, VALID_REFERENCE_STRENGTH,
};
pub use error::{ConsistencyError, Result};
pub use metrics::{
    calculate_consistency_metrics, ConsistencyLevel, ConsistencyMetrics, CrossReferenceSummary, ViolationSummary,
};
pub use validator::{
    ConsistencyValidation, ConsistencyValidator, ValidationMetadata, ValidationReport, DEFAULT_CONSISTENCY_THRESHOLD,
};
pub use violation::{decode_violations, ConflictingValues, ConsistencyViolation, DecodedViolations, ViolationType};
