//! The four independent sub-scorers

pub mod coherence;
pub mod completeness;
pub mod readability;
pub mod structure;

pub use coherence::{CoherenceBreakdown, CoherenceComponents, CoherenceScorer};
pub use completeness::{CompletenessBreakdown, CompletenessComponents, CompletenessScorer};
pub use readability::{ReadabilityBreakdown, ReadabilityComponents, ReadabilityScorer};
pub use structure::{StructureBreakdown, StructureComponents, StructureScorer};

use crate::ScoreInput;

/// Trait for sub-scorers
pub trait SubScorer: Send + Sync {
    /// Name of the sub-score
    fn name(&self) -> &'static str;

    /// Raw (unrounded) score in [0, 100]
    fn score(&self, input: &ScoreInput<'_>) -> f64;
}

/// Clamp a combined score into [0, 100]
pub(crate) fn clamp_score(value: f64) -> f64 {
    value.clamp(0.0, 100.0)
}
