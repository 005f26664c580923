//! Scorer module - text quality scoring engine

pub mod engine;
pub mod metrics;
pub mod scoring;

pub use engine::{AggregateStats, ScoreReport, TextQualityScorer};
pub use metrics::SubScorer;
pub use scoring::{RawScores, ScoreCalculator};
