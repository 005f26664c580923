//! textgauge: heuristic quality scoring for generated text
//!
//! The core of this library is a deterministic, stateless scoring engine that
//! rates a generated response against the prompt that produced it. Around it
//! sit the experiment store, the scheduler that runs parameter sweeps, and the
//! reporters used by the CLI.

pub mod config;
pub mod experiment;
pub mod generation;
pub mod reporter;
pub mod scorer;
pub mod text;

use serde::{Deserialize, Serialize};

pub use scorer::{ScoreReport, TextQualityScorer};

/// Input to the scoring engine
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ScoreInput<'a> {
    /// Generated response text (may be empty)
    pub text: &'a str,
    /// Prompt the response was generated from
    pub prompt: &'a str,
}

impl<'a> ScoreInput<'a> {
    pub fn new(text: &'a str, prompt: &'a str) -> Self {
        Self { text, prompt }
    }
}

/// Quality metrics for one generated response
///
/// Sub-scores are rounded to integers independently; `overall` is the mean of
/// the unrounded sub-scores, rounded to two decimals.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct MetricsResult {
    /// Logical flow and topic consistency (0-100)
    pub coherence: u8,
    /// Ease of reading (0-100)
    pub readability: u8,
    /// How thoroughly the prompt was addressed (0-100)
    pub completeness: u8,
    /// Formatting, paragraphs and organization (0-100)
    pub structure: u8,
    /// Mean of the four sub-scores (0-100, two decimals)
    pub overall: f64,
}

impl MetricsResult {
    /// Letter grade for the overall score
    pub fn grade(&self) -> Grade {
        Grade::from_overall(self.overall)
    }
}

/// Letter grade
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum Grade {
    A,
    B,
    C,
    D,
    F,
}

impl Grade {
    pub fn from_score(score: u8) -> Self {
        match score {
            90..=100 => Grade::A,
            80..=89 => Grade::B,
            70..=79 => Grade::C,
            60..=69 => Grade::D,
            _ => Grade::F,
        }
    }

    /// Grade for a fractional overall score (truncates, so 89.99 is a B)
    pub fn from_overall(overall: f64) -> Self {
        let clamped = overall.clamp(0.0, 100.0);
        Self::from_score(clamped.floor() as u8)
    }
}

impl std::fmt::Display for Grade {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Grade::A => write!(f, "A"),
            Grade::B => write!(f, "B"),
            Grade::C => write!(f, "C"),
            Grade::D => write!(f, "D"),
            Grade::F => write!(f, "F"),
        }
    }
}

/// A scored text together with where it came from
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ScoredText {
    /// File path, or `<stdin>`
    pub source: String,
    pub report: ScoreReport,
}

impl ScoredText {
    pub fn new(source: impl Into<String>, report: ScoreReport) -> Self {
        Self {
            source: source.into(),
            report,
        }
    }

    pub fn metrics(&self) -> &MetricsResult {
        &self.report.metrics
    }
}

/// Public API: score a generated response against its prompt.
///
/// Never fails; degenerate input gets fixed fallback scores.
pub fn score(text: &str, prompt: &str) -> MetricsResult {
    TextQualityScorer::new().score(text, prompt)
}
