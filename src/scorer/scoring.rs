//! Aggregation of raw sub-scores into a `MetricsResult`

use crate::{Grade, MetricsResult};
use serde::{Deserialize, Serialize};

/// Sub-scores before rounding
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct RawScores {
    pub coherence: f64,
    pub readability: f64,
    pub completeness: f64,
    pub structure: f64,
}

impl RawScores {
    /// Unweighted mean of the four raw sub-scores
    pub fn mean(&self) -> f64 {
        (self.coherence + self.readability + self.completeness + self.structure) / 4.0
    }
}

/// Sub-scores below this get a recommendation
const RECOMMENDATION_THRESHOLD: u8 = 60;

/// Calculator for aggregate scores
pub struct ScoreCalculator;

impl ScoreCalculator {
    /// Build the output record. `overall` is averaged from the unrounded
    /// sub-scores; each field is rounded independently afterwards.
    pub fn aggregate(raw: &RawScores) -> MetricsResult {
        MetricsResult {
            coherence: Self::round_score(raw.coherence),
            readability: Self::round_score(raw.readability),
            completeness: Self::round_score(raw.completeness),
            structure: Self::round_score(raw.structure),
            overall: Self::round2(raw.mean().clamp(0.0, 100.0)),
        }
    }

    /// Round to the nearest integer in [0, 100]; NaN maps to 0
    pub fn round_score(value: f64) -> u8 {
        if value.is_nan() {
            return 0;
        }
        value.clamp(0.0, 100.0).round() as u8
    }

    /// Round to two decimal places
    pub fn round2(value: f64) -> f64 {
        (value * 100.0).round() / 100.0
    }

    /// Get a description of the grade
    pub fn grade_description(grade: Grade) -> &'static str {
        match grade {
            Grade::A => "Excellent - clear, complete and well organized",
            Grade::B => "Good - solid response with room for polish",
            Grade::C => "Fair - addresses the prompt but needs strengthening",
            Grade::D => "Poor - significant quality problems",
            Grade::F => "Failing - response is missing, very short or unusable",
        }
    }

    /// Get recommendations based on the sub-scores
    pub fn recommendations(metrics: &MetricsResult) -> Vec<String> {
        let mut recs = Vec::new();

        if metrics.coherence < RECOMMENDATION_THRESHOLD {
            recs.push(
                "Connect ideas with transitions (however, therefore, for example) and keep sentence lengths even"
                    .to_string(),
            );
        }

        if metrics.readability < RECOMMENDATION_THRESHOLD {
            recs.push("Use shorter sentences and simpler words".to_string());
        }

        if metrics.completeness < RECOMMENDATION_THRESHOLD {
            recs.push(
                "Address every keyword in the prompt and explain the reasoning (because, as a result)"
                    .to_string(),
            );
        }

        if metrics.structure < RECOMMENDATION_THRESHOLD {
            recs.push("Break the answer into paragraphs, headings or lists".to_string());
        }

        if recs.is_empty() {
            recs.push("Response is in good shape across all metrics.".to_string());
        }

        recs
    }
}
