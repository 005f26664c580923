//! Coherence - logical flow and topic consistency
//!
//! Combines transition-word density, sentence-length consistency and a
//! penalty for a single word dominating the text.

use super::{clamp_score, SubScorer};
use crate::text::{count_transitions, is_degenerate, split_sentences, split_words, strip_non_word};
use crate::ScoreInput;
use serde::{Deserialize, Serialize};
use std::collections::HashMap;

const DEGENERATE_SCORE: f64 = 30.0;
const SINGLE_SENTENCE_SCORE: f64 = 50.0;

const TRANSITION_WEIGHT: f64 = 0.4;
const CONSISTENCY_WEIGHT: f64 = 0.3;
const REPETITION_WEIGHT: f64 = 0.3;

/// Only words longer than this count towards repetition
const REPETITION_MIN_LEN: usize = 3;

/// Component scores behind a coherence rating
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CoherenceComponents {
    pub sentence_count: usize,
    pub transition_count: usize,
    pub transition: f64,
    pub consistency: f64,
    pub repetition: f64,
}

/// Coherence score with its components (absent for degenerate input)
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CoherenceBreakdown {
    pub score: f64,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub components: Option<CoherenceComponents>,
}

impl CoherenceBreakdown {
    fn fallback(score: f64) -> Self {
        Self {
            score,
            components: None,
        }
    }
}

/// Scorer for coherence
pub struct CoherenceScorer;

impl CoherenceScorer {
    pub fn new() -> Self {
        Self
    }

    pub fn analyze(&self, text: &str) -> CoherenceBreakdown {
        if is_degenerate(text) {
            return CoherenceBreakdown::fallback(DEGENERATE_SCORE);
        }

        let sentences = split_sentences(text);
        if sentences.len() < 2 {
            return CoherenceBreakdown::fallback(SINGLE_SENTENCE_SCORE);
        }

        let transition_count = count_transitions(text);
        let transition = Self::transition_score(transition_count, sentences.len());
        let consistency = Self::consistency_score(&sentences);
        let repetition = Self::repetition_score(text);

        let score = clamp_score(
            transition * TRANSITION_WEIGHT
                + consistency * CONSISTENCY_WEIGHT
                + repetition * REPETITION_WEIGHT,
        );

        CoherenceBreakdown {
            score,
            components: Some(CoherenceComponents {
                sentence_count: sentences.len(),
                transition_count,
                transition,
                consistency,
                repetition,
            }),
        }
    }

    /// Transitions per sentence, scaled so that none still scores 40
    pub fn transition_score(transitions: usize, sentences: usize) -> f64 {
        if sentences == 0 {
            return 40.0;
        }
        ((transitions as f64 / sentences as f64) * 30.0 + 40.0).min(100.0)
    }

    /// Penalizes sentence-length variance relative to the mean length
    pub fn consistency_score(sentences: &[&str]) -> f64 {
        if sentences.is_empty() {
            return 100.0;
        }
        let lengths: Vec<usize> = sentences.iter().map(|s| split_words(s).len()).collect();
        let n = lengths.len() as f64;
        let mean = lengths.iter().sum::<usize>() as f64 / n;
        if mean == 0.0 {
            return 100.0;
        }
        let variance = lengths
            .iter()
            .map(|&len| {
                let d = len as f64 - mean;
                d * d
            })
            .sum::<f64>()
            / n;
        (100.0 - (variance / mean) * 20.0).max(0.0)
    }

    /// Penalizes the most frequent long word by its share of all words
    pub fn repetition_score(text: &str) -> f64 {
        let lower = text.to_lowercase();
        let words = split_words(&lower);
        if words.is_empty() {
            return 100.0;
        }

        let mut freq: HashMap<String, usize> = HashMap::new();
        for word in &words {
            let clean = strip_non_word(word);
            if clean.chars().count() > REPETITION_MIN_LEN {
                *freq.entry(clean).or_insert(0) += 1;
            }
        }

        let Some(max_repetition) = freq.values().copied().max() else {
            return 100.0;
        };
        (100.0 - (max_repetition as f64 / words.len() as f64) * 200.0).max(0.0)
    }
}

impl Default for CoherenceScorer {
    fn default() -> Self {
        Self::new()
    }
}

impl SubScorer for CoherenceScorer {
    fn name(&self) -> &'static str {
        "coherence"
    }

    fn score(&self, input: &ScoreInput<'_>) -> f64 {
        self.analyze(input.text).score
    }
}
