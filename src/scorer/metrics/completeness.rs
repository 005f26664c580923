//! Completeness - how thoroughly the prompt was addressed
//!
//! Based on response length relative to the prompt, coverage of the prompt's
//! keywords, and content depth (paragraphs, lists, questions, explanations).

use super::{clamp_score, SubScorer};
use crate::text::{
    compile, has_list_marker, is_degenerate, is_stop_word, split_paragraphs, split_words,
    strip_non_word,
};
use crate::ScoreInput;
use regex::Regex;
use serde::{Deserialize, Serialize};
use std::sync::OnceLock;

const DEGENERATE_SCORE: f64 = 20.0;
/// Keyword score used when the prompt has no qualifying keywords
const NO_KEYWORDS_SCORE: f64 = 70.0;
/// Keywords must be longer than this
const KEYWORD_MIN_LEN: usize = 3;

const LENGTH_WEIGHT: f64 = 0.4;
const KEYWORD_WEIGHT: f64 = 0.3;
const DEPTH_WEIGHT: f64 = 0.3;

fn explanation_pattern() -> &'static Regex {
    static RE: OnceLock<Regex> = OnceLock::new();
    RE.get_or_init(|| compile(r"(?i)because|since|due to|as a result"))
}

#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CompletenessComponents {
    pub length_ratio: f64,
    pub keywords_total: usize,
    pub keywords_covered: usize,
    pub paragraph_count: usize,
    pub explanation_count: usize,
    pub length: f64,
    pub keyword: f64,
    pub depth: f64,
}

#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CompletenessBreakdown {
    pub score: f64,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub components: Option<CompletenessComponents>,
}

/// Scorer for completeness
pub struct CompletenessScorer;

impl CompletenessScorer {
    pub fn new() -> Self {
        Self
    }

    pub fn analyze(&self, text: &str, prompt: &str) -> CompletenessBreakdown {
        if is_degenerate(text) {
            return CompletenessBreakdown {
                score: DEGENERATE_SCORE,
                components: None,
            };
        }

        let text_words = split_words(text).len();
        let prompt_words = split_words(prompt).len().max(1);
        let length_ratio = text_words as f64 / prompt_words as f64;
        let length = Self::length_score(length_ratio);

        let keywords = extract_keywords(prompt);
        let text_lower = text.to_lowercase();
        let keywords_covered = keywords
            .iter()
            .filter(|k| text_lower.contains(k.as_str()))
            .count();
        let keyword = if keywords.is_empty() {
            NO_KEYWORDS_SCORE
        } else {
            (keywords_covered as f64 / keywords.len() as f64) * 100.0
        };

        let paragraph_count = split_paragraphs(text).len();
        let explanation_count = explanation_pattern().find_iter(text).count();
        let depth = Self::depth_score(
            paragraph_count,
            has_list_marker(text),
            text.contains('?'),
            explanation_count,
        );

        let score =
            clamp_score(length * LENGTH_WEIGHT + keyword * KEYWORD_WEIGHT + depth * DEPTH_WEIGHT);

        CompletenessBreakdown {
            score,
            components: Some(CompletenessComponents {
                length_ratio,
                keywords_total: keywords.len(),
                keywords_covered,
                paragraph_count,
                explanation_count,
                length,
                keyword,
                depth,
            }),
        }
    }

    /// Good responses are 2-15x longer than the prompt.
    /// Very long responses lose 2 points per unit of ratio above 15, unbounded.
    pub fn length_score(ratio: f64) -> f64 {
        if ratio < 1.0 {
            30.0
        } else if ratio < 2.0 {
            50.0 + (ratio - 1.0) * 20.0
        } else if ratio > 15.0 {
            100.0 - (ratio - 15.0) * 2.0
        } else {
            100.0
        }
    }

    pub fn depth_score(
        paragraphs: usize,
        has_list: bool,
        has_question: bool,
        explanations: usize,
    ) -> f64 {
        let raw = paragraphs as f64 * 15.0
            + if has_list { 10.0 } else { 0.0 }
            + if has_question { 5.0 } else { 0.0 }
            + (explanations as f64 * 5.0).min(20.0);
        raw.min(100.0)
    }
}

/// Important prompt words: lowercased, stripped, longer than three
/// characters and not stop words. Duplicates are kept.
pub fn extract_keywords(prompt: &str) -> Vec<String> {
    prompt
        .to_lowercase()
        .split_whitespace()
        .map(strip_non_word)
        .filter(|w| w.chars().count() > KEYWORD_MIN_LEN && !is_stop_word(w))
        .collect()
}

impl Default for CompletenessScorer {
    fn default() -> Self {
        Self::new()
    }
}

impl SubScorer for CompletenessScorer {
    fn name(&self) -> &'static str {
        "completeness"
    }

    fn score(&self, input: &ScoreInput<'_>) -> f64 {
        self.analyze(input.text, input.prompt).score
    }
}
