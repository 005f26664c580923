//! Readability - Flesch-like ease of reading.
//! Shorter sentences, shorter words and fewer syllables read more easily.

use super::{clamp_score, SubScorer};
use crate::text::{is_degenerate, split_sentences, split_words, strip_non_word};
use crate::ScoreInput;
use serde::{Deserialize, Serialize};

const DEGENERATE_SCORE: f64 = 30.0;
const EMPTY_SCORE: f64 = 50.0;

const SENTENCE_LENGTH_WEIGHT: f64 = 0.3;
const WORD_LENGTH_WEIGHT: f64 = 0.3;
const SYLLABLE_WEIGHT: f64 = 0.2;
const PUNCTUATION_WEIGHT: f64 = 0.2;

const PUNCTUATION: &[char] = &['.', ',', ';', ':', '!', '?'];

/// Component scores behind a readability rating.
/// Length components are not capped individually and may exceed 100.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ReadabilityComponents {
    pub avg_sentence_length: f64,
    pub avg_word_length: f64,
    pub avg_syllables: f64,
    pub sentence_length: f64,
    pub word_length: f64,
    pub syllables: f64,
    pub punctuation: f64,
}

#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ReadabilityBreakdown {
    pub score: f64,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub components: Option<ReadabilityComponents>,
}

/// Scorer for readability
pub struct ReadabilityScorer;

impl ReadabilityScorer {
    pub fn new() -> Self {
        Self
    }

    pub fn analyze(&self, text: &str) -> ReadabilityBreakdown {
        if is_degenerate(text) {
            return ReadabilityBreakdown {
                score: DEGENERATE_SCORE,
                components: None,
            };
        }

        let sentences = split_sentences(text);
        let words = split_words(text);
        if sentences.is_empty() || words.is_empty() {
            return ReadabilityBreakdown {
                score: EMPTY_SCORE,
                components: None,
            };
        }

        let word_count = words.len() as f64;
        let sentence_count = sentences.len() as f64;

        let avg_sentence_length = word_count / sentence_count;
        let sentence_length = (100.0 - (avg_sentence_length - 15.0) * 2.0).max(0.0);

        let letters: usize = words
            .iter()
            .map(|w| strip_non_word(w).chars().count())
            .sum();
        let avg_word_length = letters as f64 / word_count;
        let word_length = (100.0 - (avg_word_length - 4.5) * 10.0).max(0.0);

        let syllable_total: usize = words.iter().map(|w| count_syllables(w)).sum();
        let avg_syllables = syllable_total as f64 / word_count;
        let syllables = (100.0 - (avg_syllables - 1.5) * 30.0).max(0.0);

        let punctuation_count = text.chars().filter(|c| PUNCTUATION.contains(c)).count();
        let punctuation = ((punctuation_count as f64 / sentence_count) * 20.0).min(100.0);

        let score = clamp_score(
            sentence_length * SENTENCE_LENGTH_WEIGHT
                + word_length * WORD_LENGTH_WEIGHT
                + syllables * SYLLABLE_WEIGHT
                + punctuation * PUNCTUATION_WEIGHT,
        );

        ReadabilityBreakdown {
            score,
            components: Some(ReadabilityComponents {
                avg_sentence_length,
                avg_word_length,
                avg_syllables,
                sentence_length,
                word_length,
                syllables,
                punctuation,
            }),
        }
    }
}

/// Approximate syllables: short words count as one, longer words count
/// their vowel groups (`y` included). A long word with no vowels counts zero.
pub fn count_syllables(word: &str) -> usize {
    let clean = strip_non_word(&word.to_lowercase());
    if clean.chars().count() <= 3 {
        return 1;
    }

    let mut groups = 0;
    let mut in_group = false;
    for c in clean.chars() {
        let vowel = matches!(c, 'a' | 'e' | 'i' | 'o' | 'u' | 'y');
        if vowel && !in_group {
            groups += 1;
        }
        in_group = vowel;
    }
    groups
}

impl Default for ReadabilityScorer {
    fn default() -> Self {
        Self::new()
    }
}

impl SubScorer for ReadabilityScorer {
    fn name(&self) -> &'static str {
        "readability"
    }

    fn score(&self, input: &ScoreInput<'_>) -> f64 {
        self.analyze(input.text).score
    }
}
