//! Structure - paragraphs, formatting, lists, sentence variety and organization

use super::{clamp_score, SubScorer};
use crate::text::{
    compile, has_list_marker, head_chars, is_degenerate, split_paragraphs, tail_chars,
};
use crate::ScoreInput;
use regex::Regex;
use serde::{Deserialize, Serialize};
use std::sync::OnceLock;

const DEGENERATE_SCORE: f64 = 30.0;
/// Window (in characters) searched for intro and conclusion markers
const ORGANIZATION_WINDOW: usize = 200;

const PARAGRAPH_WEIGHT: f64 = 0.25;
const FORMATTING_WEIGHT: f64 = 0.25;
const LIST_WEIGHT: f64 = 0.15;
const VARIETY_WEIGHT: f64 = 0.15;
const ORGANIZATION_WEIGHT: f64 = 0.2;

fn heading_pattern() -> &'static Regex {
    static RE: OnceLock<Regex> = OnceLock::new();
    RE.get_or_init(|| compile(r"(?m)^#{1,6}\s|^\*\*.*\*\*|^__.*__"))
}

fn bold_pattern() -> &'static Regex {
    static RE: OnceLock<Regex> = OnceLock::new();
    RE.get_or_init(|| compile(r"\*\*.*?\*\*|__.*?__"))
}

fn intro_pattern() -> &'static Regex {
    static RE: OnceLock<Regex> = OnceLock::new();
    RE.get_or_init(|| compile(r"(?i)introduction|overview|summary|in summary"))
}

fn conclusion_pattern() -> &'static Regex {
    static RE: OnceLock<Regex> = OnceLock::new();
    RE.get_or_init(|| compile(r"(?i)conclusion|in conclusion|to summarize|in summary"))
}

#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct StructureComponents {
    pub paragraph_count: usize,
    pub has_formatting: bool,
    pub has_list: bool,
    pub has_intro: bool,
    pub has_conclusion: bool,
    pub paragraph: f64,
    pub formatting: f64,
    pub list: f64,
    pub variety: f64,
    pub organization: f64,
}

#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct StructureBreakdown {
    pub score: f64,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub components: Option<StructureComponents>,
}

/// Scorer for structure
pub struct StructureScorer;

impl StructureScorer {
    pub fn new() -> Self {
        Self
    }

    pub fn analyze(&self, text: &str) -> StructureBreakdown {
        if is_degenerate(text) {
            return StructureBreakdown {
                score: DEGENERATE_SCORE,
                components: None,
            };
        }

        let paragraph_count = split_paragraphs(text).len();
        let paragraph = (paragraph_count as f64 * 15.0 + 30.0).min(100.0);

        let has_formatting = has_formatting(text);
        let formatting = if has_formatting { 90.0 } else { 60.0 };

        let has_list = has_list_marker(text);
        let list = if has_list { 85.0 } else { 60.0 };

        let variety = Self::variety_score(text);

        let has_intro = intro_pattern().is_match(head_chars(text, ORGANIZATION_WINDOW));
        let has_conclusion = conclusion_pattern().is_match(tail_chars(text, ORGANIZATION_WINDOW));
        let organization = 70.0
            + if has_intro { 10.0 } else { 0.0 }
            + if has_conclusion { 10.0 } else { 0.0 };

        let score = clamp_score(
            paragraph * PARAGRAPH_WEIGHT
                + formatting * FORMATTING_WEIGHT
                + list * LIST_WEIGHT
                + variety * VARIETY_WEIGHT
                + organization * ORGANIZATION_WEIGHT,
        );

        StructureBreakdown {
            score,
            components: Some(StructureComponents {
                paragraph_count,
                has_formatting,
                has_list,
                has_intro,
                has_conclusion,
                paragraph,
                formatting,
                list,
                variety,
                organization,
            }),
        }
    }

    /// Rewards questions, exclamations and a healthy number of statements
    pub fn variety_score(text: &str) -> f64 {
        let declarative = text.matches('.').count();
        let has_question = text.contains('?');
        let has_exclaim = text.contains('!');

        let statements = if declarative > 3 {
            25.0
        } else {
            declarative as f64 * 5.0
        };
        (50.0
            + if has_question { 15.0 } else { 0.0 }
            + if has_exclaim { 10.0 } else { 0.0 }
            + statements)
            .min(100.0)
    }
}

/// Markdown headers, or bold markers at line start or anywhere
pub fn has_formatting(text: &str) -> bool {
    heading_pattern().is_match(text) || bold_pattern().is_match(text)
}

impl Default for StructureScorer {
    fn default() -> Self {
        Self::new()
    }
}

impl SubScorer for StructureScorer {
    fn name(&self) -> &'static str {
        "structure"
    }

    fn score(&self, input: &ScoreInput<'_>) -> f64 {
        self.analyze(input.text).score
    }
}
