//! Tokenization helpers shared by all scorers.
//!
//! None of these functions can fail: empty input yields empty sequences,
//! `false`, or zero.

pub mod lexicon;

pub use lexicon::{is_stop_word, STOP_WORDS, TRANSITION_WORDS};

use regex::Regex;
use std::sync::OnceLock;

/// Texts shorter than this many characters are too short to analyze
pub const MIN_TEXT_CHARS: usize = 10;

/// Compile a pattern that is known to be valid
pub(crate) fn compile(pattern: &str) -> Regex {
    Regex::new(pattern).expect("static pattern must compile")
}

fn paragraph_break() -> &'static Regex {
    static RE: OnceLock<Regex> = OnceLock::new();
    RE.get_or_init(|| compile(r"\n\s*\n"))
}

fn list_marker() -> &'static Regex {
    static RE: OnceLock<Regex> = OnceLock::new();
    RE.get_or_init(|| compile(r"(?m)^\s*[-*•]\s|^\d+\.\s"))
}

fn transition_patterns() -> &'static [Regex] {
    static RE: OnceLock<Vec<Regex>> = OnceLock::new();
    RE.get_or_init(|| {
        TRANSITION_WORDS
            .iter()
            .map(|w| compile(&format!(r"(?i)\b{}\b", regex::escape(w))))
            .collect()
    })
}

/// Number of characters (not bytes) in `text`
pub fn char_len(text: &str) -> usize {
    text.chars().count()
}

/// True when the text is empty or shorter than [`MIN_TEXT_CHARS`]
pub fn is_degenerate(text: &str) -> bool {
    char_len(text) < MIN_TEXT_CHARS
}

/// Split on runs of `.`, `!` and `?`, dropping blank fragments
pub fn split_sentences(text: &str) -> Vec<&str> {
    text.split(['.', '!', '?'])
        .filter(|s| !s.trim().is_empty())
        .collect()
}

/// Split on whitespace runs
pub fn split_words(text: &str) -> Vec<&str> {
    text.split_whitespace().collect()
}

/// Remove every character that is not alphanumeric or `_`
pub fn strip_non_word(word: &str) -> String {
    word.chars()
        .filter(|c| c.is_alphanumeric() || *c == '_')
        .collect()
}

/// Blank-line delimited paragraphs, blank ones dropped
pub fn split_paragraphs(text: &str) -> Vec<&str> {
    paragraph_break()
        .split(text)
        .filter(|p| !p.trim().is_empty())
        .collect()
}

/// Line-leading `-`, `*`, `•` bullets or `N.` numbering
pub fn has_list_marker(text: &str) -> bool {
    list_marker().is_match(text)
}

/// Whole-word, case-insensitive occurrences of every transition term
pub fn count_transitions(text: &str) -> usize {
    transition_patterns()
        .iter()
        .map(|re| re.find_iter(text).count())
        .sum()
}

/// First `n` characters of `text`
pub fn head_chars(text: &str, n: usize) -> &str {
    match text.char_indices().nth(n) {
        Some((idx, _)) => &text[..idx],
        None => text,
    }
}

/// Last `n` characters of `text` (the whole text when it is shorter)
pub fn tail_chars(text: &str, n: usize) -> &str {
    let len = char_len(text);
    if len <= n {
        return text;
    }
    match text.char_indices().nth(len - n) {
        Some((idx, _)) => &text[idx..],
        None => text,
    }
}
