//! Static word lists shared by the scorers

/// Terms that signal a logical connection between sentences.
/// Multi-word entries are matched as whole phrases.
pub const TRANSITION_WORDS: &[&str] = &[
    "however",
    "therefore",
    "moreover",
    "furthermore",
    "additionally",
    "consequently",
    "thus",
    "hence",
    "meanwhile",
    "subsequently",
    "similarly",
    "likewise",
    "first",
    "second",
    "third",
    "finally",
    "in conclusion",
    "in summary",
    "for example",
    "for instance",
    "specifically",
    "in particular",
];

/// Common function words excluded from keyword coverage
pub const STOP_WORDS: &[&str] = &[
    "the", "a", "an", "and", "or", "but", "in", "on", "at", "to", "for", "of", "with", "by",
    "from", "as", "is", "are", "was", "were", "be", "been", "have", "has", "had", "do", "does",
    "did", "will", "would", "could", "should", "may", "might", "can", "this", "that", "these",
    "those", "what", "which", "who", "when", "where", "why", "how",
];

/// Case-insensitive stop word check
pub fn is_stop_word(word: &str) -> bool {
    let lower = word.to_lowercase();
    STOP_WORDS.contains(&lower.as_str())
}
