//! Edge case tests: degenerate inputs get fixed fallbacks and never panic.

use textgauge::{score, MetricsResult, TextQualityScorer};

const PROMPT: &str = "Explain Rust";

fn assert_metrics(m: MetricsResult, expected: (u8, u8, u8, u8, f64)) {
    assert_eq!(
        (m.coherence, m.readability, m.completeness, m.structure, m.overall),
        expected
    );
}

#[test]
fn empty_text_fallbacks() {
    assert_metrics(score("", "anything"), (30, 30, 20, 30, 27.5));
}

#[test]
fn nine_chars_is_still_degenerate() {
    assert_metrics(score("123456789", PROMPT), (30, 30, 20, 30, 27.5));
}

#[test]
fn degenerate_report_has_no_components() {
    let report = TextQualityScorer::new().explain("short", PROMPT);
    assert!(report.coherence.components.is_none());
    assert!(report.readability.components.is_none());
    assert!(report.completeness.components.is_none());
    assert!(report.structure.components.is_none());
}

#[test]
fn whitespace_only_text() {
    // Long enough to skip the fallback, but no sentences or words
    assert_metrics(
        score("              \n\n     ", PROMPT),
        (50, 50, 12, 53, 41.25),
    );
}

#[test]
fn punctuation_only_text() {
    assert_metrics(score("!!!???.....", PROMPT), (50, 50, 18, 64, 45.56));
}

#[test]
fn single_word_without_punctuation() {
    assert_metrics(score("aaaaaaaaaa", PROMPT), (50, 75, 17, 57, 49.54));
}

#[test]
fn very_long_word_clamps_components_at_zero() {
    let report = TextQualityScorer::new().explain("Supercalifragilisticexpialidocious", PROMPT);
    let r = report.readability.components.unwrap();
    assert_eq!(r.word_length, 0.0);
    assert_eq!(r.syllables, 0.0);
    assert_eq!(report.metrics.readability, 38);
}

#[test]
fn non_ascii_text_counts_chars() {
    assert_metrics(
        score(
            "Über größe straße. Naïve café résumé wurde geschrieben.",
            PROMPT,
        ),
        (67, 86, 45, 58, 63.96),
    );
}

#[test]
fn questions_only() {
    assert_metrics(
        score("What is Rust? Why use it? How does it work?", PROMPT),
        (70, 98, 61, 59, 71.95),
    );
}

#[test]
fn empty_prompt_uses_neutral_keyword_score() {
    let report = TextQualityScorer::new().explain(
        "However, the solution works well. Therefore, it is efficient.",
        "",
    );
    let c = report.completeness.components.unwrap();
    assert_eq!(c.keywords_total, 0);
    assert_eq!(c.keyword, 70.0);
}

#[test]
fn huge_input_stays_in_range() {
    let text = "word ".repeat(50_000);
    let m = score(&text, PROMPT);
    for v in [m.coherence, m.readability, m.completeness, m.structure] {
        assert!(v <= 100);
    }
    assert!((0.0..=100.0).contains(&m.overall));
}

#[test]
fn control_characters_do_not_panic() {
    let text = "\u{0}\u{1}\u{7f} text\r\n\r\n\tmore\u{200b} text.";
    let m = score(text, "\u{0} prompt");
    assert!((0.0..=100.0).contains(&m.overall));
}
