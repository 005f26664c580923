//! Regression tests: baseline metrics per fixture response.
//! Update baselines intentionally when scoring changes.
//!
//! NOTE: These tests protect against *accidental* score changes, not *incorrect* scores.
//! See tests/integration.rs for property-level correctness tests.

use std::path::Path;
use textgauge::{MetricsResult, TextQualityScorer};

const FIXTURES: &str = "test-fixtures/responses";

fn score_fixture(name: &str, prompt: &str) -> MetricsResult {
    let path = Path::new(FIXTURES).join(name);
    let text = std::fs::read_to_string(&path)
        .unwrap_or_else(|e| panic!("read {} failed: {}", path.display(), e));
    TextQualityScorer::new().score(&text, prompt)
}

macro_rules! regression {
    ($name:ident, $file:expr, $prompt:expr, [$c:expr, $r:expr, $k:expr, $s:expr], $overall:expr) => {
        #[test]
        fn $name() {
            let m = score_fixture($file, $prompt);
            assert_eq!(
                [m.coherence, m.readability, m.completeness, m.structure],
                [$c, $r, $k, $s],
                "{} sub-scores changed from baseline",
                $file
            );
            assert_eq!(m.overall, $overall, "{} overall changed from baseline", $file);
        }
    };
}

regression!(
    ownership,
    "ownership.md",
    "Explain ownership and borrowing in Rust",
    [70, 86, 82, 88],
    81.5
);
regression!(
    caching,
    "caching.md",
    "Explain how caching improves latency",
    [72, 86, 77, 68],
    75.83
);
regression!(
    list_only,
    "list_only.md",
    "List the steps to start a Rust project",
    [66, 93, 54, 64],
    69.17
);
regression!(
    terse,
    "terse.txt",
    "Describe how the deployment pipeline works",
    [67, 99, 33, 59],
    64.47
);
regression!(
    rambling,
    "rambling.txt",
    "Why are database queries slow?",
    [50, 52, 58, 57],
    54.02
);

#[test]
fn structured_answer_beats_rambling() {
    let good = score_fixture("ownership.md", "Explain ownership and borrowing in Rust");
    let bad = score_fixture("rambling.txt", "Explain ownership and borrowing in Rust");
    assert!(good.overall > bad.overall);
    assert!(good.structure > bad.structure);
}
