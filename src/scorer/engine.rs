//! Scoring engine - runs the four sub-scorers and aggregates them

use super::metrics::{
    CoherenceBreakdown, CoherenceScorer, CompletenessBreakdown, CompletenessScorer,
    ReadabilityBreakdown, ReadabilityScorer, StructureBreakdown, StructureScorer, SubScorer,
};
use super::scoring::{RawScores, ScoreCalculator};
use crate::{Grade, MetricsResult, ScoreInput, ScoredText};
use serde::{Deserialize, Serialize};

/// Full breakdown of one scoring run: every component plus the final metrics
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ScoreReport {
    pub metrics: MetricsResult,
    pub raw: RawScores,
    pub coherence: CoherenceBreakdown,
    pub readability: ReadabilityBreakdown,
    pub completeness: CompletenessBreakdown,
    pub structure: StructureBreakdown,
}

/// Stateless text quality scorer.
///
/// Holds no mutable state; one instance can be shared across threads.
pub struct TextQualityScorer {
    coherence: CoherenceScorer,
    readability: ReadabilityScorer,
    completeness: CompletenessScorer,
    structure: StructureScorer,
}

impl TextQualityScorer {
    /// Create a new scorer
    pub fn new() -> Self {
        Self {
            coherence: CoherenceScorer::new(),
            readability: ReadabilityScorer::new(),
            completeness: CompletenessScorer::new(),
            structure: StructureScorer::new(),
        }
    }

    /// The sub-scorers in output order
    pub fn sub_scorers(&self) -> [&dyn SubScorer; 4] {
        [
            &self.coherence,
            &self.readability,
            &self.completeness,
            &self.structure,
        ]
    }

    /// Unrounded sub-scores for `input`
    pub fn raw_scores(&self, input: &ScoreInput<'_>) -> RawScores {
        let [coherence, readability, completeness, structure] =
            self.sub_scorers().map(|s| s.score(input));
        RawScores {
            coherence,
            readability,
            completeness,
            structure,
        }
    }

    /// Score a response against its prompt
    pub fn score(&self, text: &str, prompt: &str) -> MetricsResult {
        let raw = self.raw_scores(&ScoreInput::new(text, prompt));
        ScoreCalculator::aggregate(&raw)
    }

    /// Score and keep every intermediate component
    pub fn explain(&self, text: &str, prompt: &str) -> ScoreReport {
        let coherence = self.coherence.analyze(text);
        let readability = self.readability.analyze(text);
        let completeness = self.completeness.analyze(text, prompt);
        let structure = self.structure.analyze(text);

        let raw = RawScores {
            coherence: coherence.score,
            readability: readability.score,
            completeness: completeness.score,
            structure: structure.score,
        };

        ScoreReport {
            metrics: ScoreCalculator::aggregate(&raw),
            raw,
            coherence,
            readability,
            completeness,
            structure,
        }
    }

    /// Get aggregate stats from multiple results
    pub fn aggregate_stats(results: &[ScoredText]) -> AggregateStats {
        if results.is_empty() {
            return AggregateStats::default();
        }

        let total: f64 = results.iter().map(|r| r.report.metrics.overall).sum();
        let average_overall = ScoreCalculator::round2(total / results.len() as f64);

        let lowest = results.iter().min_by(|a, b| {
            a.report
                .metrics
                .overall
                .total_cmp(&b.report.metrics.overall)
        });

        AggregateStats {
            files_scored: results.len(),
            average_overall,
            lowest_source: lowest.map(|r| r.source.clone()),
            lowest_overall: lowest.map(|r| r.report.metrics.overall),
        }
    }
}

/// Aggregate statistics from multiple scored texts
#[derive(Debug, Default, Clone, PartialEq)]
pub struct AggregateStats {
    /// Number of texts scored
    pub files_scored: usize,
    /// Mean overall score, two decimals
    pub average_overall: f64,
    /// Source of the weakest text
    pub lowest_source: Option<String>,
    pub lowest_overall: Option<f64>,
}

impl AggregateStats {
    pub fn average_grade(&self) -> Grade {
        Grade::from_overall(self.average_overall)
    }
}

impl Default for TextQualityScorer {
    fn default() -> Self {
        Self::new()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    const EXAMPLE: &str = "However, the solution works well. Therefore, it is efficient. For example, consider this case in detail.";

    #[test]
    fn empty_text_gets_fallbacks() {
        let m = TextQualityScorer::new().score("", "anything");
        assert_eq!(m.coherence, 30);
        assert_eq!(m.readability, 30);
        assert_eq!(m.completeness, 20);
        assert_eq!(m.structure, 30);
        assert_eq!(m.overall, 27.5);
    }

    #[test]
    fn example_scores() {
        let m = TextQualityScorer::new().score(EXAMPLE, "Explain the solution efficiency");
        assert!(m.coherence >= 60);
        assert_eq!(m.coherence, 83);
        assert_eq!(m.readability, 89);
        assert_eq!(m.completeness, 55);
        assert_eq!(m.structure, 59);
        assert_eq!(m.overall, 71.28);
    }

    #[test]
    fn explain_matches_score() {
        let scorer = TextQualityScorer::new();
        let report = scorer.explain(EXAMPLE, "Explain the solution efficiency");
        assert_eq!(report.metrics, scorer.score(EXAMPLE, "Explain the solution efficiency"));
        let k = report.completeness.components.unwrap();
        assert_eq!(k.keywords_total, 3);
        assert_eq!(k.keywords_covered, 1);
    }

    #[test]
    fn sub_scorer_names_in_order() {
        let scorer = TextQualityScorer::new();
        let names: Vec<_> = scorer.sub_scorers().iter().map(|s| s.name()).collect();
        assert_eq!(names, vec!["coherence", "readability", "completeness", "structure"]);
    }

    #[test]
    fn aggregate_stats_average_and_lowest() {
        let scorer = TextQualityScorer::new();
        let results = vec![
            ScoredText::new("good.md", scorer.explain(EXAMPLE, "Explain the solution efficiency")),
            ScoredText::new("empty.txt", scorer.explain("", "anything")),
        ];
        let stats = TextQualityScorer::aggregate_stats(&results);
        assert_eq!(stats.files_scored, 2);
        assert_eq!(stats.average_overall, 49.39);
        assert_eq!(stats.lowest_source.as_deref(), Some("empty.txt"));
        assert_eq!(stats.lowest_overall, Some(27.5));
        assert_eq!(stats.average_grade(), Grade::F);

        assert_eq!(TextQualityScorer::aggregate_stats(&[]), AggregateStats::default());
    }

    #[test]
    fn scorer_is_shareable_across_threads() {
        fn assert_send_sync<T: Send + Sync>() {}
        assert_send_sync::<TextQualityScorer>();
    }
}
