//! JSON reporter for machine-readable output

use crate::experiment::{Comparison, Experiment};
use crate::scorer::AggregateStats;
use crate::{MetricsResult, ScoreReport, ScoredText};
use serde::Serialize;

/// Reporter for JSON output
pub struct JsonReporter {
    /// Whether to pretty-print JSON
    pretty: bool,
    /// Whether to include the per-component breakdown
    breakdown: bool,
}

impl JsonReporter {
    /// Create a new JSON reporter
    pub fn new() -> Self {
        Self {
            pretty: false,
            breakdown: false,
        }
    }

    /// Enable pretty-printing
    pub fn pretty(mut self) -> Self {
        self.pretty = true;
        self
    }

    /// Include every sub-scorer component
    pub fn with_breakdown(mut self) -> Self {
        self.breakdown = true;
        self
    }

    /// Report a single scored text as JSON
    pub fn report(&self, result: &ScoredText) -> String {
        self.render(&self.entry(result), "{}")
    }

    /// Report multiple results as JSON array
    pub fn report_many(&self, results: &[ScoredText]) -> String {
        let entries: Vec<JsonEntry<'_>> = results.iter().map(|r| self.entry(r)).collect();
        self.render(&entries, "[]")
    }

    /// Report with summary
    pub fn report_with_summary(&self, results: &[ScoredText], stats: &AggregateStats) -> String {
        let output = JsonOutput {
            results: results.iter().map(|r| self.entry(r)).collect(),
            summary: JsonSummary {
                files_scored: stats.files_scored,
                average_overall: stats.average_overall,
                average_grade: stats.average_grade().to_string(),
                lowest_source: stats.lowest_source.as_deref(),
            },
        };
        self.render(&output, "{}")
    }

    /// An experiment plus its comparison picks
    pub fn report_experiment(&self, experiment: &Experiment) -> String {
        let output = JsonExperiment {
            experiment,
            comparison: experiment.comparison(),
        };
        self.render(&output, "{}")
    }

    pub fn report_experiment_list(&self, experiments: &[Experiment]) -> String {
        self.render(&experiments, "[]")
    }

    fn entry<'a>(&self, result: &'a ScoredText) -> JsonEntry<'a> {
        let metrics = result.metrics();
        JsonEntry {
            source: &result.source,
            metrics,
            grade: metrics.grade().to_string(),
            breakdown: self.breakdown.then_some(&result.report),
        }
    }

    fn render<T: Serialize + ?Sized>(&self, value: &T, fallback: &str) -> String {
        let rendered = if self.pretty {
            serde_json::to_string_pretty(value)
        } else {
            serde_json::to_string(value)
        };
        rendered.unwrap_or_else(|_| fallback.to_string())
    }
}

impl Default for JsonReporter {
    fn default() -> Self {
        Self::new()
    }
}

#[derive(Serialize)]
#[serde(rename_all = "camelCase")]
struct JsonEntry<'a> {
    source: &'a str,
    metrics: &'a MetricsResult,
    grade: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    breakdown: Option<&'a ScoreReport>,
}

#[derive(Serialize)]
#[serde(rename_all = "camelCase")]
struct JsonOutput<'a> {
    results: Vec<JsonEntry<'a>>,
    summary: JsonSummary<'a>,
}

#[derive(Serialize)]
#[serde(rename_all = "camelCase")]
struct JsonSummary<'a> {
    files_scored: usize,
    average_overall: f64,
    average_grade: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    lowest_source: Option<&'a str>,
}

#[derive(Serialize)]
#[serde(rename_all = "camelCase")]
struct JsonExperiment<'a> {
    #[serde(flatten)]
    experiment: &'a Experiment,
    #[serde(skip_serializing_if = "Option::is_none")]
    comparison: Option<Comparison<'a>>,
}
