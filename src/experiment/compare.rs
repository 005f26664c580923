//! Side-by-side comparison of an experiment's responses

use super::ExperimentResponse;
use serde::Serialize;

/// The standout responses of one experiment
#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct Comparison<'a> {
    pub best_overall: &'a ExperimentResponse,
    pub most_readable: &'a ExperimentResponse,
    pub most_coherent: &'a ExperimentResponse,
}

impl<'a> Comparison<'a> {
    /// Pick the standouts. Ties go to the earliest response; `None` when empty.
    pub fn from_responses(responses: &'a [ExperimentResponse]) -> Option<Self> {
        Some(Self {
            best_overall: first_max_by(responses, |r| r.metrics.overall)?,
            most_readable: first_max_by(responses, |r| f64::from(r.metrics.readability))?,
            most_coherent: first_max_by(responses, |r| f64::from(r.metrics.coherence))?,
        })
    }

    /// Gap between the best and worst overall score
    pub fn overall_spread(responses: &[ExperimentResponse]) -> f64 {
        if responses.is_empty() {
            return 0.0;
        }
        let scores = responses.iter().map(|r| r.metrics.overall);
        let max = scores.clone().fold(f64::NEG_INFINITY, f64::max);
        let min = scores.fold(f64::INFINITY, f64::min);
        max - min
    }
}

/// `Iterator::max_by` keeps the last maximum; this keeps the first.
fn first_max_by<T>(items: &[T], key: impl Fn(&T) -> f64) -> Option<&T> {
    let mut best: Option<(&T, f64)> = None;
    for item in items {
        let value = key(item);
        match best {
            Some((_, best_value)) if value <= best_value => {}
            _ => best = Some((item, value)),
        }
    }
    best.map(|(item, _)| item)
}
