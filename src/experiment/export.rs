//! JSON export of a finished experiment

use super::{Comparison, Experiment};
use crate::generation::GenerationParams;
use crate::MetricsResult;
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use thiserror::Error;

#[derive(Debug, Error)]
pub enum ExportError {
    #[error("experiment {0} has no responses to export")]
    NoResponses(String),
    #[error("failed to serialize export: {0}")]
    Serialize(#[from] serde_json::Error),
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ExportedConfiguration {
    pub id: String,
    pub name: String,
    pub parameters: GenerationParams,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ExportedResult {
    pub configuration_id: String,
    pub configuration_name: String,
    pub response_text: String,
    pub metrics: MetricsResult,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ExportSummary {
    /// Id of the configuration with the highest overall score
    pub best_configuration: String,
    pub best_overall_score: f64,
}

/// Downloadable snapshot of an experiment's results
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ExperimentExport {
    pub experiment_id: String,
    /// When the export was produced
    pub timestamp: DateTime<Utc>,
    pub prompt: String,
    pub configurations: Vec<ExportedConfiguration>,
    pub results: Vec<ExportedResult>,
    pub summary: ExportSummary,
}

impl ExperimentExport {
    pub fn from_experiment(experiment: &Experiment) -> Result<Self, ExportError> {
        Self::at(experiment, Utc::now())
    }

    /// Export with an explicit timestamp
    pub fn at(experiment: &Experiment, timestamp: DateTime<Utc>) -> Result<Self, ExportError> {
        let responses = experiment.responses();
        let comparison = Comparison::from_responses(responses)
            .ok_or_else(|| ExportError::NoResponses(experiment.id.clone()))?;

        let configurations = responses
            .iter()
            .map(|r| ExportedConfiguration {
                id: r.id.clone(),
                name: r.config.clone(),
                parameters: r.params,
            })
            .collect();

        let results = responses
            .iter()
            .map(|r| ExportedResult {
                configuration_id: r.id.clone(),
                configuration_name: r.config.clone(),
                response_text: r.text.clone(),
                metrics: r.metrics,
            })
            .collect();

        Ok(Self {
            experiment_id: experiment.id.clone(),
            timestamp,
            prompt: experiment.prompt.clone(),
            configurations,
            results,
            summary: ExportSummary {
                best_configuration: comparison.best_overall.id.clone(),
                best_overall_score: comparison.best_overall.metrics.overall,
            },
        })
    }

    pub fn to_json(&self) -> Result<String, ExportError> {
        Ok(serde_json::to_string_pretty(self)?)
    }

    /// Default download name, e.g. `experiment-1a2b3c4d5e6f7.json`
    pub fn file_name(&self) -> String {
        format!("experiment-{}.json", self.experiment_id)
    }
}
