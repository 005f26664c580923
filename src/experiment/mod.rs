//! Experiments - one prompt run under three sampling configurations.
//!
//! An [`Experiment`] moves through `pending -> running -> completed | failed`
//! under the control of the [`Scheduler`]. Persistence goes through the
//! [`ExperimentStore`] trait.

pub mod compare;
pub mod export;
pub mod scheduler;
pub mod store;

pub use compare::Comparison;
pub use export::{ExperimentExport, ExportError};
pub use scheduler::{Scheduler, SchedulerError, StatusEvent};
pub use store::{ExperimentStore, InMemoryStore, JsonFileStore, StoreError, DEFAULT_LIST_LIMIT};

use crate::generation::{GenerationParams, ValidationError};
use crate::scorer::TextQualityScorer;
use crate::MetricsResult;
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use sha2::{Digest, Sha256};
use std::fmt;
use std::sync::atomic::{AtomicU64, Ordering};
use thiserror::Error;

/// Configuration slot ids, in order
pub const CONFIG_IDS: [&str; 3] = ["A", "B", "C"];

/// Length of a generated experiment id
const ID_LEN: usize = 13;

/// Text recorded when a backend returns an empty body
pub const EMPTY_RESPONSE_TEXT: &str = "No response received";

static ID_COUNTER: AtomicU64 = AtomicU64::new(0);

/// Lifecycle state of an experiment
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ExperimentStatus {
    Pending,
    Running,
    Completed,
    Failed,
}

impl ExperimentStatus {
    /// Whether `self -> next` is a legal transition
    pub fn can_transition_to(self, next: ExperimentStatus) -> bool {
        use ExperimentStatus::*;
        matches!(
            (self, next),
            (Pending, Running) | (Running, Completed) | (Running, Failed) | (Pending, Failed)
        )
    }

    /// Completed and failed experiments never change again
    pub fn is_terminal(self) -> bool {
        matches!(self, ExperimentStatus::Completed | ExperimentStatus::Failed)
    }
}

impl fmt::Display for ExperimentStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let s = match self {
            ExperimentStatus::Pending => "pending",
            ExperimentStatus::Running => "running",
            ExperimentStatus::Completed => "completed",
            ExperimentStatus::Failed => "failed",
        };
        f.write_str(s)
    }
}

/// Rejected status change
#[derive(Debug, Clone, Copy, PartialEq, Eq, Error)]
#[error("invalid status transition: {from} -> {to}")]
pub struct InvalidTransition {
    pub from: ExperimentStatus,
    pub to: ExperimentStatus,
}

/// One scored response within an experiment
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ExperimentResponse {
    /// Slot id: "A", "B" or "C"
    pub id: String,
    /// Display name: "Configuration A", ...
    pub config: String,
    pub params: GenerationParams,
    /// Generated text, or the error message when generation failed
    pub text: String,
    pub metrics: MetricsResult,
    /// True when `text` holds an error message instead of a response
    #[serde(default)]
    pub generation_error: bool,
}

impl ExperimentResponse {
    /// Build and score the response for configuration slot `slot` (0..3)
    pub fn scored(
        slot: usize,
        params: GenerationParams,
        text: String,
        generation_error: bool,
        prompt: &str,
        scorer: &TextQualityScorer,
    ) -> Self {
        let id = CONFIG_IDS.get(slot).copied().unwrap_or("?");
        let metrics = scorer.score(&text, prompt);
        Self {
            id: id.to_string(),
            config: config_name(id),
            params,
            text,
            metrics,
            generation_error,
        }
    }
}

/// "Configuration A" for slot id "A"
pub fn config_name(id: &str) -> String {
    format!("Configuration {}", id)
}

/// A prompt plus three generation configurations and their results
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Experiment {
    pub id: String,
    pub prompt: String,
    pub configs: [GenerationParams; 3],
    pub created_at: DateTime<Utc>,
    pub status: ExperimentStatus,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub responses: Option<Vec<ExperimentResponse>>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub error: Option<String>,
}

impl Experiment {
    /// Create a pending experiment. Fails on an empty prompt or invalid params.
    pub fn new(prompt: &str, configs: [GenerationParams; 3]) -> Result<Self, ValidationError> {
        if prompt.trim().is_empty() {
            return Err(ValidationError::EmptyPrompt);
        }
        for (id, params) in CONFIG_IDS.iter().zip(configs.iter()) {
            params
                .validate()
                .map_err(|e| ValidationError::in_config(id, e))?;
        }

        let created_at = Utc::now();
        Ok(Self {
            id: generate_id(prompt, &created_at),
            prompt: prompt.to_string(),
            configs,
            created_at,
            status: ExperimentStatus::Pending,
            responses: None,
            error: None,
        })
    }

    /// Move to `next`, rejecting illegal transitions
    pub fn transition_to(&mut self, next: ExperimentStatus) -> Result<(), InvalidTransition> {
        if !self.status.can_transition_to(next) {
            return Err(InvalidTransition {
                from: self.status,
                to: next,
            });
        }
        self.status = next;
        Ok(())
    }

    /// Responses, or an empty slice when none have been recorded
    pub fn responses(&self) -> &[ExperimentResponse] {
        self.responses.as_deref().unwrap_or(&[])
    }

    /// Best/most readable/most coherent picks, once responses exist
    pub fn comparison(&self) -> Option<Comparison<'_>> {
        Comparison::from_responses(self.responses())
    }
}

/// 13 hex chars of sha256(prompt, timestamp, counter)
fn generate_id(prompt: &str, created_at: &DateTime<Utc>) -> String {
    let counter = ID_COUNTER.fetch_add(1, Ordering::Relaxed);
    let mut hasher = Sha256::new();
    hasher.update(prompt.as_bytes());
    hasher.update(created_at.to_rfc3339().as_bytes());
    hasher.update(counter.to_le_bytes());
    let mut id = hex::encode(hasher.finalize());
    id.truncate(ID_LEN);
    id
}
