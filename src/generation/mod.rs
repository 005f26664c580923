//! Response generation - the collaborator that turns a prompt into text.
//!
//! The scheduler only depends on the [`ResponseGenerator`] trait; the HTTP
//! client lives behind the `ai` feature.

pub mod chat;

pub use chat::{is_generation_available, ChatCompletionsClient};

use serde::{Deserialize, Serialize};
use thiserror::Error;

/// Sampling parameters for one configuration
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct GenerationParams {
    pub temperature: f64,
    pub top_p: f64,
    pub max_tokens: u32,
}

impl GenerationParams {
    pub fn new(temperature: f64, top_p: f64, max_tokens: u32) -> Self {
        Self {
            temperature,
            top_p,
            max_tokens,
        }
    }

    /// The three default configurations (A, B, C)
    pub fn defaults() -> [GenerationParams; 3] {
        [
            GenerationParams::new(0.7, 0.9, 500),
            GenerationParams::new(1.0, 0.95, 500),
            GenerationParams::new(0.3, 0.85, 500),
        ]
    }

    /// Check the parameters are within the ranges chat APIs accept
    pub fn validate(&self) -> Result<(), ValidationError> {
        if !(0.0..=2.0).contains(&self.temperature) {
            return Err(ValidationError::Temperature(self.temperature));
        }
        if !(self.top_p > 0.0 && self.top_p <= 1.0) {
            return Err(ValidationError::TopP(self.top_p));
        }
        if self.max_tokens == 0 {
            return Err(ValidationError::MaxTokens);
        }
        Ok(())
    }
}

/// Rejected experiment or configuration input
#[derive(Debug, Clone, PartialEq, Error)]
pub enum ValidationError {
    #[error("prompt must not be empty")]
    EmptyPrompt,
    #[error("temperature must be between 0 and 2, got {0}")]
    Temperature(f64),
    #[error("top_p must be in (0, 1], got {0}")]
    TopP(f64),
    #[error("max_tokens must be at least 1")]
    MaxTokens,
    #[error("threshold must be 0-100, got {0}")]
    Threshold(u8),
    #[error("exactly 3 generation configs are required, got {0}")]
    ConfigCount(usize),
    /// Invalid parameters in configuration slot `id` ("A", "B" or "C")
    #[error("Configuration {id}: {source}")]
    Config {
        id: String,
        #[source]
        source: Box<ValidationError>,
    },
}

impl ValidationError {
    /// Attach the configuration slot id to a parameter error
    pub fn in_config(id: &str, source: ValidationError) -> Self {
        ValidationError::Config {
            id: id.to_string(),
            source: Box::new(source),
        }
    }
}

/// Error from a generation backend
#[derive(Debug, Error)]
pub enum GenerationError {
    #[error("{0} environment variable not set")]
    NoApiKey(String),
    #[error("Request failed: {0}")]
    RequestFailed(String),
    #[error("Invalid response: {0}")]
    InvalidResponse(String),
    #[error("Rate limited - try again later")]
    RateLimited,
    #[error("API error: {0}")]
    Api(String),
    #[error("Generation not available. Rebuild with: cargo build --features ai")]
    Unavailable,
}

/// Anything that can produce a response for a prompt
pub trait ResponseGenerator: Send + Sync {
    fn generate(&self, prompt: &str, params: &GenerationParams) -> Result<String, GenerationError>;
}
