//! Config schema and deserialization

use crate::experiment::CONFIG_IDS;
use crate::generation::{GenerationParams, ValidationError};
use serde::Deserialize;
use std::path::{Path, PathBuf};

/// Default experiment store location, relative to the working directory
pub const DEFAULT_STORE_PATH: &str = ".textgauge/experiments.json";

/// Generation backend settings
#[derive(Debug, Clone, Default, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct GenerationConfig {
    /// Chat-completions URL (default: Groq)
    #[serde(default)]
    pub endpoint: Option<String>,

    /// Model name
    #[serde(default)]
    pub model: Option<String>,

    /// Environment variable holding the API key (default: GROQ_API_KEY)
    #[serde(default)]
    pub api_key_env: Option<String>,
}

/// Per-path override configuration
#[derive(Debug, Clone, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ConfigOverride {
    /// Glob patterns this override applies to
    pub files: Vec<String>,

    /// Optional threshold override for matched files
    #[serde(default)]
    pub threshold: Option<u8>,
}

/// Root config structure for .textgaugerc.json
#[derive(Debug, Clone, Default, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Config {
    /// Extend another config file (path relative to this config)
    #[serde(default)]
    pub extends: Option<String>,

    /// Minimum overall score (exit 1 if below)
    #[serde(default)]
    pub threshold: Option<u8>,

    /// Glob patterns for files/directories to exclude from scoring
    #[serde(default)]
    pub ignore: Vec<String>,

    /// File suffixes scored when walking a directory (default: .txt, .md)
    #[serde(default)]
    pub extensions: Vec<String>,

    /// Prompt used when none is given on the command line
    #[serde(default)]
    pub default_prompt: Option<String>,

    /// Path of the experiment store file
    #[serde(default)]
    pub store: Option<String>,

    /// Generation backend settings
    #[serde(default)]
    pub generation: GenerationConfig,

    /// The three generation configurations (A, B, C)
    #[serde(default)]
    pub configs: Option<Vec<GenerationParams>>,

    /// Per-path threshold overrides
    #[serde(default)]
    pub overrides: Vec<ConfigOverride>,
}

impl Config {
    /// Merge CLI overrides into config. CLI values take precedence.
    pub fn merge_with_cli(mut self, cli_threshold: Option<u8>) -> Self {
        if cli_threshold.is_some() {
            self.threshold = cli_threshold;
        }
        self
    }

    /// Reject configs that parse but cannot be used
    pub fn validate(&self) -> Result<(), ValidationError> {
        if let Some(threshold) = self.threshold {
            if threshold > 100 {
                return Err(ValidationError::Threshold(threshold));
            }
        }
        if let Some(ref configs) = self.configs {
            if configs.len() != 3 {
                return Err(ValidationError::ConfigCount(configs.len()));
            }
            for (id, params) in CONFIG_IDS.iter().zip(configs) {
                params
                    .validate()
                    .map_err(|e| ValidationError::in_config(id, e))?;
            }
        }
        Ok(())
    }

    /// Threshold for a specific file, applying matching overrides in order
    pub fn threshold_for_file(&self, file_path: &Path) -> Option<u8> {
        let mut threshold = self.threshold;
        for override_cfg in &self.overrides {
            if Self::matches_override(file_path, &override_cfg.files) {
                if let Some(t) = override_cfg.threshold {
                    threshold = Some(t);
                }
            }
        }
        threshold
    }

    /// Check if a file path matches any of the override patterns
    fn matches_override(file_path: &Path, patterns: &[String]) -> bool {
        let path_str = file_path.to_string_lossy();
        for pattern in patterns {
            if let Ok(glob) = globset::Glob::new(pattern) {
                let matcher = glob.compile_matcher();
                if matcher.is_match(file_path)
                    || path_str.contains(pattern.trim_start_matches("**/"))
                {
                    return true;
                }
            }
        }
        false
    }

    /// Merge another config into this one (for extends)
    pub fn merge_from(&mut self, base: Config) {
        // Base values are overridden by this config's values
        if self.threshold.is_none() {
            self.threshold = base.threshold;
        }
        if self.extends.is_none() {
            self.extends = base.extends;
        }
        if self.default_prompt.is_none() {
            self.default_prompt = base.default_prompt;
        }
        if self.store.is_none() {
            self.store = base.store;
        }
        if self.configs.is_none() {
            self.configs = base.configs;
        }

        if self.generation.endpoint.is_none() {
            self.generation.endpoint = base.generation.endpoint;
        }
        if self.generation.model.is_none() {
            self.generation.model = base.generation.model;
        }
        if self.generation.api_key_env.is_none() {
            self.generation.api_key_env = base.generation.api_key_env;
        }

        // Merge ignore patterns
        let mut all_ignores = base.ignore;
        all_ignores.append(&mut self.ignore);
        self.ignore = all_ignores;

        if self.extensions.is_empty() {
            self.extensions = base.extensions;
        }

        // Prepend base overrides
        let mut all_overrides = base.overrides;
        all_overrides.append(&mut self.overrides);
        self.overrides = all_overrides;
    }

    /// File suffixes to score when walking directories
    pub fn get_extensions(&self) -> Vec<&str> {
        if self.extensions.is_empty() {
            vec![".txt", ".md"]
        } else {
            self.extensions.iter().map(|s| s.as_str()).collect()
        }
    }

    /// Generation configurations, falling back to the defaults
    pub fn generation_params(&self) -> [GenerationParams; 3] {
        match self.configs.as_deref() {
            Some([a, b, c]) => [*a, *b, *c],
            _ => GenerationParams::defaults(),
        }
    }

    /// Experiment store location
    pub fn store_path(&self) -> PathBuf {
        PathBuf::from(self.store.as_deref().unwrap_or(DEFAULT_STORE_PATH))
    }
}
