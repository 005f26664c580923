//! Experiment persistence
//!
//! Stores hold whole [`Experiment`] records keyed by id. The in-memory store
//! is used by tests and one-shot runs; the JSON file store backs the CLI.

use super::{Experiment, ExperimentStatus, InvalidTransition};
use serde::{Deserialize, Serialize};
use std::collections::HashMap;
use std::fs;
use std::path::{Path, PathBuf};
use std::sync::{Mutex, RwLock};
use thiserror::Error;

/// Number of experiments returned by a listing when no limit is given
pub const DEFAULT_LIST_LIMIT: usize = 10;

const STORE_VERSION: u32 = 1;

/// Error from an experiment store
#[derive(Debug, Error)]
pub enum StoreError {
    #[error("experiment not found: {0}")]
    NotFound(String),
    #[error("experiment already exists: {0}")]
    Duplicate(String),
    #[error("failed to access store {path}: {source}")]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },
    #[error("corrupt store file {path}: {source}")]
    Corrupt {
        path: PathBuf,
        #[source]
        source: serde_json::Error,
    },
    #[error("failed to serialize store: {0}")]
    Serialize(#[from] serde_json::Error),
    #[error(transparent)]
    Transition(#[from] InvalidTransition),
    #[error("store lock poisoned")]
    Poisoned,
}

/// Repository of experiments
pub trait ExperimentStore: Send + Sync {
    /// Insert a new experiment. Fails if the id is taken.
    fn create(&self, experiment: Experiment) -> Result<(), StoreError>;

    fn get(&self, id: &str) -> Result<Experiment, StoreError>;

    /// Up to `limit` experiments, newest first
    fn list(&self, limit: usize) -> Result<Vec<Experiment>, StoreError>;

    /// Replace an existing experiment
    fn update(&self, experiment: Experiment) -> Result<(), StoreError>;

    /// Move `id` to `next` against the stored status and return the updated
    /// record. The check and the write happen under one lock, so only one
    /// caller can win a given transition.
    fn transition(&self, id: &str, next: ExperimentStatus) -> Result<Experiment, StoreError>;

    /// Remove an experiment, returning whether it existed
    fn delete(&self, id: &str) -> Result<bool, StoreError>;
}

/// Experiments held in process memory
#[derive(Debug, Default)]
pub struct InMemoryStore {
    experiments: RwLock<HashMap<String, Experiment>>,
}

impl InMemoryStore {
    pub fn new() -> Self {
        Self::default()
    }

    fn from_experiments(experiments: Vec<Experiment>) -> Self {
        let map = experiments.into_iter().map(|e| (e.id.clone(), e)).collect();
        Self {
            experiments: RwLock::new(map),
        }
    }

    fn contents(&self) -> Result<HashMap<String, Experiment>, StoreError> {
        let experiments = self.experiments.read().map_err(|_| StoreError::Poisoned)?;
        Ok(experiments.clone())
    }

    fn restore(&self, contents: HashMap<String, Experiment>) -> Result<(), StoreError> {
        let mut experiments = self.experiments.write().map_err(|_| StoreError::Poisoned)?;
        *experiments = contents;
        Ok(())
    }

    /// Every experiment, newest first
    fn snapshot(&self) -> Result<Vec<Experiment>, StoreError> {
        let experiments = self.experiments.read().map_err(|_| StoreError::Poisoned)?;
        let mut all: Vec<Experiment> = experiments.values().cloned().collect();
        sort_newest_first(&mut all);
        Ok(all)
    }
}

fn sort_newest_first(experiments: &mut [Experiment]) {
    experiments.sort_by(|a, b| {
        b.created_at
            .cmp(&a.created_at)
            .then_with(|| a.id.cmp(&b.id))
    });
}

impl ExperimentStore for InMemoryStore {
    fn create(&self, experiment: Experiment) -> Result<(), StoreError> {
        let mut experiments = self.experiments.write().map_err(|_| StoreError::Poisoned)?;
        if experiments.contains_key(&experiment.id) {
            return Err(StoreError::Duplicate(experiment.id));
        }
        experiments.insert(experiment.id.clone(), experiment);
        Ok(())
    }

    fn get(&self, id: &str) -> Result<Experiment, StoreError> {
        let experiments = self.experiments.read().map_err(|_| StoreError::Poisoned)?;
        experiments
            .get(id)
            .cloned()
            .ok_or_else(|| StoreError::NotFound(id.to_string()))
    }

    fn list(&self, limit: usize) -> Result<Vec<Experiment>, StoreError> {
        let mut all = self.snapshot()?;
        all.truncate(limit);
        Ok(all)
    }

    fn update(&self, experiment: Experiment) -> Result<(), StoreError> {
        let mut experiments = self.experiments.write().map_err(|_| StoreError::Poisoned)?;
        match experiments.get_mut(&experiment.id) {
            Some(slot) => {
                *slot = experiment;
                Ok(())
            }
            None => Err(StoreError::NotFound(experiment.id)),
        }
    }

    fn transition(&self, id: &str, next: ExperimentStatus) -> Result<Experiment, StoreError> {
        let mut experiments = self.experiments.write().map_err(|_| StoreError::Poisoned)?;
        let experiment = experiments
            .get_mut(id)
            .ok_or_else(|| StoreError::NotFound(id.to_string()))?;
        experiment.transition_to(next)?;
        Ok(experiment.clone())
    }

    fn delete(&self, id: &str) -> Result<bool, StoreError> {
        let mut experiments = self.experiments.write().map_err(|_| StoreError::Poisoned)?;
        Ok(experiments.remove(id).is_some())
    }
}

/// On-disk layout of the store file
#[derive(Debug, Serialize, Deserialize)]
struct StoreFile {
    version: u32,
    experiments: Vec<Experiment>,
}

/// Experiments persisted to a single JSON file.
///
/// The whole collection is rewritten after every mutation.
#[derive(Debug)]
pub struct JsonFileStore {
    path: PathBuf,
    inner: InMemoryStore,
    /// Serializes mutate-then-persist so the file never lags the map
    write_lock: Mutex<()>,
}

impl JsonFileStore {
    /// Open the store at `path`. A missing file is an empty store.
    pub fn open(path: impl Into<PathBuf>) -> Result<Self, StoreError> {
        let path = path.into();
        let experiments = Self::load(&path)?;
        tracing::debug!(path = %path.display(), count = experiments.len(), "opened experiment store");
        Ok(Self {
            path,
            inner: InMemoryStore::from_experiments(experiments),
            write_lock: Mutex::new(()),
        })
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    fn load(path: &Path) -> Result<Vec<Experiment>, StoreError> {
        let content = match fs::read_to_string(path) {
            Ok(content) => content,
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => return Ok(Vec::new()),
            Err(source) => {
                return Err(StoreError::Io {
                    path: path.to_path_buf(),
                    source,
                })
            }
        };

        let file: StoreFile =
            serde_json::from_str(&content).map_err(|source| StoreError::Corrupt {
                path: path.to_path_buf(),
                source,
            })?;

        if file.version != STORE_VERSION {
            tracing::warn!(
                path = %path.display(),
                version = file.version,
                "unknown store version, reading anyway"
            );
        }
        Ok(file.experiments)
    }

    fn persist(&self) -> Result<(), StoreError> {
        let file = StoreFile {
            version: STORE_VERSION,
            experiments: self.inner.snapshot()?,
        };
        let content = serde_json::to_string_pretty(&file)?;

        if let Some(parent) = self.path.parent() {
            if !parent.as_os_str().is_empty() {
                fs::create_dir_all(parent).map_err(|source| StoreError::Io {
                    path: parent.to_path_buf(),
                    source,
                })?;
            }
        }
        fs::write(&self.path, content).map_err(|source| StoreError::Io {
            path: self.path.clone(),
            source,
        })?;
        tracing::debug!(path = %self.path.display(), count = file.experiments.len(), "wrote experiment store");
        Ok(())
    }

    /// Apply `op` and write the file. A failed write undoes `op`, so the map
    /// never holds changes the file does not.
    fn mutate<T>(
        &self,
        op: impl FnOnce(&InMemoryStore) -> Result<T, StoreError>,
        changed: impl FnOnce(&T) -> bool,
    ) -> Result<T, StoreError> {
        let _guard = self.write_lock.lock().map_err(|_| StoreError::Poisoned)?;
        let before = self.inner.contents()?;
        let out = op(&self.inner)?;
        if !changed(&out) {
            return Ok(out);
        }
        if let Err(e) = self.persist() {
            tracing::warn!(path = %self.path.display(), error = %e, "store write failed, rolling back");
            self.inner.restore(before)?;
            return Err(e);
        }
        Ok(out)
    }
}

impl ExperimentStore for JsonFileStore {
    fn create(&self, experiment: Experiment) -> Result<(), StoreError> {
        self.mutate(|inner| inner.create(experiment), |_| true)
    }

    fn get(&self, id: &str) -> Result<Experiment, StoreError> {
        self.inner.get(id)
    }

    fn list(&self, limit: usize) -> Result<Vec<Experiment>, StoreError> {
        self.inner.list(limit)
    }

    fn update(&self, experiment: Experiment) -> Result<(), StoreError> {
        self.mutate(|inner| inner.update(experiment), |_| true)
    }

    fn transition(&self, id: &str, next: ExperimentStatus) -> Result<Experiment, StoreError> {
        self.mutate(|inner| inner.transition(id, next), |_| true)
    }

    fn delete(&self, id: &str) -> Result<bool, StoreError> {
        self.mutate(|inner| inner.delete(id), |removed| *removed)
    }
}
