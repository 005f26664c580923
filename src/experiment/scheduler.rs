//! Background experiment processing
//!
//! A job is an experiment id. Processing moves it `pending -> running`, fans
//! the three generations out on the rayon pool, scores each response and
//! finishes `completed`. Store or transition errors finish it `failed`.
//! Every status change is broadcast to subscribers.

use super::store::{ExperimentStore, StoreError};
use super::{
    Experiment, ExperimentResponse, ExperimentStatus, InvalidTransition, EMPTY_RESPONSE_TEXT,
};
use crate::generation::{GenerationParams, ResponseGenerator, ValidationError};
use crate::scorer::TextQualityScorer;
use rayon::prelude::*;
use std::sync::mpsc::{self, Receiver, Sender};
use std::sync::{Arc, Mutex};
use thiserror::Error;
use tracing::{debug, info, warn};

#[derive(Debug, Error)]
pub enum SchedulerError {
    #[error("invalid experiment: {0}")]
    Invalid(#[from] ValidationError),
    #[error(transparent)]
    Store(#[from] StoreError),
    #[error(transparent)]
    Transition(#[from] InvalidTransition),
}

/// Broadcast on every status change
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct StatusEvent {
    pub id: String,
    pub status: ExperimentStatus,
}

/// Runs experiments against a store and a generator.
///
/// Cloning is cheap and clones share the store, generator and subscribers.
#[derive(Clone)]
pub struct Scheduler {
    store: Arc<dyn ExperimentStore>,
    generator: Arc<dyn ResponseGenerator>,
    scorer: Arc<TextQualityScorer>,
    subscribers: Arc<Mutex<Vec<Sender<StatusEvent>>>>,
}

impl Scheduler {
    pub fn new(store: Arc<dyn ExperimentStore>, generator: Arc<dyn ResponseGenerator>) -> Self {
        Self {
            store,
            generator,
            scorer: Arc::new(TextQualityScorer::new()),
            subscribers: Arc::new(Mutex::new(Vec::new())),
        }
    }

    pub fn store(&self) -> &dyn ExperimentStore {
        self.store.as_ref()
    }

    /// Validate and store a pending experiment, returning its id
    pub fn submit(
        &self,
        prompt: &str,
        configs: [GenerationParams; 3],
    ) -> Result<String, SchedulerError> {
        let experiment = Experiment::new(prompt, configs)?;
        let id = experiment.id.clone();
        self.store.create(experiment)?;
        info!(id = %id, "experiment submitted");
        self.emit(&id, ExperimentStatus::Pending);
        Ok(id)
    }

    /// Process `id` on the rayon pool. Watch progress via `subscribe` or `status`.
    pub fn spawn(&self, id: &str) {
        let this = self.clone();
        let id = id.to_string();
        rayon::spawn(move || {
            if let Err(e) = this.run(&id) {
                warn!(id = %id, error = %e, "background experiment failed");
            }
        });
    }

    /// Process `id` to completion on the calling thread.
    ///
    /// Only one caller can claim a pending experiment; any other gets
    /// [`SchedulerError::Transition`] and the job is left to its owner.
    pub fn run(&self, id: &str) -> Result<Experiment, SchedulerError> {
        let mut experiment = match self.store.transition(id, ExperimentStatus::Running) {
            Ok(experiment) => experiment,
            Err(StoreError::Transition(e)) => return Err(e.into()),
            Err(e) => {
                self.fail(id, &e.to_string());
                return Err(e.into());
            }
        };
        self.emit(id, ExperimentStatus::Running);
        debug!(id = %id, "experiment claimed");

        match self.process(&mut experiment) {
            Ok(()) => Ok(experiment),
            Err(e) => {
                self.fail(id, &e.to_string());
                Err(e)
            }
        }
    }

    pub fn status(&self, id: &str) -> Result<ExperimentStatus, SchedulerError> {
        Ok(self.store.get(id)?.status)
    }

    /// Receive every status change from now on
    pub fn subscribe(&self) -> Receiver<StatusEvent> {
        let (tx, rx) = mpsc::channel();
        match self.subscribers.lock() {
            Ok(mut subscribers) => subscribers.push(tx),
            Err(poisoned) => poisoned.into_inner().push(tx),
        }
        rx
    }

    fn process(&self, experiment: &mut Experiment) -> Result<(), SchedulerError> {
        let prompt = experiment.prompt.as_str();
        let generator = self.generator.as_ref();
        let scorer = self.scorer.as_ref();

        let responses: Vec<ExperimentResponse> = experiment
            .configs
            .par_iter()
            .enumerate()
            .map(|(slot, params)| {
                let (text, generation_error) = match generator.generate(prompt, params) {
                    Ok(text) if text.trim().is_empty() => (EMPTY_RESPONSE_TEXT.to_string(), false),
                    Ok(text) => (text, false),
                    Err(e) => {
                        warn!(slot, error = %e, "generation failed, scoring error text");
                        (e.to_string(), true)
                    }
                };
                ExperimentResponse::scored(slot, *params, text, generation_error, prompt, scorer)
            })
            .collect();

        let failures = responses.iter().filter(|r| r.generation_error).count();
        if failures == responses.len() {
            warn!(id = %experiment.id, "every configuration failed to generate");
        }
        debug!(id = %experiment.id, failures, "responses scored");

        experiment.responses = Some(responses);
        self.transition(experiment, ExperimentStatus::Completed)?;
        info!(id = %experiment.id, "experiment completed");
        Ok(())
    }

    /// Apply a transition, persist it, then announce it
    fn transition(
        &self,
        experiment: &mut Experiment,
        next: ExperimentStatus,
    ) -> Result<(), SchedulerError> {
        experiment.transition_to(next)?;
        self.store.update(experiment.clone())?;
        self.emit(&experiment.id, next);
        Ok(())
    }

    /// Best-effort move to `failed`, recording `message`
    fn fail(&self, id: &str, message: &str) {
        let outcome = self.store.get(id).map_err(SchedulerError::from).and_then(|mut e| {
            e.transition_to(ExperimentStatus::Failed)?;
            e.error = Some(message.to_string());
            self.store.update(e)?;
            Ok(())
        });

        match outcome {
            Ok(()) => {
                warn!(id = %id, error = %message, "experiment failed");
                self.emit(id, ExperimentStatus::Failed);
            }
            Err(e) => warn!(id = %id, error = %e, "could not mark experiment failed"),
        }
    }

    fn emit(&self, id: &str, status: ExperimentStatus) {
        let event = StatusEvent {
            id: id.to_string(),
            status,
        };
        let mut subscribers = match self.subscribers.lock() {
            Ok(guard) => guard,
            Err(poisoned) => poisoned.into_inner(),
        };
        subscribers.retain(|tx| tx.send(event.clone()).is_ok());
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::experiment::InMemoryStore;
    use crate::generation::GenerationError;

    /// Echoes the temperature back so each slot gets distinct text
    struct EchoGenerator;

    impl ResponseGenerator for EchoGenerator {
        fn generate(&self, prompt: &str, params: &GenerationParams) -> Result<String, GenerationError> {
            Ok(format!(
                "However, {} matters. Therefore, the temperature level {} was used. For example, this sentence adds detail.",
                prompt,
                (params.temperature * 10.0).round() as i64
            ))
        }
    }

    struct FailingGenerator;

    impl ResponseGenerator for FailingGenerator {
        fn generate(&self, _: &str, _: &GenerationParams) -> Result<String, GenerationError> {
            Err(GenerationError::RateLimited)
        }
    }

    /// Fails only for the slot with the given temperature
    struct FlakyGenerator(f64);

    impl ResponseGenerator for FlakyGenerator {
        fn generate(&self, _: &str, params: &GenerationParams) -> Result<String, GenerationError> {
            if params.temperature == self.0 {
                Err(GenerationError::Api("500: upstream".into()))
            } else {
                Ok(String::new())
            }
        }
    }

    fn scheduler(generator: impl ResponseGenerator + 'static) -> Scheduler {
        Scheduler::new(Arc::new(InMemoryStore::new()), Arc::new(generator))
    }

    #[test]
    fn submit_stores_pending() {
        let s = scheduler(EchoGenerator);
        let id = s.submit("Rust ownership", GenerationParams::defaults()).unwrap();
        assert_eq!(s.status(&id).unwrap(), ExperimentStatus::Pending);
    }

    #[test]
    fn submit_rejects_empty_prompt() {
        let s = scheduler(EchoGenerator);
        let err = s.submit("", GenerationParams::defaults()).unwrap_err();
        assert!(matches!(err, SchedulerError::Invalid(ValidationError::EmptyPrompt)));
        assert!(s.store().list(10).unwrap().is_empty());
    }

    #[test]
    fn run_completes_with_three_scored_responses() {
        let s = scheduler(EchoGenerator);
        let id = s.submit("Rust ownership", GenerationParams::defaults()).unwrap();
        let done = s.run(&id).unwrap();

        assert_eq!(done.status, ExperimentStatus::Completed);
        let responses = done.responses();
        let ids: Vec<_> = responses.iter().map(|r| r.id.as_str()).collect();
        assert_eq!(ids, vec!["A", "B", "C"]);
        assert!(responses[1].text.contains("temperature level 10"));
        assert!(responses.iter().all(|r| !r.generation_error));
        assert!(responses.iter().all(|r| r.metrics.coherence == 83));
        assert_eq!(responses[0].metrics.overall, 75.74);

        assert_eq!(s.store().get(&id).unwrap(), done);
    }

    #[test]
    fn all_generations_failing_still_completes() {
        let s = scheduler(FailingGenerator);
        let id = s.submit("prompt", GenerationParams::defaults()).unwrap();
        let done = s.run(&id).unwrap();

        assert_eq!(done.status, ExperimentStatus::Completed);
        for r in done.responses() {
            assert!(r.generation_error);
            assert_eq!(r.text, GenerationError::RateLimited.to_string());
        }
    }

    #[test]
    fn partial_failure_and_empty_text() {
        let s = scheduler(FlakyGenerator(1.0));
        let id = s.submit("prompt", GenerationParams::defaults()).unwrap();
        let done = s.run(&id).unwrap();

        let r = done.responses();
        assert!(!r[0].generation_error);
        assert_eq!(r[0].text, EMPTY_RESPONSE_TEXT);
        assert!(r[1].generation_error);
        assert!(r[1].text.contains("upstream"));
    }

    #[test]
    fn rerun_of_completed_is_rejected() {
        let s = scheduler(EchoGenerator);
        let id = s.submit("prompt", GenerationParams::defaults()).unwrap();
        s.run(&id).unwrap();

        let err = s.run(&id).unwrap_err();
        assert!(matches!(err, SchedulerError::Transition(_)));
        assert_eq!(s.status(&id).unwrap(), ExperimentStatus::Completed);
    }

    #[test]
    fn unknown_id_is_not_found() {
        let s = scheduler(EchoGenerator);
        assert!(matches!(
            s.run("deadbeef00000"),
            Err(SchedulerError::Store(StoreError::NotFound(_)))
        ));
    }

    #[test]
    fn events_follow_the_state_machine() {
        let s = scheduler(EchoGenerator);
        let rx = s.subscribe();
        let id = s.submit("prompt", GenerationParams::defaults()).unwrap();
        s.run(&id).unwrap();

        let statuses: Vec<_> = rx.try_iter().map(|e| e.status).collect();
        assert_eq!(
            statuses,
            vec![
                ExperimentStatus::Pending,
                ExperimentStatus::Running,
                ExperimentStatus::Completed
            ]
        );
    }

    #[test]
    fn dropped_subscribers_are_pruned() {
        let s = scheduler(EchoGenerator);
        drop(s.subscribe());
        let rx = s.subscribe();
        s.submit("prompt", GenerationParams::defaults()).unwrap();

        assert_eq!(rx.try_iter().count(), 1);
        assert_eq!(s.subscribers.lock().unwrap().len(), 1);
    }
}
