//! Errors surfaced by `step()` and `run()`.

use crate::runner::machine::RunnerPhase;
use thiserror::Error;

/// Errors that can end a single iteration.
///
/// In both cases the runner's current state is left unchanged.
#[derive(Debug, Error)]
pub enum StepError<E> {
    /// The handler failed with a kind that has no transition from `state`
    #[error("Handler for state '{state}' failed: {source}")]
    Handler { state: String, source: E },

    /// Strict mode: the handler returned a value with no transition
    #[error("No transition from state '{state}' for {outcome}")]
    UnhandledOutcome { state: String, outcome: String },

    /// The current state has no handler bound
    #[error("No handler bound for state '{state}'")]
    NoHandler { state: String },
}

impl<E> StepError<E> {
    /// Name of the state whose handler produced the error.
    pub fn state(&self) -> &str {
        match self {
            StepError::Handler { state, .. }
            | StepError::UnhandledOutcome { state, .. }
            | StepError::NoHandler { state } => state,
        }
    }

    /// Recover the application failure, if this error carries one.
    pub fn into_handler_error(self) -> Option<E> {
        match self {
            StepError::Handler { source, .. } => Some(source),
            StepError::UnhandledOutcome { .. } | StepError::NoHandler { .. } => None,
        }
    }
}

/// Errors that end `run()`.
#[derive(Debug, Error)]
pub enum RunError<E> {
    /// `run()` was called on a runner that already ran
    #[error("Runner cannot start from phase {phase:?}; only an idle runner can run")]
    NotIdle { phase: RunnerPhase },

    /// An iteration failed and the loop stopped
    #[error(transparent)]
    Step(#[from] StepError<E>),
}

impl<E> RunError<E> {
    pub fn into_step_error(self) -> Option<StepError<E>> {
        match self {
            RunError::Step(error) => Some(error),
            RunError::NotIdle { .. } => None,
        }
    }
}
