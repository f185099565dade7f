//! The paced state runner.

use crate::builder::{ConfigurationError, RunnerBuilder};
use crate::checkpoint::{Checkpoint, RunnerMetadata};
use crate::core::{Failure, Outcome, State, StateHistory, StateTransition, TransitionTable};
use crate::runner::clock::{Clock, SystemClock};
use crate::runner::config::RunnerConfig;
use crate::runner::error::{RunError, StepError};
use chrono::Utc;
use serde::{Deserialize, Serialize};
use std::collections::HashMap;
use std::fmt::Debug;
use std::hash::Hash;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;
use std::time::Duration;
use tracing::{debug, info, trace, warn};

/// A state's behavior. Receives the runner's context on every call.
pub type Handler<V, E, Env> = Box<dyn FnMut(&mut Env) -> Result<V, E> + Send>;

/// Lifecycle of the runner itself, independent of application states.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub enum RunnerPhase {
    /// Built, `run()` not yet called
    Idle,

    /// Inside `run()`
    Running,

    /// `run()` returned; terminal
    Stopped,
}

/// Cloneable stop signal shared with a runner.
///
/// Handlers may hold one (captured or placed in the context) to stop the
/// loop from inside an iteration; other threads may hold one to stop it
/// from outside. The request is observed between iterations only.
#[derive(Clone, Debug, Default)]
pub struct StopHandle {
    requested: Arc<AtomicBool>,
}

impl StopHandle {
    pub fn quit(&self) {
        self.requested.store(true, Ordering::SeqCst);
    }

    pub fn is_stop_requested(&self) -> bool {
        self.requested.load(Ordering::SeqCst)
    }
}

/// How the handler's result was consumed.
#[derive(Debug)]
pub enum StepOutcome<V, E> {
    /// The handler returned a value
    Returned(V),

    /// The handler failed with a registered kind; the table consumed it
    Recovered(E),
}

/// Observable result of one `step()`.
#[derive(Debug)]
pub struct StepReport<S, V, E> {
    pub from: S,
    pub to: S,
    /// Whether the transition table had an entry for the outcome
    pub matched: bool,
    pub outcome: StepOutcome<V, E>,
}

impl<S: PartialEq, V, E> StepReport<S, V, E> {
    /// The value the handler returned, if it returned one.
    pub fn value(&self) -> Option<&V> {
        match &self.outcome {
            StepOutcome::Returned(value) => Some(value),
            StepOutcome::Recovered(_) => None,
        }
    }

    pub fn is_recovered(&self) -> bool {
        matches!(self.outcome, StepOutcome::Recovered(_))
    }

    pub fn changed_state(&self) -> bool {
        self.from != self.to
    }
}

/// Runs the current state's handler at a fixed cadence, choosing the next
/// state from the `(state, outcome)` transition table.
///
/// Build one with [`RunnerBuilder`] or [`StateRunner::new`].
///
/// # Example
///
/// ```rust
/// use cadence_fsm::builder::RunnerBuilder;
/// use cadence_fsm::runner::FakeClock;
/// use cadence_fsm::state_enum;
/// use std::io;
/// use std::time::Duration;
///
/// state_enum! {
///     enum Link {
///         Start,
///         Retry,
///         Done,
///     }
///     final: [Done]
/// }
///
/// let mut attempts = 0;
/// let mut runner = RunnerBuilder::new()
///     .initial(Link::Start)
///     .loop_period(Duration::from_millis(10))
///     .stop_on_final(true)
///     .clock(FakeClock::new())
///     .handler(Link::Start, move |_| {
///         attempts += 1;
///         if attempts == 1 {
///             Err(io::Error::new(io::ErrorKind::TimedOut, "slow peer"))
///         } else {
///             Ok("ok")
///         }
///     })
///     .handler(Link::Retry, |_| Ok("ok"))
///     .handler(Link::Done, |_| Ok("idle"))
///     .on_value(Link::Start, "ok", Link::Done)
///     .on_failure(Link::Start, io::ErrorKind::TimedOut, Link::Retry)
///     .on_value(Link::Retry, "ok", Link::Done)
///     .build()
///     .unwrap();
///
/// runner.run().unwrap();
///
/// assert_eq!(runner.current_state(), &Link::Done);
/// assert_eq!(runner.iterations(), 2);
/// ```
pub struct StateRunner<S, V, E, Env = (), C = SystemClock>
where
    S: State,
    E: Failure,
{
    current: S,
    initial: S,
    handlers: HashMap<S, Handler<V, E, Env>>,
    table: TransitionTable<S, V, E::Kind>,
    config: RunnerConfig,
    clock: C,
    env: Env,
    stop: StopHandle,
    phase: RunnerPhase,
    history: StateHistory<S>,
    metadata: RunnerMetadata,
}

/// Everything the builder hands over once validation passed.
pub(crate) struct RunnerParts<S, V, E, Env, C>
where
    S: State,
    E: Failure,
{
    pub initial: S,
    pub handlers: HashMap<S, Handler<V, E, Env>>,
    pub table: TransitionTable<S, V, E::Kind>,
    pub config: RunnerConfig,
    pub clock: C,
    pub env: Env,
    pub stop: StopHandle,
    pub history: StateHistory<S>,
    pub metadata: RunnerMetadata,
}

impl<S, V, E> StateRunner<S, V, E>
where
    S: State,
    V: Clone + Eq + Hash + Debug,
    E: Failure,
{
    /// Validate and assemble a runner on the system clock.
    ///
    /// Fails if `loop_period` is zero, if `initial` has no entry in
    /// `transitions`, or if any state lacks a handler.
    pub fn new<I>(
        initial: S,
        transitions: TransitionTable<S, V, E::Kind>,
        handlers: I,
        loop_period: Duration,
    ) -> Result<Self, ConfigurationError>
    where
        I: IntoIterator<Item = (S, Handler<V, E, ()>)>,
    {
        RunnerBuilder::new()
            .initial(initial)
            .transitions(transitions)
            .handlers(handlers)
            .loop_period(loop_period)
            .build()
    }
}

impl<S, V, E, Env, C> StateRunner<S, V, E, Env, C>
where
    S: State,
    V: Clone + Eq + Hash + Debug,
    E: Failure,
    C: Clock,
{
    pub(crate) fn from_parts(parts: RunnerParts<S, V, E, Env, C>) -> Self {
        Self {
            current: parts.initial.clone(),
            initial: parts.initial,
            handlers: parts.handlers,
            table: parts.table,
            config: parts.config,
            clock: parts.clock,
            env: parts.env,
            stop: parts.stop,
            phase: RunnerPhase::Idle,
            history: parts.history,
            metadata: parts.metadata,
        }
    }

    pub fn current_state(&self) -> &S {
        &self.current
    }

    /// The state the runner was built with (or resumed into).
    pub fn initial_state(&self) -> &S {
        &self.initial
    }

    pub fn phase(&self) -> RunnerPhase {
        self.phase
    }

    pub fn config(&self) -> &RunnerConfig {
        &self.config
    }

    pub fn transitions(&self) -> &TransitionTable<S, V, E::Kind> {
        &self.table
    }

    pub fn history(&self) -> &StateHistory<S> {
        &self.history
    }

    pub fn metadata(&self) -> &RunnerMetadata {
        &self.metadata
    }

    /// Number of `step()` calls made so far, including failed ones.
    pub fn iterations(&self) -> u64 {
        self.metadata.iterations
    }

    pub fn context(&self) -> &Env {
        &self.env
    }

    pub fn context_mut(&mut self) -> &mut Env {
        &mut self.env
    }

    pub fn clock(&self) -> &C {
        &self.clock
    }

    /// A handle that can stop this runner from a handler or another thread.
    pub fn stop_handle(&self) -> StopHandle {
        self.stop.clone()
    }

    /// Request the run loop to stop before its next iteration.
    pub fn quit(&self) {
        self.stop.quit();
    }

    pub fn is_stop_requested(&self) -> bool {
        self.stop.is_stop_requested()
    }

    /// Execute exactly one iteration.
    ///
    /// Runs the current state's handler and moves to the state the table
    /// maps its outcome to. A returned value with no entry leaves the state
    /// unchanged (or fails in strict mode). A failure with no entry is
    /// returned as [`StepError::Handler`] with the state unchanged.
    pub fn step(&mut self) -> Result<StepReport<S, V, E>, StepError<E>> {
        let from = self.current.clone();
        let iteration = self.metadata.begin_iteration(from.name());

        let Some(handler) = self.handlers.get_mut(&from) else {
            return Err(StepError::NoHandler {
                state: from.name().to_string(),
            });
        };
        let result = handler(&mut self.env);
        let outcome = Outcome::classify(&result);
        let next = self.table.lookup(&from, &outcome).cloned();
        self.metadata.last_outcome = Some(outcome.to_string());

        match (result, next) {
            (Ok(value), Some(to)) => {
                self.enter(&from, &to, &outcome, iteration);
                Ok(StepReport {
                    from,
                    to,
                    matched: true,
                    outcome: StepOutcome::Returned(value),
                })
            }
            (Ok(_), None) if self.config.strict => Err(StepError::UnhandledOutcome {
                state: from.name().to_string(),
                outcome: outcome.to_string(),
            }),
            (Ok(value), None) => {
                trace!(state = from.name(), %outcome, iteration, "no transition, state retained");
                Ok(StepReport {
                    to: from.clone(),
                    from,
                    matched: false,
                    outcome: StepOutcome::Returned(value),
                })
            }
            (Err(error), Some(to)) => {
                debug!(state = from.name(), %outcome, error = %error, "failure recovered by transition");
                self.enter(&from, &to, &outcome, iteration);
                Ok(StepReport {
                    from,
                    to,
                    matched: true,
                    outcome: StepOutcome::Recovered(error),
                })
            }
            (Err(error), None) => {
                warn!(state = from.name(), %outcome, error = %error, iteration, "unregistered failure");
                Err(StepError::Handler {
                    state: from.name().to_string(),
                    source: error,
                })
            }
        }
    }

    fn enter(&mut self, from: &S, to: &S, outcome: &Outcome<V, E::Kind>, iteration: u64) {
        debug!(from = from.name(), to = to.name(), iteration, "state transition");
        let transition = StateTransition {
            from: from.clone(),
            to: to.clone(),
            trigger: outcome.to_string(),
            timestamp: Utc::now(),
            iteration,
        };
        self.history.push_bounded(transition, self.config.history_limit);
        self.current = to.clone();

        if self.config.stop_on_final && to.is_final() {
            debug!(state = to.name(), "final state entered, stopping");
            self.stop.quit();
        }
    }

    /// Step repeatedly at the configured cadence until stopped.
    ///
    /// Each iteration starts `loop_period` after the previous one started.
    /// An iteration that overruns the period is followed immediately by the
    /// next, with no catch-up. A stop request is honored between
    /// iterations; a step error ends the loop and is returned.
    ///
    /// Only an idle runner can run. Whatever the result, the runner ends
    /// up [`RunnerPhase::Stopped`].
    pub fn run(&mut self) -> Result<(), RunError<E>> {
        if self.phase != RunnerPhase::Idle {
            return Err(RunError::NotIdle { phase: self.phase });
        }

        self.phase = RunnerPhase::Running;
        info!(
            state = self.current.name(),
            period_ms = self.config.loop_period.as_millis() as u64,
            "runner started"
        );

        let result = self.run_loop();

        self.phase = RunnerPhase::Stopped;
        info!(
            state = self.current.name(),
            iterations = self.metadata.iterations,
            failed = result.is_err(),
            "runner stopped"
        );
        result
    }

    fn run_loop(&mut self) -> Result<(), RunError<E>> {
        let period = self.config.loop_period;

        while !self.stop.is_stop_requested() {
            let started = self.clock.now();
            self.step()?;

            if self.stop.is_stop_requested() {
                break;
            }

            let elapsed = self.clock.now().saturating_duration_since(started);
            match period.checked_sub(elapsed) {
                Some(remaining) if !remaining.is_zero() => {
                    trace!(sleep_us = remaining.as_micros() as u64, "pacing");
                    self.clock.sleep(remaining);
                }
                Some(_) => {}
                None => {
                    warn!(
                        state = self.current.name(),
                        elapsed_ms = elapsed.as_millis() as u64,
                        period_ms = period.as_millis() as u64,
                        "iteration overran loop period"
                    );
                }
            }
        }

        Ok(())
    }

    /// Capture the runner's position for a later [`RunnerBuilder::resume_from`].
    pub fn checkpoint(&self) -> Checkpoint<S> {
        Checkpoint::capture(
            self.initial.clone(),
            self.current.clone(),
            self.history.clone(),
            self.metadata.clone(),
        )
    }
}
