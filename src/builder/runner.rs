//! Builder for constructing state runners.

use crate::builder::error::{ConfigViolation, ConfigurationError};
use crate::checkpoint::{Checkpoint, RunnerMetadata};
use crate::core::{Failure, Outcome, State, StateHistory, TransitionTable};
use crate::runner::{
    Clock, Handler, RunnerConfig, RunnerParts, StateRunner, StopHandle, SystemClock,
    DEFAULT_HISTORY_LIMIT,
};
use std::collections::{HashMap, HashSet};
use std::fmt::Debug;
use std::hash::Hash;
use std::time::Duration;
use stillwater::validation::Validation;
use stillwater::NonEmptyVec;
use tracing::debug;

type Checks = Validation<(), NonEmptyVec<ConfigViolation>>;

fn check(violation: Option<ConfigViolation>) -> Checks {
    match violation {
        Some(violation) => Validation::fail(violation),
        None => Validation::success(()),
    }
}

/// Builder for constructing runners with a fluent API.
///
/// Problems are not reported as they are introduced; `build()` validates
/// the whole configuration and reports every violation at once.
pub struct RunnerBuilder<S, V, E, Env = (), C = SystemClock>
where
    S: State,
    E: Failure,
{
    initial: Option<S>,
    resuming: bool,
    handlers: HashMap<S, Handler<V, E, Env>>,
    table: TransitionTable<S, V, E::Kind>,
    conflicts: Vec<ConfigViolation>,
    loop_period: Option<Duration>,
    strict: bool,
    stop_on_final: bool,
    history_limit: usize,
    clock: C,
    env: Env,
    stop: StopHandle,
    history: StateHistory<S>,
    metadata: RunnerMetadata,
}

impl<S, V, E> RunnerBuilder<S, V, E>
where
    S: State,
    V: Clone + Eq + Hash + Debug,
    E: Failure,
{
    /// Create a builder whose handlers take no context.
    pub fn new() -> Self {
        Self::with_context(())
    }
}

impl<S, V, E> Default for RunnerBuilder<S, V, E>
where
    S: State,
    V: Clone + Eq + Hash + Debug,
    E: Failure,
{
    fn default() -> Self {
        Self::new()
    }
}

impl<S, V, E, Env> RunnerBuilder<S, V, E, Env>
where
    S: State,
    V: Clone + Eq + Hash + Debug,
    E: Failure,
{
    /// Create a builder whose runner owns `env` and lends it to every
    /// handler call.
    pub fn with_context(env: Env) -> Self {
        Self {
            initial: None,
            resuming: false,
            handlers: HashMap::new(),
            table: TransitionTable::new(),
            conflicts: Vec::new(),
            loop_period: None,
            strict: false,
            stop_on_final: false,
            history_limit: DEFAULT_HISTORY_LIMIT,
            clock: SystemClock,
            env,
            stop: StopHandle::default(),
            history: StateHistory::new(),
            metadata: RunnerMetadata::default(),
        }
    }
}

impl<S, V, E, Env, C> RunnerBuilder<S, V, E, Env, C>
where
    S: State,
    V: Clone + Eq + Hash + Debug,
    E: Failure,
    C: Clock,
{
    /// Set the initial state (required).
    pub fn initial(mut self, state: S) -> Self {
        self.initial = Some(state);
        self.resuming = false;
        self
    }

    /// Bind the handler for `state` (required for every state the runner
    /// can reach).
    pub fn handler<F>(self, state: S, handler: F) -> Self
    where
        F: FnMut(&mut Env) -> Result<V, E> + Send + 'static,
    {
        self.boxed_handler(state, Box::new(handler))
    }

    /// Bind several pre-boxed handlers at once.
    pub fn handlers<I>(self, handlers: I) -> Self
    where
        I: IntoIterator<Item = (S, Handler<V, E, Env>)>,
    {
        handlers
            .into_iter()
            .fold(self, |builder, (state, handler)| {
                builder.boxed_handler(state, handler)
            })
    }

    fn boxed_handler(mut self, state: S, handler: Handler<V, E, Env>) -> Self {
        if self.handlers.contains_key(&state) {
            self.conflicts.push(ConfigViolation::DuplicateHandler {
                state: state.name().to_string(),
            });
        }
        self.handlers.insert(state, handler);
        self
    }

    /// Register `from --outcome--> to`.
    pub fn transition(mut self, from: S, outcome: Outcome<V, E::Kind>, to: S) -> Self {
        let name = from.name().to_string();
        let rendered = outcome.to_string();
        if self.table.insert(from, outcome, to).is_some() {
            self.conflicts.push(ConfigViolation::DuplicateTransition {
                state: name,
                outcome: rendered,
            });
        }
        self
    }

    /// Move to `to` when the handler of `from` returns `value`.
    pub fn on_value(self, from: S, value: V, to: S) -> Self {
        self.transition(from, Outcome::Value(value), to)
    }

    /// Move to `to` when the handler of `from` fails with `kind`. Such
    /// failures are consumed and never surface from `step()`.
    pub fn on_failure(self, from: S, kind: E::Kind, to: S) -> Self {
        self.transition(from, Outcome::Failure(kind), to)
    }

    /// Merge every entry of a prepared table.
    pub fn transitions(self, table: TransitionTable<S, V, E::Kind>) -> Self {
        let mut entries = Vec::with_capacity(table.len());
        for from in table.states().collect::<HashSet<_>>() {
            for (outcome, to) in table.outcomes(from) {
                entries.push((from.clone(), outcome.clone(), to.clone()));
            }
        }
        entries
            .into_iter()
            .fold(self, |builder, (from, outcome, to)| {
                builder.transition(from, outcome, to)
            })
    }

    /// Target interval between iteration starts (required, non-zero).
    pub fn loop_period(mut self, period: Duration) -> Self {
        self.loop_period = Some(period);
        self
    }

    /// Fail steps whose returned value has no transition.
    pub fn strict(mut self, strict: bool) -> Self {
        self.strict = strict;
        self
    }

    /// Stop `run()` once a final state is entered.
    pub fn stop_on_final(mut self, stop: bool) -> Self {
        self.stop_on_final = stop;
        self
    }

    pub fn history_limit(mut self, limit: usize) -> Self {
        self.history_limit = limit;
        self
    }

    /// Apply every field of a [`RunnerConfig`].
    pub fn config(mut self, config: RunnerConfig) -> Self {
        self.loop_period = Some(config.loop_period);
        self.strict = config.strict;
        self.stop_on_final = config.stop_on_final;
        self.history_limit = config.history_limit;
        self
    }

    /// Share a stop handle created before the runner, e.g. one already
    /// captured by a handler.
    pub fn stop_handle(mut self, stop: StopHandle) -> Self {
        self.stop = stop;
        self
    }

    /// Replace the time source.
    pub fn clock<C2: Clock>(self, clock: C2) -> RunnerBuilder<S, V, E, Env, C2> {
        RunnerBuilder {
            initial: self.initial,
            resuming: self.resuming,
            handlers: self.handlers,
            table: self.table,
            conflicts: self.conflicts,
            loop_period: self.loop_period,
            strict: self.strict,
            stop_on_final: self.stop_on_final,
            history_limit: self.history_limit,
            clock,
            env: self.env,
            stop: self.stop,
            history: self.history,
            metadata: self.metadata,
        }
    }

    /// Continue from a checkpoint: start in its current state with its
    /// history and counters.
    ///
    /// The resumed state only has to be named by the table, so a runner
    /// stopped in a sink or final state can be restored.
    pub fn resume_from(mut self, checkpoint: &Checkpoint<S>) -> Self {
        debug!(
            id = %checkpoint.id,
            state = checkpoint.current_state.name(),
            "resuming from checkpoint"
        );
        self.initial = Some(checkpoint.current_state.clone());
        self.resuming = true;
        self.history = checkpoint.history.clone();
        self.metadata = checkpoint.metadata.clone();
        self
    }

    /// Check the configuration, collecting every violation.
    pub fn validate(&self) -> Validation<(), NonEmptyVec<ConfigViolation>> {
        let mut checks: Vec<Checks> = Vec::new();

        checks.push(check(match self.loop_period {
            None => Some(ConfigViolation::MissingLoopPeriod),
            Some(period) if period.is_zero() => Some(ConfigViolation::NonPositivePeriod),
            Some(_) => None,
        }));

        match &self.initial {
            None => checks.push(check(Some(ConfigViolation::MissingInitialState))),
            Some(initial) if self.resuming => {
                if !self.table.states().any(|state| state == initial) {
                    checks.push(check(Some(ConfigViolation::ResumedStateNotInTable {
                        state: initial.name().to_string(),
                    })));
                }
            }
            Some(initial) if !self.table.contains_state(initial) => {
                checks.push(check(Some(ConfigViolation::InitialStateNotInTable {
                    state: initial.name().to_string(),
                })));
            }
            Some(_) => {}
        }

        let mut unbound: Vec<&S> = self
            .table
            .states()
            .chain(self.initial.iter())
            .filter(|state| !self.handlers.contains_key(*state))
            .collect::<HashSet<_>>()
            .into_iter()
            .collect();
        unbound.sort_by(|a, b| a.name().cmp(b.name()));
        for state in unbound {
            checks.push(check(Some(ConfigViolation::MissingHandler {
                state: state.name().to_string(),
            })));
        }

        for conflict in &self.conflicts {
            checks.push(check(Some(conflict.clone())));
        }

        Validation::all_vec(checks).map(|_| ())
    }

    /// Build the runner.
    /// Returns every configuration violation if any check fails.
    pub fn build(self) -> Result<StateRunner<S, V, E, Env, C>, ConfigurationError> {
        if let Validation::Failure(violations) = self.validate() {
            return Err(ConfigurationError::new(violations.iter().cloned().collect()));
        }

        let Some(initial) = self.initial else {
            return Err(ConfigurationError::new(vec![
                ConfigViolation::MissingInitialState,
            ]));
        };
        let Some(loop_period) = self.loop_period else {
            return Err(ConfigurationError::new(vec![ConfigViolation::MissingLoopPeriod]));
        };

        debug!(
            initial = initial.name(),
            transitions = self.table.len(),
            handlers = self.handlers.len(),
            "runner built"
        );

        Ok(StateRunner::from_parts(RunnerParts {
            initial,
            handlers: self.handlers,
            table: self.table,
            config: RunnerConfig {
                loop_period,
                strict: self.strict,
                stop_on_final: self.stop_on_final,
                history_limit: self.history_limit,
            },
            clock: self.clock,
            env: self.env,
            stop: self.stop,
            history: self.history,
            metadata: self.metadata,
        }))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde::{Deserialize, Serialize};
    use std::io;

    #[derive(Clone, Copy, PartialEq, Eq, Hash, Debug, Serialize, Deserialize)]
    enum TestState {
        Start,
        Retry,
        Done,
    }

    impl State for TestState {
        fn name(&self) -> &str {
            match self {
                Self::Start => "Start",
                Self::Retry => "Retry",
                Self::Done => "Done",
            }
        }

        fn is_final(&self) -> bool {
            matches!(self, Self::Done)
        }
    }

    type Builder = RunnerBuilder<TestState, &'static str, io::Error>;

    fn complete() -> Builder {
        Builder::new()
            .initial(TestState::Start)
            .loop_period(Duration::from_millis(50))
            .handler(TestState::Start, |_| Ok("ok"))
            .handler(TestState::Retry, |_| Ok("ok"))
            .handler(TestState::Done, |_| Ok("ok"))
            .on_value(TestState::Start, "ok", TestState::Done)
            .on_failure(TestState::Start, io::ErrorKind::TimedOut, TestState::Retry)
            .on_value(TestState::Retry, "ok", TestState::Done)
    }

    #[test]
    fn complete_configuration_builds() {
        let runner = complete().build().unwrap();

        assert_eq!(runner.current_state(), &TestState::Start);
        assert_eq!(runner.config().loop_period, Duration::from_millis(50));
        assert_eq!(runner.transitions().len(), 3);
    }

    #[test]
    fn builder_validates_required_fields() {
        let error = Builder::new().build().err().expect("config error");

        assert!(error.contains(&ConfigViolation::MissingInitialState));
        assert!(error.contains(&ConfigViolation::MissingLoopPeriod));
    }

    #[test]
    fn zero_period_is_rejected() {
        let error = complete().loop_period(Duration::ZERO).build().err().expect("config error");

        assert_eq!(error.violations(), &[ConfigViolation::NonPositivePeriod]);
    }

    #[test]
    fn initial_state_must_have_transitions() {
        let error = complete().initial(TestState::Done).build().err().expect("config error");

        assert_eq!(
            error.violations(),
            &[ConfigViolation::InitialStateNotInTable {
                state: "Done".to_string()
            }]
        );
    }

    #[test]
    fn every_reachable_state_needs_a_handler() {
        let error = Builder::new()
            .initial(TestState::Start)
            .loop_period(Duration::from_millis(50))
            .handler(TestState::Start, |_| Ok("ok"))
            .on_value(TestState::Start, "ok", TestState::Done)
            .on_failure(TestState::Start, io::ErrorKind::TimedOut, TestState::Retry)
            .build()
            .err().expect("config error");

        assert_eq!(
            error.violations(),
            &[
                ConfigViolation::MissingHandler {
                    state: "Done".to_string()
                },
                ConfigViolation::MissingHandler {
                    state: "Retry".to_string()
                },
            ]
        );
    }

    #[test]
    fn duplicate_pairs_are_rejected() {
        let error = complete()
            .on_value(TestState::Start, "ok", TestState::Retry)
            .handler(TestState::Done, |_| Ok("again"))
            .build()
            .err().expect("config error");

        assert!(error.contains(&ConfigViolation::DuplicateTransition {
            state: "Start".to_string(),
            outcome: "value \"ok\"".to_string(),
        }));
        assert!(error.contains(&ConfigViolation::DuplicateHandler {
            state: "Done".to_string()
        }));
    }

    #[test]
    fn violations_accumulate() {
        let error = Builder::new()
            .initial(TestState::Retry)
            .loop_period(Duration::ZERO)
            .build()
            .err().expect("config error");

        assert_eq!(error.violations().len(), 3);
        assert!(error.contains(&ConfigViolation::NonPositivePeriod));
        assert!(error.contains(&ConfigViolation::InitialStateNotInTable {
            state: "Retry".to_string()
        }));
        assert!(error.contains(&ConfigViolation::MissingHandler {
            state: "Retry".to_string()
        }));
    }

    #[test]
    fn config_applies_all_fields() {
        let mut config = RunnerConfig::new(Duration::from_millis(20));
        config.strict = true;
        config.stop_on_final = true;
        config.history_limit = 4;

        let runner = complete().config(config.clone()).build().unwrap();

        assert_eq!(runner.config(), &config);
    }

    #[test]
    fn prepared_table_is_merged() {
        let mut table = TransitionTable::new();
        table.insert(TestState::Start, Outcome::Value("ok"), TestState::Done);
        table.insert(
            TestState::Start,
            Outcome::Failure(io::ErrorKind::TimedOut),
            TestState::Retry,
        );

        let runner = Builder::new()
            .initial(TestState::Start)
            .loop_period(Duration::from_millis(50))
            .handler(TestState::Start, |_| Ok("ok"))
            .handler(TestState::Retry, |_| Ok("ok"))
            .handler(TestState::Done, |_| Ok("ok"))
            .transitions(table)
            .build()
            .unwrap();

        assert_eq!(runner.transitions().len(), 2);
    }

    #[test]
    fn resume_from_checkpoint_starts_in_captured_state() {
        let mut first = Builder::new()
            .initial(TestState::Start)
            .loop_period(Duration::from_millis(50))
            .handler(TestState::Start, |_| {
                Err(io::Error::new(io::ErrorKind::TimedOut, "slow"))
            })
            .handler(TestState::Retry, |_| Ok("ok"))
            .handler(TestState::Done, |_| Ok("ok"))
            .on_value(TestState::Start, "ok", TestState::Done)
            .on_failure(TestState::Start, io::ErrorKind::TimedOut, TestState::Retry)
            .on_value(TestState::Retry, "ok", TestState::Done)
            .build()
            .unwrap();
        first.step().unwrap();
        let checkpoint = first.checkpoint();

        let resumed = complete().resume_from(&checkpoint).build().unwrap();

        assert_eq!(resumed.current_state(), &TestState::Retry);
        assert_eq!(resumed.initial_state(), &TestState::Retry);
        assert_eq!(resumed.iterations(), 1);
        assert_eq!(resumed.history().len(), 1);
    }

    #[test]
    fn resume_into_final_state_builds() {
        let mut first = complete().stop_on_final(true).build().unwrap();
        first.run().unwrap();
        assert_eq!(first.current_state(), &TestState::Done);
        let checkpoint = first.checkpoint();

        let resumed = complete().resume_from(&checkpoint).build().unwrap();

        assert_eq!(resumed.current_state(), &TestState::Done);
        assert_eq!(resumed.history().len(), 1);
    }

    #[test]
    fn fresh_build_still_requires_outgoing_transition() {
        let mut first = complete().build().unwrap();
        first.step().unwrap();
        let checkpoint = first.checkpoint();

        let error = complete()
            .resume_from(&checkpoint)
            .initial(TestState::Done)
            .build()
            .err().expect("config error");

        assert!(error.contains(&ConfigViolation::InitialStateNotInTable {
            state: "Done".to_string()
        }));
    }

    #[test]
    fn resumed_state_must_be_named_by_table() {
        let mut first = complete().build().unwrap();
        first.step().unwrap();
        let checkpoint = first.checkpoint();

        let error = Builder::new()
            .loop_period(Duration::from_millis(50))
            .handler(TestState::Start, |_| Ok("ok"))
            .handler(TestState::Retry, |_| Ok("ok"))
            .on_value(TestState::Start, "ok", TestState::Retry)
            .resume_from(&checkpoint)
            .build()
            .err().expect("config error");

        assert_eq!(
            error.violations(),
            &[
                ConfigViolation::ResumedStateNotInTable {
                    state: "Done".to_string()
                },
                ConfigViolation::MissingHandler {
                    state: "Done".to_string()
                },
            ]
        );
    }
}
