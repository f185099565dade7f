//! Configuration errors reported when building a runner.

use thiserror::Error;

/// One problem found while validating a runner configuration.
#[derive(Debug, Clone, Error, PartialEq, Eq)]
pub enum ConfigViolation {
    #[error("Initial state not specified. Call .initial(state) before .build()")]
    MissingInitialState,

    #[error("Loop period not specified. Call .loop_period(duration) or .config(config)")]
    MissingLoopPeriod,

    #[error("Loop period must be greater than zero")]
    NonPositivePeriod,

    #[error("Initial state '{state}' has no outgoing transition")]
    InitialStateNotInTable { state: String },

    #[error("Resumed state '{state}' does not appear in the transition table")]
    ResumedStateNotInTable { state: String },

    #[error("State '{state}' has no handler")]
    MissingHandler { state: String },

    #[error("State '{state}' has more than one handler")]
    DuplicateHandler { state: String },

    #[error("State '{state}' has more than one transition for {outcome}")]
    DuplicateTransition { state: String, outcome: String },
}

/// Every violation that kept a runner from being built.
#[derive(Debug, Clone, Error, PartialEq, Eq)]
#[error("Invalid runner configuration: {}", summarize(.violations))]
pub struct ConfigurationError {
    violations: Vec<ConfigViolation>,
}

fn summarize(violations: &[ConfigViolation]) -> String {
    violations
        .iter()
        .map(ToString::to_string)
        .collect::<Vec<_>>()
        .join("; ")
}

impl ConfigurationError {
    pub fn new(violations: Vec<ConfigViolation>) -> Self {
        Self { violations }
    }

    pub fn violations(&self) -> &[ConfigViolation] {
        &self.violations
    }

    pub fn contains(&self, violation: &ConfigViolation) -> bool {
        self.violations.contains(violation)
    }
}
