//! State transition history tracking.
//!
//! Records every table hit a runner makes, self-transitions included.
//! Iterations whose outcome has no table entry are not recorded.

use super::state::State;
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::collections::VecDeque;
use std::time::Duration;

/// Record of a single table hit.
///
/// # Example
///
/// ```rust
/// use cadence_fsm::core::StateTransition;
/// use cadence_fsm::state_enum;
/// use chrono::Utc;
///
/// state_enum! {
///     enum Phase {
///         Warmup,
///         Steady,
///     }
/// }
///
/// let transition = StateTransition {
///     from: Phase::Warmup,
///     to: Phase::Steady,
///     trigger: "value \"ready\"".to_string(),
///     timestamp: Utc::now(),
///     iteration: 1,
/// };
/// assert!(!transition.is_self_loop());
/// ```
#[derive(Clone, Debug, Serialize, Deserialize)]
#[serde(bound = "")]
pub struct StateTransition<S: State> {
    /// The state being transitioned from
    pub from: S,
    /// The state being transitioned to
    pub to: S,
    /// Rendering of the outcome that selected this transition
    pub trigger: String,
    /// When the transition occurred
    pub timestamp: DateTime<Utc>,
    /// Runner iteration (1-based) that produced the transition
    pub iteration: u64,
}

impl<S: State> StateTransition<S> {
    pub fn is_self_loop(&self) -> bool {
        self.from == self.to
    }
}

/// Ordered history of state transitions.
///
/// History is immutable - `record` returns a new history with the
/// transition added.
///
/// # Example
///
/// ```rust
/// use cadence_fsm::core::{StateHistory, StateTransition};
/// use cadence_fsm::state_enum;
/// use chrono::Utc;
///
/// state_enum! {
///     enum Step {
///         A,
///         B,
///         C,
///     }
/// }
///
/// let history = StateHistory::new()
///     .record(StateTransition {
///         from: Step::A,
///         to: Step::B,
///         trigger: "value 1".into(),
///         timestamp: Utc::now(),
///         iteration: 1,
///     })
///     .record(StateTransition {
///         from: Step::B,
///         to: Step::C,
///         trigger: "value 2".into(),
///         timestamp: Utc::now(),
///         iteration: 2,
///     });
///
/// assert_eq!(history.get_path(), vec![&Step::A, &Step::B, &Step::C]);
/// ```
#[derive(Clone, Debug, Serialize, Deserialize)]
#[serde(bound = "")]
pub struct StateHistory<S: State> {
    transitions: VecDeque<StateTransition<S>>,
}

impl<S: State> Default for StateHistory<S> {
    fn default() -> Self {
        Self::new()
    }
}

impl<S: State> StateHistory<S> {
    /// Create a new empty history.
    pub fn new() -> Self {
        Self {
            transitions: VecDeque::new(),
        }
    }

    /// Record a transition, returning a new history.
    ///
    /// The existing history is left untouched.
    pub fn record(&self, transition: StateTransition<S>) -> Self {
        let mut transitions = self.transitions.clone();
        transitions.push_back(transition);
        Self { transitions }
    }

    /// Record a transition, keeping at most `limit` of the newest entries.
    ///
    /// A `limit` of zero keeps nothing.
    pub fn record_bounded(&self, transition: StateTransition<S>, limit: usize) -> Self {
        let mut history = self.clone();
        history.push_bounded(transition, limit);
        history
    }

    /// In-place form of `record_bounded`, used by the runner on every hit.
    pub(crate) fn push_bounded(&mut self, transition: StateTransition<S>, limit: usize) {
        self.transitions.push_back(transition);
        while self.transitions.len() > limit {
            self.transitions.pop_front();
        }
    }

    /// Get the path of states traversed.
    ///
    /// Returns the `from` of the oldest retained transition followed by
    /// the `to` of every transition.
    pub fn get_path(&self) -> Vec<&S> {
        let mut path = Vec::new();
        if let Some(first) = self.transitions.front() {
            path.push(&first.from);
        }
        for transition in &self.transitions {
            path.push(&transition.to);
        }
        path
    }

    /// Calculate total duration from first to last transition.
    ///
    /// Returns `None` if there are no transitions.
    pub fn duration(&self) -> Option<Duration> {
        if let (Some(first), Some(last)) = (self.transitions.front(), self.transitions.back()) {
            let duration = last.timestamp.signed_duration_since(first.timestamp);
            duration.to_std().ok()
        } else {
            None
        }
    }

    /// Get the most recent transition.
    pub fn last(&self) -> Option<&StateTransition<S>> {
        self.transitions.back()
    }

    /// Get all transitions, oldest first.
    pub fn transitions(&self) -> &VecDeque<StateTransition<S>> {
        &self.transitions
    }

    pub fn len(&self) -> usize {
        self.transitions.len()
    }

    pub fn is_empty(&self) -> bool {
        self.transitions.is_empty()
    }
}
