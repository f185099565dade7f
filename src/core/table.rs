//! Transition table keyed by `(state, outcome)`.

use super::outcome::Outcome;
use super::state::State;
use std::collections::HashMap;
use std::hash::Hash;

/// Deterministic mapping from `(state, outcome)` to the next state.
///
/// Each pair has at most one entry. A lookup miss means the runner keeps
/// its current state.
///
/// # Example
///
/// ```rust
/// use cadence_fsm::core::{Outcome, TransitionTable};
/// use cadence_fsm::state_enum;
/// use std::io::ErrorKind;
///
/// state_enum! {
///     enum Probe {
///         Start,
///         Retry,
///         Done,
///     }
///     final: [Done]
/// }
///
/// let mut table: TransitionTable<Probe, &str, ErrorKind> = TransitionTable::new();
/// table.insert(Probe::Start, Outcome::Value("ok"), Probe::Done);
/// table.insert(Probe::Start, Outcome::Failure(ErrorKind::TimedOut), Probe::Retry);
///
/// assert_eq!(table.lookup(&Probe::Start, &Outcome::Value("ok")), Some(&Probe::Done));
/// assert_eq!(table.lookup(&Probe::Retry, &Outcome::Value("ok")), None);
/// ```
#[derive(Clone, Debug)]
pub struct TransitionTable<S, V, K> {
    entries: HashMap<S, HashMap<Outcome<V, K>, S>>,
}

impl<S, V, K> Default for TransitionTable<S, V, K> {
    fn default() -> Self {
        Self {
            entries: HashMap::new(),
        }
    }
}

impl<S, V, K> TransitionTable<S, V, K>
where
    S: State,
    V: Eq + Hash,
    K: Eq + Hash,
{
    /// Create an empty table.
    pub fn new() -> Self {
        Self::default()
    }

    /// Register `from --outcome--> to`.
    ///
    /// Returns the target previously registered for the same pair, if any.
    /// The new entry replaces it; callers that need uniqueness treat a
    /// `Some` as a conflict.
    pub fn insert(&mut self, from: S, outcome: Outcome<V, K>, to: S) -> Option<S> {
        self.entries.entry(from).or_default().insert(outcome, to)
    }

    /// Find the next state for `outcome` in `state`.
    pub fn lookup(&self, state: &S, outcome: &Outcome<V, K>) -> Option<&S> {
        self.entries.get(state)?.get(outcome)
    }

    /// Whether `state` has at least one outgoing entry.
    pub fn contains_state(&self, state: &S) -> bool {
        self.entries.get(state).is_some_and(|row| !row.is_empty())
    }

    /// Every state named by the table, as source or target.
    pub fn states(&self) -> impl Iterator<Item = &S> {
        self.entries
            .iter()
            .flat_map(|(from, row)| std::iter::once(from).chain(row.values()))
    }

    /// Outgoing entries of `state`.
    pub fn outcomes(&self, state: &S) -> impl Iterator<Item = (&Outcome<V, K>, &S)> {
        self.entries.get(state).into_iter().flat_map(|row| row.iter())
    }

    /// Total number of `(state, outcome)` entries.
    pub fn len(&self) -> usize {
        self.entries.values().map(HashMap::len).sum()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde::{Deserialize, Serialize};
    use std::collections::HashSet;

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
    }

    #[derive(Clone, Copy, PartialEq, Eq, Hash, Debug)]
    enum Kind {
        Timeout,
    }

    fn sample() -> TransitionTable<TestState, &'static str, Kind> {
        let mut table = TransitionTable::new();
        table.insert(TestState::Start, Outcome::Value("ok"), TestState::Done);
        table.insert(TestState::Start, Outcome::Failure(Kind::Timeout), TestState::Retry);
        table.insert(TestState::Retry, Outcome::Value("ok"), TestState::Done);
        table
    }

    #[test]
    fn lookup_finds_value_and_failure_entries() {
        let table = sample();

        assert_eq!(
            table.lookup(&TestState::Start, &Outcome::Value("ok")),
            Some(&TestState::Done)
        );
        assert_eq!(
            table.lookup(&TestState::Start, &Outcome::Failure(Kind::Timeout)),
            Some(&TestState::Retry)
        );
    }

    #[test]
    fn lookup_misses_unregistered_pairs() {
        let table = sample();

        assert_eq!(table.lookup(&TestState::Start, &Outcome::Value("nope")), None);
        assert_eq!(
            table.lookup(&TestState::Retry, &Outcome::Failure(Kind::Timeout)),
            None
        );
        assert_eq!(table.lookup(&TestState::Done, &Outcome::Value("ok")), None);
    }

    #[test]
    fn insert_reports_displaced_entry() {
        let mut table = sample();

        let previous = table.insert(TestState::Start, Outcome::Value("ok"), TestState::Retry);

        assert_eq!(previous, Some(TestState::Done));
        assert_eq!(table.len(), 3);
    }

    #[test]
    fn contains_state_only_for_sources() {
        let table = sample();

        assert!(table.contains_state(&TestState::Start));
        assert!(table.contains_state(&TestState::Retry));
        assert!(!table.contains_state(&TestState::Done));
    }

    #[test]
    fn states_include_targets() {
        let table = sample();
        let states: HashSet<_> = table.states().copied().collect();

        assert_eq!(states.len(), 3);
        assert!(states.contains(&TestState::Done));
    }

    #[test]
    fn outcomes_lists_rows() {
        let table = sample();

        assert_eq!(table.outcomes(&TestState::Start).count(), 2);
        assert_eq!(table.outcomes(&TestState::Done).count(), 0);
    }

    #[test]
    fn empty_table() {
        let table: TransitionTable<TestState, &str, Kind> = TransitionTable::new();
        assert!(table.is_empty());
        assert!(!table.contains_state(&TestState::Start));
    }
}
