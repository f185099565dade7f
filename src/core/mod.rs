//! Core runner types.
//!
//! This module holds the parts of the runner that do no I/O and keep no
//! clock:
//! - State definitions via the `State` trait
//! - Handler outcomes and failure classification
//! - The `(state, outcome)` transition table
//! - Immutable history tracking

mod history;
mod outcome;
mod state;
mod table;

pub use history::{StateHistory, StateTransition};
pub use outcome::{Failure, Outcome};
pub use state::State;
pub use table::TransitionTable;
