//! Cadence: a table-driven state runner with a fixed loop cadence
//!
//! A runner owns a current state, one handler per state, and a transition
//! table keyed by `(state, outcome)`. Each iteration it calls the current
//! state's handler, looks the outcome up in the table, moves to the mapped
//! state (or stays put on a miss), and sleeps whatever is left of the loop
//! period.
//!
//! # Core Concepts
//!
//! - **State**: an enum implementing the `State` trait, one variant per handler
//! - **Outcome**: either a value the handler returned or the kind of failure
//!   it returned; both key the transition table
//! - **Registered failures**: failure kinds with a table entry are consumed
//!   as transitions; any other failure ends the step with an error
//! - **Cadence**: iterations start `loop_period` apart; overruns are not
//!   caught up
//!
//! # Example
//!
//! ```rust
//! use cadence_fsm::builder::RunnerBuilder;
//! use cadence_fsm::runner::FakeClock;
//! use cadence_fsm::state_enum;
//! use std::io;
//! use std::time::Duration;
//!
//! state_enum! {
//!     enum Fetch {
//!         Start,
//!         Retry,
//!         Done,
//!     }
//!     final: [Done]
//! }
//!
//! let mut runner = RunnerBuilder::new()
//!     .initial(Fetch::Start)
//!     .loop_period(Duration::from_millis(100))
//!     .clock(FakeClock::new())
//!     .handler(Fetch::Start, |_| {
//!         Err::<&str, _>(io::Error::new(io::ErrorKind::TimedOut, "no reply"))
//!     })
//!     .handler(Fetch::Retry, |_| Ok("ok"))
//!     .handler(Fetch::Done, |_| Ok("ok"))
//!     .on_value(Fetch::Start, "ok", Fetch::Done)
//!     .on_failure(Fetch::Start, io::ErrorKind::TimedOut, Fetch::Retry)
//!     .on_value(Fetch::Retry, "ok", Fetch::Done)
//!     .build()
//!     .unwrap();
//!
//! runner.step().unwrap();
//! assert_eq!(runner.current_state(), &Fetch::Retry);
//! runner.step().unwrap();
//! assert_eq!(runner.current_state(), &Fetch::Done);
//! ```

pub mod builder;
pub mod checkpoint;
pub mod core;
pub mod runner;

// Re-export commonly used types
pub use builder::{ConfigViolation, ConfigurationError, RunnerBuilder};
pub use checkpoint::{Checkpoint, CheckpointError};
pub use crate::core::{Failure, Outcome, State, StateHistory, StateTransition, TransitionTable};
pub use runner::{
    Clock, FakeClock, RunError, RunnerConfig, RunnerPhase, StateRunner, StepError, StepOutcome,
    StepReport, StopHandle, SystemClock,
};
