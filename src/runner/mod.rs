//! The paced run loop around the pure core.
//!
//! This is where handlers are invoked and where the runner touches the
//! clock. Everything here is single-threaded except the stop signal.
//!
//! # Key Concepts
//!
//! - **Step**: one handler call followed by one table lookup
//! - **Run**: steps at a fixed cadence until a stop request is observed
//! - **Clock**: injectable time source, so pacing can be tested exactly

mod clock;
mod config;
mod error;
mod machine;

pub use clock::{Clock, FakeClock, SystemClock};
pub use config::{RunnerConfig, DEFAULT_HISTORY_LIMIT};
pub use error::{RunError, StepError};
pub(crate) use machine::RunnerParts;
pub use machine::{Handler, RunnerPhase, StateRunner, StepOutcome, StepReport, StopHandle};
