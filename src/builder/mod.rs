//! Builder API for runner construction.
//!
//! This module provides the fluent [`RunnerBuilder`], the configuration
//! errors it reports, and the [`state_enum!`](crate::state_enum) macro for
//! declaring states with minimal boilerplate.

pub mod error;
pub mod macros;
pub mod runner;

pub use error::{ConfigViolation, ConfigurationError};
pub use runner::RunnerBuilder;
