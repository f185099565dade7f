//! State trait for runner states.
//!
//! A state is an identifier for one handler. The runner keys handlers and
//! transitions by state value, so states must be hashable and comparable.

use serde::de::DeserializeOwned;
use serde::Serialize;
use std::fmt::Debug;
use std::hash::Hash;

/// Trait for runner states.
///
/// Implementors are usually fieldless enums, one variant per handler.
/// Equality is identity: two states are the same state iff they compare
/// equal.
///
/// # Required Traits
///
/// - `Clone`: states are copied into history and reports
/// - `Eq` + `Hash`: states key the handler map and the transition table
/// - `Debug`: states appear in diagnostics
/// - `Serialize` + `Deserialize`: states are persisted in checkpoints
///
/// # Example
///
/// ```rust
/// use cadence_fsm::core::State;
/// use serde::{Deserialize, Serialize};
///
/// #[derive(Clone, Copy, PartialEq, Eq, Hash, Debug, Serialize, Deserialize)]
/// enum Link {
///     Connecting,
///     Streaming,
///     Closed,
/// }
///
/// impl State for Link {
///     fn name(&self) -> &str {
///         match self {
///             Self::Connecting => "Connecting",
///             Self::Streaming => "Streaming",
///             Self::Closed => "Closed",
///         }
///     }
///
///     fn is_final(&self) -> bool {
///         matches!(self, Self::Closed)
///     }
/// }
/// ```
pub trait State:
    Clone + Eq + Hash + Debug + Serialize + DeserializeOwned + Send + Sync + 'static
{
    /// Get the state's name for display/logging.
    fn name(&self) -> &str;

    /// Check if this is a final (terminal) state.
    ///
    /// A runner configured with `stop_on_final` stops itself once it enters
    /// a final state. Default implementation returns `false`.
    fn is_final(&self) -> bool {
        false
    }
}
