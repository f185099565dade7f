//! Handler outcomes and failure classification.
//!
//! A handler returns `Result<V, E>`. The runner folds both arms into an
//! [`Outcome`] so a single table lookup covers returned values and
//! failure kinds alike.

use serde::{Deserialize, Serialize};
use std::fmt::{self, Debug};
use std::hash::Hash;

/// Classifies a handler failure by kind.
///
/// The kind, not the error value, is what the transition table is keyed
/// on. Two failures of the same kind always take the same transition.
///
/// # Example
///
/// ```rust
/// use cadence_fsm::core::Failure;
///
/// #[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
/// enum FetchKind {
///     Timeout,
///     Refused,
/// }
///
/// #[derive(Debug, thiserror::Error)]
/// enum FetchError {
///     #[error("timed out after {0}ms")]
///     Timeout(u64),
///     #[error("connection refused")]
///     Refused,
/// }
///
/// impl Failure for FetchError {
///     type Kind = FetchKind;
///
///     fn kind(&self) -> FetchKind {
///         match self {
///             Self::Timeout(_) => FetchKind::Timeout,
///             Self::Refused => FetchKind::Refused,
///         }
///     }
/// }
///
/// assert_eq!(FetchError::Timeout(30).kind(), FetchKind::Timeout);
/// ```
pub trait Failure: std::error::Error + 'static {
    /// Tag describing the class of a failure.
    type Kind: Clone + Eq + Hash + Debug;

    /// Classify this failure.
    fn kind(&self) -> Self::Kind;
}

impl Failure for std::io::Error {
    type Kind = std::io::ErrorKind;

    fn kind(&self) -> std::io::ErrorKind {
        std::io::Error::kind(self)
    }
}

/// What a handler produced, reduced to a transition table key.
#[derive(Clone, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum Outcome<V, K> {
    /// The handler returned this value
    Value(V),

    /// The handler failed with this kind
    Failure(K),
}

impl<V, K> Outcome<V, K> {
    /// Build the key for a handler result without consuming the error.
    pub fn classify<E>(result: &Result<V, E>) -> Self
    where
        V: Clone,
        E: Failure<Kind = K>,
    {
        match result {
            Ok(value) => Outcome::Value(value.clone()),
            Err(error) => Outcome::Failure(error.kind()),
        }
    }

    pub fn is_failure(&self) -> bool {
        matches!(self, Outcome::Failure(_))
    }
}

impl<V: Debug, K: Debug> fmt::Display for Outcome<V, K> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Outcome::Value(value) => write!(f, "value {value:?}"),
            Outcome::Failure(kind) => write!(f, "failure {kind:?}"),
        }
    }
}
