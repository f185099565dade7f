//! Checkpoint and resume for runners.
//!
//! A runner forgets its position when the process exits. A checkpoint
//! captures that position (current state, history, counters) so a rebuilt
//! runner can pick up where the old one stopped. Handlers and transitions
//! are code and are not part of a checkpoint; they are registered again on
//! the rebuilt runner.

use crate::core::{State, StateHistory};
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::collections::HashMap;
use tracing::debug;
use uuid::Uuid;

pub mod error;

pub use error::CheckpointError;

/// Version identifier for checkpoint format
pub const CHECKPOINT_VERSION: u32 = 1;

/// Counters tracked by a runner
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct RunnerMetadata {
    /// When the runner (or the runner it was resumed from) was created
    pub created_at: DateTime<Utc>,

    /// Start of the most recent iteration
    pub updated_at: DateTime<Utc>,

    /// Total `step()` calls
    pub iterations: u64,

    /// Handler invocations per state name
    pub visits: HashMap<String, u64>,

    /// Rendering of the most recent handler outcome, hit or miss
    #[serde(default)]
    pub last_outcome: Option<String>,
}

impl Default for RunnerMetadata {
    fn default() -> Self {
        let now = Utc::now();
        Self {
            created_at: now,
            updated_at: now,
            iterations: 0,
            visits: HashMap::new(),
            last_outcome: None,
        }
    }
}

impl RunnerMetadata {
    /// Count an iteration in `state` and return its 1-based number.
    pub(crate) fn begin_iteration(&mut self, state: &str) -> u64 {
        self.iterations += 1;
        self.updated_at = Utc::now();
        *self.visits.entry(state.to_string()).or_default() += 1;
        self.iterations
    }
}

/// Serializable snapshot of a runner's position.
#[derive(Clone, Debug, Serialize, Deserialize)]
#[serde(bound = "")]
pub struct Checkpoint<S: State> {
    /// Checkpoint format version
    pub version: u32,

    /// Unique checkpoint identifier
    pub id: String,

    /// When checkpoint was created
    pub timestamp: DateTime<Utc>,

    /// State the runner was built with or resumed into
    pub initial_state: S,

    /// State the runner was in when captured
    pub current_state: S,

    /// Transition history at capture time
    pub history: StateHistory<S>,

    /// Runner counters
    pub metadata: RunnerMetadata,
}

impl<S: State> Checkpoint<S> {
    pub(crate) fn capture(
        initial_state: S,
        current_state: S,
        history: StateHistory<S>,
        metadata: RunnerMetadata,
    ) -> Self {
        let checkpoint = Self {
            version: CHECKPOINT_VERSION,
            id: Uuid::new_v4().to_string(),
            timestamp: Utc::now(),
            initial_state,
            current_state,
            history,
            metadata,
        };
        debug!(
            id = %checkpoint.id,
            state = checkpoint.current_state.name(),
            iterations = checkpoint.metadata.iterations,
            "checkpoint captured"
        );
        checkpoint
    }

    /// Encode as pretty-printed JSON.
    pub fn to_json(&self) -> Result<String, CheckpointError> {
        serde_json::to_string_pretty(self).map_err(|e| CheckpointError::Encode {
            format: "json",
            message: e.to_string(),
        })
    }

    /// Decode from JSON and validate.
    pub fn from_json(json: &str) -> Result<Self, CheckpointError> {
        let checkpoint: Self = serde_json::from_str(json).map_err(|e| CheckpointError::Decode {
            format: "json",
            message: e.to_string(),
        })?;
        checkpoint.validate()?;
        Ok(checkpoint)
    }

    /// Encode in the compact binary format.
    pub fn to_bytes(&self) -> Result<Vec<u8>, CheckpointError> {
        bincode::serialize(self).map_err(|e| CheckpointError::Encode {
            format: "binary",
            message: e.to_string(),
        })
    }

    /// Decode from the compact binary format and validate.
    pub fn from_bytes(bytes: &[u8]) -> Result<Self, CheckpointError> {
        let checkpoint: Self = bincode::deserialize(bytes).map_err(|e| CheckpointError::Decode {
            format: "binary",
            message: e.to_string(),
        })?;
        checkpoint.validate()?;
        Ok(checkpoint)
    }

    /// Check version and internal consistency.
    pub fn validate(&self) -> Result<(), CheckpointError> {
        if self.version != CHECKPOINT_VERSION {
            return Err(CheckpointError::UnsupportedVersion {
                found: self.version,
                supported: CHECKPOINT_VERSION,
            });
        }

        if let Some(last) = self.history.last() {
            if last.to != self.current_state {
                return Err(CheckpointError::HistoryMismatch {
                    history_state: last.to.name().to_string(),
                    current_state: self.current_state.name().to_string(),
                });
            }
        }

        Ok(())
    }
}
