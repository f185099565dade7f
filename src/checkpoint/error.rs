//! Errors raised while saving or restoring a runner's position.

use thiserror::Error;

/// Why a checkpoint could not be written or accepted.
#[derive(Debug, Error)]
pub enum CheckpointError {
    /// The position could not be written in `format` ("json" or "binary")
    #[error("Could not encode checkpoint as {format}: {message}")]
    Encode {
        format: &'static str,
        message: String,
    },

    /// The input is not a readable `format` checkpoint
    #[error("Could not decode {format} checkpoint: {message}")]
    Decode {
        format: &'static str,
        message: String,
    },

    #[error("Checkpoint format version {found} is not supported (expected {supported})")]
    UnsupportedVersion { found: u32, supported: u32 },

    /// The last recorded transition does not lead to the saved state
    #[error("Checkpoint history ends in '{history_state}' but the runner was in '{current_state}'")]
    HistoryMismatch {
        history_state: String,
        current_state: String,
    },
}
