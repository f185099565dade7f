//! Runner configuration.

use serde::{Deserialize, Serialize};
use std::time::Duration;

/// Default number of transitions a runner keeps in its history.
pub const DEFAULT_HISTORY_LIMIT: usize = 1024;

/// Tunables fixed at construction time.
///
/// Only `loop_period` is required when deserializing; the remaining fields
/// fall back to their defaults.
///
/// # Example
///
/// ```rust
/// use cadence_fsm::runner::RunnerConfig;
/// use std::time::Duration;
///
/// let config = RunnerConfig::from_json(
///     r#"{ "loop_period": { "secs": 0, "nanos": 250000000 }, "strict": true }"#,
/// )
/// .unwrap();
///
/// assert_eq!(config.loop_period, Duration::from_millis(250));
/// assert!(config.strict);
/// assert!(!config.stop_on_final);
/// ```
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct RunnerConfig {
    /// Target interval between the starts of consecutive iterations
    pub loop_period: Duration,

    /// Fail a step whose returned value has no transition instead of
    /// retaining the current state
    #[serde(default)]
    pub strict: bool,

    /// Stop `run()` once a final state is entered
    #[serde(default)]
    pub stop_on_final: bool,

    /// Maximum number of transitions kept in history
    #[serde(default = "default_history_limit")]
    pub history_limit: usize,
}

fn default_history_limit() -> usize {
    DEFAULT_HISTORY_LIMIT
}

impl RunnerConfig {
    pub fn new(loop_period: Duration) -> Self {
        Self {
            loop_period,
            strict: false,
            stop_on_final: false,
            history_limit: DEFAULT_HISTORY_LIMIT,
        }
    }

    /// Parse a configuration from JSON.
    pub fn from_json(json: &str) -> Result<Self, serde_json::Error> {
        serde_json::from_str(json)
    }

    pub fn to_json(&self) -> Result<String, serde_json::Error> {
        serde_json::to_string_pretty(self)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn new_uses_permissive_defaults() {
        let config = RunnerConfig::new(Duration::from_millis(100));

        assert_eq!(config.loop_period, Duration::from_millis(100));
        assert!(!config.strict);
        assert!(!config.stop_on_final);
        assert_eq!(config.history_limit, DEFAULT_HISTORY_LIMIT);
    }

    #[test]
    fn from_json_fills_defaults() {
        let config = RunnerConfig::from_json(r#"{ "loop_period": { "secs": 2, "nanos": 0 } }"#)
            .unwrap();

        assert_eq!(config, RunnerConfig::new(Duration::from_secs(2)));
    }

    #[test]
    fn from_json_requires_loop_period() {
        assert!(RunnerConfig::from_json(r#"{ "strict": true }"#).is_err());
    }

    #[test]
    fn json_round_trip_preserves_fields() {
        let mut config = RunnerConfig::new(Duration::from_millis(40));
        config.stop_on_final = true;
        config.history_limit = 8;

        let parsed = RunnerConfig::from_json(&config.to_json().unwrap()).unwrap();

        assert_eq!(parsed, config);
    }
}
