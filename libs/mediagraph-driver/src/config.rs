//! Driver tuning constants

use std::time::Duration;

use serde::{Deserialize, Serialize};

use crate::time::GraphTime;

/// Ceiling on any single condition-variable wait, in milliseconds.
///
/// A paced driver wakes up at least once a minute even when the computed
/// timeout is pathological, which also keeps the timeout inside narrow
/// timer representations. Fixed rather than configurable.
pub const MAX_WAIT_TIMEOUT_MS: u32 = 60 * 1000;

/// Tuning parameters for a paced driver.
///
/// Both values are fixed properties of the deployment, not quantities
/// derived at runtime.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct DriverConfig {
    /// Target period between iterations, in milliseconds. The wall-clock
    /// driver sleeps between iterations so that they land roughly this far
    /// apart.
    pub target_period_ms: u32,

    /// How far past each iteration's end the engine keeps state precomputed,
    /// in milliseconds. This is the buffering depth that absorbs clock
    /// jitter and load spikes before an underrun becomes observable.
    pub lookahead_ms: u32,
}

impl Default for DriverConfig {
    fn default() -> Self {
        Self {
            target_period_ms: 10,
            lookahead_ms: 30,
        }
    }
}

impl DriverConfig {
    pub fn lookahead(&self) -> GraphTime {
        GraphTime::from_millis(self.lookahead_ms as i64)
    }

    pub fn target_period(&self) -> Duration {
        Duration::from_millis(self.target_period_ms as u64)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_defaults() {
        let config = DriverConfig::default();
        assert_eq!(config.target_period_ms, 10);
        assert_eq!(config.lookahead_ms, 30);
        assert_eq!(config.lookahead(), GraphTime::from_millis(30));
        assert_eq!(config.target_period(), Duration::from_millis(10));
    }

    #[test]
    fn test_serde_roundtrip() {
        let config = DriverConfig {
            target_period_ms: 5,
            lookahead_ms: 20,
        };
        let json = serde_json::to_string(&config).unwrap();
        let back: DriverConfig = serde_json::from_str(&json).unwrap();
        assert_eq!(back.target_period_ms, 5);
        assert_eq!(back.lookahead_ms, 20);
    }
}
