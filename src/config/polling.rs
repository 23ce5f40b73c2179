//! Telemetry polling configuration

use serde::{Deserialize, Serialize};
use std::time::Duration;

/// Controls the live telemetry poll loop.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct PollingConfig {
    /// Milliseconds between scheduled polls
    pub interval_ms: u64,
    /// Consecutive polls without live data before the loop suspends itself
    pub failure_ceiling: u32,
    /// Number of history entries requested per poll
    pub history_limit: u32,
    /// Whether the loop starts with auto-refresh enabled
    pub auto_refresh: bool,
}

impl Default for PollingConfig {
    fn default() -> Self {
        Self {
            interval_ms: 2000,
            failure_ceiling: 3,
            history_limit: 50,
            auto_refresh: true,
        }
    }
}

impl PollingConfig {
    pub fn interval(&self) -> Duration {
        Duration::from_millis(self.interval_ms)
    }
}
