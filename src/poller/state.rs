//! Poll loop state tracking.

use crate::client::ClientError;
use crate::telemetry::TelemetrySnapshot;
use serde::{Deserialize, Serialize};

/// Lifecycle of the poll loop for the selected printer.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum PollState {
    /// No printer selected
    Idle,
    /// Interval active, failures below the ceiling
    Polling,
    /// Failure ceiling reached, interval cancelled until retry or command
    Suspended,
    /// Auto-refresh disabled by the operator
    Paused,
}

/// Classification of a single state fetch.
#[derive(Debug, Clone)]
pub enum PollOutcome {
    /// Backend returned a meaningful snapshot
    Live(TelemetrySnapshot),
    /// Backend answered but carried no live telemetry
    NoData,
    /// Request failed outright
    Failed(ClientError),
}

impl PollOutcome {
    pub fn classify(result: Result<Option<TelemetrySnapshot>, ClientError>) -> Self {
        match result {
            Ok(Some(snapshot)) if snapshot.is_meaningful() => PollOutcome::Live(snapshot),
            Ok(_) => PollOutcome::NoData,
            Err(e) => PollOutcome::Failed(e),
        }
    }

    pub fn is_live(&self) -> bool {
        matches!(self, PollOutcome::Live(_))
    }

    /// Metric label for this outcome.
    pub fn label(&self) -> &'static str {
        match self {
            PollOutcome::Live(_) => "live",
            PollOutcome::NoData => "no_data",
            PollOutcome::Failed(_) => "error",
        }
    }
}

/// Why a poll is running.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PollKind {
    /// First fetch after a printer is selected
    Initial,
    /// Interval tick
    Scheduled,
    /// Operator pressed retry
    Retry,
    /// Follow-up after a command was dispatched
    Command,
}

impl PollKind {
    /// Manual polls drive the loading indicator.
    pub fn is_manual(self) -> bool {
        !matches!(self, PollKind::Scheduled)
    }

    /// Command follow-ups reset the counter regardless of outcome.
    pub fn counts_failure(self) -> bool {
        !matches!(self, PollKind::Command)
    }
}

/// Consecutive polls without live data in the current session.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct FailureCounter {
    count: u32,
    ceiling: u32,
}

impl FailureCounter {
    pub fn new(ceiling: u32) -> Self {
        Self { count: 0, ceiling }
    }

    pub fn count(&self) -> u32 {
        self.count
    }

    pub fn ceiling(&self) -> u32 {
        self.ceiling
    }

    /// Record a poll outcome and return the new count.
    pub fn record(&mut self, live: bool) -> u32 {
        self.count = if live {
            0
        } else {
            self.count.saturating_add(1)
        };
        self.count
    }

    pub fn reset(&mut self) {
        self.count = 0;
    }

    /// Whether the loop must suspend itself.
    pub fn is_exhausted(&self) -> bool {
        self.count >= self.ceiling
    }
}
