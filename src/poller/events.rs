//! Change notifications published by the poller.

use super::PollState;
use crate::registry::PrinterId;
use chrono::{DateTime, Utc};
use serde::Serialize;

/// Broadcast whenever the read model changes.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum PollerEvent {
    /// A different printer (or none) is now selected
    SelectionChanged { printer_id: Option<PrinterId> },
    /// A meaningful snapshot replaced the cached one
    SnapshotUpdated { printer_id: PrinterId },
    /// A printer with cached data stopped returning live telemetry
    StaleDetected {
        printer_id: PrinterId,
        since: DateTime<Utc>,
    },
    /// The history table was replaced
    HistoryUpdated { printer_id: PrinterId, entries: usize },
    /// The poll loop moved to another state
    StateChanged { state: PollState, failures: u32 },
}
