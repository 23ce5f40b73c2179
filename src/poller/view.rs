//! Read model for front ends.

use super::{DeviceStatus, PollState};
use crate::registry::Printer;
use crate::telemetry::TelemetrySnapshot;
use serde::Serialize;

/// Everything a front end needs to render the dashboard.
#[derive(Debug, Clone, Serialize)]
pub struct DashboardView {
    pub printers: Vec<Printer>,
    pub selected: Option<Printer>,
    /// Last meaningful snapshot of the selected printer
    pub snapshot: Option<TelemetrySnapshot>,
    pub status: DeviceStatus,
    pub history: Vec<TelemetrySnapshot>,
    pub loading: bool,
    pub auto_refresh: bool,
    pub state: PollState,
    pub consecutive_failures: u32,
}
