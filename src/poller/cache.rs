//! Last-known telemetry per printer and staleness markers.

use crate::registry::PrinterId;
use crate::telemetry::TelemetrySnapshot;
use chrono::{DateTime, Utc};
use dashmap::DashMap;
use serde::Serialize;

/// Cached data for one printer.
#[derive(Debug, Clone)]
struct CacheEntry {
    /// Last meaningful snapshot
    snapshot: TelemetrySnapshot,
    /// When live data stopped arriving, `None` while fresh
    stale_since: Option<DateTime<Utc>>,
}

/// Connection health of a printer as shown to the operator.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize)]
pub struct DeviceStatus {
    /// A meaningful snapshot has been received at some point
    pub has_data: bool,
    /// The latest poll did not yield live data
    pub is_stale: bool,
    pub stale_since: Option<DateTime<Utc>>,
}

impl DeviceStatus {
    /// Badge text for the printer header.
    pub fn label(&self) -> &'static str {
        if self.is_stale {
            "Connection lost"
        } else if self.has_data {
            "Connected"
        } else {
            "Offline"
        }
    }
}

/// Snapshot cache keyed by printer id.
///
/// Entries are created on the first meaningful snapshot and live as long as
/// the cache. A printer that never produced live data has no entry, so it
/// can never be stale.
#[derive(Debug, Default)]
pub struct SnapshotCache {
    entries: DashMap<PrinterId, CacheEntry>,
}

impl SnapshotCache {
    pub fn new() -> Self {
        Self::default()
    }

    /// Replace the cached snapshot and clear the staleness marker.
    ///
    /// Returns the marker that was cleared, if the printer was stale.
    pub fn store(&self, id: PrinterId, snapshot: TelemetrySnapshot) -> Option<DateTime<Utc>> {
        self.entries
            .insert(
                id,
                CacheEntry {
                    snapshot,
                    stale_since: None,
                },
            )
            .and_then(|previous| previous.stale_since)
    }

    /// Mark a printer stale as of `now`.
    ///
    /// Returns the new marker only when a stale episode starts: printers
    /// without cached data and printers already stale are left untouched.
    pub fn mark_stale(&self, id: &PrinterId, now: DateTime<Utc>) -> Option<DateTime<Utc>> {
        let mut entry = self.entries.get_mut(id)?;
        if entry.stale_since.is_some() {
            return None;
        }
        entry.stale_since = Some(now);
        Some(now)
    }

    pub fn snapshot(&self, id: &PrinterId) -> Option<TelemetrySnapshot> {
        self.entries.get(id).map(|entry| entry.snapshot.clone())
    }

    pub fn stale_since(&self, id: &PrinterId) -> Option<DateTime<Utc>> {
        self.entries.get(id).and_then(|entry| entry.stale_since)
    }

    pub fn status(&self, id: &PrinterId) -> DeviceStatus {
        match self.entries.get(id) {
            Some(entry) => DeviceStatus {
                has_data: true,
                is_stale: entry.stale_since.is_some(),
                stale_since: entry.stale_since,
            },
            None => DeviceStatus::default(),
        }
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }
}
