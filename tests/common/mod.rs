//! Shared test utilities for printwatch integration tests.
//!
//! Provides JSON fixtures shaped like the printer backend's responses and
//! helpers for pointing clients at a wiremock server.

#![allow(dead_code)]

use printwatch::config::{BackendConfig, PollingConfig};
use serde_json::{json, Value};
use wiremock::matchers::{method, path};
use wiremock::{Mock, MockServer, ResponseTemplate};

// =============================================================================
// Fixtures
// =============================================================================

/// A printer as listed by the backend (numeric id, like the real one).
pub fn printer_json(id: i64, name: &str) -> Value {
    json!({
        "id": id,
        "name": name,
        "type": "MOONRAKER",
        "ipAddress": "192.168.1.50",
        "port": 7125
    })
}

/// A live snapshot with temperatures and a running job.
pub fn snapshot_json(nozzle: f64) -> Value {
    json!({
        "nozzleTemp": nozzle,
        "targetNozzle": 215.0,
        "bedTemp": 60.1,
        "targetBed": 60.0,
        "posX": 120.5,
        "posY": 98.25,
        "posZ": 3.2,
        "homedAxes": "xyz",
        "state": "printing",
        "filename": "benchy.gcode",
        "progress": 42.5,
        "currentLayer": 16,
        "totalLayers": 160
    })
}

/// A snapshot from a printer that is powered off.
pub fn empty_snapshot_json() -> Value {
    json!({
        "nozzleTemp": null,
        "bedTemp": null,
        "state": null
    })
}

// =============================================================================
// Backend helpers
// =============================================================================

/// Backend configuration targeting the mock server.
pub fn backend_config(server: &MockServer) -> BackendConfig {
    BackendConfig {
        base_url: server.uri(),
        timeout_seconds: 2,
        ..Default::default()
    }
}

/// Polling tuned for real-time tests.
pub fn fast_polling(interval_ms: u64) -> PollingConfig {
    PollingConfig {
        interval_ms,
        ..Default::default()
    }
}

/// Mount `GET /api/printers` returning `printers`.
pub async fn mount_printers(server: &MockServer, printers: Vec<Value>) {
    Mock::given(method("GET"))
        .and(path("/api/printers"))
        .respond_with(ResponseTemplate::new(200).set_body_json(Value::Array(printers)))
        .mount(server)
        .await;
}

/// Mount `GET /api/printers/{id}/state`.
pub async fn mount_state(server: &MockServer, id: i64, response: ResponseTemplate) {
    Mock::given(method("GET"))
        .and(path(format!("/api/printers/{}/state", id)))
        .respond_with(response)
        .mount(server)
        .await;
}

/// Mount `GET /api/printers/{id}/history` returning `entries` snapshots.
pub async fn mount_history(server: &MockServer, id: i64, entries: usize) {
    let history: Vec<Value> = (0..entries)
        .map(|i| {
            let mut entry = snapshot_json(200.0 + i as f64);
            entry["id"] = json!(i + 1);
            entry["timestamp"] = json!("2026-10-19T12:00:00Z");
            entry
        })
        .collect();

    Mock::given(method("GET"))
        .and(path(format!("/api/printers/{}/history", id)))
        .respond_with(ResponseTemplate::new(200).set_body_json(Value::Array(history)))
        .mount(server)
        .await;
}

/// Number of requests the server received for `request_path`.
pub async fn request_count(server: &MockServer, request_path: &str) -> usize {
    server
        .received_requests()
        .await
        .unwrap_or_default()
        .iter()
        .filter(|request| request.url.path() == request_path)
        .count()
}
