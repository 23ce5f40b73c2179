//! Telemetry snapshot model.
//!
//! A snapshot is one reading reported by the backend for a printer. Every
//! field is optional: a printer that is powered off but whose endpoint is
//! still reachable answers with a snapshot whose fields are all `null`.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

/// One telemetry reading for a printer.
///
/// Field names follow the backend's camelCase JSON. Unknown fields are
/// ignored so newer backends can add data without breaking older clients.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct TelemetrySnapshot {
    /// Backend row id (present on history entries)
    #[serde(skip_serializing_if = "Option::is_none")]
    pub id: Option<i64>,
    /// When the reading was captured
    #[serde(skip_serializing_if = "Option::is_none")]
    pub timestamp: Option<DateTime<Utc>>,

    // Temperatures
    pub nozzle_temp: Option<f64>,
    pub target_nozzle: Option<f64>,
    pub bed_temp: Option<f64>,
    pub target_bed: Option<f64>,
    pub chamber_temp: Option<f64>,

    // Toolhead
    pub pos_x: Option<f64>,
    pub pos_y: Option<f64>,
    pub pos_z: Option<f64>,
    pub pos_e: Option<f64>,
    pub homed_axes: Option<String>,
    pub max_velocity: Option<f64>,
    pub live_velocity: Option<f64>,

    // Print job
    pub state: Option<String>,
    pub filename: Option<String>,
    /// Job progress in percent (0..=100)
    pub progress: Option<f64>,
    pub current_layer: Option<u32>,
    pub total_layers: Option<u32>,
    /// Seconds spent printing the current job
    pub print_duration: Option<u64>,

    // Fans & sensors
    /// Part cooling fan duty cycle (0.0..=1.0)
    pub part_fan_speed: Option<f64>,
    pub filament_detected: Option<bool>,
}

impl TelemetrySnapshot {
    /// Whether the snapshot carries live data.
    ///
    /// A snapshot is meaningful when at least one of nozzle temperature, bed
    /// temperature or print state is present.
    pub fn is_meaningful(&self) -> bool {
        self.nozzle_temp.is_some() || self.bed_temp.is_some() || self.state.is_some()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_meaningful_requires_a_core_field() {
        assert!(!TelemetrySnapshot::default().is_meaningful());

        let only_position = TelemetrySnapshot {
            pos_x: Some(10.0),
            chamber_temp: Some(30.0),
            ..Default::default()
        };
        assert!(!only_position.is_meaningful());

        let nozzle = TelemetrySnapshot {
            nozzle_temp: Some(0.0),
            ..Default::default()
        };
        assert!(nozzle.is_meaningful());

        let state = TelemetrySnapshot {
            state: Some("standby".to_string()),
            ..Default::default()
        };
        assert!(state.is_meaningful());
    }

    #[test]
    fn test_null_fields_parse_as_not_meaningful() {
        let body = r#"{"nozzleTemp": null, "bedTemp": null, "state": null}"#;
        let snapshot: TelemetrySnapshot = serde_json::from_str(body).unwrap();
        assert!(!snapshot.is_meaningful());
    }

    #[test]
    fn test_parse_backend_payload() {
        let body = r#"{
            "id": 42,
            "timestamp": "2026-03-01T12:00:00Z",
            "nozzleTemp": 210.4,
            "targetNozzle": 215.0,
            "bedTemp": 60.1,
            "targetBed": 60.0,
            "posX": 120.5,
            "homedAxes": "xyz",
            "state": "printing",
            "filename": "benchy.gcode",
            "progress": 37.5,
            "currentLayer": 12,
            "totalLayers": 80,
            "partFanSpeed": 0.75,
            "filamentDetected": true,
            "rawPayload": "{}"
        }"#;

        let snapshot: TelemetrySnapshot = serde_json::from_str(body).unwrap();
        assert_eq!(snapshot.id, Some(42));
        assert_eq!(snapshot.nozzle_temp, Some(210.4));
        assert_eq!(snapshot.homed_axes.as_deref(), Some("xyz"));
        assert_eq!(snapshot.current_layer, Some(12));
        assert_eq!(snapshot.filament_detected, Some(true));
        assert!(snapshot.timestamp.is_some());
        assert!(snapshot.is_meaningful());
    }

    #[test]
    fn test_serialize_uses_camel_case() {
        let snapshot = TelemetrySnapshot {
            bed_temp: Some(55.0),
            ..Default::default()
        };
        let json = serde_json::to_value(&snapshot).unwrap();
        assert_eq!(json["bedTemp"], 55.0);
        assert!(json.get("id").is_none());
    }
}
