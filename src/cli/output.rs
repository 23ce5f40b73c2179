//! Output formatting helpers for CLI commands

use crate::poller::{DashboardView, DeviceStatus, PollState, QuickCommand};
use crate::registry::{Printer, PrinterId};
use crate::telemetry::TelemetrySnapshot;
use chrono::{DateTime, Local, Utc};
use colored::Colorize;
use comfy_table::{presets::UTF8_FULL, Cell, ContentArrangement, Table};
use serde_json::json;

const PLACEHOLDER: &str = "--";

fn new_table() -> Table {
    let mut table = Table::new();
    table.load_preset(UTF8_FULL);
    table.set_content_arrangement(ContentArrangement::Dynamic);
    table
}

fn to_pretty_json(value: &serde_json::Value) -> String {
    serde_json::to_string_pretty(value).unwrap_or_default()
}

/// Format printers as a table, marking the selected one.
pub fn format_printers_table(printers: &[Printer], selected: Option<&PrinterId>) -> String {
    let mut table = new_table();
    table.set_header(vec!["", "ID", "Name", "Type", "Address"]);

    for p in printers {
        let marker = if selected == Some(&p.id) { "▶" } else { "" };
        table.add_row(vec![
            Cell::new(marker),
            Cell::new(&p.id),
            Cell::new(&p.name),
            Cell::new(p.printer_type),
            Cell::new(p.address()),
        ]);
    }

    table.to_string()
}

/// Format printers as JSON
pub fn format_printers_json(printers: &[Printer]) -> String {
    to_pretty_json(&json!({ "printers": printers }))
}

/// Get status icon for a connection badge
pub fn status_icon(status: &DeviceStatus) -> &'static str {
    if status.is_stale {
        "!"
    } else if status.has_data {
        "✓"
    } else {
        "✗"
    }
}

/// Colored connection badge, e.g. `✓ Connected`.
pub fn status_badge(status: &DeviceStatus) -> String {
    let text = format!("{} {}", status_icon(status), status.label());
    if status.is_stale {
        text.yellow().to_string()
    } else if status.has_data {
        text.green().to_string()
    } else {
        text.red().to_string()
    }
}

/// `210.4°C → 215°C`; an unset or zero target prints as `--`.
pub fn format_temperature(current: Option<f64>, target: Option<f64>) -> String {
    let current = current
        .map(|t| format!("{:.1}°C", t))
        .unwrap_or_else(|| format!("{}°C", PLACEHOLDER));
    let target = target
        .filter(|t| *t != 0.0)
        .map(|t| format!("{:.0}°C", t))
        .unwrap_or_else(|| PLACEHOLDER.to_string());
    format!("{} → {}", current, target)
}

fn format_position(axis: Option<f64>) -> String {
    match axis {
        Some(v) => format!("{:.2} mm", v),
        None => format!("{} mm", PLACEHOLDER),
    }
}

/// Format a print duration as `1h 02m 03s`.
pub fn format_duration(seconds: u64) -> String {
    let hours = seconds / 3600;
    let minutes = (seconds % 3600) / 60;
    let secs = seconds % 60;
    if hours > 0 {
        format!("{}h {:02}m {:02}s", hours, minutes, secs)
    } else {
        format!("{}m {:02}s", minutes, secs)
    }
}

fn format_layer(snapshot: &TelemetrySnapshot) -> Option<String> {
    let current = snapshot.current_layer?;
    Some(match snapshot.total_layers {
        Some(total) if total > 0 => format!("{} / {}", current, total),
        _ => current.to_string(),
    })
}

fn format_local_time(at: DateTime<Utc>) -> String {
    at.with_timezone(&Local).format("%Y-%m-%d %H:%M:%S").to_string()
}

/// Format a snapshot as a two column panel.
///
/// Optional sections (chamber, homing, job, motion, fans) are only shown
/// when the printer reports them.
pub fn format_snapshot(snapshot: &TelemetrySnapshot) -> String {
    let mut rows: Vec<(&str, String)> = vec![
        (
            "Nozzle",
            format_temperature(snapshot.nozzle_temp, snapshot.target_nozzle),
        ),
        (
            "Bed",
            format_temperature(snapshot.bed_temp, snapshot.target_bed),
        ),
    ];
    if let Some(chamber) = snapshot.chamber_temp {
        rows.push(("Chamber", format!("{:.1}°C", chamber)));
    }

    rows.push(("X", format_position(snapshot.pos_x)));
    rows.push(("Y", format_position(snapshot.pos_y)));
    rows.push(("Z", format_position(snapshot.pos_z)));
    if let Some(homed) = snapshot.homed_axes.as_deref().filter(|h| !h.is_empty()) {
        rows.push(("Homed", homed.to_uppercase()));
    }

    rows.push((
        "State",
        snapshot.state.clone().unwrap_or_else(|| "Unknown".to_string()),
    ));
    if let Some(file) = &snapshot.filename {
        rows.push(("File", file.clone()));
    }
    if let Some(progress) = snapshot.progress {
        rows.push(("Progress", format!("{:.1}%", progress)));
    }
    if let Some(layer) = format_layer(snapshot) {
        rows.push(("Layer", layer));
    }
    if let Some(duration) = snapshot.print_duration {
        rows.push(("Print time", format_duration(duration)));
    }

    if let Some(speed) = snapshot.live_velocity {
        rows.push(("Speed", format!("{:.1} mm/s", speed)));
    }
    if let Some(max) = snapshot.max_velocity {
        rows.push(("Max velocity", format!("{:.0} mm/s", max)));
    }
    if let Some(fan) = snapshot.part_fan_speed {
        rows.push(("Part fan", format!("{:.0}%", fan * 100.0)));
    }
    if let Some(detected) = snapshot.filament_detected {
        let text = if detected {
            "✓ Detected".green().to_string()
        } else {
            "✗ Not Detected".red().to_string()
        };
        rows.push(("Filament", text));
    }

    let mut table = new_table();
    for (label, value) in rows {
        table.add_row(vec![Cell::new(label), Cell::new(value)]);
    }
    table.to_string()
}

/// Format the history as a table, newest entries as returned by the backend.
pub fn format_history_table(history: &[TelemetrySnapshot]) -> String {
    let mut table = new_table();
    table.set_header(vec!["Timestamp", "Nozzle", "Bed", "Progress", "State"]);

    if history.is_empty() {
        table.add_row(vec![Cell::new("No history captured yet.")]);
        return table.to_string();
    }

    let temp = |v: Option<f64>| {
        v.map(|t| format!("{:.1}", t))
            .unwrap_or_else(|| PLACEHOLDER.to_string())
    };

    for s in history {
        table.add_row(vec![
            Cell::new(
                s.timestamp
                    .map(format_local_time)
                    .unwrap_or_else(|| PLACEHOLDER.to_string()),
            ),
            Cell::new(format!("{}°C / {}°C", temp(s.nozzle_temp), temp(s.target_nozzle))),
            Cell::new(format!("{}°C / {}°C", temp(s.bed_temp), temp(s.target_bed))),
            Cell::new(
                s.progress
                    .filter(|p| *p > 0.0)
                    .map(|p| format!("{:.1}%", p))
                    .unwrap_or_else(|| "N/A".to_string()),
            ),
            Cell::new(s.state.as_deref().unwrap_or("Unknown")),
        ]);
    }

    table.to_string()
}

/// Notice shown under the header while the loop is not polling.
pub fn poll_state_notice(state: PollState, failures: u32) -> Option<String> {
    match state {
        PollState::Suspended => Some(
            format!(
                "Auto-refresh suspended after {} failed polls. Retry or send a command to resume.",
                failures
            )
            .red()
            .to_string(),
        ),
        PollState::Paused => Some("Auto-refresh paused.".yellow().to_string()),
        PollState::Idle | PollState::Polling => None,
    }
}

/// Format the full dashboard for the selected printer.
pub fn format_view(view: &DashboardView, include_history: bool) -> String {
    let Some(printer) = &view.selected else {
        return "No printer selected.".to_string();
    };

    let mut out = format!(
        "{} ({})  {}\n",
        printer.name.bold(),
        printer.address(),
        status_badge(&view.status)
    );
    if let Some(since) = view.status.stale_since {
        out.push_str(&format!(
            "Showing last known data, connection lost since {}\n",
            format_local_time(since)
        ));
    }
    if let Some(notice) = poll_state_notice(view.state, view.consecutive_failures) {
        out.push_str(&notice);
        out.push('\n');
    }

    match &view.snapshot {
        Some(snapshot) => out.push_str(&format_snapshot(snapshot)),
        None => out.push_str("No telemetry received yet."),
    }

    if include_history {
        out.push('\n');
        out.push_str(&format_history_table(&view.history));
    }

    out
}

/// Format the dashboard as JSON
pub fn format_view_json(view: &DashboardView) -> String {
    to_pretty_json(&json!({
        "printer": view.selected,
        "status": view.status,
        "badge": view.status.label(),
        "state": view.state,
        "consecutiveFailures": view.consecutive_failures,
        "snapshot": view.snapshot,
        "history": view.history,
    }))
}

/// One line per poll for the watch view.
pub fn format_tick_line(printer: &Printer, snapshot: Option<&TelemetrySnapshot>, status: &DeviceStatus) -> String {
    let time = Local::now().format("%H:%M:%S");
    let Some(s) = snapshot else {
        return format!("[{}] {}  {}", time, printer.name, status_badge(status));
    };

    let mut line = format!(
        "[{}] {}  {}  nozzle {}  bed {}  {}",
        time,
        printer.name,
        status_badge(status),
        format_temperature(s.nozzle_temp, s.target_nozzle),
        format_temperature(s.bed_temp, s.target_bed),
        s.state.as_deref().unwrap_or("Unknown")
    );
    if let Some(progress) = s.progress {
        line.push_str(&format!("  {:.1}%", progress));
    }
    if let Some(layer) = format_layer(s) {
        line.push_str(&format!("  layer {}", layer));
    }
    line
}

/// Format quick commands as a table
pub fn format_quick_commands_table(commands: &[QuickCommand]) -> String {
    let mut table = new_table();
    table.set_header(vec!["Label", "Command"]);
    for c in commands {
        table.add_row(vec![Cell::new(c.label), Cell::new(c.command)]);
    }
    table.to_string()
}

/// Format quick commands as JSON
pub fn format_quick_commands_json(commands: &[QuickCommand]) -> String {
    to_pretty_json(&json!({ "commands": commands }))
}
