//! Status command implementation

use crate::cli::output::{format_view, format_view_json};
use crate::cli::{build_api, StatusArgs};
use crate::config::PrintwatchConfig;
use crate::poller::TelemetryPoller;
use crate::registry::{Printer, PrinterId};
use std::sync::Arc;

/// Build a poller for a single fetch: auto-refresh stays off so no interval
/// task is started.
pub(crate) fn one_shot_poller(
    config: &PrintwatchConfig,
) -> Result<TelemetryPoller, Box<dyn std::error::Error>> {
    let api = build_api(config)?;
    let mut polling = config.polling.clone();
    polling.auto_refresh = false;
    Ok(TelemetryPoller::new(Arc::new(api), polling))
}

/// Load the printer list and select `printer`, fetching its telemetry once.
pub(crate) async fn select_printer(
    poller: &TelemetryPoller,
    printer: &str,
) -> Result<Printer, Box<dyn std::error::Error>> {
    let id = PrinterId::from(printer);
    poller.load_devices(Some(&id)).await;

    if poller.registry().printer_count() == 0 {
        return Err("No printers available. Is the backend reachable?".into());
    }
    poller
        .registry()
        .selected()
        .filter(|selected| selected.id == id)
        .ok_or_else(|| format!("Printer not found: {}", printer).into())
}

/// Handle `printwatch status` command
pub async fn handle_status(args: &StatusArgs) -> Result<String, Box<dyn std::error::Error>> {
    let config = args.backend.load_config()?;
    let poller = one_shot_poller(&config)?;
    select_printer(&poller, &args.printer).await?;

    let view = poller.view();
    poller.shutdown().await;

    if args.json {
        Ok(format_view_json(&view))
    } else {
        Ok(format_view(&view, args.history))
    }
}
