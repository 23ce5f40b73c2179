//! Watch command implementation
//!
//! Follows the selected printer until interrupted. Telemetry is printed as it
//! arrives; operator input is read line by line from stdin.

use crate::cli::output::{
    format_printers_table, format_tick_line, format_view, poll_state_notice, status_badge,
};
use crate::cli::{build_api, WatchArgs};
use crate::config::PrintwatchConfig;
use crate::logging::init_tracing;
use crate::poller::{resolve_command, PollState, PollerEvent, TelemetryPoller};
use crate::registry::PrinterId;
use std::sync::Arc;
use tokio::sync::broadcast::error::RecvError;
use tokio::sync::mpsc;
use tokio_util::sync::CancellationToken;

const HELP: &str = "\
Commands:
  retry            reset the failure counter and poll now
  auto             toggle auto-refresh
  send <command>   send G-code, a macro or a quick command label
  select <id>      switch to another printer
  printers         list printers
  status           show the full dashboard
  history          show the dashboard with history
  help             show this help
  quit             stop watching";

/// A line of operator input.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum WatchInput {
    Retry,
    ToggleAutoRefresh,
    Send(String),
    Select(String),
    Printers,
    Status { history: bool },
    Help,
    Quit,
    Empty,
    Unknown(String),
}

/// Parse one line typed by the operator.
pub fn parse_input(line: &str) -> WatchInput {
    let line = line.trim();
    let (word, rest) = match line.split_once(char::is_whitespace) {
        Some((word, rest)) => (word, rest.trim()),
        None => (line, ""),
    };

    match (word.to_lowercase().as_str(), rest) {
        ("", _) => WatchInput::Empty,
        ("retry" | "r", "") => WatchInput::Retry,
        ("auto" | "a", "") => WatchInput::ToggleAutoRefresh,
        ("send" | "cmd", command) if !command.is_empty() => {
            WatchInput::Send(resolve_command(command))
        }
        ("select", id) if !id.is_empty() => WatchInput::Select(id.to_string()),
        ("printers", "") => WatchInput::Printers,
        ("status" | "s", "") => WatchInput::Status { history: false },
        ("history", "") => WatchInput::Status { history: true },
        ("help" | "?", "") => WatchInput::Help,
        ("quit" | "exit" | "q", "") => WatchInput::Quit,
        _ => WatchInput::Unknown(line.to_string()),
    }
}

/// Load configuration with watch-specific overrides
pub fn load_config_with_overrides(
    args: &WatchArgs,
) -> Result<PrintwatchConfig, Box<dyn std::error::Error>> {
    let mut config = args.backend.load_config()?;

    if let Some(interval_ms) = args.interval_ms {
        config.polling.interval_ms = interval_ms;
    }
    if args.paused {
        config.polling.auto_refresh = false;
    }

    config.validate()?;
    Ok(config)
}

/// Wait for shutdown signal (SIGINT or SIGTERM)
async fn shutdown_signal(cancel_token: CancellationToken) {
    let ctrl_c = async {
        if let Err(e) = tokio::signal::ctrl_c().await {
            tracing::warn!(error = %e, "Failed to listen for CTRL+C");
            std::future::pending::<()>().await;
        }
    };

    #[cfg(unix)]
    let terminate = async {
        match tokio::signal::unix::signal(tokio::signal::unix::SignalKind::terminate()) {
            Ok(mut signal) => {
                signal.recv().await;
            }
            Err(e) => {
                tracing::warn!(error = %e, "Failed to listen for SIGTERM");
                std::future::pending::<()>().await;
            }
        }
    };

    #[cfg(not(unix))]
    let terminate = std::future::pending::<()>();

    tokio::select! {
        _ = ctrl_c => {
            tracing::info!("Received SIGINT, shutting down...");
        }
        _ = terminate => {
            tracing::info!("Received SIGTERM, shutting down...");
        }
    }

    cancel_token.cancel();
}

/// Forward stdin lines from a dedicated thread.
fn spawn_input_reader() -> mpsc::UnboundedReceiver<String> {
    let (tx, rx) = mpsc::unbounded_channel();
    std::thread::spawn(move || {
        for line in std::io::stdin().lines() {
            match line {
                Ok(line) => {
                    if tx.send(line).is_err() {
                        break;
                    }
                }
                Err(e) => {
                    tracing::warn!(error = %e, "Failed to read input, continuing without it");
                    break;
                }
            }
        }
    });
    rx
}

/// Render an event for the terminal, `None` when it needs no output.
fn render_event(poller: &TelemetryPoller, event: &PollerEvent) -> Option<String> {
    let selected = poller.registry().selected();

    match event {
        PollerEvent::SnapshotUpdated { printer_id } => {
            let printer = selected.filter(|p| &p.id == printer_id)?;
            let snapshot = poller.snapshot(printer_id);
            Some(format_tick_line(
                &printer,
                snapshot.as_ref(),
                &poller.device_status(printer_id),
            ))
        }
        PollerEvent::StaleDetected { printer_id, .. } => {
            let printer = selected.filter(|p| &p.id == printer_id)?;
            Some(format!(
                "{}  {}, showing last known data",
                printer.name,
                status_badge(&poller.device_status(printer_id))
            ))
        }
        PollerEvent::StateChanged { state, failures } => match state {
            PollState::Polling => Some("Auto-refresh running.".to_string()),
            other => poll_state_notice(*other, *failures),
        },
        PollerEvent::SelectionChanged { printer_id: None } => {
            Some("No printer selected. Type `printers` then `select <id>`.".to_string())
        }
        PollerEvent::SelectionChanged { printer_id: Some(_) } => {
            let printer = selected?;
            Some(format!("Watching {} ({})", printer.name, printer.address()))
        }
        PollerEvent::HistoryUpdated { .. } => None,
    }
}

/// Apply one line of input. Returns false when the operator asked to quit.
async fn handle_input(poller: &TelemetryPoller, input: WatchInput) -> bool {
    let output = match input {
        WatchInput::Quit => return false,
        WatchInput::Empty => return true,
        WatchInput::Retry => match poller.retry().await {
            Ok(()) => format_view(&poller.view(), false),
            Err(e) => format!("Error: {}", e),
        },
        WatchInput::ToggleAutoRefresh => {
            if poller.toggle_auto_refresh() {
                "Auto-refresh enabled.".to_string()
            } else {
                "Auto-refresh paused.".to_string()
            }
        }
        WatchInput::Send(command) => match poller.send_command(&command).await {
            Ok(ack) => match ack.message {
                Some(message) => format!("✓ Sent '{}': {}", command, message),
                None => format!("✓ Sent '{}'", command),
            },
            Err(e) => format!("Error: {}", e),
        },
        WatchInput::Select(id) => match poller.select_device(&PrinterId::from(id)).await {
            Ok(_) => format_view(&poller.view(), false),
            Err(e) => format!("Error: {}", e),
        },
        WatchInput::Printers => {
            let selected = poller.registry().selected_id();
            format_printers_table(&poller.registry().printers(), selected.as_ref())
        }
        WatchInput::Status { history } => format_view(&poller.view(), history),
        WatchInput::Help => HELP.to_string(),
        WatchInput::Unknown(line) => format!("Unknown command: {}. Type `help`.", line),
    };

    println!("{}", output);
    true
}

/// Run the watch command until interrupted
pub async fn run_watch(args: WatchArgs) -> Result<(), Box<dyn std::error::Error>> {
    let config = load_config_with_overrides(&args)?;
    init_tracing(&config.logging)?;

    tracing::info!(
        backend = %config.backend.base_url,
        interval_ms = config.polling.interval_ms,
        "Starting printwatch"
    );

    let api = build_api(&config)?;
    let poller = TelemetryPoller::new(Arc::new(api), config.polling.clone());
    let mut events = poller.subscribe();

    let preferred = args.printer.as_deref().map(PrinterId::from);
    let change = poller.load_devices(preferred.as_ref()).await;
    if let Some(id) = &preferred {
        if change.current.as_ref() != Some(id) {
            return Err(format!("Printer not found: {}", id).into());
        }
    }

    // The initial fetch already happened; start from the rendered dashboard
    while events.try_recv().is_ok() {}
    if args.json {
        println!("{}", serde_json::to_string(&poller.view())?);
    } else if change.current.is_some() {
        println!("{}", format_view(&poller.view(), false));
    } else {
        println!(
            "{}",
            format_printers_table(&poller.registry().printers(), None)
        );
        println!("Type `select <id>` to start watching, `help` for commands.");
    }

    let cancel_token = CancellationToken::new();
    tokio::spawn(shutdown_signal(cancel_token.clone()));

    let mut input = spawn_input_reader();
    let mut stdin_open = true;

    loop {
        tokio::select! {
            _ = cancel_token.cancelled() => break,
            line = input.recv(), if stdin_open => match line {
                Some(line) => {
                    if !handle_input(&poller, parse_input(&line)).await {
                        break;
                    }
                }
                None => stdin_open = false,
            },
            event = events.recv() => match event {
                Ok(event) if args.json => println!("{}", serde_json::to_string(&event)?),
                Ok(event) => {
                    if let Some(line) = render_event(&poller, &event) {
                        println!("{}", line);
                    }
                }
                Err(RecvError::Lagged(skipped)) => {
                    tracing::debug!(skipped, "Event stream lagged");
                }
                Err(RecvError::Closed) => break,
            },
        }
    }

    poller.shutdown().await;
    tracing::info!("Watch stopped");
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::cli::BackendArgs;

    #[test]
    fn test_parse_control_words() {
        assert_eq!(parse_input("retry"), WatchInput::Retry);
        assert_eq!(parse_input("  AUTO "), WatchInput::ToggleAutoRefresh);
        assert_eq!(parse_input("q"), WatchInput::Quit);
        assert_eq!(parse_input(""), WatchInput::Empty);
        assert_eq!(
            parse_input("history"),
            WatchInput::Status { history: true }
        );
    }

    #[test]
    fn test_parse_send_expands_quick_commands() {
        assert_eq!(
            parse_input("send home axes"),
            WatchInput::Send("G28".to_string())
        );
        assert_eq!(
            parse_input("cmd M104 S0"),
            WatchInput::Send("M104 S0".to_string())
        );
    }

    #[test]
    fn test_parse_requires_arguments() {
        assert_eq!(parse_input("send"), WatchInput::Unknown("send".to_string()));
        assert_eq!(
            parse_input("select 4"),
            WatchInput::Select("4".to_string())
        );
        assert_eq!(
            parse_input("retry now"),
            WatchInput::Unknown("retry now".to_string())
        );
    }

    #[test]
    fn test_watch_overrides() {
        let dir = tempfile::tempdir().unwrap();
        let args = WatchArgs {
            printer: None,
            backend: BackendArgs {
                config: dir.path().join("printwatch.toml"),
                backend_url: Some("http://localhost:8080".to_string()),
                token_file: None,
            },
            interval_ms: Some(750),
            paused: true,
            json: false,
        };

        let config = load_config_with_overrides(&args).unwrap();
        assert_eq!(config.polling.interval_ms, 750);
        assert!(!config.polling.auto_refresh);
    }

    #[test]
    fn test_watch_rejects_zero_interval() {
        let dir = tempfile::tempdir().unwrap();
        let args = WatchArgs {
            printer: None,
            backend: BackendArgs {
                config: dir.path().join("printwatch.toml"),
                backend_url: Some("http://localhost:8080".to_string()),
                token_file: None,
            },
            interval_ms: Some(0),
            paused: false,
            json: false,
        };

        assert!(load_config_with_overrides(&args).is_err());
    }
}
