//! Send and quick command implementations

use crate::cli::output::{format_quick_commands_json, format_quick_commands_table, status_badge};
use crate::cli::status::{one_shot_poller, select_printer};
use crate::cli::{CommandsArgs, SendArgs};
use crate::poller::{resolve_command, QUICK_COMMANDS};

/// Handle `printwatch send` command
///
/// Quick command labels are expanded before sending. The printer is polled
/// once afterwards so the reply reflects its new state.
pub async fn handle_send(args: &SendArgs) -> Result<String, Box<dyn std::error::Error>> {
    let config = args.backend.load_config()?;
    let poller = one_shot_poller(&config)?;
    let printer = select_printer(&poller, &args.printer).await?;

    let command = resolve_command(&args.command.join(" "));
    let result = poller.send_command(&command).await;
    let status = poller.device_status(&printer.id);
    poller.shutdown().await;
    let ack = result?;

    let mut out = format!("✓ Sent '{}' to {}", command, printer.name);
    if let Some(message) = ack.message.filter(|m| !m.trim().is_empty()) {
        out.push_str(&format!(": {}", message.trim()));
    }
    out.push_str(&format!("\n  {}", status_badge(&status)));
    Ok(out)
}

/// Handle `printwatch commands` command
pub fn handle_commands(args: &CommandsArgs) -> String {
    if args.json {
        format_quick_commands_json(&QUICK_COMMANDS)
    } else {
        format_quick_commands_table(&QUICK_COMMANDS)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_commands_table() {
        let output = handle_commands(&CommandsArgs { json: false });
        assert!(output.contains("Lower bed"));
        assert!(output.contains("RESUME"));
    }

    #[test]
    fn test_commands_json() {
        let output = handle_commands(&CommandsArgs { json: true });
        let parsed: serde_json::Value = serde_json::from_str(&output).unwrap();
        assert_eq!(parsed["commands"].as_array().unwrap().len(), 4);
    }
}
