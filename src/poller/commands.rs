//! Quick commands offered next to the live telemetry.

use serde::Serialize;

/// A named command the operator can send with one action.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub struct QuickCommand {
    pub label: &'static str,
    pub command: &'static str,
}

pub const QUICK_COMMANDS: [QuickCommand; 4] = [
    QuickCommand {
        label: "Home axes",
        command: "G28",
    },
    QuickCommand {
        label: "Pause",
        command: "PAUSE",
    },
    QuickCommand {
        label: "Resume",
        command: "RESUME",
    },
    QuickCommand {
        label: "Lower bed",
        command: "G1 Z200",
    },
];

/// Look up a quick command by label, case-insensitively.
pub fn find_quick_command(label: &str) -> Option<&'static QuickCommand> {
    let label = label.trim();
    QUICK_COMMANDS
        .iter()
        .find(|quick| quick.label.eq_ignore_ascii_case(label))
}

/// Map operator input to the command sent to the printer.
///
/// Quick command labels expand to their command; anything else is passed
/// through verbatim (trimmed).
pub fn resolve_command(input: &str) -> String {
    match find_quick_command(input) {
        Some(quick) => quick.command.to_string(),
        None => input.trim().to_string(),
    }
}
