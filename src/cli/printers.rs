//! Printers command implementation

use crate::cli::output::{format_printers_json, format_printers_table};
use crate::cli::status::one_shot_poller;
use crate::cli::{build_api, PrintersAddArgs, PrintersListArgs};
use crate::client::PrinterApi;
use crate::registry::{NewPrinter, PrinterType};

/// Handle `printwatch printers list` command
pub async fn handle_printers_list(
    args: &PrintersListArgs,
) -> Result<String, Box<dyn std::error::Error>> {
    let config = args.backend.load_config()?;
    let api = build_api(&config)?;
    let printers = api.list_printers().await?;

    if args.json {
        Ok(format_printers_json(&printers))
    } else if printers.is_empty() {
        Ok("No printers registered.".to_string())
    } else {
        Ok(format_printers_table(&printers, None))
    }
}

/// Build the creation form from CLI arguments.
fn new_printer_from_args(args: &PrintersAddArgs) -> Result<NewPrinter, Box<dyn std::error::Error>> {
    let printer_type: PrinterType = args.printer_type.parse()?;
    Ok(NewPrinter {
        name: args.name.clone(),
        printer_type,
        ip_address: args.ip_address.clone(),
        port: Some(args.port),
        api_key: args.api_key.clone(),
    })
}

/// Handle `printwatch printers add` command
pub async fn handle_printers_add(
    args: &PrintersAddArgs,
) -> Result<String, Box<dyn std::error::Error>> {
    let new_printer = new_printer_from_args(args)?;
    let config = args.backend.load_config()?;
    let poller = one_shot_poller(&config)?;

    let created = poller.create_device(new_printer).await;
    poller.shutdown().await;
    let created = created?;

    Ok(format!(
        "✓ Printer created: {} (id {}, {})",
        created.name,
        created.id,
        created.address()
    ))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::cli::BackendArgs;
    use std::path::PathBuf;

    fn add_args(printer_type: &str) -> PrintersAddArgs {
        PrintersAddArgs {
            name: "Voron".to_string(),
            ip_address: "10.0.0.5".to_string(),
            port: 7125,
            printer_type: printer_type.to_string(),
            api_key: None,
            backend: BackendArgs {
                config: PathBuf::from("printwatch.toml"),
                backend_url: None,
                token_file: None,
            },
        }
    }

    #[test]
    fn test_new_printer_from_args() {
        let printer = new_printer_from_args(&add_args("moonraker")).unwrap();
        assert_eq!(printer.printer_type, PrinterType::Moonraker);
        assert_eq!(printer.port, Some(7125));
    }

    #[test]
    fn test_new_printer_rejects_unknown_type() {
        let err = new_printer_from_args(&add_args("octoprint")).unwrap_err();
        assert!(err.to_string().contains("Invalid printer type"));
    }
}
