//! CLI module for printwatch
//!
//! Command-line interface definitions and handlers for the printer telemetry
//! poller.
//!
//! # Commands
//!
//! - `watch` - Follow live telemetry of a printer
//! - `status` - Print one snapshot of a printer
//! - `printers` - List or register printers
//! - `send` - Send a command to a printer
//! - `commands` - List quick commands
//! - `token` - Manage the API bearer token
//! - `config` - Configuration utilities (init)
//! - `completions` - Generate shell completions
//!
//! # Example
//!
//! ```bash
//! # Watch printer 3 with a faster interval
//! printwatch watch 3 --interval-ms 1000
//!
//! # Home all axes
//! printwatch send 3 "home axes"
//!
//! # Generate shell completions
//! printwatch completions bash > ~/.bash_completion.d/printwatch
//! ```

pub mod commands;
pub mod completions;
pub mod config;
pub mod output;
pub mod printers;
pub mod status;
pub mod token;
pub mod watch;

pub use completions::handle_completions;
pub use config::handle_config_init;

use crate::client::{FileSessionStore, HttpPrinterApi};
use crate::config::PrintwatchConfig;
use clap::{Args, Parser, Subcommand};
use std::path::PathBuf;
use std::sync::Arc;

/// printwatch - Live 3D printer telemetry
#[derive(Parser, Debug)]
#[command(
    name = "printwatch",
    version,
    about = "Live telemetry poller for networked 3D printers"
)]
pub struct Cli {
    #[command(subcommand)]
    pub command: Commands,
}

#[derive(Subcommand, Debug)]
pub enum Commands {
    /// Follow live telemetry of a printer
    Watch(WatchArgs),
    /// Print the current telemetry of a printer
    Status(StatusArgs),
    /// Manage printers
    #[command(subcommand)]
    Printers(PrintersCommands),
    /// Send a command to a printer
    Send(SendArgs),
    /// List quick commands
    Commands(CommandsArgs),
    /// Manage the API bearer token
    #[command(subcommand)]
    Token(TokenCommands),
    /// Configuration utilities
    #[command(subcommand)]
    Config(ConfigCommands),
    /// Generate shell completions
    Completions(CompletionsArgs),
}

/// Options shared by every command that talks to the backend.
#[derive(Args, Debug, Clone)]
pub struct BackendArgs {
    /// Path to configuration file
    #[arg(short, long, default_value = "printwatch.toml")]
    pub config: PathBuf,

    /// Override backend base URL
    #[arg(short = 'u', long)]
    pub backend_url: Option<String>,

    /// Override the token file
    #[arg(long)]
    pub token_file: Option<PathBuf>,
}

impl BackendArgs {
    /// Load the layered configuration with CLI overrides applied.
    pub fn load_config(&self) -> Result<PrintwatchConfig, Box<dyn std::error::Error>> {
        let mut config = PrintwatchConfig::load_or_default(&self.config)?.with_env_overrides();
        if let Some(url) = &self.backend_url {
            config.backend.base_url = url.clone();
        }
        if let Some(path) = &self.token_file {
            config.backend.token_file = Some(path.clone());
        }
        config.validate()?;
        Ok(config)
    }
}

/// Build the HTTP client, attaching the token file when one is configured.
pub fn build_api(config: &PrintwatchConfig) -> Result<HttpPrinterApi, Box<dyn std::error::Error>> {
    let api = HttpPrinterApi::new(&config.backend)?;
    Ok(match &config.backend.token_file {
        Some(path) => api.with_session_store(Arc::new(FileSessionStore::new(path))),
        None => api,
    })
}

#[derive(Args, Debug)]
pub struct WatchArgs {
    /// Printer id to select (omit to pick one interactively)
    pub printer: Option<String>,

    #[command(flatten)]
    pub backend: BackendArgs,

    /// Override the poll interval in milliseconds
    #[arg(short, long)]
    pub interval_ms: Option<u64>,

    /// Start with auto-refresh paused
    #[arg(long)]
    pub paused: bool,

    /// Print events as JSON lines
    #[arg(long)]
    pub json: bool,
}

#[derive(Args, Debug)]
pub struct StatusArgs {
    /// Printer id
    pub printer: String,

    #[command(flatten)]
    pub backend: BackendArgs,

    /// Include the history table
    #[arg(long)]
    pub history: bool,

    /// Output as JSON
    #[arg(long)]
    pub json: bool,
}

#[derive(Subcommand, Debug)]
pub enum PrintersCommands {
    /// List registered printers
    List(PrintersListArgs),
    /// Register a new printer
    Add(PrintersAddArgs),
}

#[derive(Args, Debug)]
pub struct PrintersListArgs {
    #[command(flatten)]
    pub backend: BackendArgs,

    /// Output as JSON
    #[arg(long)]
    pub json: bool,
}

#[derive(Args, Debug)]
pub struct PrintersAddArgs {
    /// Display name
    pub name: String,

    /// IP address or host name of the printer
    pub ip_address: String,

    /// API port
    #[arg(short, long, default_value = "7125")]
    pub port: u16,

    /// Printer firmware API (MOONRAKER)
    #[arg(short = 't', long = "type", default_value = "MOONRAKER")]
    pub printer_type: String,

    /// API key, if the printer requires one
    #[arg(short = 'k', long)]
    pub api_key: Option<String>,

    #[command(flatten)]
    pub backend: BackendArgs,
}

#[derive(Args, Debug)]
pub struct SendArgs {
    /// Printer id
    pub printer: String,

    /// G-code, macro, or quick command label (e.g. "home axes")
    #[arg(required = true, num_args = 1..)]
    pub command: Vec<String>,

    #[command(flatten)]
    pub backend: BackendArgs,
}

#[derive(Args, Debug)]
pub struct CommandsArgs {
    /// Output as JSON
    #[arg(long)]
    pub json: bool,
}

#[derive(Subcommand, Debug)]
pub enum TokenCommands {
    /// Store a bearer token
    Set(TokenSetArgs),
    /// Forget the stored token
    Clear(TokenClearArgs),
}

#[derive(Args, Debug)]
pub struct TokenSetArgs {
    /// Bearer token
    pub token: String,

    #[command(flatten)]
    pub backend: BackendArgs,
}

#[derive(Args, Debug)]
pub struct TokenClearArgs {
    #[command(flatten)]
    pub backend: BackendArgs,
}

#[derive(Subcommand, Debug)]
pub enum ConfigCommands {
    /// Initialize a new configuration file
    Init(ConfigInitArgs),
}

#[derive(Args, Debug)]
pub struct ConfigInitArgs {
    /// Output file path
    #[arg(short, long, default_value = "printwatch.toml")]
    pub output: PathBuf,

    /// Overwrite existing file
    #[arg(short, long)]
    pub force: bool,
}

#[derive(Args, Debug)]
pub struct CompletionsArgs {
    /// Shell to generate completions for
    #[arg(value_enum)]
    pub shell: clap_complete::Shell,
}
