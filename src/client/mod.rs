//! Printer backend client.
//!
//! [`PrinterApi`] is the seam between the poller and the REST backend. The
//! poller only ever talks to the trait, so tests drive it with scripted
//! implementations while the binary uses [`HttpPrinterApi`].

mod error;
mod http;
mod session;

pub use error::ClientError;
pub use http::HttpPrinterApi;
pub use session::{FileSessionStore, MemorySessionStore, SessionStore};

use crate::registry::{NewPrinter, Printer, PrinterId};
use crate::telemetry::TelemetrySnapshot;
use async_trait::async_trait;
use serde::{Deserialize, Serialize};

/// Backend acknowledgement of a printer command.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct CommandAck {
    pub success: Option<bool>,
    pub message: Option<String>,
}

/// Operations the printer backend exposes.
///
/// # Object Safety
///
/// Designed to be used as `Arc<dyn PrinterApi>`.
#[async_trait]
pub trait PrinterApi: Send + Sync + 'static {
    /// List all registered printers.
    async fn list_printers(&self) -> Result<Vec<Printer>, ClientError>;

    /// Fetch the current telemetry snapshot.
    ///
    /// Returns `Ok(None)` when the backend answers with an empty body or
    /// `null`.
    async fn fetch_state(&self, id: &PrinterId) -> Result<Option<TelemetrySnapshot>, ClientError>;

    /// Fetch up to `limit` past snapshots.
    async fn fetch_history(
        &self,
        id: &PrinterId,
        limit: u32,
    ) -> Result<Vec<TelemetrySnapshot>, ClientError>;

    /// Send a raw command (G-code or Klipper macro) to a printer.
    async fn send_command(&self, id: &PrinterId, command: &str) -> Result<CommandAck, ClientError>;

    /// Register a new printer; the backend assigns its id.
    async fn create_printer(&self, printer: &NewPrinter) -> Result<Printer, ClientError>;
}
