//! Error types for poller actions.

use crate::client::ClientError;
use crate::registry::RegistryError;
use thiserror::Error;

/// Errors surfaced to the operator by poller actions.
///
/// Poll failures never show up here: they are absorbed by the poll loop and
/// reported through the staleness read model instead.
#[derive(Debug, Error)]
pub enum PollerError {
    #[error("no printer selected")]
    NoPrinterSelected,

    #[error("command cannot be empty")]
    EmptyCommand,

    #[error(transparent)]
    Registry(#[from] RegistryError),

    #[error("command '{command}' failed: {source}")]
    Command {
        command: String,
        #[source]
        source: ClientError,
    },

    #[error("unable to create printer: {0}")]
    CreatePrinter(#[source] ClientError),
}
