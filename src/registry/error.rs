/// Errors that can occur during registry operations
#[derive(Debug, thiserror::Error)]
pub enum RegistryError {
    #[error("printer not found: {0}")]
    PrinterNotFound(String),

    #[error("invalid value for '{field}': {message}")]
    InvalidPrinter { field: String, message: String },
}
