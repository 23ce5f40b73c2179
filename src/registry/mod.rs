//! Printer Registry module.
//!
//! Holds the list of known printers and the operator's current selection.

mod error;
mod printer;

pub use error::*;
pub use printer::*;

use std::sync::{PoisonError, RwLock};

/// Outcome of replacing the printer list.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SelectionChange {
    /// Selection before the list was replaced
    pub previous: Option<PrinterId>,
    /// Selection after the list was replaced
    pub current: Option<PrinterId>,
}

impl SelectionChange {
    /// Whether the selected printer differs from before.
    pub fn changed(&self) -> bool {
        self.previous != self.current
    }
}

/// The Printer Registry stores all known printers and the selected one.
///
/// # Examples
///
/// ```
/// use printwatch::registry::{Printer, PrinterId, PrinterRegistry, PrinterType};
///
/// let registry = PrinterRegistry::new();
/// let printer = Printer {
///     id: PrinterId::from("1"),
///     name: "Voron".to_string(),
///     printer_type: PrinterType::Moonraker,
///     ip_address: "10.0.0.5".to_string(),
///     port: Some(7125),
///     api_key: None,
/// };
///
/// registry.replace(vec![printer], Some(&PrinterId::from("1")));
/// assert_eq!(registry.selected_id(), Some(PrinterId::from("1")));
/// ```
#[derive(Debug, Default)]
pub struct PrinterRegistry {
    printers: RwLock<Vec<Printer>>,
    selected: RwLock<Option<PrinterId>>,
}

impl PrinterRegistry {
    /// Create a new empty registry with nothing selected.
    pub fn new() -> Self {
        Self::default()
    }

    /// All known printers in backend order.
    pub fn printers(&self) -> Vec<Printer> {
        self.printers
            .read()
            .unwrap_or_else(PoisonError::into_inner)
            .clone()
    }

    pub fn printer_count(&self) -> usize {
        self.printers
            .read()
            .unwrap_or_else(PoisonError::into_inner)
            .len()
    }

    /// Get a printer by id.
    pub fn get(&self, id: &PrinterId) -> Option<Printer> {
        self.printers
            .read()
            .unwrap_or_else(PoisonError::into_inner)
            .iter()
            .find(|printer| &printer.id == id)
            .cloned()
    }

    pub fn contains(&self, id: &PrinterId) -> bool {
        self.get(id).is_some()
    }

    pub fn selected_id(&self) -> Option<PrinterId> {
        self.selected
            .read()
            .unwrap_or_else(PoisonError::into_inner)
            .clone()
    }

    /// The selected printer, if it is still in the list.
    pub fn selected(&self) -> Option<Printer> {
        self.selected_id().and_then(|id| self.get(&id))
    }

    /// Select a listed printer.
    ///
    /// # Errors
    ///
    /// Returns `RegistryError::PrinterNotFound` if the id is not in the list.
    pub fn select(&self, id: &PrinterId) -> Result<Printer, RegistryError> {
        let printer = self
            .get(id)
            .ok_or_else(|| RegistryError::PrinterNotFound(id.to_string()))?;
        *self.selected.write().unwrap_or_else(PoisonError::into_inner) = Some(id.clone());
        Ok(printer)
    }

    /// Clear the selection, returning what was selected.
    pub fn clear_selection(&self) -> Option<PrinterId> {
        self.selected
            .write()
            .unwrap_or_else(PoisonError::into_inner)
            .take()
    }

    /// Replace the printer list and reconcile the selection.
    ///
    /// An empty list clears the selection. A `preferred` id present in the
    /// new list becomes selected. Otherwise the previous selection is kept
    /// when it is still listed, and cleared when it is not. The registry
    /// never falls back to the first printer.
    pub fn replace(&self, printers: Vec<Printer>, preferred: Option<&PrinterId>) -> SelectionChange {
        let mut list = self.printers.write().unwrap_or_else(PoisonError::into_inner);
        let mut selected = self.selected.write().unwrap_or_else(PoisonError::into_inner);
        let previous = selected.clone();

        let listed = |id: &PrinterId| printers.iter().any(|printer| &printer.id == id);

        let current = if printers.is_empty() {
            None
        } else if let Some(id) = preferred.filter(|id| listed(*id)) {
            Some(id.clone())
        } else {
            previous.clone().filter(|id| listed(id))
        };

        *list = printers;
        *selected = current.clone();

        SelectionChange { previous, current }
    }
}
