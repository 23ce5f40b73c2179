use super::RegistryError;
use serde::{Deserialize, Deserializer, Serialize};
use std::fmt;
use std::str::FromStr;

/// Default Moonraker API port.
pub const DEFAULT_MOONRAKER_PORT: u16 = 7125;

/// Backend-assigned printer identifier.
///
/// The backend stores ids as integers but some endpoints return them as
/// strings, so both JSON forms are accepted.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize)]
#[serde(transparent)]
pub struct PrinterId(String);

impl PrinterId {
    pub fn new(id: impl Into<String>) -> Self {
        Self(id.into())
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }

    /// Whether the id can be placed in a URL path as is.
    ///
    /// Only unreserved URL characters qualify, so the id always stays a
    /// single path segment.
    pub fn is_path_safe(&self) -> bool {
        !self.0.is_empty()
            && self
                .0
                .bytes()
                .all(|b| b.is_ascii_alphanumeric() || matches!(b, b'-' | b'.' | b'_' | b'~'))
            && self.0 != "."
            && self.0 != ".."
    }
}

impl fmt::Display for PrinterId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

impl From<&str> for PrinterId {
    fn from(id: &str) -> Self {
        Self(id.to_string())
    }
}

impl From<String> for PrinterId {
    fn from(id: String) -> Self {
        Self(id)
    }
}

impl<'de> Deserialize<'de> for PrinterId {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        #[derive(Deserialize)]
        #[serde(untagged)]
        enum RawId {
            Text(String),
            Number(i64),
        }

        Ok(match RawId::deserialize(deserializer)? {
            RawId::Text(text) => PrinterId(text),
            RawId::Number(number) => PrinterId(number.to_string()),
        })
    }
}

/// Connector type the backend uses to talk to the printer.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum PrinterType {
    /// Klipper printers exposed through Moonraker
    #[default]
    Moonraker,
    /// Connector type this client does not know about
    #[serde(other)]
    Unknown,
}

impl FromStr for PrinterType {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_lowercase().as_str() {
            "moonraker" => Ok(PrinterType::Moonraker),
            _ => Err(format!("Invalid printer type: {}", s)),
        }
    }
}

impl fmt::Display for PrinterType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            PrinterType::Moonraker => f.write_str("MOONRAKER"),
            PrinterType::Unknown => f.write_str("UNKNOWN"),
        }
    }
}

/// A printer registered with the backend.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Printer {
    pub id: PrinterId,
    pub name: String,
    #[serde(rename = "type", default)]
    pub printer_type: PrinterType,
    #[serde(default)]
    pub ip_address: String,
    #[serde(default)]
    pub port: Option<u16>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub api_key: Option<String>,
}

impl Printer {
    /// `host:port` the backend connects to, as shown to operators.
    pub fn address(&self) -> String {
        match self.port {
            Some(port) => format!("{}:{}", self.ip_address, port),
            None => self.ip_address.clone(),
        }
    }
}

/// Payload for registering a new printer.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct NewPrinter {
    pub name: String,
    #[serde(rename = "type")]
    pub printer_type: PrinterType,
    pub ip_address: String,
    pub port: Option<u16>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub api_key: Option<String>,
}

impl Default for NewPrinter {
    fn default() -> Self {
        Self {
            name: String::new(),
            printer_type: PrinterType::Moonraker,
            ip_address: String::new(),
            port: Some(DEFAULT_MOONRAKER_PORT),
            api_key: None,
        }
    }
}

impl NewPrinter {
    /// Trim text fields and drop a blank API key.
    pub fn normalized(mut self) -> Self {
        self.name = self.name.trim().to_string();
        self.ip_address = self.ip_address.trim().to_string();
        self.api_key = self
            .api_key
            .map(|key| key.trim().to_string())
            .filter(|key| !key.is_empty());
        self
    }

    /// Check the fields the creation form requires.
    pub fn validate(&self) -> Result<(), RegistryError> {
        if self.name.trim().is_empty() {
            return Err(RegistryError::InvalidPrinter {
                field: "name".to_string(),
                message: "name cannot be empty".to_string(),
            });
        }
        if self.ip_address.trim().is_empty() {
            return Err(RegistryError::InvalidPrinter {
                field: "ipAddress".to_string(),
                message: "IP address cannot be empty".to_string(),
            });
        }
        if self.port == Some(0) {
            return Err(RegistryError::InvalidPrinter {
                field: "port".to_string(),
                message: "port must be between 1 and 65535".to_string(),
            });
        }
        Ok(())
    }
}
