//! Backend API configuration

use serde::{Deserialize, Serialize};
use std::path::PathBuf;

/// Placeholder replaced with the printer id in endpoint templates.
pub const PRINTER_ID_PLACEHOLDER: &str = "{id}";

/// Where the printer REST API lives and how to reach it.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct BackendConfig {
    /// Base URL of the backend (e.g., "http://localhost:8080")
    pub base_url: String,
    /// Timeout for each request
    pub timeout_seconds: u64,
    /// File holding the bearer token sent with every request
    #[serde(skip_serializing_if = "Option::is_none")]
    pub token_file: Option<PathBuf>,
    /// Endpoint path templates
    pub endpoints: EndpointsConfig,
}

impl Default for BackendConfig {
    fn default() -> Self {
        Self {
            base_url: "http://localhost:8080".to_string(),
            timeout_seconds: 5,
            token_file: None,
            endpoints: EndpointsConfig::default(),
        }
    }
}

/// Endpoint path templates relative to `base_url`.
///
/// Per-printer paths must contain the `{id}` placeholder.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct EndpointsConfig {
    /// `GET` lists printers, `POST` creates one
    pub printers: String,
    /// `GET` current telemetry snapshot
    pub state: String,
    /// `GET` snapshot history, takes a `limit` query parameter
    pub history: String,
    /// `POST` a command
    pub command: String,
}

impl Default for EndpointsConfig {
    fn default() -> Self {
        Self {
            printers: "/api/printers".to_string(),
            state: "/api/printers/{id}/state".to_string(),
            history: "/api/printers/{id}/history".to_string(),
            command: "/api/printers/{id}/command".to_string(),
        }
    }
}

impl EndpointsConfig {
    /// Per-printer templates with their config field names.
    pub fn printer_templates(&self) -> [(&'static str, &str); 3] {
        [
            ("state", &self.state),
            ("history", &self.history),
            ("command", &self.command),
        ]
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_backend_config_defaults() {
        let config = BackendConfig::default();
        assert_eq!(config.base_url, "http://localhost:8080");
        assert_eq!(config.timeout_seconds, 5);
        assert!(config.token_file.is_none());
        assert_eq!(config.endpoints.state, "/api/printers/{id}/state");
    }

    #[test]
    fn test_endpoint_overrides_from_toml() {
        let toml = r#"
        base_url = "http://fablab:8080"

        [endpoints]
        state = "/api/test/printers/{id}/fetch"
        "#;

        let config: BackendConfig = toml::from_str(toml).unwrap();
        assert_eq!(config.base_url, "http://fablab:8080");
        assert_eq!(config.endpoints.state, "/api/test/printers/{id}/fetch");
        assert_eq!(config.endpoints.printers, "/api/printers");
    }

    #[test]
    fn test_printer_templates_all_have_placeholder_by_default() {
        let endpoints = EndpointsConfig::default();
        for (_, template) in endpoints.printer_templates() {
            assert!(template.contains(PRINTER_ID_PLACEHOLDER));
        }
    }
}
