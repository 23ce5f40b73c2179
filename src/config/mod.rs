//! Configuration module for printwatch
//!
//! Provides layered configuration loading from files, environment variables, and defaults.
//!
//! # Configuration Precedence
//!
//! 1. CLI arguments (highest priority)
//! 2. Environment variables (`PRINTWATCH_*`)
//! 3. Configuration file (TOML)
//! 4. Default values (lowest priority)
//!
//! # Example
//!
//! ```rust
//! use printwatch::config::PrintwatchConfig;
//!
//! let toml = r#"
//! [polling]
//! interval_ms = 1000
//! "#;
//! let config: PrintwatchConfig = toml::from_str(toml).unwrap();
//! assert_eq!(config.polling.interval_ms, 1000);
//! assert_eq!(config.polling.failure_ceiling, 3);
//! ```

pub mod backend;
pub mod error;
pub mod logging;
pub mod polling;

pub use backend::{BackendConfig, EndpointsConfig, PRINTER_ID_PLACEHOLDER};
pub use error::ConfigError;
pub use logging::{LogFormat, LoggingConfig};
pub use polling::PollingConfig;

use serde::{Deserialize, Serialize};
use std::path::Path;

/// Unified configuration for printwatch.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, Default)]
#[serde(default)]
pub struct PrintwatchConfig {
    /// Printer REST backend
    pub backend: BackendConfig,
    /// Poll loop tuning
    pub polling: PollingConfig,
    /// Logging configuration
    pub logging: LoggingConfig,
}

impl PrintwatchConfig {
    /// Load configuration from a TOML file
    ///
    /// If path is None, returns default configuration.
    /// If path doesn't exist, returns NotFound error.
    pub fn load(path: Option<&Path>) -> Result<Self, ConfigError> {
        match path {
            Some(p) => {
                if !p.exists() {
                    return Err(ConfigError::NotFound(p.to_path_buf()));
                }
                let content = std::fs::read_to_string(p).map_err(|source| ConfigError::Read {
                    path: p.to_path_buf(),
                    source,
                })?;
                toml::from_str(&content).map_err(|source| ConfigError::Parse {
                    path: p.to_path_buf(),
                    source,
                })
            }
            None => Ok(Self::default()),
        }
    }

    /// Load the file when it exists, defaults otherwise.
    pub fn load_or_default(path: &Path) -> Result<Self, ConfigError> {
        if path.exists() {
            Self::load(Some(path))
        } else {
            tracing::debug!(path = %path.display(), "Config file not found, using defaults");
            Ok(Self::default())
        }
    }

    /// Apply environment variable overrides
    ///
    /// Invalid values are silently ignored (defaults are kept).
    pub fn with_env_overrides(mut self) -> Self {
        if let Ok(url) = std::env::var("PRINTWATCH_BACKEND_URL") {
            self.backend.base_url = url;
        }
        if let Ok(path) = std::env::var("PRINTWATCH_TOKEN_FILE") {
            self.backend.token_file = Some(path.into());
        }

        if let Ok(interval) = std::env::var("PRINTWATCH_POLL_INTERVAL_MS") {
            if let Ok(ms) = interval.parse() {
                self.polling.interval_ms = ms;
            }
        }
        if let Ok(auto) = std::env::var("PRINTWATCH_AUTO_REFRESH") {
            self.polling.auto_refresh = auto.to_lowercase() == "true";
        }

        if let Ok(level) = std::env::var("PRINTWATCH_LOG_LEVEL") {
            self.logging.level = level;
        }
        if let Ok(format) = std::env::var("PRINTWATCH_LOG_FORMAT") {
            if let Ok(f) = format.parse() {
                self.logging.format = f;
            }
        }

        self
    }

    /// Validate configuration
    pub fn validate(&self) -> Result<(), ConfigError> {
        if self.backend.base_url.trim().is_empty() {
            return Err(ConfigError::invalid("backend.base_url", "URL cannot be empty"));
        }
        if let Err(e) = reqwest::Url::parse(&self.backend.base_url) {
            return Err(ConfigError::invalid(
                "backend.base_url",
                format!("invalid URL: {}", e),
            ));
        }
        if self.backend.timeout_seconds == 0 {
            return Err(ConfigError::invalid(
                "backend.timeout_seconds",
                "timeout must be non-zero",
            ));
        }

        for (name, template) in self.backend.endpoints.printer_templates() {
            if !template.contains(PRINTER_ID_PLACEHOLDER) {
                return Err(ConfigError::invalid(
                    format!("backend.endpoints.{}", name),
                    format!("path must contain {}", PRINTER_ID_PLACEHOLDER),
                ));
            }
        }

        if self.polling.interval_ms == 0 {
            return Err(ConfigError::invalid(
                "polling.interval_ms",
                "interval must be non-zero",
            ));
        }
        if self.polling.failure_ceiling == 0 {
            return Err(ConfigError::invalid(
                "polling.failure_ceiling",
                "failure ceiling must be at least 1",
            ));
        }
        if self.polling.history_limit == 0 {
            return Err(ConfigError::invalid(
                "polling.history_limit",
                "history limit must be at least 1",
            ));
        }

        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::path::Path;

    #[test]
    fn test_config_defaults() {
        let config = PrintwatchConfig::default();
        assert_eq!(config.backend.base_url, "http://localhost:8080");
        assert_eq!(config.polling.interval_ms, 2000);
        assert_eq!(config.polling.failure_ceiling, 3);
        assert!(config.validate().is_ok());
    }

    #[test]
    fn test_config_parse_full_toml() {
        let toml = include_str!("../../printwatch.example.toml");
        let config: PrintwatchConfig = toml::from_str(toml).unwrap();
        assert!(config.validate().is_ok());
        assert_eq!(config.polling.history_limit, 50);
    }

    #[test]
    fn test_config_load_from_file() {
        let temp = tempfile::NamedTempFile::new().unwrap();
        std::fs::write(temp.path(), "[backend]\nbase_url = \"http://printers:9000\"").unwrap();

        let config = PrintwatchConfig::load(Some(temp.path())).unwrap();
        assert_eq!(config.backend.base_url, "http://printers:9000");
    }

    #[test]
    fn test_config_missing_file_error() {
        let result = PrintwatchConfig::load(Some(Path::new("/nonexistent/printwatch.toml")));
        assert!(matches!(result, Err(ConfigError::NotFound(_))));
    }

    #[test]
    fn test_config_load_or_default_missing_file() {
        let config =
            PrintwatchConfig::load_or_default(Path::new("/nonexistent/printwatch.toml")).unwrap();
        assert_eq!(config, PrintwatchConfig::default());
    }

    #[test]
    fn test_config_parse_error() {
        let temp = tempfile::NamedTempFile::new().unwrap();
        std::fs::write(temp.path(), "[polling\ninterval_ms = ").unwrap();

        let err = PrintwatchConfig::load(Some(temp.path())).unwrap_err();
        assert!(matches!(err, ConfigError::Parse { ref path, .. } if path == temp.path()));
        assert!(err
            .to_string()
            .contains(&temp.path().display().to_string()));
    }

    #[test]
    fn test_config_env_overrides() {
        std::env::set_var("PRINTWATCH_BACKEND_URL", "http://10.1.1.1:8080");
        std::env::set_var("PRINTWATCH_POLL_INTERVAL_MS", "not-a-number");
        std::env::set_var("PRINTWATCH_AUTO_REFRESH", "false");
        let config = PrintwatchConfig::default().with_env_overrides();
        std::env::remove_var("PRINTWATCH_BACKEND_URL");
        std::env::remove_var("PRINTWATCH_POLL_INTERVAL_MS");
        std::env::remove_var("PRINTWATCH_AUTO_REFRESH");

        assert_eq!(config.backend.base_url, "http://10.1.1.1:8080");
        assert_eq!(config.polling.interval_ms, 2000);
        assert!(!config.polling.auto_refresh);
    }

    #[test]
    fn test_config_validation_bad_url() {
        let mut config = PrintwatchConfig::default();
        config.backend.base_url = "not a url".to_string();

        assert!(matches!(
            config.validate(),
            Err(ConfigError::Validation { ref field, .. }) if field == "backend.base_url"
        ));
    }

    #[test]
    fn test_config_validation_template_without_placeholder() {
        let mut config = PrintwatchConfig::default();
        config.backend.endpoints.history = "/api/history".to_string();

        assert!(matches!(
            config.validate(),
            Err(ConfigError::Validation { ref field, .. }) if field == "backend.endpoints.history"
        ));
    }

    #[test]
    fn test_config_validation_zero_ceiling() {
        let mut config = PrintwatchConfig::default();
        config.polling.failure_ceiling = 0;

        assert!(matches!(
            config.validate(),
            Err(ConfigError::Validation { ref field, .. }) if field == "polling.failure_ceiling"
        ));
    }

    #[test]
    fn test_config_validation_zero_interval() {
        let mut config = PrintwatchConfig::default();
        config.polling.interval_ms = 0;
        assert!(config.validate().is_err());
    }
}
