//! Logging setup for printwatch
//!
//! Logs go to stderr so that command output on stdout stays machine-readable.

use crate::config::{LogFormat, LoggingConfig};
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt, EnvFilter};

/// Build filter directives string from LoggingConfig
///
/// Constructs a tracing filter string that includes the base log level
/// and any component-specific log levels configured in the LoggingConfig.
/// Components are sorted so the result is stable.
///
/// # Examples
///
/// ```
/// use printwatch::config::{LogFormat, LoggingConfig};
/// use printwatch::logging::build_filter_directives;
/// use std::collections::HashMap;
///
/// let mut component_levels = HashMap::new();
/// component_levels.insert("poller".to_string(), "debug".to_string());
///
/// let config = LoggingConfig {
///     level: "info".to_string(),
///     format: LogFormat::Pretty,
///     component_levels: Some(component_levels),
/// };
///
/// let filter_str = build_filter_directives(&config);
/// assert_eq!(filter_str, "info,printwatch::poller=debug");
/// ```
pub fn build_filter_directives(config: &LoggingConfig) -> String {
    let mut filter_str = config.level.clone();

    if let Some(component_levels) = &config.component_levels {
        let mut components: Vec<_> = component_levels.iter().collect();
        components.sort();
        for (component, level) in components {
            filter_str.push_str(&format!(",printwatch::{}={}", component, level));
        }
    }

    filter_str
}

/// Initialize the global tracing subscriber.
///
/// `RUST_LOG` takes precedence over the configured directives.
pub fn init_tracing(config: &LoggingConfig) -> Result<(), Box<dyn std::error::Error>> {
    let filter_str = build_filter_directives(config);
    let env_filter =
        EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(&filter_str));

    match config.format {
        LogFormat::Pretty => {
            tracing_subscriber::registry()
                .with(env_filter)
                .with(tracing_subscriber::fmt::layer().with_writer(std::io::stderr))
                .try_init()?;
        }
        LogFormat::Json => {
            tracing_subscriber::registry()
                .with(env_filter)
                .with(
                    tracing_subscriber::fmt::layer()
                        .json()
                        .with_writer(std::io::stderr),
                )
                .try_init()?;
        }
    }

    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::HashMap;

    #[test]
    fn test_filter_without_components() {
        let config = LoggingConfig::default();
        assert_eq!(build_filter_directives(&config), "warn");
    }

    #[test]
    fn test_filter_components_are_sorted() {
        let component_levels = HashMap::from([
            ("poller".to_string(), "trace".to_string()),
            ("client".to_string(), "debug".to_string()),
        ]);
        let config = LoggingConfig {
            level: "info".to_string(),
            component_levels: Some(component_levels),
            ..Default::default()
        };

        assert_eq!(
            build_filter_directives(&config),
            "info,printwatch::client=debug,printwatch::poller=trace"
        );
    }
}
