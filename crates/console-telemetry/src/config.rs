//! Telemetry configuration from environment variables.

use std::env;

/// Configuration for console logging.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TelemetryConfig {
    /// Service name stamped on every log line
    pub service_name: String,

    /// Log level filter (trace, debug, info, warn, error) or a full
    /// `EnvFilter` directive
    pub log_level: String,

    /// Whether to write logs to stdout at all
    pub console_output: bool,

    /// Whether to enable JSON formatted logs
    pub json_logs: bool,

    /// Whether to include file and line in each record
    pub source_location: bool,
}

impl Default for TelemetryConfig {
    fn default() -> Self {
        Self {
            service_name: "supervision-console".to_string(),
            log_level: "info".to_string(),
            console_output: true,
            json_logs: false,
            source_location: false,
        }
    }
}

impl TelemetryConfig {
    /// Create configuration from environment variables.
    ///
    /// # Environment Variables
    ///
    /// - `SC_SERVICE_NAME`: Service name (default: supervision-console)
    /// - `SC_LOG_LEVEL` or `RUST_LOG`: Log level (default: info)
    /// - `SC_CONSOLE_OUTPUT`: Enable console output (default: true)
    /// - `SC_JSON_LOGS`: Enable JSON logs (default: false, true in containers)
    /// - `SC_SOURCE_LOCATION`: Include file/line (default: false)
    pub fn from_env() -> Self {
        Self::from_lookup(|key| env::var(key).ok())
    }

    /// Build from an arbitrary key lookup. `from_env` delegates here.
    pub fn from_lookup<F>(lookup: F) -> Self
    where
        F: Fn(&str) -> Option<String>,
    {
        let is_container =
            lookup("KUBERNETES_SERVICE_HOST").is_some() || lookup("DOCKER_CONTAINER").is_some();
        let flag = |key: &str, default: bool| {
            lookup(key)
                .map(|v| matches!(v.to_lowercase().as_str(), "true" | "1" | "yes"))
                .unwrap_or(default)
        };

        Self {
            service_name: lookup("SC_SERVICE_NAME")
                .unwrap_or_else(|| "supervision-console".to_string()),

            log_level: lookup("SC_LOG_LEVEL")
                .or_else(|| lookup("RUST_LOG"))
                .unwrap_or_else(|| "info".to_string()),

            console_output: lookup("SC_CONSOLE_OUTPUT")
                .map(|v| v.to_lowercase() != "false" && v != "0")
                .unwrap_or(true),

            json_logs: flag("SC_JSON_LOGS", is_container),

            source_location: flag("SC_SOURCE_LOCATION", false),
        }
    }

    /// Configuration for a named component, e.g. a demo binary.
    pub fn for_component(component: &str) -> Self {
        let mut config = Self::from_env();
        config.service_name = format!("{}-{}", config.service_name, component);
        config
    }
}
