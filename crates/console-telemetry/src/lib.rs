//! # Console Telemetry
//!
//! Structured logging for the supervision console, built on `tracing` and
//! `tracing-subscriber`.
//!
//! ## Usage
//!
//! ```rust,ignore
//! use console_telemetry::{init_telemetry, TelemetryConfig};
//!
//! fn main() -> anyhow::Result<()> {
//!     init_telemetry(&TelemetryConfig::from_env())?;
//!     // Logs are now being collected
//!     Ok(())
//! }
//! ```
//!
//! ## Environment Variables
//!
//! | Variable | Default | Description |
//! |----------|---------|-------------|
//! | `SC_SERVICE_NAME` | `supervision-console` | Service name in logs |
//! | `SC_LOG_LEVEL` | `info` | Log level filter |
//! | `SC_JSON_LOGS` | `false` | Emit JSON records |
//! | `SC_CONSOLE_OUTPUT` | `true` | Write to stdout |
//! | `SC_SOURCE_LOCATION` | `false` | Include file and line |

mod config;
mod logging;

pub use config::TelemetryConfig;
pub use logging::{build_filter, init_logging};

use thiserror::Error;

/// Telemetry initialization errors
#[derive(Error, Debug)]
pub enum TelemetryError {
    #[error("Invalid configuration: {0}")]
    Config(String),

    #[error("Global subscriber already set: {0}")]
    AlreadyInitialized(String),
}

/// Initialize logging for the process.
pub fn init_telemetry(config: &TelemetryConfig) -> Result<(), TelemetryError> {
    init_logging(config)
}

/// Convenience macro for creating a span with component context.
///
/// ```rust,ignore
/// let _span = component_span!("bootstrap", component = "app", path = "/admin.html");
/// ```
#[macro_export]
macro_rules! component_span {
    ($name:expr, $($field:tt)*) => {
        tracing::info_span!($name, $($field)*)
    };
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_default_service_name() {
        let config = TelemetryConfig::default();
        assert_eq!(config.service_name, "supervision-console");
    }

    #[test]
    fn test_component_span_macro() {
        let span = component_span!("bootstrap", component = "app");
        let _guard = span.enter();
    }
}
