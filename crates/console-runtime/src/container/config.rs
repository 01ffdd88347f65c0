//! # Console Configuration
//!
//! Everything the console needs before it can start: where the backend
//! lives, how hard to try reaching it, and the page paths it routes between.
//!
//! ## Environment Variables
//!
//! | Variable | Field | Default |
//! |----------|-------|---------|
//! | `SC_BACKEND_URL` | `backend.url` | empty (acquisition fails) |
//! | `SC_BACKEND_ANON_KEY` | `backend.anon_key` | empty (acquisition fails) |
//! | `SC_RETRY_MAX` | `retry.max_attempts` | 3 |
//! | `SC_RETRY_DELAY_MS` | `retry.delay` | 1000 |

use sc_01_backend_client::{BackendConfig, RetryPolicy};
use shared_types::{ConfigError, RouteTable};
use std::env;
use std::time::Duration;
use tracing::info;

/// Complete console configuration.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ConsoleConfig {
    /// Backend endpoint and public key.
    pub backend: BackendConfig,
    /// Destination paths.
    pub routes: RouteTable,
    /// Backend acquisition ceiling.
    pub retry: RetryPolicy,
}

impl ConsoleConfig {
    /// Build from an arbitrary key lookup. [`load_config`] delegates here.
    pub fn from_lookup<F>(lookup: F) -> Result<Self, ConfigError>
    where
        F: Fn(&str) -> Option<String>,
    {
        let mut config = Self::default();

        if let Some(url) = lookup("SC_BACKEND_URL") {
            config.backend.url = url;
        }
        if let Some(key) = lookup("SC_BACKEND_ANON_KEY") {
            config.backend.anon_key = key;
        }
        if let Some(value) = lookup("SC_RETRY_MAX") {
            config.retry.max_attempts = match value.trim().parse::<u32>() {
                Ok(n) if n > 0 => n,
                _ => {
                    return Err(ConfigError::InvalidSetting {
                        key: "SC_RETRY_MAX",
                        value,
                    })
                }
            };
        }
        if let Some(value) = lookup("SC_RETRY_DELAY_MS") {
            let millis = value
                .trim()
                .parse::<u64>()
                .map_err(|_| ConfigError::InvalidSetting {
                    key: "SC_RETRY_DELAY_MS",
                    value: value.clone(),
                })?;
            config.retry.delay = Duration::from_millis(millis);
        }

        Ok(config)
    }

    /// Route paths must be complete. Backend settings are checked when the
    /// client is first acquired so the failure surfaces through the fatal
    /// panel.
    pub fn validate(&self) -> Result<(), ConfigError> {
        self.routes.validate()
    }
}

/// Load configuration from the process environment.
pub fn load_config() -> Result<ConsoleConfig, ConfigError> {
    let config = ConsoleConfig::from_lookup(|key| env::var(key).ok())?;
    info!(
        backend = ?config.backend,
        max_attempts = config.retry.max_attempts,
        "Loaded console configuration"
    );
    Ok(config)
}
