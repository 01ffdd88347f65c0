//! Backend endpoint configuration and retry policy.

use shared_types::ConfigError;
use std::fmt;
use std::time::Duration;

/// Where the backend lives and the public key used to reach it.
#[derive(Clone, PartialEq, Eq, Default)]
pub struct BackendConfig {
    pub url: String,
    pub anon_key: String,
}

impl BackendConfig {
    pub fn new(url: impl Into<String>, anon_key: impl Into<String>) -> Self {
        Self {
            url: url.into(),
            anon_key: anon_key.into(),
        }
    }

    /// Reject a configuration with a blank endpoint or key.
    pub fn validate(&self) -> Result<(), ConfigError> {
        if self.url.trim().is_empty() {
            return Err(ConfigError::MissingBackendSetting("url"));
        }
        if self.anon_key.trim().is_empty() {
            return Err(ConfigError::MissingBackendSetting("anon_key"));
        }
        Ok(())
    }
}

// The key never reaches logs.
impl fmt::Debug for BackendConfig {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("BackendConfig")
            .field("url", &self.url)
            .field("anon_key", &"<redacted>")
            .finish()
    }
}

/// Attempt ceiling and fixed delay between attempts.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct RetryPolicy {
    /// Total attempts per acquisition sequence.
    pub max_attempts: u32,
    /// Pause after a failed attempt.
    pub delay: Duration,
}

impl Default for RetryPolicy {
    fn default() -> Self {
        Self {
            max_attempts: 3,
            delay: Duration::from_millis(1000),
        }
    }
}

impl RetryPolicy {
    /// Same ceiling, no pause. Used by tests and the demo binary.
    pub fn immediate(max_attempts: u32) -> Self {
        Self {
            max_attempts,
            delay: Duration::ZERO,
        }
    }
}
