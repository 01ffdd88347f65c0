//! Backend and connectivity errors.

use shared_types::ConfigError;
use thiserror::Error;

/// A single backend request failed.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum BackendError {
    /// A data-store request was rejected or could not be completed.
    #[error("Request to {table} failed: {message}")]
    Request { table: String, message: String },

    /// A request expected exactly one row and found none.
    #[error("No {what} found")]
    NotFound { what: String },

    /// The identity provider rejected a credential or session operation.
    #[error("Authentication error: {0}")]
    Auth(String),

    /// The identity referenced by an admin operation does not exist.
    #[error("User not found: {0}")]
    UserNotFound(String),

    /// The backend could not be reached at all.
    #[error("Backend unavailable: {0}")]
    Unavailable(String),
}

impl BackendError {
    pub fn request(table: impl Into<String>, message: impl Into<String>) -> Self {
        Self::Request {
            table: table.into(),
            message: message.into(),
        }
    }

    /// Whether the error reports a missing identity.
    pub fn is_user_not_found(&self) -> bool {
        match self {
            Self::UserNotFound(_) => true,
            Self::Auth(message) => message.to_lowercase().contains("user not found"),
            _ => false,
        }
    }

    /// Whether the error reports a table that does not exist.
    pub fn is_missing_relation(&self) -> bool {
        matches!(self, Self::Request { message, .. } if message.contains("does not exist"))
    }
}

/// Acquiring a verified backend client failed.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum ConnectivityError {
    /// Endpoint or key missing; no attempt was made.
    #[error(transparent)]
    Configuration(#[from] ConfigError),

    /// Every attempt failed to construct or probe a client.
    #[error("Backend connection failed after {attempts} attempts: {last_cause}")]
    Exhausted {
        attempts: u32,
        last_cause: BackendError,
    },
}

impl ConnectivityError {
    /// Attempts consumed before giving up.
    pub fn attempts(&self) -> u32 {
        match self {
            Self::Configuration(_) => 0,
            Self::Exhausted { attempts, .. } => *attempts,
        }
    }
}
