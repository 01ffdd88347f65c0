//! Session manager errors.

use sc_01_backend_client::{BackendError, ConnectivityError};
use thiserror::Error;

/// Session initialization failed. Fatal to the bootstrap sequence.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum AuthInitError {
    #[error("Backend unavailable: {0}")]
    Connectivity(#[from] ConnectivityError),

    #[error("Failed to read current user: {0}")]
    Identity(BackendError),
}

/// Organization and role data could not be loaded.
///
/// Never fatal: the session stays usable with no roles.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
#[error("Failed to fetch organization data: {0}")]
pub struct RoleDataFetchError(pub String);

/// A login, logout or password operation failed.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum AccountError {
    #[error(transparent)]
    Connectivity(#[from] ConnectivityError),

    #[error(transparent)]
    Backend(#[from] BackendError),
}
