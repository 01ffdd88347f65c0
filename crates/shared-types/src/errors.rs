//! # Error Types
//!
//! Errors shared across crates. Crate-local failures (connectivity, session
//! initialization, mutations) live next to the code that raises them.

use crate::entities::RoleKind;
use crate::routes::Destination;
use thiserror::Error;

/// Configuration errors.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum ConfigError {
    /// A destination has no path.
    #[error("Route table has no path for {0:?}")]
    MissingRoute(Destination),

    /// A destination path is not absolute.
    #[error("Route for {destination:?} must be absolute, got {path:?}")]
    RelativeRoute {
        destination: Destination,
        path: String,
    },

    /// Backend endpoint or key missing.
    #[error("Backend configuration missing: {0}")]
    MissingBackendSetting(&'static str),

    /// A setting could not be parsed.
    #[error("Invalid value for {key}: {value}")]
    InvalidSetting { key: &'static str, value: String },
}

/// Failure of a page-specific dashboard controller.
///
/// Page-local and non-fatal: the page stays and the error is shown inline.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum DashboardInitError {
    /// Session lacks a role required by the page.
    #[error("You do not have permission to access this page (requires {required})")]
    Unauthorized { required: RoleKind },

    /// The view is missing an element the controller binds to.
    #[error("Required view element missing: {element}")]
    MissingBinding { element: String },

    /// The session has no active organization to scope data to.
    #[error("No active organization for the current user")]
    NoOrganization,

    /// Backend data needed for the page could not be loaded.
    #[error("Failed to load {what}: {message}")]
    Data { what: String, message: String },
}
