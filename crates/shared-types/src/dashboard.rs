//! # Dashboard Controller Contract
//!
//! Defines what a page-specific controller must implement so the bootstrapper
//! can route an authenticated user onto it.
//!
//! ## Example Implementation
//!
//! ```rust,ignore
//! use shared_types::{DashboardController, DashboardInitError, PageKind, Session};
//! use async_trait::async_trait;
//! use std::sync::Arc;
//!
//! pub struct MarkerPage { /* ... */ }
//!
//! #[async_trait]
//! impl DashboardController for MarkerPage {
//!     fn page(&self) -> PageKind { PageKind::MarkerDashboard }
//!     async fn initialize(&self, session: Arc<Session>) -> Result<(), DashboardInitError> {
//!         Ok(())
//!     }
//! }
//! ```

use crate::entities::{RoleKind, Session};
use crate::errors::DashboardInitError;
use crate::routes::Destination;
use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use std::fmt;
use std::sync::Arc;

/// Pages that have a dedicated controller.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum PageKind {
    ThesisSubmission,
    EthicsForm,
    EthicsReview,
    ThesisMarking,
    AdminDashboard,
    StudentDashboard,
    SupervisorDashboard,
    CommitteeDashboard,
    MarkerDashboard,
}

impl PageKind {
    /// Stable name carried on dashboard lifecycle events.
    #[must_use]
    pub fn name(&self) -> &'static str {
        match self {
            Self::ThesisSubmission => "thesis-submission",
            Self::EthicsForm => "ethics-form",
            Self::EthicsReview => "ethics-review",
            Self::ThesisMarking => "thesis-marking",
            Self::AdminDashboard => "admin",
            Self::StudentDashboard => "student",
            Self::SupervisorDashboard => "supervisor",
            Self::CommitteeDashboard => "committee",
            Self::MarkerDashboard => "marker",
        }
    }

    #[must_use]
    pub fn destination(&self) -> Destination {
        match self {
            Self::ThesisSubmission => Destination::ThesisSubmission,
            Self::EthicsForm => Destination::EthicsForm,
            Self::EthicsReview => Destination::EthicsReview,
            Self::ThesisMarking => Destination::ThesisMarking,
            Self::AdminDashboard => Destination::AdminDashboard,
            Self::StudentDashboard => Destination::StudentDashboard,
            Self::SupervisorDashboard => Destination::SupervisorDashboard,
            Self::CommitteeDashboard => Destination::CommitteeDashboard,
            Self::MarkerDashboard => Destination::MarkerDashboard,
        }
    }

    /// Roles allowed onto the page (OR semantics).
    #[must_use]
    pub fn allowed_roles(&self) -> &'static [RoleKind] {
        match self {
            Self::ThesisSubmission | Self::EthicsForm | Self::StudentDashboard => {
                &[RoleKind::Student]
            }
            Self::EthicsReview => &[RoleKind::Supervisor, RoleKind::Admin, RoleKind::Committee],
            Self::ThesisMarking | Self::MarkerDashboard => &[RoleKind::Marker],
            Self::AdminDashboard => &[RoleKind::Admin],
            Self::SupervisorDashboard => &[RoleKind::Supervisor],
            Self::CommitteeDashboard => &[RoleKind::Committee],
        }
    }
}

impl fmt::Display for PageKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

/// A page-specific initializer responsible for one view.
#[async_trait]
pub trait DashboardController: Send + Sync {
    /// The page this controller serves.
    fn page(&self) -> PageKind;

    /// Load and render the page for the given session snapshot.
    async fn initialize(&self, session: Arc<Session>) -> Result<(), DashboardInitError>;
}

#[cfg(test)]
mod tests {
    use super::*;

    struct NoopPage;

    #[async_trait]
    impl DashboardController for NoopPage {
        fn page(&self) -> PageKind {
            PageKind::CommitteeDashboard
        }

        async fn initialize(&self, _session: Arc<Session>) -> Result<(), DashboardInitError> {
            Ok(())
        }
    }

    #[tokio::test]
    async fn test_controller_object_safety() {
        let controller: Arc<dyn DashboardController> = Arc::new(NoopPage);
        assert_eq!(controller.page().name(), "committee");
        assert!(controller.initialize(Arc::new(Session::empty())).await.is_ok());
    }

    #[test]
    fn test_ethics_review_allows_three_roles() {
        let allowed = PageKind::EthicsReview.allowed_roles();
        assert_eq!(allowed.len(), 3);
        assert!(allowed.contains(&RoleKind::Committee));
    }

    #[test]
    fn test_page_destinations() {
        assert_eq!(
            PageKind::ThesisMarking.destination(),
            Destination::ThesisMarking
        );
    }
}
