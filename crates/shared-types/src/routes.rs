//! # Route Table
//!
//! Static mapping from logical destinations to concrete page paths. Read-only
//! input to the bootstrapper and the session guards.

use crate::entities::RoleKind;
use crate::errors::ConfigError;
use serde::{Deserialize, Serialize};

/// Logical navigation destinations.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum Destination {
    Login,
    ResetPassword,
    TermsOfService,
    PrivacyPolicy,
    HelpAndContact,
    Unauthorized,
    AdminDashboard,
    StudentDashboard,
    SupervisorDashboard,
    CommitteeDashboard,
    MarkerDashboard,
    ThesisSubmission,
    EthicsForm,
    EthicsReview,
    ThesisMarking,
}

impl Destination {
    /// Pages reachable without an identity.
    pub const PUBLIC: [Destination; 5] = [
        Self::Login,
        Self::ResetPassword,
        Self::TermsOfService,
        Self::PrivacyPolicy,
        Self::HelpAndContact,
    ];

    pub const ALL: [Destination; 15] = [
        Self::Login,
        Self::ResetPassword,
        Self::TermsOfService,
        Self::PrivacyPolicy,
        Self::HelpAndContact,
        Self::Unauthorized,
        Self::AdminDashboard,
        Self::StudentDashboard,
        Self::SupervisorDashboard,
        Self::CommitteeDashboard,
        Self::MarkerDashboard,
        Self::ThesisSubmission,
        Self::EthicsForm,
        Self::EthicsReview,
        Self::ThesisMarking,
    ];

    /// The default dashboard for a role.
    #[must_use]
    pub fn dashboard_for(role: RoleKind) -> Self {
        match role {
            RoleKind::Admin => Self::AdminDashboard,
            RoleKind::Student => Self::StudentDashboard,
            RoleKind::Supervisor => Self::SupervisorDashboard,
            RoleKind::Committee => Self::CommitteeDashboard,
            RoleKind::Marker => Self::MarkerDashboard,
        }
    }
}

/// Concrete paths for every [`Destination`].
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct RouteTable {
    pub login: String,
    pub reset_password: String,
    pub terms_of_service: String,
    pub privacy_policy: String,
    pub help_and_contact: String,
    pub unauthorized: String,
    pub admin_dashboard: String,
    pub student_dashboard: String,
    pub supervisor_dashboard: String,
    pub committee_dashboard: String,
    pub marker_dashboard: String,
    pub thesis_submission: String,
    pub ethics_form: String,
    pub ethics_review: String,
    pub thesis_marking: String,
}

impl Default for RouteTable {
    fn default() -> Self {
        Self {
            login: "/login.html".to_string(),
            reset_password: "/reset-password.html".to_string(),
            terms_of_service: "/terms.html".to_string(),
            privacy_policy: "/privacy.html".to_string(),
            help_and_contact: "/help.html".to_string(),
            unauthorized: "/login.html?error=unauthorized".to_string(),
            admin_dashboard: "/admin.html".to_string(),
            student_dashboard: "/student.html".to_string(),
            supervisor_dashboard: "/supervisor.html".to_string(),
            committee_dashboard: "/committee.html".to_string(),
            marker_dashboard: "/marker.html".to_string(),
            thesis_submission: "/thesis-submission.html".to_string(),
            ethics_form: "/ethics-form.html".to_string(),
            ethics_review: "/ethics-review.html".to_string(),
            thesis_marking: "/thesis-marking.html".to_string(),
        }
    }
}

impl RouteTable {
    /// The configured path for a destination.
    #[must_use]
    pub fn path(&self, destination: Destination) -> &str {
        match destination {
            Destination::Login => &self.login,
            Destination::ResetPassword => &self.reset_password,
            Destination::TermsOfService => &self.terms_of_service,
            Destination::PrivacyPolicy => &self.privacy_policy,
            Destination::HelpAndContact => &self.help_and_contact,
            Destination::Unauthorized => &self.unauthorized,
            Destination::AdminDashboard => &self.admin_dashboard,
            Destination::StudentDashboard => &self.student_dashboard,
            Destination::SupervisorDashboard => &self.supervisor_dashboard,
            Destination::CommitteeDashboard => &self.committee_dashboard,
            Destination::MarkerDashboard => &self.marker_dashboard,
            Destination::ThesisSubmission => &self.thesis_submission,
            Destination::EthicsForm => &self.ethics_form,
            Destination::EthicsReview => &self.ethics_review,
            Destination::ThesisMarking => &self.thesis_marking,
        }
    }

    /// Last path segment of a destination, without any query string.
    #[must_use]
    pub fn file_name(&self, destination: Destination) -> &str {
        let path = self.path(destination);
        let path = path.split('?').next().unwrap_or(path);
        path.rsplit('/').next().unwrap_or(path)
    }

    /// Does `current_path` point at `destination`?
    ///
    /// Matching is by the last path segment so pages served under a prefix
    /// still resolve. `superadmin.html` is not `admin.html`.
    #[must_use]
    pub fn matches(&self, destination: Destination, current_path: &str) -> bool {
        let file = self.file_name(destination);
        !file.is_empty()
            && (current_path == file
                || current_path
                    .strip_suffix(file)
                    .is_some_and(|prefix| prefix.ends_with('/')))
    }

    /// Is `current_path` one of the public pages?
    #[must_use]
    pub fn is_public(&self, current_path: &str) -> bool {
        Destination::PUBLIC
            .into_iter()
            .any(|dest| self.matches(dest, current_path))
    }

    /// Every destination must map to an absolute path.
    pub fn validate(&self) -> Result<(), ConfigError> {
        for destination in Destination::ALL {
            let path = self.path(destination);
            if path.trim().is_empty() {
                return Err(ConfigError::MissingRoute(destination));
            }
            if !path.starts_with('/') {
                return Err(ConfigError::RelativeRoute {
                    destination,
                    path: path.to_string(),
                });
            }
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_file_name_strips_query() {
        let routes = RouteTable::default();
        assert_eq!(routes.file_name(Destination::Unauthorized), "login.html");
        assert_eq!(routes.file_name(Destination::AdminDashboard), "admin.html");
    }

    #[test]
    fn test_public_pages_match_by_suffix() {
        let routes = RouteTable::default();
        assert!(routes.is_public("/portal/login.html"));
        assert!(routes.is_public("/help.html"));
        assert!(!routes.is_public("/admin.html"));
    }

    #[test]
    fn test_match_requires_whole_file_segment() {
        let routes = RouteTable::default();
        assert!(routes.matches(Destination::AdminDashboard, "/portal/admin.html"));
        assert!(routes.matches(Destination::AdminDashboard, "admin.html"));
        assert!(!routes.matches(Destination::AdminDashboard, "/superadmin.html"));
        assert!(!routes.matches(Destination::MarkerDashboard, "/thesis-marker.html"));
        assert!(!routes.is_public("/ethics-help.html"));
        assert!(!routes.is_public("/thesis-help.html"));
    }

    #[test]
    fn test_validate_rejects_missing_and_relative_routes() {
        let mut routes = RouteTable::default();
        assert!(routes.validate().is_ok());

        routes.login = String::new();
        assert_eq!(
            routes.validate(),
            Err(ConfigError::MissingRoute(Destination::Login))
        );

        routes.login = "login.html".to_string();
        assert!(matches!(
            routes.validate(),
            Err(ConfigError::RelativeRoute { .. })
        ));
    }

    #[test]
    fn test_dashboard_for_role() {
        assert_eq!(
            Destination::dashboard_for(RoleKind::Marker),
            Destination::MarkerDashboard
        );
    }
}
