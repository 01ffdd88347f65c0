//! Page routing for an authenticated session.

use shared_types::{Destination, PageKind, RoleKind, RouteTable, Session};

/// Pages checked against the current path, first match wins. Specialized
/// form pages come before the dashboards.
pub const ROUTING_ORDER: [PageKind; 9] = [
    PageKind::ThesisSubmission,
    PageKind::EthicsForm,
    PageKind::EthicsReview,
    PageKind::ThesisMarking,
    PageKind::AdminDashboard,
    PageKind::StudentDashboard,
    PageKind::SupervisorDashboard,
    PageKind::CommitteeDashboard,
    PageKind::MarkerDashboard,
];

/// Whose default dashboard wins when a user holds several roles.
pub const ROLE_PRIORITY: [RoleKind; 5] = RoleKind::PRIORITY;

/// The first page whose path matches `path` and whose roles the session
/// holds in any organization.
pub fn match_page(routes: &RouteTable, session: &Session, path: &str) -> Option<PageKind> {
    ROUTING_ORDER.into_iter().find(|page| {
        routes.matches(page.destination(), path) && session.has_any_of(page.allowed_roles())
    })
}

/// Default dashboard of the highest-priority role the session holds.
pub fn default_destination(session: &Session) -> Option<Destination> {
    ROLE_PRIORITY
        .into_iter()
        .find(|role| session.has_any_role(*role))
        .map(Destination::dashboard_for)
}
