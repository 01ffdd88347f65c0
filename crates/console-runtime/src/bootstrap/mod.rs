//! # App Bootstrapper
//!
//! Single-pass startup sequence for one page load.
//!
//! ```text
//! validate routes ─▶ app:init:started ─▶ acquire client ─▶ initialize session
//!                                             │                   │
//!                                           fatal               fatal
//!                                                                 │
//!               ┌─────────────────────────────────────────────────┘
//!               ▼
//!        identity?  ── no ──▶ public page? ── yes ─▶ render as-is
//!               │                    └─ no ──▶ redirect to login
//!              yes
//!               ▼
//!   (role × path) match with controller ── yes ─▶ run controller
//!               │                                   ├─ ok  ─▶ dashboard:init:success
//!               no                                  └─ err ─▶ dashboard:init:failed, inline error
//!               ▼
//!   default dashboard by role priority ─▶ redirect (unless already there)
//!               │
//!           no role ─▶ login?error=…  (inline error when already on login)
//! ```
//!
//! Connectivity and session failures are fatal: the shell shows one error
//! panel and [`AppBootstrapper::retry`] re-runs the whole sequence.

pub mod routing;

pub use routing::{default_destination, match_page, ROLE_PRIORITY, ROUTING_ORDER};

use crate::ports::ShellView;
use crate::registry::ControllerRegistry;
use sc_01_backend_client::{ClientAccessor, ConnectivityError};
use sc_02_session::domain::append_query;
use sc_02_session::{AuthInitError, Navigator, SessionManager};
use shared_bus::{EventPublisher, SystemEvent};
use shared_types::{ConfigError, DashboardInitError, Destination, PageKind, RouteTable, Session};
use std::sync::Arc;
use thiserror::Error;
use tracing::{error, info, warn};

pub const STATUS_INITIALIZING: &str = "Initializing system...";
pub const STATUS_AUTHENTICATING: &str = "Authenticating user...";
pub const STATUS_LOADING_DASHBOARD: &str = "Loading user dashboard...";

/// Carried in the login redirect when a user has no recognised role.
pub const NO_DASHBOARD_ERROR: &str = "No default dashboard found for your role.";
const NO_DASHBOARD_INLINE: &str = "No default dashboard found for your role. Please contact support.";

/// Why startup stopped at the fatal panel.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum BootError {
    #[error("Route configuration is invalid: {0}")]
    Routes(#[from] ConfigError),

    #[error(transparent)]
    Connectivity(#[from] ConnectivityError),

    #[error("Authentication module failed to initialize: {0}")]
    Session(#[from] AuthInitError),
}

/// How a startup pass ended.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum BootOutcome {
    /// Anonymous visitor on a public page.
    PublicPage,
    /// The console navigated away.
    Redirected { to: String },
    /// A page controller ran successfully.
    DashboardLoaded { page: PageKind },
    /// A page controller failed; the page stays with an inline error.
    DashboardFailed {
        page: PageKind,
        error: DashboardInitError,
    },
    /// Already on the user's default dashboard, which has no controller here.
    AlreadyHome { destination: Destination },
    /// Signed in without a recognised role while on the login page.
    NoDashboard,
    /// Startup could not complete. The shell shows the fatal panel.
    Fatal(BootError),
}

/// Orchestrates startup for the current page.
pub struct AppBootstrapper {
    routes: RouteTable,
    accessor: ClientAccessor,
    sessions: SessionManager,
    bus: Arc<dyn EventPublisher>,
    navigator: Arc<dyn Navigator>,
    shell: Arc<dyn ShellView>,
    controllers: Arc<ControllerRegistry>,
}

impl AppBootstrapper {
    pub fn new(
        routes: RouteTable,
        accessor: ClientAccessor,
        sessions: SessionManager,
        bus: Arc<dyn EventPublisher>,
        navigator: Arc<dyn Navigator>,
        shell: Arc<dyn ShellView>,
        controllers: Arc<ControllerRegistry>,
    ) -> Self {
        Self {
            routes,
            accessor,
            sessions,
            bus,
            navigator,
            shell,
            controllers,
        }
    }

    pub fn controllers(&self) -> &Arc<ControllerRegistry> {
        &self.controllers
    }

    /// Run the startup sequence once.
    pub async fn run(&self) -> BootOutcome {
        if let Err(e) = self.routes.validate() {
            return self.fail(e.into());
        }

        self.bus.publish(SystemEvent::AppInitStarted);
        self.shell.show_loading(STATUS_INITIALIZING);

        if let Err(e) = self.accessor.acquire().await {
            return self.fail(e.into());
        }
        self.shell.update_status(STATUS_AUTHENTICATING);

        let session = match self.sessions.initialize().await {
            Ok(session) => session,
            Err(e) => return self.fail(e.into()),
        };

        let outcome = if session.is_authenticated() {
            self.shell.update_status(STATUS_LOADING_DASHBOARD);
            self.route_authenticated(session).await
        } else {
            self.route_anonymous()
        };

        if let BootOutcome::Redirected { to } = &outcome {
            // The page is being replaced; keep the loader up until it is.
            info!(to = %to, "Console navigated away during startup");
            return outcome;
        }

        let path = self.navigator.location().path;
        info!(path = %path, outcome = ?outcome, "Console initialized");
        self.bus.publish(SystemEvent::AppInitSuccess { path });
        self.shell.hide_loading();
        outcome
    }

    /// Clear the fatal panel and run the whole sequence again.
    pub async fn retry(&self) -> BootOutcome {
        info!("Retrying console initialization");
        self.shell.hide_fatal();
        self.run().await
    }

    fn fail(&self, error: BootError) -> BootOutcome {
        error!(error = %error, "Console initialization failed");
        self.bus.publish(SystemEvent::AppInitFailed {
            message: error.to_string(),
        });
        self.shell.hide_loading();
        self.shell.show_fatal(&format!(
            "System initialization failed: {error}. Please try refreshing the page or contact support."
        ));
        BootOutcome::Fatal(error)
    }

    fn redirect(&self, target: String) -> BootOutcome {
        self.navigator.redirect(&target);
        BootOutcome::Redirected { to: target }
    }

    fn route_anonymous(&self) -> BootOutcome {
        let path = self.navigator.location().path;
        if self.routes.is_public(&path) {
            info!(path = %path, "Public page, no identity");
            return BootOutcome::PublicPage;
        }
        info!(path = %path, "No identity on a protected page");
        self.redirect(self.routes.path(Destination::Login).to_string())
    }

    async fn route_authenticated(&self, session: Arc<Session>) -> BootOutcome {
        let path = self.navigator.location().path;

        if let Some(page) = match_page(&self.routes, &session, &path) {
            match self.controllers.get(page) {
                Some(controller) => return self.run_controller(page, controller, session).await,
                None => warn!(page = %page, "No controller registered for page"),
            }
        }
        self.redirect_to_default(&session, &path)
    }

    async fn run_controller(
        &self,
        page: PageKind,
        controller: Arc<dyn shared_types::DashboardController>,
        session: Arc<Session>,
    ) -> BootOutcome {
        info!(page = %page, "Initializing page controller");
        self.bus.publish(SystemEvent::DashboardInitStarted { page });
        match controller.initialize(session).await {
            Ok(()) => {
                self.bus.publish(SystemEvent::DashboardInitSuccess { page });
                BootOutcome::DashboardLoaded { page }
            }
            Err(error) => {
                warn!(page = %page, error = %error, "Page controller failed");
                self.bus.publish(SystemEvent::DashboardInitFailed {
                    page,
                    message: error.to_string(),
                });
                self.shell.show_inline_error(&format!(
                    "Failed to load content for this page: {error}"
                ));
                BootOutcome::DashboardFailed { page, error }
            }
        }
    }

    fn redirect_to_default(&self, session: &Session, path: &str) -> BootOutcome {
        match default_destination(session) {
            Some(destination) if self.routes.matches(destination, path) => {
                info!(destination = ?destination, "Already on default dashboard");
                BootOutcome::AlreadyHome { destination }
            }
            Some(destination) => {
                info!(destination = ?destination, "Redirecting to default dashboard");
                self.redirect(self.routes.path(destination).to_string())
            }
            None if self.routes.matches(Destination::Login, path) => {
                warn!("Signed-in user has no recognised role");
                self.shell.show_inline_error(NO_DASHBOARD_INLINE);
                BootOutcome::NoDashboard
            }
            None => {
                warn!("Signed-in user has no recognised role");
                let login = self.routes.path(Destination::Login);
                self.redirect(append_query(login, "error", NO_DASHBOARD_ERROR))
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::adapters::RecordingShell;
    use async_trait::async_trait;
    use sc_01_backend_client::{BackendConfig, MemoryBackend, MemoryConnector, RetryPolicy, TableOp};
    use sc_02_session::domain::MEMBERSHIP_TABLE;
    use sc_02_session::RecordingNavigator;
    use serde_json::json;
    use shared_bus::{EventFilter, EventTopic, InMemoryEventBus, Subscription};
    use shared_types::{DashboardController, RoleKind, UserIdentity};

    struct StubPage {
        page: PageKind,
        fail: bool,
    }

    #[async_trait]
    impl DashboardController for StubPage {
        fn page(&self) -> PageKind {
            self.page
        }

        async fn initialize(&self, _session: Arc<Session>) -> Result<(), DashboardInitError> {
            if self.fail {
                Err(DashboardInitError::Unauthorized {
                    required: RoleKind::Admin,
                })
            } else {
                Ok(())
            }
        }
    }

    struct Harness {
        backend: Arc<MemoryBackend>,
        bus: Arc<InMemoryEventBus>,
        navigator: Arc<RecordingNavigator>,
        shell: Arc<RecordingShell>,
        boot: AppBootstrapper,
    }

    fn harness(path: &str) -> Harness {
        let backend = Arc::new(MemoryBackend::new());
        backend.seed("organizations", vec![json!({"id": "org-1", "name": "Uni"})]);
        backend.seed(
            "roles",
            vec![
                json!({"id": 1, "name": "admin"}),
                json!({"id": 2, "name": "supervisor"}),
                json!({"id": 3, "name": "guest"}),
            ],
        );
        let bus = Arc::new(InMemoryEventBus::new());
        let accessor = ClientAccessor::new(
            BackendConfig::new("memory://console", "anon"),
            RetryPolicy::immediate(3),
            Arc::new(MemoryConnector::new(backend.clone())),
            bus.clone(),
        );
        let navigator = Arc::new(RecordingNavigator::at("https://console.example", path));
        let sessions = SessionManager::new(
            accessor.clone(),
            bus.clone(),
            navigator.clone(),
            RouteTable::default(),
        );
        let shell = Arc::new(RecordingShell::new());
        let boot = AppBootstrapper::new(
            RouteTable::default(),
            accessor,
            sessions,
            bus.clone(),
            navigator.clone(),
            shell.clone(),
            Arc::new(ControllerRegistry::new()),
        );
        Harness {
            backend,
            bus,
            navigator,
            shell,
            boot,
        }
    }

    fn sign_in(h: &Harness, role_ids: &[u64]) {
        h.backend
            .set_current_user(Some(UserIdentity::new("u1", "u1@uni.example")));
        for role in role_ids {
            h.backend.seed(
                MEMBERSHIP_TABLE,
                vec![json!({"user_id": "u1", "organization_id": "org-1", "role_id": role})],
            );
        }
    }

    fn topics(sub: &mut Subscription) -> Vec<EventTopic> {
        sub.drain().iter().map(SystemEvent::topic).collect()
    }

    #[tokio::test]
    async fn test_anonymous_on_public_page_stays() {
        let h = harness("/terms.html");
        let mut sub = h.bus.subscribe_stream(EventFilter::all());

        assert_eq!(h.boot.run().await, BootOutcome::PublicPage);
        assert!(h.navigator.redirects().is_empty());
        let seen = topics(&mut sub);
        assert_eq!(seen.first(), Some(&EventTopic::AppInitStarted));
        assert_eq!(seen.last(), Some(&EventTopic::AppInitSuccess));
        assert!(!h.shell.frame().loading);
    }

    #[tokio::test]
    async fn test_anonymous_on_protected_page_goes_to_login() {
        let h = harness("/admin.html");

        let outcome = h.boot.run().await;

        assert_eq!(
            outcome,
            BootOutcome::Redirected {
                to: "/login.html".into()
            }
        );
        assert_eq!(h.navigator.last_redirect().as_deref(), Some("/login.html"));
    }

    #[tokio::test]
    async fn test_look_alike_public_path_goes_to_login() {
        let h = harness("/thesis-help.html");

        assert_eq!(
            h.boot.run().await,
            BootOutcome::Redirected {
                to: "/login.html".into()
            }
        );
        assert_eq!(h.navigator.last_redirect().as_deref(), Some("/login.html"));
    }

    #[tokio::test]
    async fn test_redirect_skips_init_success() {
        let h = harness("/admin.html");
        let mut sub = h.bus.subscribe_stream(EventFilter::all());

        assert!(matches!(h.boot.run().await, BootOutcome::Redirected { .. }));
        let seen = topics(&mut sub);
        assert_eq!(seen.first(), Some(&EventTopic::AppInitStarted));
        assert!(!seen.contains(&EventTopic::AppInitSuccess));
        assert!(h.shell.frame().loading);
    }

    #[tokio::test]
    async fn test_matching_controller_runs() {
        let h = harness("/admin.html");
        sign_in(&h, &[1]);
        h.boot.controllers().register(Arc::new(StubPage {
            page: PageKind::AdminDashboard,
            fail: false,
        }));
        let mut sub = h.bus.subscribe_stream(EventFilter::all());

        let outcome = h.boot.run().await;

        assert_eq!(
            outcome,
            BootOutcome::DashboardLoaded {
                page: PageKind::AdminDashboard
            }
        );
        let seen = topics(&mut sub);
        assert!(seen.contains(&EventTopic::DashboardInitStarted));
        assert!(seen.contains(&EventTopic::DashboardInitSuccess));
        assert!(h.navigator.redirects().is_empty());
        assert_eq!(
            h.shell.frame().status_history,
            vec![
                STATUS_INITIALIZING.to_string(),
                STATUS_AUTHENTICATING.to_string(),
                STATUS_LOADING_DASHBOARD.to_string(),
            ]
        );
    }

    #[tokio::test]
    async fn test_controller_failure_stays_on_page() {
        let h = harness("/admin.html");
        sign_in(&h, &[1]);
        h.boot.controllers().register(Arc::new(StubPage {
            page: PageKind::AdminDashboard,
            fail: true,
        }));
        let mut sub = h.bus.subscribe_stream(EventFilter::all());

        let outcome = h.boot.run().await;

        assert!(matches!(
            outcome,
            BootOutcome::DashboardFailed {
                page: PageKind::AdminDashboard,
                ..
            }
        ));
        assert!(h.navigator.redirects().is_empty());
        assert!(h.shell.frame().inline_error.is_some());
        assert!(h.shell.frame().fatal.is_none());
        let seen = topics(&mut sub);
        assert!(seen.contains(&EventTopic::DashboardInitFailed));
        assert!(seen.contains(&EventTopic::AppInitSuccess));
    }

    #[tokio::test]
    async fn test_unmatched_page_redirects_to_default_dashboard() {
        let h = harness("/login.html");
        sign_in(&h, &[2, 1]);

        let outcome = h.boot.run().await;

        assert_eq!(
            outcome,
            BootOutcome::Redirected {
                to: "/admin.html".into()
            }
        );
    }

    #[tokio::test]
    async fn test_default_dashboard_without_controller_is_not_a_loop() {
        let h = harness("/supervisor.html");
        sign_in(&h, &[2]);

        let outcome = h.boot.run().await;

        assert_eq!(
            outcome,
            BootOutcome::AlreadyHome {
                destination: Destination::SupervisorDashboard
            }
        );
        assert!(h.navigator.redirects().is_empty());
    }

    #[tokio::test]
    async fn test_no_role_redirects_with_error() {
        let h = harness("/help-desk.html");
        sign_in(&h, &[3]);

        let outcome = h.boot.run().await;

        let BootOutcome::Redirected { to } = outcome else {
            panic!("expected redirect, got {outcome:?}");
        };
        assert!(to.starts_with("/login.html?error="));
        assert!(to.contains("No+default+dashboard"));
    }

    #[tokio::test]
    async fn test_no_role_on_login_shows_inline_error() {
        let h = harness("/login.html");
        sign_in(&h, &[]);

        assert_eq!(h.boot.run().await, BootOutcome::NoDashboard);
        assert!(h.navigator.redirects().is_empty());
        assert_eq!(
            h.shell.frame().inline_error.as_deref(),
            Some(NO_DASHBOARD_INLINE)
        );
    }

    #[tokio::test]
    async fn test_connectivity_failure_is_fatal_then_retry_recovers() {
        let h = harness("/terms.html");
        h.backend
            .fail("organizations", Some(TableOp::Select), "connection refused");
        let mut sub = h.bus.subscribe_stream(EventFilter::all());

        let outcome = h.boot.run().await;

        assert!(matches!(
            outcome,
            BootOutcome::Fatal(BootError::Connectivity(_))
        ));
        let frame = h.shell.frame();
        assert!(!frame.loading);
        assert!(frame
            .fatal
            .as_deref()
            .is_some_and(|m| m.starts_with("System initialization failed:")));
        assert!(topics(&mut sub).contains(&EventTopic::AppInitFailed));

        h.backend.heal("organizations");
        assert_eq!(h.boot.retry().await, BootOutcome::PublicPage);
        assert!(h.shell.frame().fatal.is_none());
    }

    #[tokio::test]
    async fn test_session_failure_is_fatal() {
        let h = harness("/admin.html");
        h.backend.fail_identity(Some("token expired"));

        let outcome = h.boot.run().await;

        assert!(matches!(outcome, BootOutcome::Fatal(BootError::Session(_))));
        assert!(h.navigator.redirects().is_empty());
    }

    #[tokio::test]
    async fn test_invalid_routes_fail_before_any_backend_work() {
        let mut routes = RouteTable::default();
        routes.login = String::new();
        let h = harness("/login.html");
        let boot = AppBootstrapper {
            routes,
            ..h.boot
        };

        assert!(matches!(
            boot.run().await,
            BootOutcome::Fatal(BootError::Routes(_))
        ));
        assert_eq!(h.backend.reads_of("organizations"), 0);
    }
}
