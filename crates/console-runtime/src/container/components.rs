//! # Component Container
//!
//! Builds every console component exactly once and hands out the shared
//! handles.
//!
//! ## Wiring Order
//!
//! ```text
//! 1. event bus
//! 2. backend client accessor (bus)
//! 3. session manager (accessor, bus, navigator, routes)
//! 4. page controllers (session manager, accessor, bus, views)
//! 5. bootstrapper (all of the above, shell)
//! ```
//!
//! Components reach each other through these handles only. There is no
//! global lookup.

use std::sync::Arc;

use tracing::{info, instrument};

use sc_01_backend_client::{BackendConnector, ClientAccessor};
use sc_02_session::{Navigator, SessionManager};
use sc_03_admin_dashboard::{AdminDashboard, AdminView};
use shared_bus::InMemoryEventBus;

use crate::bootstrap::AppBootstrapper;
use crate::container::config::ConsoleConfig;
use crate::ports::ShellView;
use crate::registry::ControllerRegistry;

/// Every long-lived console component.
pub struct ConsoleContainer {
    /// Lifecycle events for all components.
    pub event_bus: Arc<InMemoryEventBus>,

    /// Memoized backend client.
    pub accessor: ClientAccessor,

    /// Identity, organizations and role guards.
    pub sessions: SessionManager,

    /// Page controllers by page.
    pub controllers: Arc<ControllerRegistry>,

    pub navigator: Arc<dyn Navigator>,

    /// Set by [`ConsoleContainer::with_admin_dashboard`].
    pub admin_dashboard: Option<Arc<AdminDashboard>>,

    /// Immutable after construction.
    pub config: ConsoleConfig,
}

impl ConsoleContainer {
    #[instrument(name = "console_wiring", skip_all)]
    pub fn new(
        config: ConsoleConfig,
        connector: Arc<dyn BackendConnector>,
        navigator: Arc<dyn Navigator>,
    ) -> Self {
        info!("Wiring supervision console");

        let event_bus = Arc::new(InMemoryEventBus::new());

        let accessor = ClientAccessor::new(
            config.backend.clone(),
            config.retry,
            connector,
            event_bus.clone(),
        );

        let sessions = SessionManager::new(
            accessor.clone(),
            event_bus.clone(),
            navigator.clone(),
            config.routes.clone(),
        );

        info!(
            max_attempts = config.retry.max_attempts,
            "Console components ready"
        );

        Self {
            event_bus,
            accessor,
            sessions,
            controllers: Arc::new(ControllerRegistry::new()),
            navigator,
            admin_dashboard: None,
            config,
        }
    }

    /// Register the admin dashboard against `view`.
    pub fn with_admin_dashboard(mut self, view: Arc<dyn AdminView>) -> Self {
        let dashboard = Arc::new(AdminDashboard::new(
            self.sessions.clone(),
            self.accessor.clone(),
            self.event_bus.clone(),
            view,
        ));
        self.controllers.register(dashboard.clone());
        self.admin_dashboard = Some(dashboard);
        self
    }

    /// A bootstrapper for the current page drawing on `shell`.
    pub fn bootstrapper(&self, shell: Arc<dyn ShellView>) -> AppBootstrapper {
        AppBootstrapper::new(
            self.config.routes.clone(),
            self.accessor.clone(),
            self.sessions.clone(),
            self.event_bus.clone(),
            self.navigator.clone(),
            shell,
            self.controllers.clone(),
        )
    }
}
