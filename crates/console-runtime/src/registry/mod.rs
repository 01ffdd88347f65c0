//! # Controller Registry
//!
//! Page controllers register here at startup. The bootstrapper looks a page
//! up after routing; a page with no registered controller falls through to
//! the default-dashboard redirect.
//!
//! ```text
//! ┌──────────────────────────────────────────────┐
//! │              ControllerRegistry               │
//! │                                               │
//! │  admin ──────▶ AdminDashboard                 │
//! │  student ────▶ (not registered)               │
//! │  ethics-review ▶ (not registered)             │
//! └──────────────────────────────────────────────┘
//! ```

use parking_lot::RwLock;
use shared_types::{DashboardController, PageKind};
use std::collections::HashMap;
use std::sync::Arc;
use tracing::{info, warn};

/// Controllers by page.
#[derive(Default)]
pub struct ControllerRegistry {
    controllers: RwLock<HashMap<PageKind, Arc<dyn DashboardController>>>,
}

impl ControllerRegistry {
    pub fn new() -> Self {
        Self::default()
    }

    /// Register a controller for the page it serves. A controller already
    /// registered for that page is replaced and returned.
    pub fn register(
        &self,
        controller: Arc<dyn DashboardController>,
    ) -> Option<Arc<dyn DashboardController>> {
        let page = controller.page();
        let previous = self.controllers.write().insert(page, controller);
        if previous.is_some() {
            warn!(page = %page, "Replacing page controller");
        } else {
            info!(page = %page, "Registered page controller");
        }
        previous
    }

    pub fn get(&self, page: PageKind) -> Option<Arc<dyn DashboardController>> {
        self.controllers.read().get(&page).cloned()
    }

    pub fn is_registered(&self, page: PageKind) -> bool {
        self.controllers.read().contains_key(&page)
    }

    /// Registered pages, in no particular order.
    pub fn pages(&self) -> Vec<PageKind> {
        self.controllers.read().keys().copied().collect()
    }
}
