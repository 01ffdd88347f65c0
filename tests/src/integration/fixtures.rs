//! # Test Fixtures
//!
//! A seeded in-memory backend and a console wired the way the binary wires
//! it, pointed at a chosen page.
//!
//! ## Seeded Accounts
//!
//! | User | Roles |
//! |------|-------|
//! | `admin-1` | admin in North, supervisor in South |
//! | `sup-user` | supervisor in North |
//! | `stu-user` | student in North |
//! | `guest-1` | none |

use std::sync::Arc;

use serde_json::json;

use console_runtime::{AppBootstrapper, ConsoleConfig, ConsoleContainer, RecordingShell};
use sc_01_backend_client::{BackendConfig, MemoryBackend, MemoryConnector, RetryPolicy};
use sc_02_session::RecordingNavigator;
use sc_03_admin_dashboard::{ElementId, RecordingAdminView};
use shared_types::UserIdentity;

pub const ORIGIN: &str = "https://console.example";

pub fn identity(id: &str) -> UserIdentity {
    let (first, last) = match id {
        "admin-1" => ("Ada", "Admin"),
        "sup-user" => ("Rita", "Reed"),
        "stu-user" => ("Sam", "Stone"),
        _ => ("Guest", "User"),
    };
    UserIdentity::new(id, format!("{id}@uni.example"))
        .with_metadata("first_name", first)
        .with_metadata("last_name", last)
}

/// Backend with two organizations, the seeded accounts and one supervised
/// student.
pub fn seeded_backend() -> Arc<MemoryBackend> {
    let backend = Arc::new(MemoryBackend::new());
    backend.seed(
        "organizations",
        vec![
            json!({"id": "org-n", "name": "North"}),
            json!({"id": "org-s", "name": "South"}),
        ],
    );
    backend.seed(
        "roles",
        vec![
            json!({"id": "r-admin", "name": "admin"}),
            json!({"id": "r-sup", "name": "Supervisor"}),
            json!({"id": "r-student", "name": "student"}),
            json!({"id": "r-guest", "name": "guest"}),
        ],
    );
    backend.seed(
        "departments",
        vec![json!({"id": 1, "name": "Physics", "organization_id": "org-n"})],
    );
    for id in ["admin-1", "sup-user", "stu-user", "guest-1"] {
        backend.add_user(identity(id), "pw");
    }
    backend.seed(
        "user_organization_roles",
        vec![
            json!({"user_id": "admin-1", "organization_id": "org-n", "role_id": "r-admin"}),
            json!({"user_id": "admin-1", "organization_id": "org-s", "role_id": "r-sup"}),
            json!({"user_id": "sup-user", "organization_id": "org-n", "role_id": "r-sup"}),
            json!({"user_id": "stu-user", "organization_id": "org-n", "role_id": "r-student"}),
            json!({"user_id": "guest-1", "organization_id": "org-n", "role_id": "r-guest"}),
        ],
    );
    backend.seed(
        "supervisors",
        vec![json!({"id": "sup-1", "user_id": "sup-user", "organization_id": "org-n",
                    "department_id": "1", "faculty_id": "F-1", "status": "active"})],
    );
    backend.seed(
        "students",
        vec![json!({"id": "stu-1", "user_id": "stu-user", "organization_id": "org-n",
                    "student_id": "S-1", "program_name": "PhD", "supervisor_id": "sup-1",
                    "status": "active", "progress": 60})],
    );
    backend.seed(
        "student_supervisors",
        vec![json!({"student_id": "stu-1", "supervisor_id": "sup-1"})],
    );
    backend
}

/// A console for one page load.
pub struct Console {
    pub backend: Arc<MemoryBackend>,
    pub connector: Arc<MemoryConnector>,
    pub navigator: Arc<RecordingNavigator>,
    pub view: Arc<RecordingAdminView>,
    pub shell: Arc<RecordingShell>,
    pub container: ConsoleContainer,
    pub boot: AppBootstrapper,
}

pub struct ConsoleBuilder {
    path: String,
    user: Option<String>,
    missing: Vec<ElementId>,
    attempts: u32,
}

impl ConsoleBuilder {
    pub fn at(path: &str) -> Self {
        Self {
            path: path.to_string(),
            user: None,
            missing: Vec::new(),
            attempts: 3,
        }
    }

    pub fn signed_in(mut self, user: &str) -> Self {
        self.user = Some(user.to_string());
        self
    }

    pub fn without(mut self, element: ElementId) -> Self {
        self.missing.push(element);
        self
    }

    pub fn attempts(mut self, attempts: u32) -> Self {
        self.attempts = attempts;
        self
    }

    pub fn build(self) -> Console {
        let backend = seeded_backend();
        backend.set_current_user(self.user.as_deref().map(identity));

        let connector = Arc::new(MemoryConnector::new(backend.clone()));
        let navigator = Arc::new(RecordingNavigator::at(ORIGIN, &self.path));
        let view = Arc::new(RecordingAdminView::without(&self.missing));
        let shell = Arc::new(RecordingShell::new());
        let config = ConsoleConfig {
            backend: BackendConfig::new("memory://tests", "anon"),
            retry: RetryPolicy::immediate(self.attempts),
            ..ConsoleConfig::default()
        };

        let container = ConsoleContainer::new(config, connector.clone(), navigator.clone())
            .with_admin_dashboard(view.clone());
        let boot = container.bootstrapper(shell.clone());

        Console {
            backend,
            connector,
            navigator,
            view,
            shell,
            container,
            boot,
        }
    }
}
