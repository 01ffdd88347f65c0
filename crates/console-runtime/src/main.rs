//! # Supervision Console Runtime
//!
//! Runs one page load of the console against a seeded in-memory backend and
//! logs every lifecycle event. The page path is the first argument.
//!
//! ```text
//! console-runtime /admin.html
//! console-runtime /login.html
//! ```
//!
//! ## Startup
//!
//! 1. Initialize logging
//! 2. Load configuration from the environment
//! 3. Wire components and register page controllers
//! 4. Run the bootstrapper, retrying once after a fatal failure

use std::sync::Arc;

use anyhow::{Context, Result};
use serde_json::json;
use tracing::info;

use console_runtime::{load_config, BootOutcome, ConsoleContainer, TracingShell};
use console_telemetry::{init_telemetry, log_event, TelemetryConfig};
use sc_01_backend_client::{MemoryBackend, MemoryConnector};
use sc_02_session::RecordingNavigator;
use sc_03_admin_dashboard::RecordingAdminView;
use shared_bus::{EventFilter, EventPublisher, SystemEvent};
use shared_types::UserIdentity;

const DEMO_ORIGIN: &str = "https://console.localhost";
const DEMO_BACKEND_URL: &str = "memory://demo";

/// Seed an organization with one admin, one supervisor and one student.
fn seed_demo(backend: &MemoryBackend) {
    backend.seed("organizations", vec![json!({"id": "org-1", "name": "Northfield University"})]);
    backend.seed(
        "roles",
        vec![
            json!({"id": "r-admin", "name": "admin", "organization_id": "org-1"}),
            json!({"id": "r-sup", "name": "supervisor", "organization_id": "org-1"}),
            json!({"id": "r-student", "name": "student", "organization_id": "org-1"}),
        ],
    );
    backend.seed(
        "departments",
        vec![
            json!({"id": 1, "name": "Computer Science", "organization_id": "org-1"}),
            json!({"id": 2, "name": "Mathematics", "organization_id": "org-1"}),
        ],
    );

    let admin = UserIdentity::new("admin-1", "admin@northfield.example")
        .with_metadata("first_name", "Ada")
        .with_metadata("last_name", "Admin");
    backend.add_user(admin.clone(), "demo");
    backend.add_user(
        UserIdentity::new("sup-user", "reed@northfield.example")
            .with_metadata("first_name", "Rita")
            .with_metadata("last_name", "Reed"),
        "demo",
    );
    backend.add_user(
        UserIdentity::new("stu-user", "stone@northfield.example")
            .with_metadata("first_name", "Sam")
            .with_metadata("last_name", "Stone"),
        "demo",
    );
    backend.seed(
        "user_organization_roles",
        vec![
            json!({"user_id": "admin-1", "organization_id": "org-1", "role_id": "r-admin"}),
            json!({"user_id": "sup-user", "organization_id": "org-1", "role_id": "r-sup"}),
            json!({"user_id": "stu-user", "organization_id": "org-1", "role_id": "r-student"}),
        ],
    );
    backend.seed(
        "supervisors",
        vec![json!({"id": "sup-1", "user_id": "sup-user", "organization_id": "org-1",
                    "department_id": "1", "faculty_id": "F-001", "status": "active"})],
    );
    backend.seed(
        "students",
        vec![json!({"id": "stu-1", "user_id": "stu-user", "organization_id": "org-1",
                    "student_id": "S-1001", "program_name": "MSc Computer Science",
                    "supervisor_id": "sup-1", "status": "active", "progress": 35})],
    );
    backend.seed(
        "student_supervisors",
        vec![json!({"student_id": "stu-1", "supervisor_id": "sup-1"})],
    );
    backend.set_current_user(Some(admin));
}

#[tokio::main]
async fn main() -> Result<()> {
    init_telemetry(&TelemetryConfig::for_component("runtime"))?;

    let mut config = load_config().context("loading console configuration")?;
    if config.backend.url.is_empty() {
        config.backend.url = DEMO_BACKEND_URL.to_string();
        config.backend.anon_key = "demo".to_string();
    }
    config.validate().context("validating route table")?;

    let path = std::env::args().nth(1).unwrap_or_else(|| "/admin.html".to_string());
    info!(path = %path, "Starting supervision console");

    let backend = Arc::new(MemoryBackend::new());
    seed_demo(&backend);

    let navigator = Arc::new(RecordingNavigator::at(DEMO_ORIGIN, &path));
    let view = Arc::new(RecordingAdminView::new());
    let container = ConsoleContainer::new(
        config,
        Arc::new(MemoryConnector::new(backend)),
        navigator.clone(),
    )
    .with_admin_dashboard(view.clone());

    let mut events = container.event_bus.subscribe_stream(EventFilter::all());
    container.event_bus.publish(SystemEvent::ConfigLoaded);

    let boot = container.bootstrapper(Arc::new(TracingShell));
    let mut outcome = boot.run().await;
    if let BootOutcome::Fatal(_) = outcome {
        outcome = boot.retry().await;
    }

    for event in events.drain() {
        log_event!(info, "bus", "Event published", topic = %event.topic());
    }

    match &outcome {
        BootOutcome::Redirected { to } => info!(to = %to, "Page load ended in a redirect"),
        BootOutcome::DashboardLoaded { page } => info!(
            page = %page,
            supervisors = view.supervisor_rows().len(),
            students = view.student_rows().len(),
            "Dashboard ready"
        ),
        BootOutcome::Fatal(error) => anyhow::bail!("console failed to start: {error}"),
        other => info!(outcome = ?other, "Page load finished"),
    }
    if let Some(last) = navigator.last_redirect() {
        info!(location = %last, "Final location");
    }

    Ok(())
}
