//! # End-to-End Startup
//!
//! Full page loads through the bootstrapper with the real admin dashboard
//! registered.
//!
//! ```text
//! page path + identity ─▶ AppBootstrapper::run ─▶ outcome, shell, redirects, events
//! ```

#[cfg(test)]
mod tests {
    use console_runtime::bootstrap::NO_DASHBOARD_ERROR;
    use console_runtime::{BootError, BootOutcome};
    use sc_01_backend_client::TableOp;
    use sc_03_admin_dashboard::{ActionError, ElementId, NewSupervisor};
    use shared_bus::{EventFilter, EventTopic, NotificationLevel, SystemEvent};
    use shared_types::{DashboardInitError, Destination, PageKind};

    use crate::integration::fixtures::ConsoleBuilder;

    fn topics(events: &[SystemEvent]) -> Vec<EventTopic> {
        events.iter().map(SystemEvent::topic).collect()
    }

    // =========================================================================
    // SCENARIO 1: ANONYMOUS VISITORS
    // =========================================================================

    #[tokio::test]
    async fn test_anonymous_public_page_renders() {
        let console = ConsoleBuilder::at("/privacy.html").build();

        assert_eq!(console.boot.run().await, BootOutcome::PublicPage);
        assert!(console.navigator.redirects().is_empty());
        assert!(console.shell.frame().fatal.is_none());
    }

    #[tokio::test]
    async fn test_anonymous_dashboard_visit_goes_to_login() {
        let console = ConsoleBuilder::at("/admin.html").build();

        let outcome = console.boot.run().await;

        assert_eq!(
            outcome,
            BootOutcome::Redirected {
                to: "/login.html".into()
            }
        );
        assert_eq!(console.backend.reads_of("supervisors"), 0);
    }

    // =========================================================================
    // SCENARIO 2: SIGNED-IN ROUTING
    // =========================================================================

    #[tokio::test]
    async fn test_admin_dashboard_full_load() {
        let console = ConsoleBuilder::at("/admin.html").signed_in("admin-1").build();
        let mut events = console
            .container
            .event_bus
            .subscribe_stream(EventFilter::all());

        let outcome = console.boot.run().await;

        assert_eq!(
            outcome,
            BootOutcome::DashboardLoaded {
                page: PageKind::AdminDashboard
            }
        );
        let supervisors = console.view.supervisor_rows();
        assert_eq!(supervisors.len(), 1);
        assert_eq!(supervisors[0].name, "Rita Reed");
        assert_eq!(supervisors[0].department, "Physics");
        assert_eq!(console.view.student_rows()[0].supervisor_name, "Rita Reed");
        assert!(!console.shell.frame().loading);

        let seen = topics(&events.drain());
        let expected = [
            EventTopic::AppInitStarted,
            EventTopic::BackendClientInitialized,
            EventTopic::AuthModuleReady,
            EventTopic::DashboardInitStarted,
            EventTopic::DashboardDataLoading,
            EventTopic::AdminDataLoaded,
            EventTopic::DashboardDataLoaded,
            EventTopic::DashboardInitSuccess,
            EventTopic::AppInitSuccess,
        ];
        let ordered: Vec<EventTopic> = seen
            .into_iter()
            .filter(|t| expected.contains(t))
            .collect();
        assert_eq!(ordered, expected);
    }

    #[tokio::test]
    async fn test_supervisor_on_admin_page_goes_home() {
        let console = ConsoleBuilder::at("/admin.html").signed_in("sup-user").build();

        let outcome = console.boot.run().await;

        assert_eq!(
            outcome,
            BootOutcome::Redirected {
                to: "/supervisor.html".into()
            }
        );
        assert!(!console.view.is_loading());
        assert!(console.view.supervisor_rows().is_empty());
    }

    #[tokio::test]
    async fn test_student_on_own_dashboard_stays() {
        let console = ConsoleBuilder::at("/student.html").signed_in("stu-user").build();

        let outcome = console.boot.run().await;

        assert_eq!(
            outcome,
            BootOutcome::AlreadyHome {
                destination: Destination::StudentDashboard
            }
        );
        assert!(console.navigator.redirects().is_empty());
    }

    #[tokio::test]
    async fn test_login_page_sends_admin_to_dashboard() {
        let console = ConsoleBuilder::at("/login.html").signed_in("admin-1").build();

        assert_eq!(
            console.boot.run().await,
            BootOutcome::Redirected {
                to: "/admin.html".into()
            }
        );
    }

    #[tokio::test]
    async fn test_no_role_user_sent_to_login_with_error() {
        let console = ConsoleBuilder::at("/student.html").signed_in("guest-1").build();

        let BootOutcome::Redirected { to } = console.boot.run().await else {
            panic!("expected a redirect");
        };
        let expected: String = NO_DASHBOARD_ERROR.replace(' ', "+");
        assert_eq!(to, format!("/login.html?error={expected}"));
    }

    // =========================================================================
    // SCENARIO 3: FAILURES
    // =========================================================================

    #[tokio::test]
    async fn test_dashboard_failure_keeps_page() {
        let console = ConsoleBuilder::at("/admin.html")
            .signed_in("admin-1")
            .without(ElementId::SupervisorTable)
            .build();

        let outcome = console.boot.run().await;

        let BootOutcome::DashboardFailed { page, error } = outcome else {
            panic!("expected a dashboard failure");
        };
        assert_eq!(page, PageKind::AdminDashboard);
        assert!(matches!(error, DashboardInitError::MissingBinding { .. }));
        assert!(console.navigator.redirects().is_empty());
        assert!(console.shell.frame().inline_error.is_some());
        assert!(console.shell.frame().fatal.is_none());
    }

    #[tokio::test]
    async fn test_dashboard_data_failure_is_not_fatal() {
        let console = ConsoleBuilder::at("/admin.html").signed_in("admin-1").build();
        console
            .backend
            .fail("supervisors", Some(TableOp::Select), "statement timeout");

        let outcome = console.boot.run().await;

        assert!(matches!(
            outcome,
            BootOutcome::DashboardFailed {
                error: DashboardInitError::Data { .. },
                ..
            }
        ));
        assert!(!console.view.is_loading());
    }

    #[tokio::test]
    async fn test_unreachable_backend_then_retry() {
        let console = ConsoleBuilder::at("/admin.html")
            .signed_in("admin-1")
            .attempts(3)
            .build();
        console
            .backend
            .fail_times("organizations", Some(TableOp::Select), 3, "connection refused");

        let outcome = console.boot.run().await;
        assert!(matches!(outcome, BootOutcome::Fatal(BootError::Connectivity(_))));
        assert!(console.shell.frame().fatal.is_some());
        assert_eq!(console.connector.connects(), 3);

        let outcome = console.boot.retry().await;
        assert_eq!(
            outcome,
            BootOutcome::DashboardLoaded {
                page: PageKind::AdminDashboard
            }
        );
        assert!(console.shell.frame().fatal.is_none());
    }

    // =========================================================================
    // SCENARIO 4: AFTER STARTUP
    // =========================================================================

    #[tokio::test]
    async fn test_second_run_reuses_client_and_session() {
        let console = ConsoleBuilder::at("/admin.html").signed_in("admin-1").build();

        console.boot.run().await;
        console.boot.run().await;

        assert_eq!(console.connector.connects(), 1);
        assert_eq!(
            console
                .backend
                .reads_of(sc_02_session::domain::MEMBERSHIP_TABLE),
            1
        );
    }

    #[tokio::test]
    async fn test_admin_creates_supervisor_after_startup() {
        let console = ConsoleBuilder::at("/admin.html").signed_in("admin-1").build();
        console.boot.run().await;
        let dashboard = console.container.admin_dashboard.clone().unwrap();

        let outcome = dashboard
            .create_supervisor(&NewSupervisor {
                full_name: "Nia North".into(),
                email: "nia@uni.example".into(),
                password: "pw".into(),
                department_id: Some("1".into()),
                ..NewSupervisor::default()
            })
            .await
            .unwrap();

        assert!(outcome.warnings.is_empty());
        assert_eq!(dashboard.supervisors().len(), 2);
        assert_eq!(console.view.supervisor_rows().len(), 2);
        let (level, message) = console.view.notifications().last().cloned().unwrap();
        assert_eq!(level, NotificationLevel::Success);
        assert_eq!(message, "Supervisor created successfully.");
    }

    #[tokio::test]
    async fn test_invalid_supervisor_form_never_reaches_backend() {
        let console = ConsoleBuilder::at("/admin.html").signed_in("admin-1").build();
        console.boot.run().await;
        let dashboard = console.container.admin_dashboard.clone().unwrap();
        let users_before = console.backend.rows("users").len();

        let err = dashboard
            .create_supervisor(&NewSupervisor {
                full_name: "Nia North".into(),
                email: "not-an-email".into(),
                password: "pw".into(),
                ..NewSupervisor::default()
            })
            .await
            .unwrap_err();

        assert!(matches!(err, ActionError::Validation(_)));
        assert_eq!(console.backend.rows("users").len(), users_before);
        assert_eq!(dashboard.supervisors().len(), 1);
    }
}
