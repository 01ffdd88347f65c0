//! # Integration Test Flows
//!
//! The backend client accessor and the session manager working together
//! through one wired console.
//!
//! ## Flows Tested
//!
//! 1. **Roles union**: memberships in several organizations
//! 2. **Single client**: concurrent callers share one acquisition
//! 3. **Retry ceiling**: exhaustion, then a fresh sequence
//! 4. **Session changes**: sign-out and sign-in notifications

#[cfg(test)]
mod tests {
    use std::sync::Arc;

    use futures::future::join_all;

    use console_runtime::bootstrap::default_destination;
    use sc_01_backend_client::{AuthChange, ConnectivityError, TableOp};
    use sc_02_session::domain::MEMBERSHIP_TABLE;
    use sc_02_session::SessionPhase;
    use shared_bus::{EventFilter, EventTopic, SystemEvent};
    use shared_types::{AuthChangeKind, AuthSession, Destination, OrganizationId, RoleKind};

    use crate::integration::fixtures::{identity, ConsoleBuilder};

    // =========================================================================
    // ROLES UNION
    // =========================================================================

    #[tokio::test]
    async fn test_roles_union_spans_organizations() {
        let console = ConsoleBuilder::at("/login.html").signed_in("admin-1").build();
        let sessions = &console.container.sessions;

        let session = sessions.initialize().await.unwrap();

        assert_eq!(session.organizations().len(), 2);
        assert_eq!(session.roles().len(), 2);
        assert!(sessions.has_role(RoleKind::Admin, None));
        assert!(!sessions.has_role(RoleKind::Supervisor, None));
        assert!(sessions.has_role(
            RoleKind::Supervisor,
            Some(&OrganizationId::new("org-s"))
        ));
        assert!(sessions.has_any_role(RoleKind::Supervisor));
        assert_eq!(
            default_destination(&session),
            Some(Destination::AdminDashboard)
        );
    }

    #[tokio::test]
    async fn test_unknown_role_names_grant_nothing() {
        let console = ConsoleBuilder::at("/login.html").signed_in("guest-1").build();

        let session = console.container.sessions.initialize().await.unwrap();

        assert!(session.is_authenticated());
        assert_eq!(session.roles().len(), 1);
        assert!(!session.has_any_of(&RoleKind::PRIORITY));
        assert_eq!(default_destination(&session), None);
    }

    // =========================================================================
    // SINGLE CLIENT
    // =========================================================================

    #[tokio::test]
    async fn test_concurrent_callers_share_one_client() {
        let console = ConsoleBuilder::at("/admin.html").signed_in("sup-user").build();
        let sessions = console.container.sessions.clone();
        let accessor = console.container.accessor.clone();

        let inits = (0..8).map(|_| {
            let sessions = sessions.clone();
            async move { sessions.initialize().await.map(|s| s.roles().len()) }
        });
        let acquires = (0..8).map(|_| {
            let accessor = accessor.clone();
            async move { accessor.acquire().await.is_ok() }
        });
        let (inits, acquires) = tokio::join!(join_all(inits), join_all(acquires));

        assert!(inits.into_iter().all(|r| r == Ok(1)));
        assert!(acquires.into_iter().all(|ok| ok));
        assert_eq!(console.connector.connects(), 1);
        assert_eq!(console.backend.reads_of(MEMBERSHIP_TABLE), 1);
    }

    // =========================================================================
    // RETRY CEILING
    // =========================================================================

    #[tokio::test]
    async fn test_exhaustion_then_fresh_sequence() {
        let console = ConsoleBuilder::at("/help.html").attempts(2).build();
        let mut errors = console
            .container
            .event_bus
            .subscribe_stream(EventFilter::topics(vec![
                EventTopic::BackendClientError,
                EventTopic::BackendClientInitialized,
            ]));
        console
            .backend
            .fail_times("organizations", Some(TableOp::Select), 2, "connection reset");

        let err = console.container.accessor.acquire().await.err().expect("acquire should fail");
        assert!(matches!(err, ConnectivityError::Exhausted { attempts: 2, .. }));
        assert!(!console.container.accessor.is_ready());

        console.container.accessor.acquire().await.unwrap();
        assert!(console.container.accessor.is_ready());

        let events = errors.drain();
        assert!(matches!(
            events.as_slice(),
            [
                SystemEvent::BackendClientError { attempts: 2, .. },
                SystemEvent::BackendClientInitialized { attempts: 1 },
            ]
        ));
    }

    #[tokio::test]
    async fn test_session_init_failure_recovers_on_next_call() {
        let console = ConsoleBuilder::at("/admin.html").signed_in("admin-1").build();
        let sessions = &console.container.sessions;
        console.backend.fail_identity(Some("jwt expired"));

        assert!(sessions.initialize().await.is_err());
        assert_eq!(sessions.phase(), SessionPhase::Failed);

        console.backend.fail_identity(None);
        let session = sessions.initialize().await.unwrap();
        assert!(session.is_authenticated());
        assert_eq!(sessions.phase(), SessionPhase::Ready);
    }

    // =========================================================================
    // SESSION CHANGES
    // =========================================================================

    #[tokio::test]
    async fn test_sign_out_then_sign_in_notifications() {
        let console = ConsoleBuilder::at("/student.html").signed_in("stu-user").build();
        let sessions = &console.container.sessions;
        sessions.initialize().await.unwrap();
        let mut changes = console
            .container
            .event_bus
            .subscribe_stream(EventFilter::topics(vec![EventTopic::AuthStateChanged]));

        let signed_out = sessions
            .handle_auth_change(AuthChange {
                kind: AuthChangeKind::SignedOut,
                session: None,
            })
            .await;
        assert!(!signed_out.is_authenticated());
        assert!(signed_out.roles().is_empty());

        let signed_in = sessions
            .handle_auth_change(AuthChange {
                kind: AuthChangeKind::SignedIn,
                session: Some(AuthSession::for_user(identity("sup-user"))),
            })
            .await;
        assert!(signed_in.has_any_role(RoleKind::Supervisor));
        assert!(!signed_in.has_any_role(RoleKind::Student));

        let previous: Vec<_> = changes
            .drain()
            .into_iter()
            .map(|e| match e {
                SystemEvent::AuthStateChanged { previous_user, .. } => {
                    previous_user.map(|u| u.id.to_string())
                }
                _ => None,
            })
            .collect();
        assert_eq!(previous, vec![Some("stu-user".to_string()), None]);
    }
}
