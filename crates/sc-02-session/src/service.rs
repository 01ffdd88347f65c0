//! # Session Manager
//!
//! Owns the console's [`Session`] and keeps it in step with the identity
//! provider.
//!
//! ## State Machine
//!
//! ```text
//! Uninitialized ──initialize()──→ Initializing ──ok──→ Ready
//!       │                              │
//!       │                              └──err──→ Failed ──initialize()──→ Initializing
//!       │
//!       └──session-change notification──→ Ready
//! ```
//!
//! A notification that lands while initialization is in flight wins over
//! the data the initialization fetched.

use crate::domain::{
    login_redirect, organizations_from_links, unauthorized_redirect, AccountError, AuthInitError,
    RoleDataFetchError, MEMBERSHIP_TABLE,
};
use crate::ports::Navigator;
use futures::future::{BoxFuture, FutureExt, Shared};
use parking_lot::Mutex;
use sc_01_backend_client::{AuthChange, BackendClient, ClientAccessor, Embed, Query};
use shared_bus::{EventPublisher, SystemEvent};
use shared_types::{
    AuthChangeKind, Destination, Organization, OrganizationId, RoleKind, RouteTable, Session,
    UserIdentity,
};
use std::sync::{Arc, Weak};
use tokio::sync::broadcast::error::RecvError;
use tokio::task::JoinHandle;
use tracing::{debug, error, info, warn};

type InitResult = Result<Arc<Session>, AuthInitError>;
type PendingInit = Shared<BoxFuture<'static, InitResult>>;

/// Observable lifecycle phase.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SessionPhase {
    Uninitialized,
    Initializing,
    Ready,
    Failed,
}

enum Phase {
    Uninitialized,
    /// Tagged with the attempt number; only that attempt may finish it.
    Initializing(u64, PendingInit),
    Ready,
    Failed(AuthInitError),
}

struct ManagerState {
    phase: Phase,
    session: Arc<Session>,
    /// Claimed by each notification; initialization only stores its result
    /// when no notification arrived meanwhile.
    revision: u64,
    /// Bumped by every initialization attempt. Survives `reset`.
    attempts: u64,
    listener: Option<JoinHandle<()>>,
}

impl ManagerState {
    fn fresh() -> Self {
        Self {
            phase: Phase::Uninitialized,
            session: Arc::new(Session::empty()),
            revision: 0,
            attempts: 0,
            listener: None,
        }
    }
}

struct ManagerInner {
    accessor: ClientAccessor,
    bus: Arc<dyn EventPublisher>,
    navigator: Arc<dyn Navigator>,
    routes: RouteTable,
    state: Mutex<ManagerState>,
}

/// Cloneable handle to the console's single session manager.
#[derive(Clone)]
pub struct SessionManager {
    inner: Arc<ManagerInner>,
}

impl SessionManager {
    pub fn new(
        accessor: ClientAccessor,
        bus: Arc<dyn EventPublisher>,
        navigator: Arc<dyn Navigator>,
        routes: RouteTable,
    ) -> Self {
        Self {
            inner: Arc::new(ManagerInner {
                accessor,
                bus,
                navigator,
                routes,
                state: Mutex::new(ManagerState::fresh()),
            }),
        }
    }

    // =========================================================================
    // LIFECYCLE
    // =========================================================================

    pub fn phase(&self) -> SessionPhase {
        match self.inner.state.lock().phase {
            Phase::Uninitialized => SessionPhase::Uninitialized,
            Phase::Initializing(..) => SessionPhase::Initializing,
            Phase::Ready => SessionPhase::Ready,
            Phase::Failed(_) => SessionPhase::Failed,
        }
    }

    /// The error from the last failed initialization, if the manager is
    /// currently Failed.
    pub fn last_error(&self) -> Option<AuthInitError> {
        match &self.inner.state.lock().phase {
            Phase::Failed(error) => Some(error.clone()),
            _ => None,
        }
    }

    /// Load the current identity and its organization data.
    ///
    /// Idempotent once Ready. Callers arriving during an in-flight attempt
    /// share its outcome. A Failed manager starts a new attempt.
    pub async fn initialize(&self) -> InitResult {
        let pending = {
            let mut state = self.inner.state.lock();
            match &state.phase {
                Phase::Ready => return Ok(state.session.clone()),
                Phase::Initializing(_, pending) => pending.clone(),
                Phase::Uninitialized | Phase::Failed(_) => {
                    state.attempts += 1;
                    let attempt = state.attempts;
                    let pending = run_initialization(self.inner.clone(), attempt)
                        .boxed()
                        .shared();
                    state.phase = Phase::Initializing(attempt, pending.clone());
                    pending
                }
            }
        };
        pending.await
    }

    /// Attach the session-change listener ahead of initialization, so
    /// notifications delivered early are not missed.
    pub async fn start_listening(&self) -> Result<(), AccountError> {
        let client = self.inner.accessor.acquire().await?;
        attach_listener(&self.inner, &client);
        Ok(())
    }

    /// Return to Uninitialized with an empty session and no listener.
    pub fn reset(&self) {
        let mut state = self.inner.state.lock();
        if let Some(listener) = state.listener.take() {
            listener.abort();
        }
        let revision = state.revision + 1;
        let attempts = state.attempts;
        *state = ManagerState::fresh();
        state.revision = revision;
        state.attempts = attempts;
        info!("Session manager reset");
    }

    // =========================================================================
    // SESSION-CHANGE NOTIFICATIONS
    // =========================================================================

    /// Apply a session-change notification and publish the resulting state.
    pub async fn handle_auth_change(&self, change: AuthChange) -> Arc<Session> {
        let kind = change.kind;
        let claimed = {
            let mut state = self.inner.state.lock();
            state.revision += 1;
            state.revision
        };
        debug!(?kind, revision = claimed, "Session change received");

        let next = match change.session {
            Some(auth) if kind != AuthChangeKind::SignedOut => {
                let organizations = match self.inner.accessor.acquire().await {
                    Ok(client) => organizations_or_empty(&client, &auth.user).await,
                    Err(e) => {
                        warn!(error = %e, "No backend for organization data");
                        Vec::new()
                    }
                };
                Session::signed_in(auth.user, organizations)
            }
            _ => Session::empty(),
        };

        let (session, previous, finalized) = {
            let mut state = self.inner.state.lock();
            if state.revision != claimed {
                debug!(revision = claimed, "Session change superseded");
                return state.session.clone();
            }
            let previous = state.session.user().cloned();
            state.session = Arc::new(next);
            let finalized = matches!(state.phase, Phase::Uninitialized | Phase::Failed(_));
            if finalized {
                state.phase = Phase::Ready;
            }
            (state.session.clone(), previous, finalized)
        };

        let user_changed = kind == AuthChangeKind::UserUpdated
            || previous.as_ref().map(|u| &u.id) != session.user().map(|u| &u.id);
        info!(
            ?kind,
            user_changed,
            roles = ?session.role_names(),
            "Session updated"
        );

        self.inner.bus.publish(SystemEvent::AuthStateChanged {
            kind,
            session: session.clone(),
            previous_user: if user_changed { previous } else { None },
        });
        if finalized {
            self.inner.bus.publish(SystemEvent::AuthModuleReady {
                session: session.clone(),
            });
        }
        session
    }

    // =========================================================================
    // SESSION QUERIES
    // =========================================================================

    /// Snapshot of the current session.
    pub fn session(&self) -> Arc<Session> {
        self.inner.state.lock().session.clone()
    }

    pub fn current_user(&self) -> Option<UserIdentity> {
        self.session().user().cloned()
    }

    pub fn organization_data(&self) -> Vec<Organization> {
        self.session().organizations().to_vec()
    }

    /// Role in the given organization, or in the active one.
    pub fn has_role(&self, role: RoleKind, org_id: Option<&OrganizationId>) -> bool {
        self.session().has_role(role, org_id)
    }

    /// Role in any organization.
    pub fn has_any_role(&self, role: RoleKind) -> bool {
        self.session().has_any_role(role)
    }

    pub fn routes(&self) -> &RouteTable {
        &self.inner.routes
    }

    // =========================================================================
    // GUARDS
    // =========================================================================

    /// Ensure there is a signed-in identity, redirecting to login otherwise.
    pub async fn require_authentication(&self) -> bool {
        let session = match self.initialize().await {
            Ok(session) => session,
            Err(e) => {
                warn!(error = %e, "Initialization failed during authentication check");
                self.session()
            }
        };
        if session.is_authenticated() {
            return true;
        }
        let location = self.inner.navigator.location();
        let target = login_redirect(
            self.inner.routes.path(Destination::Login),
            &location.path_and_query(),
        );
        self.inner.navigator.redirect(&target);
        false
    }

    /// Ensure the identity holds at least one of `roles` in any organization.
    pub async fn require_role(&self, roles: &[RoleKind], unauthorized: Option<&str>) -> bool {
        if !self.require_authentication().await {
            return false;
        }
        if self.session().has_any_of(roles) {
            return true;
        }
        let base = unauthorized.unwrap_or_else(|| self.inner.routes.path(Destination::Unauthorized));
        let target = unauthorized_redirect(base, roles);
        warn!(required = ?roles, "Role requirement not met");
        self.inner.navigator.redirect(&target);
        false
    }

    // =========================================================================
    // ACCOUNT OPERATIONS
    // =========================================================================

    pub async fn login_with_email_password(
        &self,
        email: &str,
        password: &str,
    ) -> Result<UserIdentity, AccountError> {
        let result = async {
            let client = self.inner.accessor.acquire().await?;
            Ok::<_, AccountError>(client.sign_in_with_password(email, password).await?)
        }
        .await;

        match result {
            Ok(auth) => {
                info!(user_id = %auth.user.id, "Login succeeded");
                self.inner.bus.publish(SystemEvent::AuthLoginSuccess {
                    user: auth.user.clone(),
                });
                Ok(auth.user)
            }
            Err(e) => {
                warn!(email, error = %e, "Login failed");
                self.inner.bus.publish(SystemEvent::AuthLoginFailed {
                    email: email.to_string(),
                    message: e.to_string(),
                });
                Err(e)
            }
        }
    }

    pub async fn logout(&self) -> Result<(), AccountError> {
        let result = async {
            let client = self.inner.accessor.acquire().await?;
            Ok::<_, AccountError>(client.sign_out().await?)
        }
        .await;

        match result {
            Ok(()) => {
                info!("Logout succeeded");
                self.inner.bus.publish(SystemEvent::AuthLogoutSuccess);
                Ok(())
            }
            Err(e) => {
                warn!(error = %e, "Logout failed");
                self.inner.bus.publish(SystemEvent::AuthLogoutFailed {
                    message: e.to_string(),
                });
                Err(e)
            }
        }
    }

    /// Send a reset link landing on this console's reset-password page.
    pub async fn send_password_reset_email(&self, email: &str) -> Result<(), AccountError> {
        let redirect_to = format!(
            "{}{}",
            self.inner.navigator.location().origin,
            self.inner.routes.path(Destination::ResetPassword)
        );
        let result = async {
            let client = self.inner.accessor.acquire().await?;
            Ok::<_, AccountError>(client.reset_password_for_email(email, &redirect_to).await?)
        }
        .await;

        match result {
            Ok(()) => {
                info!(email, "Password reset email sent");
                self.inner.bus.publish(SystemEvent::AuthPasswordResetSent {
                    email: email.to_string(),
                });
                Ok(())
            }
            Err(e) => {
                warn!(email, error = %e, "Password reset failed");
                self.inner.bus.publish(SystemEvent::AuthError {
                    message: e.to_string(),
                });
                Err(e)
            }
        }
    }

    pub async fn update_user_password(&self, new_password: &str) -> Result<(), AccountError> {
        let result = async {
            let client = self.inner.accessor.acquire().await?;
            Ok::<_, AccountError>(client.update_password(new_password).await?)
        }
        .await;

        match result {
            Ok(user) => {
                info!(user_id = %user.id, "Password updated");
                self.inner.bus.publish(SystemEvent::AuthPasswordUpdated);
                Ok(())
            }
            Err(e) => {
                warn!(error = %e, "Password update failed");
                self.inner.bus.publish(SystemEvent::AuthError {
                    message: e.to_string(),
                });
                Err(e)
            }
        }
    }
}

async fn run_initialization(inner: Arc<ManagerInner>, attempt: u64) -> InitResult {
    let started = inner.state.lock().revision;
    info!(attempt, "Initializing session");
    let loaded = load_session(&inner).await;

    let outcome = {
        let mut state = inner.state.lock();
        if !matches!(state.phase, Phase::Initializing(current, _) if current == attempt) {
            // Reset while in flight, possibly with a newer attempt running.
            debug!(attempt, "Discarding stale initialization result");
            return loaded.map(Arc::new);
        }
        match loaded {
            Ok(session) => {
                if state.revision == started {
                    state.session = Arc::new(session);
                } else {
                    debug!("Session-change notification superseded initial fetch");
                }
                state.phase = Phase::Ready;
                Ok(state.session.clone())
            }
            Err(e) => {
                state.phase = Phase::Failed(e.clone());
                Err(e)
            }
        }
    };

    match &outcome {
        Ok(session) => {
            info!(
                authenticated = session.is_authenticated(),
                organizations = session.organizations().len(),
                "Session ready"
            );
            inner.bus.publish(SystemEvent::AuthModuleReady {
                session: session.clone(),
            });
        }
        Err(e) => {
            error!(error = %e, "Session initialization failed");
            inner.bus.publish(SystemEvent::AuthError {
                message: e.to_string(),
            });
        }
    }
    outcome
}

async fn load_session(inner: &Arc<ManagerInner>) -> Result<Session, AuthInitError> {
    let client = inner.accessor.acquire().await?;
    attach_listener(inner, &client);

    let Some(user) = client
        .current_user()
        .await
        .map_err(AuthInitError::Identity)?
    else {
        info!("No active session");
        return Ok(Session::empty());
    };
    let organizations = organizations_or_empty(&client, &user).await;
    Ok(Session::signed_in(user, organizations))
}

async fn fetch_organizations(
    client: &Arc<dyn BackendClient>,
    user: &UserIdentity,
) -> Result<Vec<Organization>, RoleDataFetchError> {
    let query = Query::from(MEMBERSHIP_TABLE)
        .select(&["organization_id", "role_id"])
        .eq("user_id", &user.id)
        .embed(Embed::to_one("organizations", "organizations", "organization_id", "id").inner())
        .embed(Embed::to_one("roles", "roles", "role_id", "id").inner());
    client
        .select(&query)
        .await
        .map(organizations_from_links)
        .map_err(|e| RoleDataFetchError(e.to_string()))
}

async fn organizations_or_empty(
    client: &Arc<dyn BackendClient>,
    user: &UserIdentity,
) -> Vec<Organization> {
    match fetch_organizations(client, user).await {
        Ok(organizations) => organizations,
        Err(e) => {
            warn!(user_id = %user.id, error = %e, "Continuing without roles");
            Vec::new()
        }
    }
}

fn attach_listener(inner: &Arc<ManagerInner>, client: &Arc<dyn BackendClient>) {
    let mut state = inner.state.lock();
    if state.listener.is_some() {
        return;
    }
    let mut changes = client.auth_changes();
    let weak: Weak<ManagerInner> = Arc::downgrade(inner);
    state.listener = Some(tokio::spawn(async move {
        loop {
            match changes.recv().await {
                Ok(change) => {
                    let Some(inner) = weak.upgrade() else {
                        break;
                    };
                    SessionManager { inner }.handle_auth_change(change).await;
                }
                Err(RecvError::Lagged(skipped)) => {
                    warn!(skipped, "Session-change listener lagged");
                }
                Err(RecvError::Closed) => break,
            }
        }
        debug!("Session-change listener stopped");
    }));
    debug!("Session-change listener attached");
}
