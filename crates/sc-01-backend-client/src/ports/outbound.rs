//! # Outbound Ports
//!
//! Everything the console needs from the remote backend. Adapters implement
//! these; the console never talks to a concrete backend SDK directly.

use crate::domain::{BackendConfig, BackendError, Query, Row};
use async_trait::async_trait;
use shared_types::{AuthChangeKind, AuthSession, Metadata, UserId, UserIdentity};
use std::sync::Arc;
use tokio::sync::broadcast;

/// Relational reads and writes.
#[async_trait]
pub trait DataStore: Send + Sync {
    /// Rows matching the query, embedded, ordered, limited and projected.
    async fn select(&self, query: &Query) -> Result<Vec<Row>, BackendError>;

    /// Number of rows matching the query's filters. Limit is ignored.
    async fn count(&self, query: &Query) -> Result<u64, BackendError>;

    /// Insert rows and return them as stored (with generated ids).
    async fn insert(&self, table: &str, rows: Vec<Row>) -> Result<Vec<Row>, BackendError>;

    /// Merge `patch` into every row matching the query's filters.
    async fn update(&self, query: &Query, patch: Row) -> Result<u64, BackendError>;

    /// Delete every row matching the query's filters.
    async fn delete(&self, query: &Query) -> Result<u64, BackendError>;

    /// Exactly one row, or [`BackendError::NotFound`].
    async fn select_single(&self, query: &Query) -> Result<Row, BackendError> {
        self.select(query)
            .await?
            .into_iter()
            .next()
            .ok_or_else(|| BackendError::NotFound {
                what: query.table.clone(),
            })
    }
}

/// A session-change notification from the identity provider.
#[derive(Debug, Clone, PartialEq)]
pub struct AuthChange {
    pub kind: AuthChangeKind,
    /// Absent on sign-out or when no session could be restored.
    pub session: Option<AuthSession>,
}

/// End-user authentication.
#[async_trait]
pub trait IdentityProvider: Send + Sync {
    /// The signed-in identity, if any.
    async fn current_user(&self) -> Result<Option<UserIdentity>, BackendError>;

    /// Subscribe to session-change notifications.
    fn auth_changes(&self) -> broadcast::Receiver<AuthChange>;

    async fn sign_in_with_password(
        &self,
        email: &str,
        password: &str,
    ) -> Result<AuthSession, BackendError>;

    async fn sign_out(&self) -> Result<(), BackendError>;

    /// Send a reset link that lands on `redirect_to`.
    async fn reset_password_for_email(
        &self,
        email: &str,
        redirect_to: &str,
    ) -> Result<(), BackendError>;

    /// Change the signed-in user's password.
    async fn update_password(&self, new_password: &str) -> Result<UserIdentity, BackendError>;
}

/// Identity to be created by an administrator.
#[derive(Debug, Clone, PartialEq)]
pub struct NewIdentity {
    pub email: String,
    pub password: String,
    pub email_confirmed: bool,
    pub metadata: Metadata,
}

/// Privileged identity management.
#[async_trait]
pub trait IdentityAdmin: Send + Sync {
    async fn create_user(&self, identity: NewIdentity) -> Result<UserIdentity, BackendError>;

    /// Merge `metadata` into the user's metadata.
    async fn update_user_metadata(
        &self,
        user_id: &UserId,
        metadata: Metadata,
    ) -> Result<UserIdentity, BackendError>;

    async fn delete_user(&self, user_id: &UserId) -> Result<(), BackendError>;
}

/// A full backend handle.
pub trait BackendClient: DataStore + IdentityProvider + IdentityAdmin {}

impl<T> BackendClient for T where T: DataStore + IdentityProvider + IdentityAdmin {}

/// Builds unverified client handles.
#[async_trait]
pub trait BackendConnector: Send + Sync {
    async fn connect(&self, config: &BackendConfig)
        -> Result<Arc<dyn BackendClient>, BackendError>;
}
