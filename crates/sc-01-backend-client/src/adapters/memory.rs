//! In-memory backend.
//!
//! Implements every backend port over plain tables held in memory. Used by the
//! demo binary and as the test double throughout the workspace. Failures can
//! be injected per table and operation.

use crate::domain::{BackendConfig, BackendError, Filter, FilterOp, Query, Row};
use crate::ports::{
    AuthChange, BackendClient, BackendConnector, DataStore, IdentityAdmin, IdentityProvider,
    NewIdentity,
};
use async_trait::async_trait;
use parking_lot::{Mutex, RwLock};
use serde_json::Value;
use shared_types::{AuthChangeKind, AuthSession, Metadata, UserId, UserIdentity};
use std::collections::HashMap;
use std::sync::atomic::{AtomicU32, AtomicU64, Ordering};
use std::sync::Arc;
use std::time::Duration;
use tokio::sync::broadcast;
use tracing::debug;
use uuid::Uuid;

/// Table name mirrored from the identity store so embeds can join on it.
pub const USERS_TABLE: &str = "users";

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum TableOp {
    Select,
    Count,
    Insert,
    Update,
    Delete,
}

#[derive(Debug)]
struct FailureRule {
    table: String,
    op: Option<TableOp>,
    remaining: Option<u32>,
    message: String,
}

#[derive(Debug, Clone)]
struct StoredUser {
    identity: UserIdentity,
    password: String,
}

/// A reset email that would have been sent.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SentResetEmail {
    pub email: String,
    pub redirect_to: String,
}

pub struct MemoryBackend {
    tables: RwLock<HashMap<String, Vec<Row>>>,
    users: RwLock<Vec<StoredUser>>,
    current: RwLock<Option<AuthSession>>,
    auth_tx: broadcast::Sender<AuthChange>,
    failures: Mutex<Vec<FailureRule>>,
    identity_failure: RwLock<Option<String>>,
    reads: Mutex<HashMap<String, usize>>,
    reset_emails: Mutex<Vec<SentResetEmail>>,
    latency: RwLock<HashMap<String, Duration>>,
    next_id: AtomicU64,
}

impl Default for MemoryBackend {
    fn default() -> Self {
        Self::new()
    }
}

impl MemoryBackend {
    pub fn new() -> Self {
        let (auth_tx, _) = broadcast::channel(64);
        Self {
            tables: RwLock::new(HashMap::new()),
            users: RwLock::new(Vec::new()),
            current: RwLock::new(None),
            auth_tx,
            failures: Mutex::new(Vec::new()),
            identity_failure: RwLock::new(None),
            reads: Mutex::new(HashMap::new()),
            reset_emails: Mutex::new(Vec::new()),
            latency: RwLock::new(HashMap::new()),
            next_id: AtomicU64::new(1),
        }
    }

    // =========================================================================
    // SEEDING
    // =========================================================================

    /// Append rows to a table, assigning ids where missing.
    pub fn seed(&self, table: &str, rows: Vec<Value>) {
        let rows = rows
            .into_iter()
            .filter_map(|v| v.as_object().cloned())
            .map(|row| self.with_id(row))
            .collect::<Vec<_>>();
        self.tables
            .write()
            .entry(table.to_string())
            .or_default()
            .extend(rows);
    }

    /// Register an identity with a password, mirrored into the users table.
    pub fn add_user(&self, identity: UserIdentity, password: &str) {
        self.mirror_user(&identity);
        self.users.write().push(StoredUser {
            identity,
            password: password.to_string(),
        });
    }

    /// Set the restored session without emitting a notification.
    pub fn set_current_user(&self, user: Option<UserIdentity>) {
        *self.current.write() = user.map(AuthSession::for_user);
    }

    /// Deliver a session-change notification to subscribers.
    pub fn emit_auth_change(&self, kind: AuthChangeKind, user: Option<UserIdentity>) {
        let session = user.map(AuthSession::for_user);
        *self.current.write() = match kind {
            AuthChangeKind::SignedOut => None,
            _ => session.clone(),
        };
        // No receivers is fine.
        let _ = self.auth_tx.send(AuthChange { kind, session });
    }

    // =========================================================================
    // FAILURE INJECTION
    // =========================================================================

    /// Fail every matching operation until [`MemoryBackend::heal`].
    pub fn fail(&self, table: &str, op: Option<TableOp>, message: &str) {
        self.push_rule(table, op, None, message);
    }

    /// Fail the next `times` matching operations.
    pub fn fail_times(&self, table: &str, op: Option<TableOp>, times: u32, message: &str) {
        self.push_rule(table, op, Some(times), message);
    }

    pub fn heal(&self, table: &str) {
        self.failures.lock().retain(|rule| rule.table != table);
    }

    /// Delay every select against `table`.
    pub fn slow(&self, table: &str, delay: Duration) {
        self.latency.write().insert(table.to_string(), delay);
    }

    /// Make `current_user` fail.
    pub fn fail_identity(&self, message: Option<&str>) {
        *self.identity_failure.write() = message.map(str::to_string);
    }

    // =========================================================================
    // INSPECTION
    // =========================================================================

    pub fn rows(&self, table: &str) -> Vec<Row> {
        self.tables.read().get(table).cloned().unwrap_or_default()
    }

    /// Number of select calls issued against a table.
    pub fn reads_of(&self, table: &str) -> usize {
        self.reads.lock().get(table).copied().unwrap_or(0)
    }

    pub fn reset_emails(&self) -> Vec<SentResetEmail> {
        self.reset_emails.lock().clone()
    }

    pub fn user_by_email(&self, email: &str) -> Option<UserIdentity> {
        self.users
            .read()
            .iter()
            .find(|u| u.identity.email.eq_ignore_ascii_case(email))
            .map(|u| u.identity.clone())
    }

    pub fn password_of(&self, user_id: &UserId) -> Option<String> {
        self.users
            .read()
            .iter()
            .find(|u| &u.identity.id == user_id)
            .map(|u| u.password.clone())
    }

    // =========================================================================
    // INTERNALS
    // =========================================================================

    fn push_rule(&self, table: &str, op: Option<TableOp>, remaining: Option<u32>, message: &str) {
        self.failures.lock().push(FailureRule {
            table: table.to_string(),
            op,
            remaining,
            message: message.to_string(),
        });
    }

    fn check(&self, table: &str, op: TableOp) -> Result<(), BackendError> {
        let mut failures = self.failures.lock();
        let Some(index) = failures
            .iter()
            .position(|r| r.table == table && r.op.map_or(true, |o| o == op))
        else {
            return Ok(());
        };
        let message = failures[index].message.clone();
        let exhausted = match failures[index].remaining.as_mut() {
            Some(remaining) => {
                *remaining = remaining.saturating_sub(1);
                *remaining == 0
            }
            None => false,
        };
        if exhausted {
            failures.remove(index);
        }
        debug!(table, ?op, %message, "Injected backend failure");
        Err(BackendError::request(table, message))
    }

    fn with_id(&self, mut row: Row) -> Row {
        if !row.contains_key("id") {
            let id = self.next_id.fetch_add(1, Ordering::Relaxed);
            row.insert("id".to_string(), Value::from(id));
        }
        row
    }

    fn mirror_user(&self, identity: &UserIdentity) {
        let mut row = Row::new();
        row.insert("id".to_string(), Value::from(&identity.id));
        row.insert("email".to_string(), Value::from(identity.email.clone()));
        row.insert(
            "raw_user_meta_data".to_string(),
            Value::Object(identity.metadata.clone()),
        );
        let mut tables = self.tables.write();
        let users = tables.entry(USERS_TABLE.to_string()).or_default();
        users.retain(|r| r.get("id") != row.get("id"));
        users.push(row);
    }

    fn matching(&self, query: &Query) -> Vec<Row> {
        let tables = self.tables.read();
        let base = tables.get(&query.table).cloned().unwrap_or_default();
        let mut rows: Vec<Row> = base
            .into_iter()
            .filter_map(|mut row| {
                for embed in &query.embeds {
                    let key = row.get(&embed.local_column).cloned().unwrap_or(Value::Null);
                    let related = tables.get(&embed.table).and_then(|candidates| {
                        candidates.iter().find(|c| {
                            !key.is_null()
                                && Filter::new(embed.foreign_column.as_str(), FilterOp::Eq, key.clone())
                                    .matches(c)
                        })
                    });
                    match related {
                        Some(found) => {
                            row.insert(embed.alias.clone(), Value::Object(found.clone()));
                        }
                        None if embed.inner => return None,
                        None => {
                            row.insert(embed.alias.clone(), Value::Null);
                        }
                    }
                }
                Some(row)
            })
            .filter(|row| query.accepts(row))
            .collect();
        query.sort(&mut rows);
        rows
    }

    fn find_stored(&self, user_id: &UserId) -> Result<usize, BackendError> {
        self.users
            .read()
            .iter()
            .position(|u| &u.identity.id == user_id)
            .ok_or_else(|| BackendError::UserNotFound(user_id.to_string()))
    }
}

#[async_trait]
impl DataStore for MemoryBackend {
    async fn select(&self, query: &Query) -> Result<Vec<Row>, BackendError> {
        *self.reads.lock().entry(query.table.clone()).or_default() += 1;
        let delay = self.latency.read().get(&query.table).copied();
        if let Some(delay) = delay {
            tokio::time::sleep(delay).await;
        }
        self.check(&query.table, TableOp::Select)?;
        let mut rows = self.matching(query);
        if let Some(limit) = query.limit {
            rows.truncate(limit);
        }
        Ok(rows.into_iter().map(|r| query.project(r)).collect())
    }

    async fn count(&self, query: &Query) -> Result<u64, BackendError> {
        self.check(&query.table, TableOp::Count)?;
        Ok(self.matching(query).len() as u64)
    }

    async fn insert(&self, table: &str, rows: Vec<Row>) -> Result<Vec<Row>, BackendError> {
        self.check(table, TableOp::Insert)?;
        let stored: Vec<Row> = rows.into_iter().map(|r| self.with_id(r)).collect();
        self.tables
            .write()
            .entry(table.to_string())
            .or_default()
            .extend(stored.iter().cloned());
        Ok(stored)
    }

    async fn update(&self, query: &Query, patch: Row) -> Result<u64, BackendError> {
        self.check(&query.table, TableOp::Update)?;
        let mut tables = self.tables.write();
        let Some(rows) = tables.get_mut(&query.table) else {
            return Ok(0);
        };
        let mut updated = 0;
        for row in rows.iter_mut().filter(|r| query.accepts(r)) {
            for (key, value) in &patch {
                row.insert(key.clone(), value.clone());
            }
            updated += 1;
        }
        Ok(updated)
    }

    async fn delete(&self, query: &Query) -> Result<u64, BackendError> {
        self.check(&query.table, TableOp::Delete)?;
        let mut tables = self.tables.write();
        let Some(rows) = tables.get_mut(&query.table) else {
            return Ok(0);
        };
        let before = rows.len();
        rows.retain(|r| !query.accepts(r));
        Ok((before - rows.len()) as u64)
    }
}

#[async_trait]
impl IdentityProvider for MemoryBackend {
    async fn current_user(&self) -> Result<Option<UserIdentity>, BackendError> {
        if let Some(message) = self.identity_failure.read().clone() {
            return Err(BackendError::Auth(message));
        }
        Ok(self.current.read().as_ref().map(|s| s.user.clone()))
    }

    fn auth_changes(&self) -> broadcast::Receiver<AuthChange> {
        self.auth_tx.subscribe()
    }

    async fn sign_in_with_password(
        &self,
        email: &str,
        password: &str,
    ) -> Result<AuthSession, BackendError> {
        let user = self
            .users
            .read()
            .iter()
            .find(|u| u.identity.email.eq_ignore_ascii_case(email) && u.password == password)
            .map(|u| u.identity.clone())
            .ok_or_else(|| BackendError::Auth("Invalid login credentials".to_string()))?;
        self.emit_auth_change(AuthChangeKind::SignedIn, Some(user.clone()));
        Ok(AuthSession::for_user(user))
    }

    async fn sign_out(&self) -> Result<(), BackendError> {
        if self.current.read().is_none() {
            return Err(BackendError::Auth("No active session".to_string()));
        }
        self.emit_auth_change(AuthChangeKind::SignedOut, None);
        Ok(())
    }

    async fn reset_password_for_email(
        &self,
        email: &str,
        redirect_to: &str,
    ) -> Result<(), BackendError> {
        if email.trim().is_empty() {
            return Err(BackendError::Auth("Email is required".to_string()));
        }
        self.reset_emails.lock().push(SentResetEmail {
            email: email.to_string(),
            redirect_to: redirect_to.to_string(),
        });
        Ok(())
    }

    async fn update_password(&self, new_password: &str) -> Result<UserIdentity, BackendError> {
        let user = self
            .current
            .read()
            .as_ref()
            .map(|s| s.user.clone())
            .ok_or_else(|| BackendError::Auth("No active session".to_string()))?;
        let index = self.find_stored(&user.id)?;
        self.users.write()[index].password = new_password.to_string();
        self.emit_auth_change(AuthChangeKind::UserUpdated, Some(user.clone()));
        Ok(user)
    }
}

#[async_trait]
impl IdentityAdmin for MemoryBackend {
    async fn create_user(&self, identity: NewIdentity) -> Result<UserIdentity, BackendError> {
        if self.user_by_email(&identity.email).is_some() {
            return Err(BackendError::Auth("User already registered".to_string()));
        }
        let user = UserIdentity {
            id: UserId::new(Uuid::new_v4().to_string()),
            email: identity.email,
            metadata: identity.metadata,
        };
        self.add_user(user.clone(), &identity.password);
        Ok(user)
    }

    async fn update_user_metadata(
        &self,
        user_id: &UserId,
        metadata: Metadata,
    ) -> Result<UserIdentity, BackendError> {
        let index = self.find_stored(user_id)?;
        let updated = {
            let mut users = self.users.write();
            let identity = &mut users[index].identity;
            identity.metadata.extend(metadata);
            identity.clone()
        };
        self.mirror_user(&updated);
        Ok(updated)
    }

    async fn delete_user(&self, user_id: &UserId) -> Result<(), BackendError> {
        let index = self.find_stored(user_id)?;
        self.users.write().remove(index);
        if let Some(users) = self.tables.write().get_mut(USERS_TABLE) {
            users.retain(|r| r.get("id").and_then(Value::as_str) != Some(user_id.as_str()));
        }
        Ok(())
    }
}

/// Hands out the shared [`MemoryBackend`] and counts constructions.
pub struct MemoryConnector {
    backend: Arc<MemoryBackend>,
    connects: AtomicU32,
}

impl MemoryConnector {
    pub fn new(backend: Arc<MemoryBackend>) -> Self {
        Self {
            backend,
            connects: AtomicU32::new(0),
        }
    }

    /// Handles constructed so far.
    pub fn connects(&self) -> u32 {
        self.connects.load(Ordering::SeqCst)
    }

    pub fn backend(&self) -> &Arc<MemoryBackend> {
        &self.backend
    }
}

#[async_trait]
impl BackendConnector for MemoryConnector {
    async fn connect(
        &self,
        config: &BackendConfig,
    ) -> Result<Arc<dyn BackendClient>, BackendError> {
        let n = self.connects.fetch_add(1, Ordering::SeqCst) + 1;
        debug!(connect = n, url = %config.url, "Constructing in-memory client");
        Ok(self.backend.clone())
    }
}
