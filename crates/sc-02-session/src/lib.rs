//! # Session Manager (sc-02)
//!
//! Tracks who is signed in, which organizations they belong to and which
//! roles they hold there. Provides the route guards used by every page.
//!
//! ## Responsibilities
//!
//! - Initialize once per process lifetime, sharing an in-flight attempt
//!   between concurrent callers.
//! - Follow session-change notifications from the identity provider and
//!   replace the session wholesale on each one.
//! - Answer role questions synchronously from the current snapshot.
//! - Redirect unauthenticated or unauthorized visitors.
//!
//! ## Failure Semantics
//!
//! | Failure | Effect |
//! |---------|--------|
//! | Backend unreachable | [`AuthInitError`], manager Failed |
//! | Current-user read fails | [`AuthInitError`], manager Failed |
//! | Organization data fails | logged, session Ready with no roles |
//!
//! ## Events
//!
//! `auth:module:ready`, `auth:state:changed`, `auth:error`, and one
//! success/failure pair per account operation.

#![cfg_attr(test, allow(clippy::unwrap_used))]
#![cfg_attr(test, allow(clippy::expect_used))]
#![cfg_attr(test, allow(clippy::panic))]

pub mod adapters;
pub mod domain;
pub mod ports;
pub mod service;

pub use adapters::RecordingNavigator;
pub use domain::{AccountError, AuthInitError, RoleDataFetchError};
pub use ports::{Location, Navigator};
pub use service::{SessionManager, SessionPhase};
