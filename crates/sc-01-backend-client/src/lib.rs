//! # Backend Client Accessor (sc-01)
//!
//! Provides the one verified backend client the console talks to.
//!
//! ## Architecture
//!
//! | Layer | Contents |
//! |-------|----------|
//! | `domain` | query model, [`BackendConfig`], [`RetryPolicy`], errors |
//! | `ports` | [`DataStore`], [`IdentityProvider`], [`IdentityAdmin`], [`BackendConnector`] |
//! | `service` | [`ClientAccessor`]: memoized acquisition with retry |
//! | `adapters` | [`MemoryBackend`]: in-memory implementation of every port |
//!
//! ## Acquisition
//!
//! 1. Validate the endpoint configuration. Blank settings fail immediately.
//! 2. Construct a handle and probe it with `select id from organizations limit 1`.
//! 3. On failure wait `RetryPolicy::delay` and try again, up to
//!    `RetryPolicy::max_attempts` attempts in total.
//! 4. Memoize the first verified handle until [`ClientAccessor::reset`].
//!
//! Concurrent callers share one in-flight attempt sequence.
//!
//! ## Events
//!
//! | Outcome | Event |
//! |---------|-------|
//! | Verified | `backend:client:initialized` |
//! | Exhausted or misconfigured | `backend:client:error` |

#![cfg_attr(test, allow(clippy::unwrap_used))]
#![cfg_attr(test, allow(clippy::expect_used))]

pub mod adapters;
pub mod domain;
pub mod ports;
pub mod service;

pub use adapters::{MemoryBackend, MemoryConnector, TableOp, USERS_TABLE};
pub use domain::*;
pub use ports::*;
pub use service::ClientAccessor;
