//! # Admin Dashboard (sc-03)
//!
//! Organization-scoped management of supervisors and students for users
//! holding the `admin` role.
//!
//! ## Activation
//!
//! 1. Required view elements are checked when the controller is built.
//! 2. `require_role(admin)` runs through the session manager.
//! 3. Lookups, overview counts, supervisor and student lists load in order.
//! 4. Charts render when the page has chart elements.
//!
//! ## Mutations
//!
//! Every create, update, status change and delete is a fixed sequence of
//! backend requests awaited in order. A failed step is reported as a
//! [`MutationError`] naming the step; earlier steps are not rolled back.
//! The affected list is fetched again afterwards.
//!
//! | Action | Steps |
//! |--------|-------|
//! | Create supervisor | identity, row, role links (warning on failure) |
//! | Update supervisor | lookup, metadata, row, replace role links |
//! | Delete supervisor | lookup, unlink students, clear assignments, row, role links, identity |
//! | Create student | identity, row, student role link (warning on failure) |
//! | Update student | lookup, metadata, row |
//! | Delete student | lookup, unlink supervisors, milestones, row, role links, identity |
//!
//! ## Events
//!
//! `dashboard:data:loading`, `dashboard:data:loaded`, `dashboard:data:error`,
//! `data:admin:all:loaded`, `ui:notification:shown`.

#![cfg_attr(test, allow(clippy::unwrap_used))]
#![cfg_attr(test, allow(clippy::expect_used))]
#![cfg_attr(test, allow(clippy::panic))]

pub mod adapters;
pub mod controller;
pub mod domain;
pub mod ports;
pub mod service;

pub use adapters::RecordingAdminView;
pub use controller::AdminDashboard;
pub use domain::*;
pub use ports::{AdminView, ElementId};
pub use service::AdminService;
