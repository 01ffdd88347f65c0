//! # Shared Types Crate
//!
//! Domain entities, the route table and the dashboard-controller contract
//! used by every crate of the supervision console.
//!
//! ## Design Principles
//!
//! - **Single Source of Truth**: Cross-crate types are defined here only.
//! - **Roles Are Derived**: A [`Session`]'s aggregated role set is computed
//!   from its organizations at construction and cannot drift from them.
//! - **Closed Vocabularies**: Role names, destinations and pages are enums,
//!   never free-form strings at call sites.

pub mod dashboard;
pub mod entities;
pub mod errors;
pub mod routes;

pub use dashboard::{DashboardController, PageKind};
pub use entities::*;
pub use errors::*;
pub use routes::{Destination, RouteTable};
