//! Ports for the admin dashboard.

pub mod outbound;

pub use outbound::*;
