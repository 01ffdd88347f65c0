//! Ports for the session manager.

pub mod outbound;

pub use outbound::*;
