//! Ports for the backend client accessor.

pub mod outbound;

pub use outbound::*;
