//! # Console Container
//!
//! Configuration and the composition root that wires every component.

pub mod components;
pub mod config;

pub use components::ConsoleContainer;
pub use config::{load_config, ConsoleConfig};
