//! Adapters for the session ports.

pub mod navigator;

pub use navigator::RecordingNavigator;
