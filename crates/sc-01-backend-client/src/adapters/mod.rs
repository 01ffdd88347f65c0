//! Adapters for the backend ports.

pub mod memory;

pub use memory::{MemoryBackend, MemoryConnector, SentResetEmail, TableOp, USERS_TABLE};
