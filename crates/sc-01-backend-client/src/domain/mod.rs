//! Domain layer for the backend client accessor.

pub mod config;
pub mod errors;
pub mod query;

pub use config::{BackendConfig, RetryPolicy};
pub use errors::{BackendError, ConnectivityError};
pub use query::{lookup_path, text_at, Direction, Embed, Filter, FilterOp, OrderBy, Query, Row};
