//! # Console Runtime
//!
//! Composition root and startup sequence of the supervision console. The
//! `main.rs` binary drives one page load against an in-memory backend.
//!
//! ## Layout
//!
//! - `container/` - configuration and component wiring
//! - `bootstrap/` - the startup sequence and page routing
//! - `registry/` - page controllers by page
//! - `ports/` - the page-wide shell the bootstrapper draws on
//! - `adapters/` - shell implementations
//!
//! ## Outcomes of a Page Load
//!
//! | Situation | Outcome |
//! |-----------|---------|
//! | Backend unreachable, session init failed | fatal panel, retry available |
//! | Anonymous, public page | page renders as-is |
//! | Anonymous, protected page | redirect to login |
//! | Signed in, page matches role and has a controller | controller runs |
//! | Signed in, anything else | redirect to default dashboard by role priority |
//! | Signed in, no recognised role | login with an error, or inline error on login |

#![cfg_attr(test, allow(clippy::unwrap_used))]
#![cfg_attr(test, allow(clippy::expect_used))]
#![cfg_attr(test, allow(clippy::panic))]

pub mod adapters;
pub mod bootstrap;
pub mod container;
pub mod ports;
pub mod registry;

pub use adapters::{RecordingShell, ShellFrame, TracingShell};
pub use bootstrap::{AppBootstrapper, BootError, BootOutcome};
pub use container::{load_config, ConsoleConfig, ConsoleContainer};
pub use ports::ShellView;
pub use registry::ControllerRegistry;
