//! Shell adapters.

pub mod shell;

pub use shell::{RecordingShell, ShellFrame, TracingShell};
