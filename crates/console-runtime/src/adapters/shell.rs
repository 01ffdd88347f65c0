//! Shell implementations for tests and headless runs.

use crate::ports::ShellView;
use parking_lot::RwLock;
use tracing::{error, info, warn};

/// Snapshot of what a [`RecordingShell`] currently shows.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ShellFrame {
    pub loading: bool,
    pub status: Option<String>,
    pub fatal: Option<String>,
    pub inline_error: Option<String>,
    /// Every status line shown, in order.
    pub status_history: Vec<String>,
}

/// Keeps the current overlay state in memory.
#[derive(Default)]
pub struct RecordingShell {
    frame: RwLock<ShellFrame>,
}

impl RecordingShell {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn frame(&self) -> ShellFrame {
        self.frame.read().clone()
    }
}

impl ShellView for RecordingShell {
    fn show_loading(&self, message: &str) {
        let mut frame = self.frame.write();
        frame.loading = true;
        frame.status = Some(message.to_string());
        frame.status_history.push(message.to_string());
    }

    fn update_status(&self, message: &str) {
        let mut frame = self.frame.write();
        frame.status = Some(message.to_string());
        frame.status_history.push(message.to_string());
    }

    fn hide_loading(&self) {
        let mut frame = self.frame.write();
        frame.loading = false;
        frame.status = None;
    }

    fn show_fatal(&self, message: &str) {
        self.frame.write().fatal = Some(message.to_string());
    }

    fn hide_fatal(&self) {
        self.frame.write().fatal = None;
    }

    fn show_inline_error(&self, message: &str) {
        self.frame.write().inline_error = Some(message.to_string());
    }
}

/// Writes overlay changes to the log. Used by the binary.
#[derive(Debug, Default)]
pub struct TracingShell;

impl ShellView for TracingShell {
    fn show_loading(&self, message: &str) {
        info!(status = message, "Loading");
    }

    fn update_status(&self, message: &str) {
        info!(status = message, "Loading");
    }

    fn hide_loading(&self) {
        info!("Loading finished");
    }

    fn show_fatal(&self, message: &str) {
        error!(message, "Fatal error");
    }

    fn hide_fatal(&self) {
        info!("Fatal error cleared");
    }

    fn show_inline_error(&self, message: &str) {
        warn!(message, "Page error");
    }
}
