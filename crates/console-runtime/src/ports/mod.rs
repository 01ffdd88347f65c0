//! # Shell Port
//!
//! Page-wide overlays owned by the bootstrapper: the loading indicator, the
//! fatal error panel with its retry affordance, and the inline error line.

/// Page-wide surface the bootstrapper draws on.
pub trait ShellView: Send + Sync {
    /// Show the loading indicator with a status line.
    fn show_loading(&self, message: &str);

    /// Replace the status line of a visible loading indicator.
    fn update_status(&self, message: &str);

    fn hide_loading(&self);

    /// Full-page error with a retry affordance. Retrying calls
    /// [`AppBootstrapper::retry`](crate::AppBootstrapper::retry).
    fn show_fatal(&self, message: &str);

    fn hide_fatal(&self);

    /// Non-fatal error shown on the current page.
    fn show_inline_error(&self, message: &str);
}
