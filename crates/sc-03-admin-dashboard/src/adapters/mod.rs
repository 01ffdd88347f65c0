//! Adapters for the admin view port.

pub mod recording_view;

pub use recording_view::RecordingAdminView;
