//! # Console Events
//!
//! Defines all lifecycle events that flow through the shared bus, their
//! topics and the filters used by stream subscribers.

use serde::{Deserialize, Serialize};
use shared_types::{AuthChangeKind, PageKind, Session, UserIdentity};
use std::fmt;
use std::sync::Arc;

/// All events that can be published to the event bus.
#[derive(Debug, Clone)]
pub enum SystemEvent {
    // =========================================================================
    // BACKEND CONNECTIVITY
    // =========================================================================
    /// A backend client passed its probe and is memoized.
    BackendClientInitialized {
        /// Attempts used, including the successful one.
        attempts: u32,
    },

    /// Acquisition gave up after exhausting retries, or was misconfigured.
    BackendClientError { attempts: u32, message: String },

    // =========================================================================
    // SESSION MANAGER
    // =========================================================================
    /// The session manager finished its first initialization.
    AuthModuleReady { session: Arc<Session> },

    /// A session-change notification was applied.
    AuthStateChanged {
        kind: AuthChangeKind,
        session: Arc<Session>,
        /// Present only when the identity changed.
        previous_user: Option<UserIdentity>,
    },

    AuthLoginSuccess { user: UserIdentity },
    AuthLoginFailed { email: String, message: String },
    AuthLogoutSuccess,
    AuthLogoutFailed { message: String },
    AuthPasswordResetSent { email: String },
    AuthPasswordUpdated,

    /// Session initialization failed.
    AuthError { message: String },

    // =========================================================================
    // APP BOOTSTRAP
    // =========================================================================
    AppInitStarted,
    AppInitSuccess { path: String },
    AppInitFailed { message: String },

    // =========================================================================
    // DASHBOARD LIFECYCLE
    // =========================================================================
    DashboardInitStarted { page: PageKind },
    DashboardInitSuccess { page: PageKind },
    DashboardInitFailed { page: PageKind, message: String },
    DashboardDataLoading { page: PageKind },
    DashboardDataLoaded { page: PageKind },
    DashboardDataError { page: PageKind, message: String },

    // =========================================================================
    // DATA
    // =========================================================================
    /// The admin dashboard finished its activation load.
    AdminDataLoaded { supervisors: usize, students: usize },

    // =========================================================================
    // UI / CONFIG
    // =========================================================================
    NotificationShown {
        level: NotificationLevel,
        message: String,
    },

    ConfigLoaded,
}

impl SystemEvent {
    /// Get the topic for this event.
    #[must_use]
    pub fn topic(&self) -> EventTopic {
        match self {
            Self::BackendClientInitialized { .. } => EventTopic::BackendClientInitialized,
            Self::BackendClientError { .. } => EventTopic::BackendClientError,
            Self::AuthModuleReady { .. } => EventTopic::AuthModuleReady,
            Self::AuthStateChanged { .. } => EventTopic::AuthStateChanged,
            Self::AuthLoginSuccess { .. } => EventTopic::AuthLoginSuccess,
            Self::AuthLoginFailed { .. } => EventTopic::AuthLoginFailed,
            Self::AuthLogoutSuccess => EventTopic::AuthLogoutSuccess,
            Self::AuthLogoutFailed { .. } => EventTopic::AuthLogoutFailed,
            Self::AuthPasswordResetSent { .. } => EventTopic::AuthPasswordResetSent,
            Self::AuthPasswordUpdated => EventTopic::AuthPasswordUpdated,
            Self::AuthError { .. } => EventTopic::AuthError,
            Self::AppInitStarted => EventTopic::AppInitStarted,
            Self::AppInitSuccess { .. } => EventTopic::AppInitSuccess,
            Self::AppInitFailed { .. } => EventTopic::AppInitFailed,
            Self::DashboardInitStarted { .. } => EventTopic::DashboardInitStarted,
            Self::DashboardInitSuccess { .. } => EventTopic::DashboardInitSuccess,
            Self::DashboardInitFailed { .. } => EventTopic::DashboardInitFailed,
            Self::DashboardDataLoading { .. } => EventTopic::DashboardDataLoading,
            Self::DashboardDataLoaded { .. } => EventTopic::DashboardDataLoaded,
            Self::DashboardDataError { .. } => EventTopic::DashboardDataError,
            Self::AdminDataLoaded { .. } => EventTopic::AdminDataLoaded,
            Self::NotificationShown { .. } => EventTopic::NotificationShown,
            Self::ConfigLoaded => EventTopic::ConfigLoaded,
        }
    }

    #[must_use]
    pub fn category(&self) -> EventCategory {
        self.topic().category()
    }
}

/// Severity of a user-visible notification.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum NotificationLevel {
    Success,
    Info,
    Warning,
    Error,
}

/// The closed topic vocabulary shared by all components.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum EventTopic {
    BackendClientInitialized,
    BackendClientError,
    AuthModuleReady,
    AuthStateChanged,
    AuthLoginSuccess,
    AuthLoginFailed,
    AuthLogoutSuccess,
    AuthLogoutFailed,
    AuthPasswordResetSent,
    AuthPasswordUpdated,
    AuthError,
    AppInitStarted,
    AppInitSuccess,
    AppInitFailed,
    DashboardInitStarted,
    DashboardInitSuccess,
    DashboardInitFailed,
    DashboardDataLoading,
    DashboardDataLoaded,
    DashboardDataError,
    AdminDataLoaded,
    NotificationShown,
    ConfigLoaded,
}

impl EventTopic {
    /// Stable wire name of the topic.
    #[must_use]
    pub fn name(&self) -> &'static str {
        match self {
            Self::BackendClientInitialized => "backend:client:initialized",
            Self::BackendClientError => "backend:client:error",
            Self::AuthModuleReady => "auth:module:ready",
            Self::AuthStateChanged => "auth:state:changed",
            Self::AuthLoginSuccess => "auth:login:success",
            Self::AuthLoginFailed => "auth:login:failed",
            Self::AuthLogoutSuccess => "auth:logout:success",
            Self::AuthLogoutFailed => "auth:logout:failed",
            Self::AuthPasswordResetSent => "auth:password:reset:sent",
            Self::AuthPasswordUpdated => "auth:password:updated",
            Self::AuthError => "auth:error",
            Self::AppInitStarted => "app:init:started",
            Self::AppInitSuccess => "app:init:success",
            Self::AppInitFailed => "app:init:failed",
            Self::DashboardInitStarted => "dashboard:init:started",
            Self::DashboardInitSuccess => "dashboard:init:success",
            Self::DashboardInitFailed => "dashboard:init:failed",
            Self::DashboardDataLoading => "dashboard:data:loading",
            Self::DashboardDataLoaded => "dashboard:data:loaded",
            Self::DashboardDataError => "dashboard:data:error",
            Self::AdminDataLoaded => "data:admin:all:loaded",
            Self::NotificationShown => "ui:notification:shown",
            Self::ConfigLoaded => "config:loaded",
        }
    }

    #[must_use]
    pub fn category(&self) -> EventCategory {
        match self {
            Self::BackendClientInitialized | Self::BackendClientError => {
                EventCategory::Connectivity
            }
            Self::AuthModuleReady
            | Self::AuthStateChanged
            | Self::AuthLoginSuccess
            | Self::AuthLoginFailed
            | Self::AuthLogoutSuccess
            | Self::AuthLogoutFailed
            | Self::AuthPasswordResetSent
            | Self::AuthPasswordUpdated
            | Self::AuthError => EventCategory::Auth,
            Self::AppInitStarted | Self::AppInitSuccess | Self::AppInitFailed => {
                EventCategory::AppInit
            }
            Self::DashboardInitStarted
            | Self::DashboardInitSuccess
            | Self::DashboardInitFailed
            | Self::DashboardDataLoading
            | Self::DashboardDataLoaded
            | Self::DashboardDataError => EventCategory::Dashboard,
            Self::AdminDataLoaded => EventCategory::Data,
            Self::NotificationShown | Self::ConfigLoaded => EventCategory::Ui,
        }
    }
}

impl fmt::Display for EventTopic {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

/// Coarse grouping of topics by lifecycle.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum EventCategory {
    Connectivity,
    Auth,
    AppInit,
    Dashboard,
    Data,
    Ui,
}

/// Filter for stream subscriptions.
#[derive(Debug, Clone, Default)]
pub struct EventFilter {
    /// Topics to include. Empty means all topics.
    pub topics: Vec<EventTopic>,
    /// Categories to include. Empty means all categories.
    pub categories: Vec<EventCategory>,
}

impl EventFilter {
    /// Create a filter that accepts all events.
    #[must_use]
    pub fn all() -> Self {
        Self::default()
    }

    /// Create a filter for specific topics.
    #[must_use]
    pub fn topics(topics: Vec<EventTopic>) -> Self {
        Self {
            topics,
            categories: Vec::new(),
        }
    }

    /// Create a filter for whole categories.
    #[must_use]
    pub fn categories(categories: Vec<EventCategory>) -> Self {
        Self {
            topics: Vec::new(),
            categories,
        }
    }

    /// Check if an event matches this filter.
    #[must_use]
    pub fn matches(&self, event: &SystemEvent) -> bool {
        let topic = event.topic();
        let topic_match = self.topics.is_empty() || self.topics.contains(&topic);
        let category_match =
            self.categories.is_empty() || self.categories.contains(&topic.category());
        topic_match && category_match
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_topic_names_are_stable() {
        assert_eq!(EventTopic::AuthModuleReady.name(), "auth:module:ready");
        assert_eq!(EventTopic::AppInitStarted.to_string(), "app:init:started");
        assert_eq!(EventTopic::AdminDataLoaded.name(), "data:admin:all:loaded");
    }

    #[test]
    fn test_event_topic_mapping() {
        let event = SystemEvent::DashboardInitFailed {
            page: PageKind::AdminDashboard,
            message: "boom".into(),
        };
        assert_eq!(event.topic(), EventTopic::DashboardInitFailed);
        assert_eq!(event.category(), EventCategory::Dashboard);
    }

    #[test]
    fn test_filter_all() {
        assert!(EventFilter::all().matches(&SystemEvent::AppInitStarted));
    }

    #[test]
    fn test_filter_by_topic() {
        let filter = EventFilter::topics(vec![EventTopic::AuthError]);
        assert!(filter.matches(&SystemEvent::AuthError {
            message: "x".into()
        }));
        assert!(!filter.matches(&SystemEvent::AuthLogoutSuccess));
    }

    #[test]
    fn test_filter_by_category() {
        let filter = EventFilter::categories(vec![EventCategory::AppInit]);
        assert!(filter.matches(&SystemEvent::AppInitFailed {
            message: "down".into()
        }));
        assert!(!filter.matches(&SystemEvent::ConfigLoaded));
    }
}
