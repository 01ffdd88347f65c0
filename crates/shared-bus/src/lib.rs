//! # Shared Bus - Lifecycle Event Bus
//!
//! Decouples the initialization stages of the console: the backend accessor,
//! session manager, bootstrapper and dashboards publish lifecycle events here
//! instead of calling each other.
//!
//! ```text
//! ┌──────────────┐                    ┌──────────────┐
//! │ Component A  │                    │ Component B  │
//! │              │    publish()       │              │
//! │              │ ──────┐            │              │
//! └──────────────┘       │            └──────────────┘
//!                        ▼                    ↑
//!                  ┌──────────────┐          │
//!                  │  Event Bus   │          │
//!                  │              │ ─────────┘
//!                  └──────────────┘  subscribe()
//! ```
//!
//! ## Delivery
//!
//! - Topic handlers run synchronously inside `publish`, in registration order.
//! - A panicking handler is isolated and does not stop later handlers.
//! - Stream subscriptions receive a copy of every event through a broadcast
//!   channel and filter by topic or category.

// Allow in tests
#![cfg_attr(test, allow(clippy::unwrap_used))]
#![cfg_attr(test, allow(clippy::expect_used))]
#![cfg_attr(test, allow(clippy::panic))]

pub mod events;
pub mod publisher;
pub mod subscriber;

pub use events::{EventCategory, EventFilter, EventTopic, NotificationLevel, SystemEvent};
pub use publisher::{EventHandler, EventPublisher, InMemoryEventBus};
pub use subscriber::{EventStream, Subscription, SubscriptionError};

/// Maximum events to buffer per stream subscriber before lagging.
pub const DEFAULT_CHANNEL_CAPACITY: usize = 256;
