//! # Event Publisher
//!
//! Defines the publishing side of the event bus.

use crate::events::{EventFilter, EventTopic, SystemEvent};
use crate::subscriber::{EventStream, Subscription, SubscriptionTracker};
use crate::DEFAULT_CHANNEL_CAPACITY;
use parking_lot::RwLock;
use std::collections::HashMap;
use std::panic::{catch_unwind, AssertUnwindSafe};
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::Arc;
use tokio::sync::broadcast;
use tracing::{debug, warn};

/// A topic handler. Registered handlers live as long as the bus.
pub type EventHandler = Arc<dyn Fn(&SystemEvent) + Send + Sync>;

/// Trait for publishing events to the bus.
///
/// This is the interface components use to emit lifecycle events without
/// knowing who consumes them.
pub trait EventPublisher: Send + Sync {
    /// Publish an event to the bus.
    ///
    /// Dispatch is synchronous: every handler registered for the event's
    /// topic has run by the time this returns.
    ///
    /// # Returns
    ///
    /// The number of topic handlers that completed without panicking.
    fn publish(&self, event: SystemEvent) -> usize;

    /// Get the total number of events published.
    fn events_published(&self) -> u64;
}

/// In-memory implementation of the event bus.
///
/// Topic handlers are invoked inline in registration order. Every event is
/// additionally forwarded to a `tokio::sync::broadcast` channel for async
/// [`Subscription`]s.
pub struct InMemoryEventBus {
    /// Broadcast sender for stream subscribers.
    sender: broadcast::Sender<SystemEvent>,

    /// Handlers by topic, in registration order.
    handlers: RwLock<HashMap<EventTopic, Vec<EventHandler>>>,

    /// Active stream subscription count by filter key.
    subscriptions: SubscriptionTracker,

    /// Total events published.
    events_published: AtomicU64,

    /// Channel capacity.
    capacity: usize,
}

impl InMemoryEventBus {
    /// Create a new in-memory event bus with default capacity.
    #[must_use]
    pub fn new() -> Self {
        Self::with_capacity(DEFAULT_CHANNEL_CAPACITY)
    }

    /// Create a new in-memory event bus with specified capacity.
    #[must_use]
    pub fn with_capacity(capacity: usize) -> Self {
        let (sender, _) = broadcast::channel(capacity);
        Self {
            sender,
            handlers: RwLock::new(HashMap::new()),
            subscriptions: Arc::new(RwLock::new(HashMap::new())),
            events_published: AtomicU64::new(0),
            capacity,
        }
    }

    /// Register a handler for one topic.
    pub fn subscribe<F>(&self, topic: EventTopic, handler: F)
    where
        F: Fn(&SystemEvent) + Send + Sync + 'static,
    {
        self.handlers
            .write()
            .entry(topic)
            .or_default()
            .push(Arc::new(handler));
        debug!(topic = %topic, "Handler registered");
    }

    /// Subscribe to events matching a filter for async consumption.
    ///
    /// Only events published after this call are observed.
    #[must_use]
    pub fn subscribe_stream(&self, filter: EventFilter) -> Subscription {
        let receiver = self.sender.subscribe();
        let topic_key = format!("{:?}/{:?}", filter.topics, filter.categories);

        *self
            .subscriptions
            .write()
            .entry(topic_key.clone())
            .or_insert(0) += 1;

        debug!(topics = ?filter.topics, categories = ?filter.categories, "New subscription created");

        Subscription::new(receiver, filter, self.subscriptions.clone(), topic_key)
    }

    /// Get a stream of events matching a filter.
    #[must_use]
    pub fn event_stream(&self, filter: EventFilter) -> EventStream {
        EventStream::new(self.subscribe_stream(filter))
    }

    /// Number of handlers registered for a topic.
    #[must_use]
    pub fn handler_count(&self, topic: EventTopic) -> usize {
        self.handlers.read().get(&topic).map_or(0, Vec::len)
    }

    /// Get the number of active stream subscribers.
    #[must_use]
    pub fn subscriber_count(&self) -> usize {
        self.sender.receiver_count()
    }

    /// Get the channel capacity.
    #[must_use]
    pub fn capacity(&self) -> usize {
        self.capacity
    }
}

impl Default for InMemoryEventBus {
    fn default() -> Self {
        Self::new()
    }
}

impl EventPublisher for InMemoryEventBus {
    fn publish(&self, event: SystemEvent) -> usize {
        let topic = event.topic();
        self.events_published.fetch_add(1, Ordering::Relaxed);

        // Snapshot so handlers may publish or subscribe re-entrantly.
        let handlers: Vec<EventHandler> = self
            .handlers
            .read()
            .get(&topic)
            .cloned()
            .unwrap_or_default();

        let mut completed = 0;
        for (index, handler) in handlers.iter().enumerate() {
            match catch_unwind(AssertUnwindSafe(|| handler(&event))) {
                Ok(()) => completed += 1,
                Err(_) => warn!(topic = %topic, handler = index, "Event handler panicked"),
            }
        }

        match self.sender.send(event) {
            Ok(receivers) => {
                debug!(topic = %topic, handlers = completed, receivers, "Event published");
            }
            Err(_) => {
                debug!(topic = %topic, handlers = completed, "Event published (no stream receivers)");
            }
        }

        completed
    }

    fn events_published(&self) -> u64 {
        self.events_published.load(Ordering::Relaxed)
    }
}
