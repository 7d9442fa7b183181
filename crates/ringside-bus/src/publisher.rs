//! # Event Publisher
//!
//! Defines the publishing side of the notification bus.
//!
//! Delivery is synchronous: `publish` invokes every matching handler on the
//! calling thread, in subscription order, before it returns. Each handler
//! call is isolated, so a panicking observer cannot starve the ones
//! registered after it.

use crate::events::{EventFilter, EventTopic, TransactionEvent};
use crate::subscriber::{EventStream, Subscription, SubscriptionId};
use parking_lot::RwLock;
use std::panic::{catch_unwind, AssertUnwindSafe};
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::Arc;
use tokio::sync::mpsc;
use tracing::{debug, warn};

/// Observer callback.
pub type EventHandler = Arc<dyn Fn(&TransactionEvent) + Send + Sync>;

/// Trait for publishing events to the bus.
pub trait EventPublisher: Send + Sync {
    /// Publish an event to the bus.
    ///
    /// # Returns
    ///
    /// The number of handlers that completed without panicking.
    fn publish(&self, topic: EventTopic, event: &TransactionEvent) -> usize;

    /// Get the total number of events published.
    fn events_published(&self) -> u64;
}

struct Registration {
    id: SubscriptionId,
    topic: EventTopic,
    handler: EventHandler,
}

pub(crate) struct BusInner {
    handlers: RwLock<Vec<Registration>>,
    next_id: AtomicU64,
    events_published: AtomicU64,
    handler_panics: AtomicU64,
}

impl BusInner {
    pub(crate) fn remove(&self, id: SubscriptionId) -> bool {
        let mut handlers = self.handlers.write();
        let before = handlers.len();
        handlers.retain(|r| r.id != id);
        handlers.len() != before
    }
}

/// In-memory observer list.
///
/// Cloning is cheap and yields a handle to the same bus, so the dispatcher
/// and its confirmation tasks publish to one set of observers.
#[derive(Clone)]
pub struct NotificationBus {
    inner: Arc<BusInner>,
}

impl NotificationBus {
    /// Create an empty bus.
    #[must_use]
    pub fn new() -> Self {
        Self {
            inner: Arc::new(BusInner {
                handlers: RwLock::new(Vec::new()),
                next_id: AtomicU64::new(1),
                events_published: AtomicU64::new(0),
                handler_panics: AtomicU64::new(0),
            }),
        }
    }

    /// Register a handler for one topic.
    ///
    /// The handler stays registered until `unsubscribe` is called with the
    /// returned id.
    pub fn subscribe<F>(&self, topic: EventTopic, handler: F) -> SubscriptionId
    where
        F: Fn(&TransactionEvent) + Send + Sync + 'static,
    {
        self.register(topic, Arc::new(handler))
    }

    /// Register a handler that is removed when the returned guard drops.
    #[must_use]
    pub fn subscribe_scoped<F>(&self, topic: EventTopic, handler: F) -> Subscription
    where
        F: Fn(&TransactionEvent) + Send + Sync + 'static,
    {
        let id = self.subscribe(topic, handler);
        Subscription::new(id, topic, Arc::downgrade(&self.inner))
    }

    /// Get an async stream of events matching a filter.
    ///
    /// Events are forwarded into an unbounded channel, so the stream never
    /// applies backpressure to the publisher.
    #[must_use]
    pub fn event_stream(&self, filter: EventFilter) -> EventStream {
        let (tx, rx) = mpsc::unbounded_channel();
        let topics = if filter.topics.is_empty() {
            vec![EventTopic::Transaction, EventTopic::TransactionError]
        } else {
            filter.topics.clone()
        };

        let ids = topics
            .into_iter()
            .map(|topic| {
                let tx = tx.clone();
                self.subscribe(topic, move |event| {
                    // Receiver gone means the stream was dropped mid-publish.
                    let _ = tx.send((topic, event.clone()));
                })
            })
            .collect();

        EventStream::new(rx, filter, ids, Arc::downgrade(&self.inner))
    }

    /// Remove a handler. Returns false if it was not registered.
    pub fn unsubscribe(&self, id: SubscriptionId) -> bool {
        let removed = self.inner.remove(id);
        if removed {
            debug!(subscription = %id, "Subscription removed");
        }
        removed
    }

    /// Get the number of registered handlers.
    #[must_use]
    pub fn subscriber_count(&self) -> usize {
        self.inner.handlers.read().len()
    }

    /// Number of handler invocations that panicked.
    #[must_use]
    pub fn handler_panics(&self) -> u64 {
        self.inner.handler_panics.load(Ordering::Relaxed)
    }

    fn register(&self, topic: EventTopic, handler: EventHandler) -> SubscriptionId {
        let id = SubscriptionId(self.inner.next_id.fetch_add(1, Ordering::Relaxed));
        self.inner.handlers.write().push(Registration { id, topic, handler });
        debug!(topic = topic.as_str(), subscription = %id, "New subscription created");
        id
    }
}

impl Default for NotificationBus {
    fn default() -> Self {
        Self::new()
    }
}

impl EventPublisher for NotificationBus {
    fn publish(&self, topic: EventTopic, event: &TransactionEvent) -> usize {
        self.inner.events_published.fetch_add(1, Ordering::Relaxed);

        // Snapshot so handlers may subscribe or unsubscribe while running.
        let handlers: Vec<EventHandler> = self
            .inner
            .handlers
            .read()
            .iter()
            .filter(|r| r.topic == topic)
            .map(|r| Arc::clone(&r.handler))
            .collect();

        let mut delivered = 0;
        for handler in handlers {
            match catch_unwind(AssertUnwindSafe(|| handler(event))) {
                Ok(()) => delivered += 1,
                Err(_) => {
                    self.inner.handler_panics.fetch_add(1, Ordering::Relaxed);
                    warn!(
                        topic = topic.as_str(),
                        tx_id = %event.id,
                        "Event handler panicked, continuing with remaining handlers"
                    );
                }
            }
        }

        debug!(
            topic = topic.as_str(),
            tx_id = %event.id,
            status = %event.status,
            receivers = delivered,
            "Event published"
        );
        delivered
    }

    fn events_published(&self) -> u64 {
        self.inner.events_published.load(Ordering::Relaxed)
    }
}
