//! # Event Subscriber
//!
//! Defines the subscription side of the notification bus.

use crate::events::{EventFilter, EventTopic, TransactionEvent};
use crate::publisher::BusInner;
use std::fmt;
use std::pin::Pin;
use std::sync::Weak;
use std::task::{Context, Poll};
use thiserror::Error;
use tokio::sync::mpsc;
use tokio_stream::Stream;
use tracing::debug;

/// Errors from subscription operations.
#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum SubscriptionError {
    /// The bus was dropped.
    #[error("Notification bus closed")]
    Closed,
}

/// Handle identifying one registered handler.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct SubscriptionId(pub u64);

impl fmt::Display for SubscriptionId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "sub-{}", self.0)
    }
}

/// A scoped subscription.
///
/// When dropped, the handler is automatically unregistered.
pub struct Subscription {
    id: SubscriptionId,
    topic: EventTopic,
    bus: Weak<BusInner>,
}

impl Subscription {
    pub(crate) fn new(id: SubscriptionId, topic: EventTopic, bus: Weak<BusInner>) -> Self {
        Self { id, topic, bus }
    }

    pub fn id(&self) -> SubscriptionId {
        self.id
    }

    pub fn topic(&self) -> EventTopic {
        self.topic
    }
}

impl Drop for Subscription {
    fn drop(&mut self) {
        let Some(bus) = self.bus.upgrade() else {
            return;
        };
        bus.remove(self.id);
        debug!(topic = self.topic.as_str(), subscription = %self.id, "Subscription dropped");
    }
}

/// A stream of `(topic, event)` pairs.
///
/// Implements `tokio_stream::Stream` for use with stream combinators.
/// Dropping the stream unregisters its forwarding handlers.
pub struct EventStream {
    receiver: mpsc::UnboundedReceiver<(EventTopic, TransactionEvent)>,
    filter: EventFilter,
    ids: Vec<SubscriptionId>,
    bus: Weak<BusInner>,
}

impl EventStream {
    pub(crate) fn new(
        receiver: mpsc::UnboundedReceiver<(EventTopic, TransactionEvent)>,
        filter: EventFilter,
        ids: Vec<SubscriptionId>,
        bus: Weak<BusInner>,
    ) -> Self {
        Self {
            receiver,
            filter,
            ids,
            bus,
        }
    }

    /// Receive the next event.
    ///
    /// # Returns
    ///
    /// - `Some((topic, event))` - The next event
    /// - `None` - The bus was dropped
    pub async fn recv(&mut self) -> Option<(EventTopic, TransactionEvent)> {
        self.receiver.recv().await
    }

    /// Try to receive the next event without blocking.
    ///
    /// # Returns
    ///
    /// - `Ok(Some(event))` - An event was available
    /// - `Ok(None)` - No event available (would block)
    /// - `Err(SubscriptionError::Closed)` - The bus was dropped
    pub fn try_recv(&mut self) -> Result<Option<(EventTopic, TransactionEvent)>, SubscriptionError> {
        match self.receiver.try_recv() {
            Ok(item) => Ok(Some(item)),
            Err(mpsc::error::TryRecvError::Empty) => Ok(None),
            Err(mpsc::error::TryRecvError::Disconnected) => Err(SubscriptionError::Closed),
        }
    }

    /// Get the filter for this stream.
    #[must_use]
    pub fn filter(&self) -> &EventFilter {
        &self.filter
    }
}

impl Stream for EventStream {
    type Item = (EventTopic, TransactionEvent);

    fn poll_next(mut self: Pin<&mut Self>, cx: &mut Context<'_>) -> Poll<Option<Self::Item>> {
        self.receiver.poll_recv(cx)
    }
}

impl Drop for EventStream {
    fn drop(&mut self) {
        let Some(bus) = self.bus.upgrade() else {
            return;
        };
        for id in &self.ids {
            bus.remove(*id);
        }
        debug!(subscriptions = self.ids.len(), "Event stream dropped");
    }
}
