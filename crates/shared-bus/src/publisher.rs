//! # Event Publisher
//!
//! Publishing side of the bus. An event is only sent when at least one live
//! subscription accepts it; otherwise it is counted as unheard and dropped.

use crate::events::{EventFilter, PeerEvent};
use crate::subscriber::{EventStream, Interest, Subscription};
use crate::DEFAULT_CHANNEL_CAPACITY;
use async_trait::async_trait;
use parking_lot::Mutex;
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::Arc;
use tokio::sync::broadcast;
use tracing::trace;

/// Sink for peer events.
#[async_trait]
pub trait EventPublisher: Send + Sync {
    /// Publish `event`.
    ///
    /// Returns how many live subscriptions accept it. Zero means the event
    /// was dropped.
    async fn publish(&self, event: PeerEvent) -> usize;
}

/// Publish counters of a bus.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct BusStats {
    /// Events handed to at least one subscription.
    pub delivered: u64,
    /// Events no subscription wanted.
    pub unheard: u64,
}

/// In-process bus over a `tokio::sync::broadcast` channel.
pub struct InMemoryEventBus {
    sender: broadcast::Sender<PeerEvent>,
    interest: Arc<Mutex<Interest>>,
    delivered: AtomicU64,
    unheard: AtomicU64,
}

impl InMemoryEventBus {
    #[must_use]
    pub fn new() -> Self {
        Self::with_capacity(DEFAULT_CHANNEL_CAPACITY)
    }

    /// Bus whose subscribers may fall `capacity` events behind before
    /// skipping.
    #[must_use]
    pub fn with_capacity(capacity: usize) -> Self {
        let (sender, _) = broadcast::channel(capacity.max(1));
        Self {
            sender,
            interest: Arc::new(Mutex::new(Interest::default())),
            delivered: AtomicU64::new(0),
            unheard: AtomicU64::new(0),
        }
    }

    #[must_use]
    pub fn subscribe(&self, filter: EventFilter) -> Subscription {
        Subscription::new(self.sender.subscribe(), filter, &self.interest)
    }

    #[must_use]
    pub fn event_stream(&self, filter: EventFilter) -> EventStream {
        EventStream::new(self.sender.subscribe(), filter, &self.interest)
    }

    /// Live subscriptions and streams.
    #[must_use]
    pub fn subscriber_count(&self) -> usize {
        self.interest.lock().len()
    }

    #[must_use]
    pub fn stats(&self) -> BusStats {
        BusStats {
            delivered: self.delivered.load(Ordering::Relaxed),
            unheard: self.unheard.load(Ordering::Relaxed),
        }
    }
}

impl Default for InMemoryEventBus {
    fn default() -> Self {
        Self::new()
    }
}

#[async_trait]
impl EventPublisher for InMemoryEventBus {
    async fn publish(&self, event: PeerEvent) -> usize {
        let topic = event.topic();
        // Matching and sending happen under one lock.
        let interested = {
            let interest = self.interest.lock();
            let interested = interest.matching(&event);
            if interested > 0 {
                let _ = self.sender.send(event);
            }
            interested
        };

        if interested == 0 {
            self.unheard.fetch_add(1, Ordering::Relaxed);
            trace!(?topic, "No subscription for event, dropped");
        } else {
            self.delivered.fetch_add(1, Ordering::Relaxed);
            trace!(?topic, interested, "Event published");
        }
        interested
    }
}
