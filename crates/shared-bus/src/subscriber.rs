//! # Subscriptions
//!
//! Every live subscription registers its filter with the bus, so a publisher
//! knows how many consumers want an event before sending it. Registrations
//! are removed when the handle drops.

use crate::events::{EventFilter, PeerEvent};
use parking_lot::Mutex;
use std::collections::HashMap;
use std::pin::Pin;
use std::sync::Arc;
use std::task::{ready, Context, Poll};
use tokio::sync::broadcast;
use tokio_stream::wrappers::errors::BroadcastStreamRecvError;
use tokio_stream::wrappers::BroadcastStream;
use tokio_stream::Stream;
use tracing::{trace, warn};

/// Filters of the live subscriptions, by registration id.
#[derive(Default)]
pub(crate) struct Interest {
    next_id: u64,
    filters: HashMap<u64, EventFilter>,
}

impl Interest {
    /// Live subscriptions that would accept `event`.
    pub(crate) fn matching(&self, event: &PeerEvent) -> usize {
        self.filters.values().filter(|f| f.matches(event)).count()
    }

    pub(crate) fn len(&self) -> usize {
        self.filters.len()
    }
}

/// A filter's entry in the bus interest table.
struct Registration {
    id: u64,
    interest: Arc<Mutex<Interest>>,
}

impl Registration {
    fn new(interest: &Arc<Mutex<Interest>>, filter: EventFilter) -> Self {
        let mut table = interest.lock();
        let id = table.next_id;
        table.next_id += 1;
        table.filters.insert(id, filter);
        Self {
            id,
            interest: Arc::clone(interest),
        }
    }
}

impl Drop for Registration {
    fn drop(&mut self) {
        self.interest.lock().filters.remove(&self.id);
        trace!(registration = self.id, "Subscription closed");
    }
}

/// Filtered receiver for bus events.
pub struct Subscription {
    receiver: broadcast::Receiver<PeerEvent>,
    filter: EventFilter,
    _registration: Registration,
}

impl Subscription {
    pub(crate) fn new(
        receiver: broadcast::Receiver<PeerEvent>,
        filter: EventFilter,
        interest: &Arc<Mutex<Interest>>,
    ) -> Self {
        Self {
            receiver,
            _registration: Registration::new(interest, filter.clone()),
            filter,
        }
    }

    /// Next event accepted by the filter. `None` once the bus is gone.
    ///
    /// A subscriber that falls more than the channel capacity behind skips
    /// the events it missed.
    pub async fn recv(&mut self) -> Option<PeerEvent> {
        loop {
            match self.receiver.recv().await {
                Ok(event) if self.filter.matches(&event) => return Some(event),
                Ok(_) => {}
                Err(broadcast::error::RecvError::Lagged(missed)) => {
                    warn!(missed, "Bus subscriber fell behind, events skipped");
                }
                Err(broadcast::error::RecvError::Closed) => return None,
            }
        }
    }

    #[must_use]
    pub fn filter(&self) -> &EventFilter {
        &self.filter
    }
}

/// [`Stream`] flavour of [`Subscription`].
pub struct EventStream {
    inner: BroadcastStream<PeerEvent>,
    filter: EventFilter,
    _registration: Registration,
}

impl EventStream {
    pub(crate) fn new(
        receiver: broadcast::Receiver<PeerEvent>,
        filter: EventFilter,
        interest: &Arc<Mutex<Interest>>,
    ) -> Self {
        Self {
            inner: BroadcastStream::new(receiver),
            _registration: Registration::new(interest, filter.clone()),
            filter,
        }
    }
}

impl Stream for EventStream {
    type Item = PeerEvent;

    fn poll_next(mut self: Pin<&mut Self>, cx: &mut Context<'_>) -> Poll<Option<Self::Item>> {
        loop {
            match ready!(Pin::new(&mut self.inner).poll_next(cx)) {
                Some(Ok(event)) if self.filter.matches(&event) => return Poll::Ready(Some(event)),
                Some(Ok(_)) => {}
                Some(Err(BroadcastStreamRecvError::Lagged(missed))) => {
                    warn!(missed, "Bus stream fell behind, events skipped");
                }
                None => return Poll::Ready(None),
            }
        }
    }
}
