//! In-process event bus for pub/sub between pipeline steps and consumers.

use std::collections::HashMap;
use std::sync::atomic::{AtomicBool, AtomicU64, Ordering};

use async_trait::async_trait;
use tokio::sync::{RwLock, broadcast};
use tracing::debug;

use crate::envelope::EventEnvelope;
use crate::error::{Error, Result};
use crate::publisher::EventPublisher;

/// Default broadcast channel capacity.
const DEFAULT_CHANNEL_CAPACITY: usize = 1000;

/// An envelope together with the subject it was published to.
#[derive(Debug, Clone)]
pub struct Delivery {
    pub subject: String,
    pub envelope: EventEnvelope,
}

/// Pattern for filtering subjects.
#[derive(Debug, Clone)]
pub enum SubjectPattern {
    /// Match every subject.
    All,
    /// Match one subject exactly.
    Exact(String),
    /// Match subjects starting with a prefix, e.g. `cluster.`.
    Prefix(String),
}

impl SubjectPattern {
    /// Check if a subject matches this pattern.
    pub fn matches(&self, subject: &str) -> bool {
        match self {
            Self::All => true,
            Self::Exact(s) => subject == s.as_str(),
            Self::Prefix(p) => subject.starts_with(p.as_str()),
        }
    }
}

/// Subscription handle for receiving deliveries.
pub struct EventSubscription {
    receiver: broadcast::Receiver<Delivery>,
}

impl EventSubscription {
    /// Receive the next delivery.
    ///
    /// # Errors
    ///
    /// Returns [`Error::ChannelClosed`] once the bus is gone and
    /// [`Error::Lagged`] if this subscriber fell behind.
    pub async fn recv(&mut self) -> Result<Delivery> {
        self.receiver.recv().await.map_err(|e| match e {
            broadcast::error::RecvError::Closed => Error::ChannelClosed,
            broadcast::error::RecvError::Lagged(skipped) => Error::Lagged { skipped },
        })
    }

    /// Try to receive a delivery without waiting. `Ok(None)` means nothing
    /// is pending yet.
    ///
    /// # Errors
    ///
    /// Returns [`Error::ChannelClosed`] once the bus is gone and
    /// [`Error::Lagged`] if this subscriber fell behind.
    pub fn try_recv(&mut self) -> Result<Option<Delivery>> {
        match self.receiver.try_recv() {
            Ok(delivery) => Ok(Some(delivery)),
            Err(broadcast::error::TryRecvError::Empty) => Ok(None),
            Err(broadcast::error::TryRecvError::Closed) => Err(Error::ChannelClosed),
            Err(broadcast::error::TryRecvError::Lagged(skipped)) => Err(Error::Lagged { skipped }),
        }
    }
}

struct Subscriber {
    sender: broadcast::Sender<Delivery>,
    pattern: SubjectPattern,
}

/// Event bus for publishing and subscribing by subject.
///
/// Publishing to a subject with no subscribers succeeds; the bus does not
/// retain envelopes for late subscribers.
pub struct EventBus {
    /// Broadcast sender for all deliveries.
    broadcast: broadcast::Sender<Delivery>,
    /// Pattern-based subscribers.
    subscribers: RwLock<HashMap<String, Subscriber>>,
    next_id: AtomicU64,
    published: AtomicU64,
    closed: AtomicBool,
    channel_capacity: usize,
}

impl EventBus {
    /// Create a new event bus with the default channel capacity.
    pub fn new() -> Self {
        EventBusBuilder::new().build()
    }

    /// Subscribe to every subject.
    pub fn subscribe(&self) -> EventSubscription {
        EventSubscription {
            receiver: self.broadcast.subscribe(),
        }
    }

    /// Subscribe to subjects matching a pattern.
    pub async fn subscribe_with_pattern(
        &self,
        pattern: SubjectPattern,
    ) -> (String, EventSubscription) {
        let (sender, receiver) = broadcast::channel(self.channel_capacity);
        let id = format!("sub_{}", self.next_id.fetch_add(1, Ordering::Relaxed));

        let mut subscribers = self.subscribers.write().await;
        subscribers.insert(id.clone(), Subscriber { sender, pattern });

        (id, EventSubscription { receiver })
    }

    /// Shorthand for an exact-subject subscription.
    pub async fn subscribe_subject(&self, subject: impl Into<String>) -> EventSubscription {
        self.subscribe_with_pattern(SubjectPattern::Exact(subject.into()))
            .await
            .1
    }

    /// Unsubscribe a pattern-based subscriber.
    pub async fn unsubscribe(&self, subscriber_id: &str) {
        let mut subscribers = self.subscribers.write().await;
        subscribers.remove(subscriber_id);
    }

    /// Stop accepting envelopes. Later publishes fail with
    /// [`Error::ChannelClosed`].
    pub fn close(&self) {
        self.closed.store(true, Ordering::Release);
    }

    /// Whether [`close`](Self::close) has been called.
    pub fn is_closed(&self) -> bool {
        self.closed.load(Ordering::Acquire)
    }

    /// Number of envelopes accepted since creation.
    pub fn published_count(&self) -> u64 {
        self.published.load(Ordering::Relaxed)
    }
}

impl Default for EventBus {
    fn default() -> Self {
        Self::new()
    }
}

#[async_trait]
impl EventPublisher for EventBus {
    async fn publish(&self, subject: &str, envelope: EventEnvelope) -> Result<()> {
        if self.is_closed() {
            return Err(Error::ChannelClosed);
        }

        debug!(
            subject,
            event_id = %envelope.id(),
            event_type = %envelope.event_type(),
            "Publishing envelope"
        );

        let delivery = Delivery {
            subject: subject.to_string(),
            envelope,
        };

        // No receivers is not an error.
        let _ = self.broadcast.send(delivery.clone());

        let subscribers = self.subscribers.read().await;
        for (id, sub) in subscribers
            .iter()
            .filter(|(_, sub)| sub.pattern.matches(subject))
        {
            if sub.sender.send(delivery.clone()).is_err() {
                debug!(subscriber = %id, subject, "Subscriber dropped its receiver");
            }
        }

        self.published.fetch_add(1, Ordering::Relaxed);
        Ok(())
    }
}

/// Builder for [`EventBus`].
pub struct EventBusBuilder {
    channel_capacity: usize,
}

impl EventBusBuilder {
    /// Create a new builder.
    pub const fn new() -> Self {
        Self {
            channel_capacity: DEFAULT_CHANNEL_CAPACITY,
        }
    }

    /// Set the broadcast channel capacity. Zero is raised to one.
    #[must_use]
    pub fn with_channel_capacity(mut self, capacity: usize) -> Self {
        self.channel_capacity = capacity.max(1);
        self
    }

    /// Build the event bus.
    pub fn build(self) -> EventBus {
        let (broadcast, _) = broadcast::channel(self.channel_capacity);

        EventBus {
            broadcast,
            subscribers: RwLock::new(HashMap::new()),
            next_id: AtomicU64::new(0),
            published: AtomicU64::new(0),
            closed: AtomicBool::new(false),
            channel_capacity: self.channel_capacity,
        }
    }
}

impl Default for EventBusBuilder {
    fn default() -> Self {
        Self::new()
    }
}
