//! In-process publish/subscribe.
//!
//! Subscribers are registered at startup. Delivery is sequential in
//! registration order. A failing or panicking subscriber is logged and
//! skipped; nothing propagates back to the publisher.

use std::panic::AssertUnwindSafe;
use std::sync::{Arc, PoisonError, RwLock};

use async_trait::async_trait;
use futures::FutureExt;
use tokio::task::JoinHandle;

use super::types::{DomainEvent, Topic};

/// Error type returned by subscribers.
pub type HandlerError = Box<dyn std::error::Error + Send + Sync>;

/// Capability to emit domain events.
#[async_trait]
pub trait Publisher: Send + Sync {
    /// Delivers `event` to every subscriber of its topic.
    async fn publish(&self, event: DomainEvent);
}

/// Capability to react to domain events.
#[async_trait]
pub trait Subscriber: Send + Sync {
    /// Name used in logs.
    fn name(&self) -> &'static str;

    /// Topics this subscriber wants.
    fn topics(&self) -> &'static [Topic];

    /// Handles one event.
    async fn handle(&self, event: &DomainEvent) -> Result<(), HandlerError>;
}

/// Topic-routed event bus.
#[derive(Default)]
pub struct EventBus {
    subscribers: RwLock<Vec<Arc<dyn Subscriber>>>,
}

impl EventBus {
    /// Creates an empty bus.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Registers a subscriber.
    pub fn subscribe(&self, subscriber: Arc<dyn Subscriber>) {
        tracing::debug!(
            subscriber = subscriber.name(),
            topics = ?subscriber.topics(),
            "Registering event subscriber"
        );
        self.subscribers
            .write()
            .unwrap_or_else(PoisonError::into_inner)
            .push(subscriber);
    }

    /// Number of subscribers registered for `topic`.
    #[must_use]
    pub fn subscriber_count(&self, topic: Topic) -> usize {
        self.subscribers_for(topic).len()
    }

    /// Delivers `event` on a background task and returns immediately.
    pub fn dispatch(self: &Arc<Self>, event: DomainEvent) -> JoinHandle<()> {
        let bus = Arc::clone(self);
        tokio::spawn(async move { bus.deliver(event).await })
    }

    fn subscribers_for(&self, topic: Topic) -> Vec<Arc<dyn Subscriber>> {
        self.subscribers
            .read()
            .unwrap_or_else(PoisonError::into_inner)
            .iter()
            .filter(|s| s.topics().contains(&topic))
            .cloned()
            .collect()
    }

    async fn deliver(&self, event: DomainEvent) {
        let topic = event.topic();
        let subscribers = self.subscribers_for(topic);
        tracing::debug!(%topic, subscribers = subscribers.len(), "Publishing event");

        for subscriber in subscribers {
            let outcome = AssertUnwindSafe(subscriber.handle(&event))
                .catch_unwind()
                .await;
            match outcome {
                Ok(Ok(())) => {}
                Ok(Err(error)) => {
                    tracing::error!(
                        %topic,
                        subscriber = subscriber.name(),
                        error = %error,
                        "Event subscriber failed"
                    );
                }
                Err(_) => {
                    tracing::error!(
                        %topic,
                        subscriber = subscriber.name(),
                        "Event subscriber panicked"
                    );
                }
            }
        }
    }
}

#[async_trait]
impl Publisher for EventBus {
    async fn publish(&self, event: DomainEvent) {
        self.deliver(event).await;
    }
}

/// Publisher that drops every event. Useful when a component is used alone.
#[derive(Debug, Default, Clone, Copy)]
pub struct NoopPublisher;

#[async_trait]
impl Publisher for NoopPublisher {
    async fn publish(&self, _event: DomainEvent) {}
}
