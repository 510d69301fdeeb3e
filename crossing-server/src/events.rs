//! In-process topic carrying transition events to the notifier.
//!
//! Publishing hands the event to a bounded channel; a single consumer task
//! drains it and invokes the registered [`TransitionHandler`]. When the
//! handler fails, the same event is redelivered with backoff until it
//! succeeds or the delivery policy gives up, so handlers see every event
//! at least once and must tolerate duplicates.

use std::sync::Arc;
use std::time::Duration;

use async_trait::async_trait;
use tokio::sync::mpsc;
use tracing::{debug, error, warn};

use crate::domain::TransitionEvent;

/// Default channel capacity.
pub const DEFAULT_CAPACITY: usize = 256;

/// Errors from publishing an event.
#[derive(Debug, thiserror::Error)]
pub enum PublishError {
    /// The consumer side has shut down
    #[error("transition topic is closed")]
    Closed,
}

/// Accepts transition events for delivery.
#[async_trait]
pub trait TransitionPublisher: Send + Sync {
    async fn publish(&self, event: TransitionEvent) -> Result<(), PublishError>;
}

/// Error type returned by handlers.
pub type HandlerError = Box<dyn std::error::Error + Send + Sync>;

/// Consumes transition events.
#[async_trait]
pub trait TransitionHandler: Send + Sync {
    async fn handle(&self, event: &TransitionEvent) -> Result<(), HandlerError>;
}

/// Redelivery settings for failed handler calls.
#[derive(Debug, Clone)]
pub struct DeliveryPolicy {
    /// Total attempts per event, including the first
    pub max_attempts: u32,
    /// Delay before the first retry; doubles after each failure
    pub initial_backoff: Duration,
}

impl Default for DeliveryPolicy {
    fn default() -> Self {
        Self {
            max_attempts: 5,
            initial_backoff: Duration::from_secs(1),
        }
    }
}

/// Create a connected publisher/consumer pair.
pub fn topic(capacity: usize) -> (TopicPublisher, TopicConsumer) {
    let (tx, rx) = mpsc::channel(capacity);
    (TopicPublisher { tx }, TopicConsumer { rx })
}

/// Publishing side of the topic. Cheap to clone.
#[derive(Debug, Clone)]
pub struct TopicPublisher {
    tx: mpsc::Sender<TransitionEvent>,
}

#[async_trait]
impl TransitionPublisher for TopicPublisher {
    async fn publish(&self, event: TransitionEvent) -> Result<(), PublishError> {
        self.tx.send(event).await.map_err(|_| PublishError::Closed)
    }
}

/// Consuming side of the topic.
#[derive(Debug)]
pub struct TopicConsumer {
    rx: mpsc::Receiver<TransitionEvent>,
}

impl TopicConsumer {
    /// Deliver events to `handler` until every publisher is dropped.
    pub async fn run(mut self, handler: Arc<dyn TransitionHandler>, policy: DeliveryPolicy) {
        while let Some(event) = self.rx.recv().await {
            deliver(handler.as_ref(), &event, &policy).await;
        }
        debug!("transition topic closed");
    }
}

async fn deliver(handler: &dyn TransitionHandler, event: &TransitionEvent, policy: &DeliveryPolicy) {
    let mut backoff = policy.initial_backoff;

    for attempt in 1..=policy.max_attempts {
        match handler.handle(event).await {
            Ok(()) => return,
            Err(e) if attempt < policy.max_attempts => {
                warn!(
                    crossing = %event.crossing.name,
                    attempt,
                    error = %e,
                    "transition handler failed, redelivering"
                );
                tokio::time::sleep(backoff).await;
                backoff *= 2;
            }
            Err(e) => {
                error!(
                    crossing = %event.crossing.name,
                    attempts = policy.max_attempts,
                    error = %e,
                    "transition dropped after repeated handler failures"
                );
            }
        }
    }
}
