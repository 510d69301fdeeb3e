//! Per-crossing transition detection.

use std::sync::Arc;

use chrono::Utc;
use tracing::{debug, info, warn};

use crate::domain::{Check, CrossingSnapshot, TransitionEvent, is_open};
use crate::events::TransitionPublisher;
use crate::store::{CrossingStore, find_or_insert_crossing};

use super::CheckError;

/// Result of evaluating one crossing.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Outcome {
    /// Openness matches the last recorded check
    Unchanged,
    /// Openness changed; a check was recorded and an event published
    Transitioned { open: bool },
}

/// Compares a crossing's current status with its last recorded check.
#[derive(Clone)]
pub struct TransitionEvaluator {
    store: Arc<dyn CrossingStore>,
    publisher: Arc<dyn TransitionPublisher>,
}

impl TransitionEvaluator {
    pub fn new(store: Arc<dyn CrossingStore>, publisher: Arc<dyn TransitionPublisher>) -> Self {
        Self { store, publisher }
    }

    /// Evaluate one crossing snapshot.
    ///
    /// A crossing with no recorded check counts as previously open. On a
    /// transition the new check is written before the event is published;
    /// if publishing fails the check stays, so the next cycle compares
    /// against it and only this one notification is lost.
    pub async fn evaluate(&self, snapshot: &CrossingSnapshot) -> Result<Outcome, CheckError> {
        let latest = self.store.latest_check(&snapshot.name).await?;
        let was_open = match &latest {
            None => true,
            Some(check) => is_open(&check.status),
        };
        let previous = latest.map(|check| check.status).unwrap_or_default();
        let now_open = is_open(&snapshot.status);

        if was_open == now_open {
            return Ok(Outcome::Unchanged);
        }

        let crossing = find_or_insert_crossing(self.store.as_ref(), snapshot).await?;
        self.store
            .insert_check(&Check {
                crossing_id: crossing.id,
                status: snapshot.status.clone(),
                checked_at: Utc::now(),
            })
            .await?;

        let subscribers = self.store.subscribers(crossing.id).await?;
        debug!(
            crossing = %crossing.name,
            previous = %previous,
            current = %snapshot.status,
            subscribers = subscribers.len(),
            "crossing status changed"
        );

        let event = TransitionEvent {
            crossing,
            subscribers,
            open: now_open,
        };
        let name = event.crossing.name.clone();

        if let Err(e) = self.publisher.publish(event).await {
            warn!(
                crossing = %name,
                open = now_open,
                error = %e,
                "check recorded but transition not published; notification lost"
            );
            return Err(e.into());
        }

        info!(crossing = %name, open = now_open, "crossing transition published");
        Ok(Outcome::Transitioned { open: now_open })
    }
}
