//! The status-check pipeline.
//!
//! A check cycle fetches the feed, evaluates every crossing against its
//! last recorded check, and publishes a transition event for each crossing
//! whose openness changed. The whole cycle shares one deadline, and
//! evaluations run concurrently up to a fixed ceiling.
//!
//! A cycle either succeeds for every crossing or fails with the first
//! error; there are no retries within a cycle. The next scheduled cycle is
//! the retry, and since it compares against whatever was recorded, a failed
//! cycle never causes a false transition later.

mod config;
mod error;
mod evaluator;

#[cfg(test)]
mod cycle_tests;

use std::sync::Arc;
use std::sync::atomic::{AtomicUsize, Ordering};

use chrono::Utc;
use futures::{TryStreamExt, stream};
use tokio::time::Instant;
use tracing::{debug, error, info};

use crate::domain::{Check, CrossingSnapshot};
use crate::events::TransitionPublisher;
use crate::feed::{CrossingFeed, fetch_before};
use crate::store::{CrossingStore, StorageError};

pub use config::{CycleConfig, DEFAULT_DEADLINE, DEFAULT_MAX_CONCURRENT};
pub use error::CheckError;
pub use evaluator::{Outcome, TransitionEvaluator};

/// Summary of a successful check cycle.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CycleReport {
    /// Crossings evaluated
    pub evaluated: usize,
    /// Crossings whose openness changed
    pub transitions: usize,
    /// Provider's timestamp for the evaluated snapshot
    pub update_timestamp: String,
}

/// Entry point for the two scheduled operations.
#[derive(Clone)]
pub struct CheckCycle {
    feed: Arc<dyn CrossingFeed>,
    store: Arc<dyn CrossingStore>,
    evaluator: TransitionEvaluator,
    config: CycleConfig,
}

impl CheckCycle {
    pub fn new(
        feed: Arc<dyn CrossingFeed>,
        store: Arc<dyn CrossingStore>,
        publisher: Arc<dyn TransitionPublisher>,
        config: CycleConfig,
    ) -> Self {
        let evaluator = TransitionEvaluator::new(store.clone(), publisher);
        Self {
            feed,
            store,
            evaluator,
            config,
        }
    }

    /// Run one check cycle.
    ///
    /// Feed failures abort before any crossing is evaluated. The first
    /// evaluation to fail cancels those still running and stops new ones
    /// from starting; the same happens when the deadline passes.
    pub async fn run(&self) -> Result<CycleReport, CheckError> {
        let started = Instant::now();
        let deadline = started + self.config.deadline;

        let envelope = fetch_before(self.feed.as_ref(), deadline).await?;
        info!(
            count = envelope.crossings.len(),
            latency_ms = started.elapsed().as_millis() as u64,
            "crossings retrieved"
        );

        let transitions = AtomicUsize::new(0);
        let evaluations = stream::iter(envelope.crossings.iter().map(Ok::<_, CheckError>))
            .try_for_each_concurrent(self.config.max_concurrent, |snapshot| {
                let transitions = &transitions;
                async move {
                    if let Outcome::Transitioned { .. } = self.evaluator.evaluate(snapshot).await? {
                        transitions.fetch_add(1, Ordering::Relaxed);
                    }
                    Ok(())
                }
            });

        match tokio::time::timeout_at(deadline, evaluations).await {
            Ok(result) => result?,
            Err(_) => return Err(CheckError::DeadlineExceeded(self.config.deadline)),
        }

        let report = CycleReport {
            evaluated: envelope.crossings.len(),
            transitions: transitions.into_inner(),
            update_timestamp: envelope.update_timestamp,
        };
        info!(
            evaluated = report.evaluated,
            transitions = report.transitions,
            elapsed_ms = started.elapsed().as_millis() as u64,
            "check cycle complete"
        );
        Ok(report)
    }

    /// Register crossings not yet known to the store.
    ///
    /// Each new crossing is stored with an initial check holding its
    /// current status, which becomes the baseline for later cycles. A
    /// failure to register one crossing is logged and does not stop the
    /// others. Returns the number of crossings added.
    pub async fn refresh_crossings(&self) -> Result<usize, CheckError> {
        let deadline = Instant::now() + self.config.deadline;
        let envelope = fetch_before(self.feed.as_ref(), deadline).await?;
        debug!(count = envelope.crossings.len(), "crossings retrieved for refresh");

        let mut added = 0;
        for snapshot in &envelope.crossings {
            match self.register(snapshot).await {
                Ok(true) => added += 1,
                Ok(false) => {}
                Err(e) => {
                    error!(crossing_name = %snapshot.name, error = %e, "failed to add crossing");
                }
            }
        }

        info!(added, known = envelope.crossings.len(), "crossing registry refreshed");
        Ok(added)
    }

    /// Insert a crossing and its initial check if absent. A known crossing
    /// that has no check yet gets its initial check. Returns whether the
    /// crossing was inserted.
    async fn register(&self, snapshot: &CrossingSnapshot) -> Result<bool, StorageError> {
        let (crossing, inserted) = match self.store.find_crossing(&snapshot.name).await? {
            Some(crossing) => {
                if self.store.latest_check(&snapshot.name).await?.is_some() {
                    return Ok(false);
                }
                debug!(crossing_name = %crossing.name, "recording missing initial check");
                (crossing, false)
            }
            None => match self.store.insert_crossing(snapshot).await {
                Ok(crossing) => (crossing, true),
                Err(StorageError::Conflict { .. }) => return Ok(false),
                Err(e) => return Err(e),
            },
        };

        self.store
            .insert_check(&Check {
                crossing_id: crossing.id,
                status: snapshot.status.clone(),
                checked_at: Utc::now(),
            })
            .await?;

        Ok(inserted)
    }
}
