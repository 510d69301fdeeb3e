//! Fixed feed for development and tests.
//!
//! Serves a feed document loaded from disk or built in code, so the
//! watcher can run without reaching the live provider.

use std::path::Path;
use std::sync::Arc;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::time::Duration;

use async_trait::async_trait;
use tokio::sync::RwLock;

use crate::domain::CrossingSnapshot;

use super::error::FeedError;
use super::types::FeedEnvelope;
use super::CrossingFeed;

/// Feed that returns a stored document.
///
/// Statuses can be changed between fetches with [`StaticFeed::set_status`]
/// to simulate crossings opening and closing.
#[derive(Clone, Default)]
pub struct StaticFeed {
    envelope: Arc<RwLock<FeedEnvelope>>,
    delay: Duration,
    fetches: Arc<AtomicUsize>,
    completed: Arc<AtomicUsize>,
}

impl StaticFeed {
    pub fn new(envelope: FeedEnvelope) -> Self {
        Self {
            envelope: Arc::new(RwLock::new(envelope)),
            ..Self::default()
        }
    }

    /// Build a feed from crossing snapshots.
    pub fn from_crossings(crossings: Vec<CrossingSnapshot>) -> Self {
        Self::new(FeedEnvelope {
            update_timestamp: String::new(),
            crossings,
        })
    }

    /// Load a feed document from a JSON file.
    pub fn from_file(path: impl AsRef<Path>) -> Result<Self, FeedError> {
        let path = path.as_ref();
        let json = std::fs::read_to_string(path).map_err(|source| FeedError::Unreadable {
            path: path.to_path_buf(),
            source,
        })?;

        let envelope: FeedEnvelope = serde_json::from_str(&json).map_err(|e| FeedError::Decode {
            message: format!("failed to parse {}: {e}", path.display()),
            body: None,
        })?;

        Ok(Self::new(envelope))
    }

    /// Delay every fetch, to simulate a slow provider.
    pub fn with_delay(mut self, delay: Duration) -> Self {
        self.delay = delay;
        self
    }

    /// Change the status reported for the named crossing.
    ///
    /// Returns false if the feed has no crossing with that name.
    pub async fn set_status(&self, name: &str, status: &str) -> bool {
        let mut envelope = self.envelope.write().await;
        match envelope.crossings.iter_mut().find(|c| c.name == name) {
            Some(crossing) => {
                crossing.status = status.to_string();
                true
            }
            None => false,
        }
    }

    /// Number of fetches started.
    pub fn fetch_count(&self) -> usize {
        self.fetches.load(Ordering::SeqCst)
    }

    /// Number of fetches that ran to completion.
    pub fn completed_count(&self) -> usize {
        self.completed.load(Ordering::SeqCst)
    }
}

#[async_trait]
impl CrossingFeed for StaticFeed {
    async fn fetch(&self) -> Result<FeedEnvelope, FeedError> {
        self.fetches.fetch_add(1, Ordering::SeqCst);

        if !self.delay.is_zero() {
            tokio::time::sleep(self.delay).await;
        }

        let envelope = self.envelope.read().await.clone();
        self.completed.fetch_add(1, Ordering::SeqCst);
        Ok(envelope)
    }
}
