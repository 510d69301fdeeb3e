//! Persistence for crossings, checks and subscriptions.
//!
//! The watcher only issues logical queries through [`CrossingStore`];
//! transaction boundaries belong to the implementation. Two backends:
//!
//! - [`PgStore`]: PostgreSQL via SQLx, used when `DATABASE_URL` is set.
//! - [`MemoryStore`]: in-process tables for development and tests. State
//!   does not survive restarts.

mod error;
mod memory;
mod postgres;

use async_trait::async_trait;

use crate::domain::{Check, Crossing, CrossingId, CrossingSnapshot, PhoneNumber, Subscription};

pub use error::StorageError;
pub use memory::MemoryStore;
pub use postgres::PgStore;

/// Logical queries issued by the check pipeline and the web layer.
#[async_trait]
pub trait CrossingStore: Send + Sync {
    /// Look up a crossing by its name.
    async fn find_crossing(&self, name: &str) -> Result<Option<Crossing>, StorageError>;

    /// Insert a crossing first seen in the feed.
    ///
    /// Fails with [`StorageError::Conflict`] if the name is already stored.
    async fn insert_crossing(&self, snapshot: &CrossingSnapshot) -> Result<Crossing, StorageError>;

    /// All stored crossings, ordered by id ascending.
    async fn list_crossings(&self) -> Result<Vec<Crossing>, StorageError>;

    async fn crossing_exists(&self, id: CrossingId) -> Result<bool, StorageError>;

    /// Most recent check for the named crossing, if any.
    ///
    /// Ties on `checked_at` go to the check inserted last.
    async fn latest_check(&self, name: &str) -> Result<Option<Check>, StorageError>;

    async fn insert_check(&self, check: &Check) -> Result<(), StorageError>;

    /// Phone numbers subscribed to a crossing.
    async fn subscribers(&self, id: CrossingId) -> Result<Vec<PhoneNumber>, StorageError>;

    /// Record a subscription. Subscribing the same number twice is a no-op.
    async fn insert_subscription(&self, subscription: &Subscription) -> Result<(), StorageError>;
}

/// Find a crossing by name, inserting it if this is its first sighting.
pub async fn find_or_insert_crossing(
    store: &dyn CrossingStore,
    snapshot: &CrossingSnapshot,
) -> Result<Crossing, StorageError> {
    if let Some(crossing) = store.find_crossing(&snapshot.name).await? {
        return Ok(crossing);
    }

    match store.insert_crossing(snapshot).await {
        Ok(crossing) => Ok(crossing),
        // Inserted concurrently by the registry refresh.
        Err(StorageError::Conflict { .. }) => store
            .find_crossing(&snapshot.name)
            .await?
            .ok_or_else(|| StorageError::NotFound {
                what: format!("crossing {}", snapshot.name),
            }),
        Err(e) => Err(e),
    }
}
