//! In-memory crossing store.

use std::sync::Arc;

use async_trait::async_trait;
use tokio::sync::RwLock;

use crate::domain::{Check, Crossing, CrossingId, CrossingSnapshot, PhoneNumber, Subscription};

use super::{CrossingStore, StorageError};

#[derive(Debug, Default)]
struct Tables {
    crossings: Vec<Crossing>,
    checks: Vec<Check>,
    subscriptions: Vec<Subscription>,
    next_id: i64,
}

impl Tables {
    fn crossing_by_name(&self, name: &str) -> Option<&Crossing> {
        self.crossings.iter().find(|c| c.name == name)
    }
}

/// Thread-safe in-memory store.
///
/// Cloning shares the same tables.
#[derive(Debug, Clone, Default)]
pub struct MemoryStore {
    tables: Arc<RwLock<Tables>>,
}

impl MemoryStore {
    pub fn new() -> Self {
        Self::default()
    }

    /// Number of checks recorded across all crossings.
    pub async fn check_count(&self) -> usize {
        self.tables.read().await.checks.len()
    }
}

#[async_trait]
impl CrossingStore for MemoryStore {
    async fn find_crossing(&self, name: &str) -> Result<Option<Crossing>, StorageError> {
        let tables = self.tables.read().await;
        Ok(tables.crossing_by_name(name).cloned())
    }

    async fn insert_crossing(&self, snapshot: &CrossingSnapshot) -> Result<Crossing, StorageError> {
        let mut tables = self.tables.write().await;
        if tables.crossing_by_name(&snapshot.name).is_some() {
            return Err(StorageError::Conflict {
                key: format!("crossing {}", snapshot.name),
            });
        }

        tables.next_id += 1;
        let crossing = Crossing {
            id: CrossingId(tables.next_id),
            name: snapshot.name.clone(),
            latitude: snapshot.latitude,
            longitude: snapshot.longitude,
        };
        tables.crossings.push(crossing.clone());
        Ok(crossing)
    }

    async fn list_crossings(&self) -> Result<Vec<Crossing>, StorageError> {
        let tables = self.tables.read().await;
        let mut crossings = tables.crossings.clone();
        crossings.sort_by_key(|c| c.id);
        Ok(crossings)
    }

    async fn crossing_exists(&self, id: CrossingId) -> Result<bool, StorageError> {
        let tables = self.tables.read().await;
        Ok(tables.crossings.iter().any(|c| c.id == id))
    }

    async fn latest_check(&self, name: &str) -> Result<Option<Check>, StorageError> {
        let tables = self.tables.read().await;
        let Some(crossing) = tables.crossing_by_name(name) else {
            return Ok(None);
        };

        // max_by_key keeps the last of equal elements, i.e. the latest insert.
        Ok(tables
            .checks
            .iter()
            .filter(|check| check.crossing_id == crossing.id)
            .max_by_key(|check| check.checked_at)
            .cloned())
    }

    async fn insert_check(&self, check: &Check) -> Result<(), StorageError> {
        let mut tables = self.tables.write().await;
        if !tables.crossings.iter().any(|c| c.id == check.crossing_id) {
            return Err(StorageError::NotFound {
                what: format!("crossing {}", check.crossing_id),
            });
        }
        tables.checks.push(check.clone());
        Ok(())
    }

    async fn subscribers(&self, id: CrossingId) -> Result<Vec<PhoneNumber>, StorageError> {
        let tables = self.tables.read().await;
        Ok(tables
            .subscriptions
            .iter()
            .filter(|s| s.crossing_id == id)
            .map(|s| s.phone_number.clone())
            .collect())
    }

    async fn insert_subscription(&self, subscription: &Subscription) -> Result<(), StorageError> {
        let mut tables = self.tables.write().await;
        if !tables.crossings.iter().any(|c| c.id == subscription.crossing_id) {
            return Err(StorageError::NotFound {
                what: format!("crossing {}", subscription.crossing_id),
            });
        }
        if !tables.subscriptions.contains(subscription) {
            tables.subscriptions.push(subscription.clone());
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use chrono::{TimeZone, Utc};

    use super::*;
    use crate::store::find_or_insert_crossing;

    fn snapshot(name: &str) -> CrossingSnapshot {
        CrossingSnapshot {
            feed_id: 99,
            name: name.to_string(),
            status: "Clear".to_string(),
            latitude: 29.6,
            longitude: -95.6,
        }
    }

    fn check(id: CrossingId, status: &str, secs: i64) -> Check {
        Check {
            crossing_id: id,
            status: status.to_string(),
            checked_at: Utc.timestamp_opt(secs, 0).unwrap(),
        }
    }

    #[tokio::test]
    async fn insert_assigns_sequential_ids() {
        let store = MemoryStore::new();
        let a = store.insert_crossing(&snapshot("Main St")).await.unwrap();
        let b = store.insert_crossing(&snapshot("Brooks St")).await.unwrap();

        assert_eq!(a.id, CrossingId(1));
        assert_eq!(b.id, CrossingId(2));

        let names: Vec<_> = store
            .list_crossings()
            .await
            .unwrap()
            .into_iter()
            .map(|c| c.name)
            .collect();
        assert_eq!(names, ["Main St", "Brooks St"]);
    }

    #[tokio::test]
    async fn duplicate_name_conflicts() {
        let store = MemoryStore::new();
        store.insert_crossing(&snapshot("Main St")).await.unwrap();

        let err = store.insert_crossing(&snapshot("Main St")).await.unwrap_err();
        assert!(matches!(err, StorageError::Conflict { .. }));
    }

    #[tokio::test]
    async fn find_or_insert_is_stable() {
        let store = MemoryStore::new();
        let first = find_or_insert_crossing(&store, &snapshot("Main St")).await.unwrap();
        let second = find_or_insert_crossing(&store, &snapshot("Main St")).await.unwrap();

        assert_eq!(first.id, second.id);
        assert_eq!(store.list_crossings().await.unwrap().len(), 1);
    }

    #[tokio::test]
    async fn latest_check_prefers_newest_then_last_inserted() {
        let store = MemoryStore::new();
        let crossing = store.insert_crossing(&snapshot("Main St")).await.unwrap();

        assert!(store.latest_check("Main St").await.unwrap().is_none());

        store.insert_check(&check(crossing.id, "Clear", 200)).await.unwrap();
        store.insert_check(&check(crossing.id, "Blocked", 100)).await.unwrap();
        assert_eq!(store.latest_check("Main St").await.unwrap().unwrap().status, "Clear");

        store.insert_check(&check(crossing.id, "Active", 200)).await.unwrap();
        assert_eq!(store.latest_check("Main St").await.unwrap().unwrap().status, "Active");
    }

    #[tokio::test]
    async fn check_for_unknown_crossing_fails() {
        let store = MemoryStore::new();
        let err = store.insert_check(&check(CrossingId(5), "Clear", 1)).await.unwrap_err();
        assert!(matches!(err, StorageError::NotFound { .. }));
    }

    #[tokio::test]
    async fn subscriptions_are_deduplicated() {
        let store = MemoryStore::new();
        let crossing = store.insert_crossing(&snapshot("Main St")).await.unwrap();
        let sub = Subscription {
            crossing_id: crossing.id,
            phone_number: PhoneNumber::parse("+12815550100").unwrap(),
        };

        store.insert_subscription(&sub).await.unwrap();
        store.insert_subscription(&sub).await.unwrap();

        assert_eq!(store.subscribers(crossing.id).await.unwrap().len(), 1);
        assert!(store.subscribers(CrossingId(42)).await.unwrap().is_empty());
    }
}
