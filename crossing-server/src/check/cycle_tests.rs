//! Unit tests for the check cycle.

use std::sync::Mutex;
use std::time::Duration;

use async_trait::async_trait;

use super::*;
use crate::domain::{Crossing, CrossingId, PhoneNumber, Subscription};
use crate::events::{DeliveryPolicy, PublishError, topic};
use crate::feed::{FeedError, StaticFeed};
use crate::notify::{DeliveryError, Notifier, SmsProvider};
use crate::store::MemoryStore;

fn snapshot(name: &str, status: &str) -> CrossingSnapshot {
    CrossingSnapshot {
        feed_id: 1,
        name: name.to_string(),
        status: status.to_string(),
        latitude: 29.6,
        longitude: -95.6,
    }
}

fn crossings(n: usize, status: &str) -> Vec<CrossingSnapshot> {
    (0..n)
        .map(|i| snapshot(&format!("Crossing {i}"), status))
        .collect()
}

/// Decrements the active count when an evaluation finishes or is dropped.
struct ActiveGuard<'a>(&'a AtomicUsize);

impl Drop for ActiveGuard<'_> {
    fn drop(&mut self) {
        self.0.fetch_sub(1, Ordering::SeqCst);
    }
}

/// Memory store that slows down and instruments `latest_check`, the first
/// step of every evaluation, and can fail it for one crossing.
#[derive(Default)]
struct InstrumentedStore {
    inner: MemoryStore,
    delay: Duration,
    fail_on: Option<String>,
    started: AtomicUsize,
    active: AtomicUsize,
    peak: AtomicUsize,
}

impl InstrumentedStore {
    fn started(&self) -> usize {
        self.started.load(Ordering::SeqCst)
    }
}

#[async_trait]
impl CrossingStore for InstrumentedStore {
    async fn find_crossing(&self, name: &str) -> Result<Option<Crossing>, StorageError> {
        self.inner.find_crossing(name).await
    }

    async fn insert_crossing(&self, snapshot: &CrossingSnapshot) -> Result<Crossing, StorageError> {
        self.inner.insert_crossing(snapshot).await
    }

    async fn list_crossings(&self) -> Result<Vec<Crossing>, StorageError> {
        self.inner.list_crossings().await
    }

    async fn crossing_exists(&self, id: CrossingId) -> Result<bool, StorageError> {
        self.inner.crossing_exists(id).await
    }

    async fn latest_check(&self, name: &str) -> Result<Option<Check>, StorageError> {
        self.started.fetch_add(1, Ordering::SeqCst);
        let now_active = self.active.fetch_add(1, Ordering::SeqCst) + 1;
        let _guard = ActiveGuard(&self.active);
        self.peak.fetch_max(now_active, Ordering::SeqCst);

        if self.fail_on.as_deref() == Some(name) {
            return Err(StorageError::InvalidRow {
                message: format!("corrupt check for {name}"),
            });
        }

        tokio::time::sleep(self.delay).await;
        self.inner.latest_check(name).await
    }

    async fn insert_check(&self, check: &Check) -> Result<(), StorageError> {
        self.inner.insert_check(check).await
    }

    async fn subscribers(&self, id: CrossingId) -> Result<Vec<PhoneNumber>, StorageError> {
        self.inner.subscribers(id).await
    }

    async fn insert_subscription(&self, subscription: &Subscription) -> Result<(), StorageError> {
        self.inner.insert_subscription(subscription).await
    }
}

/// SMS provider that records every message.
#[derive(Default)]
struct RecordingSms {
    sent: Mutex<Vec<(PhoneNumber, String)>>,
}

#[async_trait]
impl SmsProvider for RecordingSms {
    async fn send_batch(
        &self,
        _subject: &str,
        body: &str,
        recipients: &[PhoneNumber],
    ) -> Vec<Result<(), DeliveryError>> {
        let mut sent = self.sent.lock().unwrap();
        recipients
            .iter()
            .map(|r| {
                sent.push((r.clone(), body.to_string()));
                Ok(())
            })
            .collect()
    }
}

fn cycle_with(
    feed: StaticFeed,
    store: Arc<dyn CrossingStore>,
    publisher: Arc<dyn TransitionPublisher>,
) -> CheckCycle {
    CheckCycle::new(Arc::new(feed), store, publisher, CycleConfig::default())
}

#[tokio::test(start_paused = true)]
async fn evaluations_never_exceed_ceiling() {
    let store = Arc::new(InstrumentedStore {
        delay: Duration::from_millis(50),
        ..InstrumentedStore::default()
    });
    let (publisher, _consumer) = topic(64);
    let cycle = cycle_with(
        StaticFeed::from_crossings(crossings(25, "Clear")),
        store.clone(),
        Arc::new(publisher),
    );

    let report = cycle.run().await.unwrap();

    assert_eq!(report.evaluated, 25);
    assert_eq!(report.transitions, 0);
    assert_eq!(store.started(), 25);
    assert_eq!(store.peak.load(Ordering::SeqCst), DEFAULT_MAX_CONCURRENT);
}

#[tokio::test(start_paused = true)]
async fn first_failure_fails_cycle_and_stops_new_evaluations() {
    let store = Arc::new(InstrumentedStore {
        delay: Duration::from_millis(50),
        fail_on: Some("Crossing 12".to_string()),
        ..InstrumentedStore::default()
    });
    let (publisher, _consumer) = topic(64);
    let cycle = cycle_with(
        StaticFeed::from_crossings(crossings(25, "Clear")),
        store.clone(),
        Arc::new(publisher),
    );

    let err = cycle.run().await.unwrap_err();
    assert!(matches!(err, CheckError::Storage(StorageError::InvalidRow { .. })));

    let started = store.started();
    assert!(started < 25, "started {started} evaluations");

    // Nothing else starts once the cycle has returned.
    tokio::time::sleep(Duration::from_secs(1)).await;
    assert_eq!(store.started(), started);
    assert_eq!(store.active.load(Ordering::SeqCst), 0);
}

#[tokio::test(start_paused = true)]
async fn slow_feed_fails_without_evaluating() {
    let store = Arc::new(InstrumentedStore::default());
    let (publisher, _consumer) = topic(64);
    let feed = StaticFeed::from_crossings(crossings(5, "Blocked")).with_delay(Duration::from_secs(5));
    let cycle = cycle_with(feed, store.clone(), Arc::new(publisher));

    let err = cycle.run().await.unwrap_err();

    assert!(matches!(err, CheckError::Feed(FeedError::Unresponsive { .. })));
    assert_eq!(store.started(), 0);
}

#[tokio::test(start_paused = true)]
async fn slow_evaluations_hit_the_deadline() {
    let store = Arc::new(InstrumentedStore {
        delay: Duration::from_secs(10),
        ..InstrumentedStore::default()
    });
    let (publisher, _consumer) = topic(64);
    let cycle = cycle_with(
        StaticFeed::from_crossings(crossings(3, "Clear")),
        store.clone(),
        Arc::new(publisher),
    );

    let err = cycle.run().await.unwrap_err();

    assert!(matches!(err, CheckError::DeadlineExceeded(d) if d == DEFAULT_DEADLINE));
    assert_eq!(store.active.load(Ordering::SeqCst), 0);
}

#[tokio::test]
async fn closed_topic_fails_cycle() {
    let store = MemoryStore::new();
    let (publisher, consumer) = topic(4);
    drop(consumer);
    let cycle = cycle_with(
        StaticFeed::from_crossings(vec![snapshot("Main St", "Blocked")]),
        Arc::new(store.clone()),
        Arc::new(publisher),
    );

    let err = cycle.run().await.unwrap_err();

    assert!(matches!(err, CheckError::Publish(PublishError::Closed)));
    // The check is kept: the lost notification is not retried as a transition.
    assert_eq!(store.check_count().await, 1);
}

#[tokio::test]
async fn refresh_registers_new_crossings_once() {
    let store = MemoryStore::new();
    let (publisher, _consumer) = topic(4);
    let feed = StaticFeed::from_crossings(vec![
        snapshot("Main St", "Clear"),
        snapshot("Brooks St", "Blocked"),
    ]);
    let cycle = cycle_with(feed, Arc::new(store.clone()), Arc::new(publisher));

    assert_eq!(cycle.refresh_crossings().await.unwrap(), 2);
    assert_eq!(cycle.refresh_crossings().await.unwrap(), 0);

    let names: Vec<_> = store
        .list_crossings()
        .await
        .unwrap()
        .into_iter()
        .map(|c| c.name)
        .collect();
    assert_eq!(names, ["Main St", "Brooks St"]);

    // Initial checks are the baseline: a closed crossing seen at refresh
    // does not produce a transition on the next cycle.
    let report = cycle.run().await.unwrap();
    assert_eq!(report.transitions, 0);
}

#[tokio::test]
async fn refresh_restores_missing_initial_check() {
    let store = MemoryStore::new();
    store.insert_crossing(&snapshot("Main St", "Blocked")).await.unwrap();
    let (publisher, _consumer) = topic(4);
    let feed = StaticFeed::from_crossings(vec![snapshot("Main St", "Blocked")]);
    let cycle = cycle_with(feed, Arc::new(store.clone()), Arc::new(publisher));

    assert_eq!(cycle.refresh_crossings().await.unwrap(), 0);
    assert_eq!(store.check_count().await, 1);
    assert_eq!(cycle.refresh_crossings().await.unwrap(), 0);
    assert_eq!(store.check_count().await, 1);

    let report = cycle.run().await.unwrap();
    assert_eq!(report.transitions, 0);
}

#[tokio::test]
async fn empty_status_baseline_is_stable() {
    let store = MemoryStore::new();
    let (publisher, _consumer) = topic(8);
    let feed = StaticFeed::from_crossings(vec![snapshot("Main St", "")]);
    let cycle = cycle_with(feed, Arc::new(store.clone()), Arc::new(publisher));
    cycle.refresh_crossings().await.unwrap();

    for _ in 0..3 {
        let report = cycle.run().await.unwrap();
        assert_eq!(report.transitions, 0);
    }
    assert_eq!(store.check_count().await, 1);
}

#[tokio::test]
async fn transition_reaches_subscribers() {
    let store = MemoryStore::new();
    let (publisher, consumer) = topic(4);
    let feed = StaticFeed::from_crossings(vec![
        snapshot("Main St", "Clear"),
        snapshot("Brooks St", "Clear"),
    ]);
    let cycle = cycle_with(feed.clone(), Arc::new(store.clone()), Arc::new(publisher));
    cycle.refresh_crossings().await.unwrap();

    let main_st = store.find_crossing("Main St").await.unwrap().unwrap();
    for phone in ["+12815550100", "+12815550101"] {
        store
            .insert_subscription(&Subscription {
                crossing_id: main_st.id,
                phone_number: PhoneNumber::parse(phone).unwrap(),
            })
            .await
            .unwrap();
    }

    feed.set_status("Main St", "Blocked - train present").await;
    let report = cycle.run().await.unwrap();
    assert_eq!(report.transitions, 1);

    feed.set_status("Main St", "Clear").await;
    let report = cycle.run().await.unwrap();
    assert_eq!(report.transitions, 1);

    let sms = Arc::new(RecordingSms::default());
    drop(cycle);
    consumer
        .run(Arc::new(Notifier::new(sms.clone())), DeliveryPolicy::default())
        .await;

    let sent = sms.sent.lock().unwrap();
    let bodies: Vec<_> = sent.iter().map(|(_, body)| body.as_str()).collect();
    assert_eq!(
        bodies,
        [
            "railroad crossing on Main St is closed!",
            "railroad crossing on Main St is closed!",
            "railroad crossing on Main St is back open.",
            "railroad crossing on Main St is back open.",
        ]
    );
}
