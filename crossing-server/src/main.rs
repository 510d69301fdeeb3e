use std::sync::Arc;
use std::time::Duration;

use tokio::time::MissedTickBehavior;
use tracing::{error, info, warn};
use tracing_subscriber::EnvFilter;

use crossing_server::check::CheckCycle;
use crossing_server::config::AppConfig;
use crossing_server::events::{self, DeliveryPolicy};
use crossing_server::feed::{CrossingFeed, FeedClient, StaticFeed};
use crossing_server::notify::{LogProvider, Notifier, SmsProvider, TwilioProvider};
use crossing_server::store::{CrossingStore, MemoryStore, PgStore};
use crossing_server::web::{AppState, create_router};

#[tokio::main]
async fn main() {
    // RUST_LOG overrides the default level, e.g. RUST_LOG=crossing_server=debug
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info"));
    tracing_subscriber::fmt().with_env_filter(filter).init();

    let config = AppConfig::from_env().expect("Invalid configuration");

    let feed: Arc<dyn CrossingFeed> = match &config.feed_file {
        Some(path) => {
            info!(path = %path.display(), "serving fixed crossing feed");
            Arc::new(StaticFeed::from_file(path).expect("Failed to load feed file"))
        }
        None => {
            let client = FeedClient::new(config.feed.clone()).expect("Failed to create feed client");
            info!(url = %client.url(), "polling live crossing feed");
            Arc::new(client)
        }
    };

    let store: Arc<dyn CrossingStore> = match &config.database_url {
        Some(url) => Arc::new(
            PgStore::connect(url)
                .await
                .expect("Failed to connect to database"),
        ),
        None => {
            warn!("DATABASE_URL not set, using in-memory store; state will not survive restarts");
            Arc::new(MemoryStore::new())
        }
    };

    let provider: Arc<dyn SmsProvider> = match config.twilio.clone() {
        Some(twilio) => {
            Arc::new(TwilioProvider::new(twilio).expect("Failed to create Twilio client"))
        }
        None => {
            warn!("Twilio credentials not set, notifications will only be logged");
            Arc::new(LogProvider)
        }
    };

    // Transition events flow from the check cycle to the notifier
    let (publisher, consumer) = events::topic(events::DEFAULT_CAPACITY);
    let notifier = Arc::new(Notifier::new(provider));
    tokio::spawn(consumer.run(notifier, DeliveryPolicy::default()));

    let cycle = CheckCycle::new(feed, store.clone(), Arc::new(publisher), config.cycle.clone());

    // Seed the registry before the first check so initial statuses become
    // the baseline rather than transitions.
    if let Err(e) = cycle.refresh_crossings().await {
        error!(error = %e, "initial crossing refresh failed");
    }

    spawn_schedule("refresh", config.refresh_interval, {
        let cycle = cycle.clone();
        move || {
            let cycle = cycle.clone();
            async move {
                match cycle.refresh_crossings().await {
                    Ok(added) => info!(added, "refreshed crossings"),
                    Err(e) => error!(error = %e, "crossing refresh failed"),
                }
            }
        }
    });

    spawn_schedule("check", config.check_interval, {
        let cycle = cycle.clone();
        move || {
            let cycle = cycle.clone();
            async move {
                if let Err(e) = cycle.run().await {
                    error!(error = %e, "check cycle failed");
                }
            }
        }
    });

    let app = create_router(AppState::new(store));

    let listener = tokio::net::TcpListener::bind(config.bind_addr)
        .await
        .expect("Failed to bind listener");
    info!(addr = %config.bind_addr, "crossing watcher listening");
    info!("  GET  /health         - Health check");
    info!("  GET  /crossings      - List crossings");
    info!("  POST /subscriptions  - Subscribe to a crossing");

    axum::serve(listener, app)
        .with_graceful_shutdown(shutdown_signal())
        .await
        .expect("Server error");
}

/// Run `job` every `period`, starting one period from now.
///
/// Each run is awaited before the next tick, so runs never overlap.
fn spawn_schedule<F, Fut>(name: &'static str, period: Duration, job: F)
where
    F: Fn() -> Fut + Send + 'static,
    Fut: std::future::Future<Output = ()> + Send,
{
    tokio::spawn(async move {
        let mut interval = tokio::time::interval(period);
        interval.set_missed_tick_behavior(MissedTickBehavior::Delay);
        interval.tick().await; // First tick is immediate, skip it
        info!(schedule = name, period_secs = period.as_secs(), "schedule started");
        loop {
            interval.tick().await;
            job().await;
        }
    });
}

async fn shutdown_signal() {
    if let Err(e) = tokio::signal::ctrl_c().await {
        error!(error = %e, "failed to listen for shutdown signal");
        std::future::pending::<()>().await;
    }
    info!("shutting down");
}
