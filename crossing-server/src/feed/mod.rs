//! Client for the live railroad crossing feed.
//!
//! The provider publishes one JSON document listing every monitored
//! crossing and its current free-text status. The document is fetched once
//! per check cycle and must arrive within the cycle's deadline; a slow or
//! failing provider aborts the cycle before any crossing is evaluated.

mod client;
mod error;
mod mock;
mod types;

use async_trait::async_trait;
use tokio::time::Instant;

pub use client::{DEFAULT_FEED_URL, FeedClient, FeedConfig};
pub use error::FeedError;
pub use mock::StaticFeed;
pub use types::FeedEnvelope;

/// Source of crossing snapshots.
#[async_trait]
pub trait CrossingFeed: Send + Sync {
    /// Retrieve and decode the current feed document.
    async fn fetch(&self) -> Result<FeedEnvelope, FeedError>;
}

/// Fetch the feed, giving up at `deadline`.
///
/// Whichever finishes first wins. When the deadline wins the fetch future
/// is dropped, which aborts the in-flight request rather than leaving it
/// running in the background.
pub async fn fetch_before(
    feed: &dyn CrossingFeed,
    deadline: Instant,
) -> Result<FeedEnvelope, FeedError> {
    match tokio::time::timeout_at(deadline, feed.fetch()).await {
        Ok(result) => result,
        Err(_) => Err(FeedError::Unresponsive {
            reason: "deadline exceeded".to_string(),
        }),
    }
}
