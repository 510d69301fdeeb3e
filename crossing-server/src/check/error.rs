//! Check cycle error types.

use std::time::Duration;

use crate::events::PublishError;
use crate::feed::FeedError;
use crate::store::StorageError;

/// Errors that fail a check cycle or registry refresh.
#[derive(Debug, thiserror::Error)]
pub enum CheckError {
    /// Feed could not be retrieved; nothing was evaluated
    #[error(transparent)]
    Feed(#[from] FeedError),

    /// A store read or write failed
    #[error(transparent)]
    Storage(#[from] StorageError),

    /// A transition could not be handed to the topic
    #[error(transparent)]
    Publish(#[from] PublishError),

    /// Evaluations did not finish within the cycle deadline
    #[error("check cycle exceeded its {0:?} deadline")]
    DeadlineExceeded(Duration),
}
