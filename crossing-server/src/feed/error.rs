//! Feed client error types.

use std::path::PathBuf;

/// Errors from retrieving the crossing feed.
#[derive(Debug, thiserror::Error)]
pub enum FeedError {
    /// Provider unreachable, connection dropped, or deadline exceeded
    #[error("crossing feed unresponsive: {reason}")]
    Unresponsive { reason: String },

    /// Provider rejected the request (any status >= 400)
    #[error("crossing feed rejected request with status {status}")]
    Unauthorized { status: u16 },

    /// Body was not a valid feed document
    #[error("crossing feed decode error: {message}")]
    Decode {
        message: String,
        body: Option<String>,
    },

    /// A feed document on disk could not be read
    #[error("failed to read feed file {}: {source}", path.display())]
    Unreadable {
        path: PathBuf,
        source: std::io::Error,
    },
}

impl From<reqwest::Error> for FeedError {
    fn from(err: reqwest::Error) -> Self {
        FeedError::Unresponsive {
            reason: err.to_string(),
        }
    }
}
