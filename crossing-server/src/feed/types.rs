//! Feed document types.

use serde::{Deserialize, Serialize};

use crate::domain::CrossingSnapshot;

/// Top-level feed document.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct FeedEnvelope {
    /// Provider's own timestamp for this snapshot, passed through verbatim.
    #[serde(default)]
    pub update_timestamp: String,
    pub crossings: Vec<CrossingSnapshot>,
}
