//! Crossing, check and subscription records.

use std::fmt;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use super::phone::PhoneNumber;

/// Identifier assigned to a crossing by the store.
///
/// This is not the provider's id: the feed's numbering is only carried in
/// [`CrossingSnapshot::feed_id`].
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(transparent)]
pub struct CrossingId(pub i64);

impl fmt::Display for CrossingId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

/// A crossing as reported by the feed on one poll.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CrossingSnapshot {
    /// Provider-assigned id.
    #[serde(rename = "id")]
    pub feed_id: i64,
    pub name: String,
    /// Free-text status, e.g. "Clear" or "Blocked".
    pub status: String,
    pub latitude: f64,
    pub longitude: f64,
}

/// A crossing known to the store.
///
/// Name is the natural key: a crossing is inserted on first sighting and
/// never re-created.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Crossing {
    pub id: CrossingId,
    pub name: String,
    pub latitude: f64,
    pub longitude: f64,
}

/// The status recorded for a crossing at a point in time.
#[derive(Debug, Clone, PartialEq)]
pub struct Check {
    pub crossing_id: CrossingId,
    pub status: String,
    pub checked_at: DateTime<Utc>,
}

/// A phone number subscribed to a crossing.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Subscription {
    pub crossing_id: CrossingId,
    pub phone_number: PhoneNumber,
}

/// Emitted once per detected open/closed transition.
///
/// Not persisted. Consumers must tolerate receiving the same event twice.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct TransitionEvent {
    pub crossing: Crossing,
    pub subscribers: Vec<PhoneNumber>,
    /// Openness after the transition.
    pub open: bool,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn snapshot_decodes_provider_fields() {
        let json = r#"{
            "type": "crossing",
            "id": 7,
            "name": "Main St",
            "status": "Clear",
            "latitude": 29.61,
            "longitude": -95.63
        }"#;

        let snapshot: CrossingSnapshot = serde_json::from_str(json).unwrap();
        assert_eq!(snapshot.feed_id, 7);
        assert_eq!(snapshot.name, "Main St");
        assert_eq!(snapshot.status, "Clear");
    }

    #[test]
    fn crossing_id_is_transparent() {
        let json = serde_json::to_string(&CrossingId(42)).unwrap();
        assert_eq!(json, "42");
        assert_eq!(CrossingId(42).to_string(), "42");
    }
}
