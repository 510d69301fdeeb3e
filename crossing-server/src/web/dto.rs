//! Data transfer objects for web requests and responses.

use serde::{Deserialize, Serialize};

use crate::domain::{Crossing, Subscription};

/// Request to subscribe a phone number to a crossing.
#[derive(Debug, Deserialize)]
pub struct SubscribeRequest {
    /// Store id of the crossing (see `GET /crossings`)
    pub crossing_id: i64,

    /// Number to text on transitions, E.164 format
    pub phone_number: String,
}

/// A created subscription.
#[derive(Debug, Serialize, Deserialize)]
pub struct SubscriptionResponse {
    pub crossing_id: i64,
    pub phone_number: String,
}

/// A crossing in list results.
#[derive(Debug, Serialize, Deserialize)]
pub struct CrossingResult {
    pub id: i64,
    pub name: String,
    pub latitude: f64,
    pub longitude: f64,
}

/// Response listing known crossings.
#[derive(Debug, Serialize, Deserialize)]
pub struct ListCrossingsResponse {
    pub crossings: Vec<CrossingResult>,
}

/// Error response.
#[derive(Debug, Serialize, Deserialize)]
pub struct ErrorResponse {
    /// Error message
    pub error: String,
}

// Conversion implementations

impl From<Crossing> for CrossingResult {
    fn from(c: Crossing) -> Self {
        Self {
            id: c.id.0,
            name: c.name,
            latitude: c.latitude,
            longitude: c.longitude,
        }
    }
}

impl From<Subscription> for SubscriptionResponse {
    fn from(s: Subscription) -> Self {
        Self {
            crossing_id: s.crossing_id.0,
            phone_number: s.phone_number.into(),
        }
    }
}
