//! Domain types for the crossing watcher.
//!
//! Crossings, the checks recorded against them, subscriptions and the
//! transition events produced when a crossing opens or closes.

mod crossing;
mod error;
mod phone;
pub mod status;

pub use crossing::{Check, Crossing, CrossingId, CrossingSnapshot, Subscription, TransitionEvent};
pub use error::DomainError;
pub use phone::PhoneNumber;
pub use status::is_open;
