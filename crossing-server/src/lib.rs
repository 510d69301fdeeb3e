//! Railroad crossing watcher.
//!
//! Polls a live feed of railroad crossing statuses, detects crossings that
//! open or close, and texts subscribers about each transition.

pub mod check;
pub mod config;
pub mod domain;
pub mod events;
pub mod feed;
pub mod notify;
pub mod store;
pub mod web;
