//! Web layer for the crossing watcher.
//!
//! Lists known crossings and registers phone numbers for transition alerts.

mod dto;
mod routes;
mod state;

pub use dto::*;
pub use routes::{AppError, create_router};
pub use state::AppState;
