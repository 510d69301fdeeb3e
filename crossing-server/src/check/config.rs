//! Check cycle configuration.

use std::time::Duration;

/// Default time budget for one cycle, feed fetch included.
pub const DEFAULT_DEADLINE: Duration = Duration::from_secs(3);

/// Default ceiling on simultaneous crossing evaluations.
pub const DEFAULT_MAX_CONCURRENT: usize = 10;

/// Parameters for a check cycle.
#[derive(Debug, Clone)]
pub struct CycleConfig {
    /// Shared deadline for the feed fetch and every evaluation.
    pub deadline: Duration,

    /// Maximum number of crossings evaluated at once.
    pub max_concurrent: usize,
}

impl CycleConfig {
    pub fn new(deadline: Duration, max_concurrent: usize) -> Self {
        Self {
            deadline,
            max_concurrent: max_concurrent.max(1),
        }
    }

    /// Set the cycle deadline.
    pub fn with_deadline(mut self, deadline: Duration) -> Self {
        self.deadline = deadline;
        self
    }

    /// Set the concurrency ceiling. Zero is raised to one.
    pub fn with_max_concurrent(mut self, n: usize) -> Self {
        self.max_concurrent = n.max(1);
        self
    }
}

impl Default for CycleConfig {
    fn default() -> Self {
        Self::new(DEFAULT_DEADLINE, DEFAULT_MAX_CONCURRENT)
    }
}
