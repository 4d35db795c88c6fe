// Timeout governor: bounds the wait budget and tracks when it runs out

use std::time::Duration;
use tokio::time::Instant;

pub const MIN_TIMEOUT_SECONDS: u64 = 1;
pub const MAX_TIMEOUT_SECONDS: u64 = 600;

/// Clamp a caller-supplied timeout into `[1, 600]` seconds
pub fn clamp_timeout_seconds(requested: i64) -> u64 {
    requested.clamp(MIN_TIMEOUT_SECONDS as i64, MAX_TIMEOUT_SECONDS as i64) as u64
}

/// Wait budget measured from the moment it is started
#[derive(Debug, Clone, Copy)]
pub struct Deadline {
    started_at: Instant,
    budget: Duration,
}

impl Deadline {
    /// Start the clock now
    pub fn start(budget: Duration) -> Self {
        Self {
            started_at: Instant::now(),
            budget,
        }
    }

    pub fn started_at(&self) -> Instant {
        self.started_at
    }

    pub fn elapsed(&self) -> Duration {
        self.started_at.elapsed()
    }

    pub fn expired(&self) -> bool {
        self.elapsed() >= self.budget
    }
}
