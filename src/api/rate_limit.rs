//! Shared debounce window for toggle requests.

use std::time::{Duration, Instant};

/// One window shared by every toggle route, whichever light they target.
///
/// Only accepted toggles move the window; rejected or invalid requests
/// leave it where it was.
#[derive(Debug, Clone)]
pub struct RateLimitWindow {
    debounce: Duration,
    last_accepted: Option<Instant>,
}

impl RateLimitWindow {
    pub fn new(debounce: Duration) -> Self {
        Self {
            debounce,
            last_accepted: None,
        }
    }

    /// Whether a toggle arriving at `now` may proceed.
    pub fn allows(&self, now: Instant) -> bool {
        match self.last_accepted {
            Some(last) => now.saturating_duration_since(last) >= self.debounce,
            None => true,
        }
    }

    /// Mark a toggle accepted at `now`.
    pub fn record(&mut self, now: Instant) {
        self.last_accepted = Some(now);
    }

    pub fn last_accepted(&self) -> Option<Instant> {
        self.last_accepted
    }
}
