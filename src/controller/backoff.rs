//! # Fibonacci Backoff
//!
//! Backoff used by the controller runtime when a reconciliation returns an error
//! (authentication, persistence, a failed store read). Remote API failures do not go
//! through here: the phase manager records them in status and requeues on its own interval.
//!
//! Durations are configured in minutes and handed out in seconds.
//! Sequence with the defaults: 1m, 1m, 2m, 3m, 5m, 8m, 10m (max).
//!
//! ```rust
//! use aruba_resource_operator::controller::backoff::FibonacciBackoff;
//!
//! let mut backoff = FibonacciBackoff::new(1, 10);
//! assert_eq!(backoff.next_backoff_seconds(), 60);
//! assert_eq!(backoff.next_backoff_seconds(), 60);
//! assert_eq!(backoff.next_backoff_seconds(), 120);
//! ```

use std::time::Duration;

/// Fibonacci backoff calculator
///
/// Each value is the sum of the previous two, capped at `max_minutes`.
#[derive(Debug, Clone)]
pub struct FibonacciBackoff {
    min_minutes: u64,
    prev_minutes: u64,
    current_minutes: u64,
    max_minutes: u64,
}

impl FibonacciBackoff {
    /// `min_minutes` is used for the first two values, `max_minutes` caps the sequence
    #[must_use]
    pub fn new(min_minutes: u64, max_minutes: u64) -> Self {
        Self {
            min_minutes,
            prev_minutes: 0,
            current_minutes: min_minutes,
            max_minutes,
        }
    }

    /// Current backoff in seconds; advances the sequence
    pub fn next_backoff_seconds(&mut self) -> u64 {
        let result_seconds = self.current_minutes.saturating_mul(60);

        let next_minutes = self.prev_minutes.saturating_add(self.current_minutes);
        self.prev_minutes = self.current_minutes;
        self.current_minutes = next_minutes.min(self.max_minutes);

        result_seconds
    }

    #[must_use]
    pub fn next_backoff(&mut self) -> Duration {
        Duration::from_secs(self.next_backoff_seconds())
    }

    /// Restart from `min_minutes` after a successful reconciliation
    pub fn reset(&mut self) {
        self.prev_minutes = 0;
        self.current_minutes = self.min_minutes;
    }
}
