//! Linear backoff for `backon`.
//!
//! Retry N waits `base * N`. Retry counts in the UI are small (three
//! attempts by default), so the schedule stays short without a cap.

use backon::BackoffBuilder;
use std::time::Duration;

/// Builder for [`LinearBackoff`].
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct LinearBuilder {
    base_delay: Duration,
    max_attempts: u32,
}

impl LinearBuilder {
    /// Create a builder for `max_attempts` total attempts.
    pub fn new(base_delay: Duration, max_attempts: u32) -> Self {
        Self {
            base_delay,
            max_attempts: max_attempts.max(1),
        }
    }
}

impl BackoffBuilder for LinearBuilder {
    type Backoff = LinearBackoff;

    fn build(self) -> Self::Backoff {
        LinearBackoff {
            base_delay: self.base_delay,
            next_retry: 1,
            retries_left: self.max_attempts - 1,
        }
    }
}

/// Yields `base`, `base * 2`, ... once per remaining retry.
#[derive(Debug, Clone)]
pub struct LinearBackoff {
    base_delay: Duration,
    next_retry: u32,
    retries_left: u32,
}

impl Iterator for LinearBackoff {
    type Item = Duration;

    fn next(&mut self) -> Option<Duration> {
        if self.retries_left == 0 {
            return None;
        }

        let delay = self.base_delay.saturating_mul(self.next_retry);
        self.next_retry += 1;
        self.retries_left -= 1;
        Some(delay)
    }
}
