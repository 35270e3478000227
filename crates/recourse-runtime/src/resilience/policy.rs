//! Execution policies.
//!
//! One executor, configured by orthogonal switches: how many attempts,
//! whether to raise a notification, whether to run the recovery action.
//! Logging is not a switch; every surfaced error is logged.

use recourse_core::{ClassifiedError, ErrorKind};
use std::time::Duration;

use super::backoff::LinearBuilder;

/// Attempt budget and backoff unit.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct RetryPolicy {
    max_attempts: u32,
    base_delay: Duration,
}

impl RetryPolicy {
    /// A single attempt, no retry.
    pub fn once() -> Self {
        Self {
            max_attempts: 1,
            base_delay: Duration::ZERO,
        }
    }

    /// Up to `max_attempts` total attempts with linear backoff.
    pub fn linear(max_attempts: u32, base_delay: Duration) -> Self {
        Self {
            max_attempts: max_attempts.max(1),
            base_delay,
        }
    }

    pub fn max_attempts(&self) -> u32 {
        self.max_attempts
    }

    pub fn base_delay(&self) -> Duration {
        self.base_delay
    }

    /// Whether a failure of this kind may be attempted again.
    pub fn allows_retry(&self, kind: ErrorKind) -> bool {
        !kind.fails_fast()
    }

    pub(crate) fn backoff(&self) -> LinearBuilder {
        LinearBuilder::new(self.base_delay, self.max_attempts)
    }
}

impl Default for RetryPolicy {
    fn default() -> Self {
        Self::linear(3, Duration::from_secs(1))
    }
}

/// Full policy for one executor invocation.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ExecutionPolicy {
    /// Attempt budget
    pub retry: RetryPolicy,

    /// Raise a transient notification for the surfaced error
    pub notify: bool,

    /// Apply the recovery action for the surfaced error
    pub recover: bool,
}

impl ExecutionPolicy {
    pub fn new(retry: RetryPolicy) -> Self {
        Self {
            retry,
            notify: true,
            recover: true,
        }
    }

    pub fn without_notification(mut self) -> Self {
        self.notify = false;
        self
    }

    pub fn without_recovery(mut self) -> Self {
        self.recover = false;
        self
    }
}

impl Default for ExecutionPolicy {
    fn default() -> Self {
        Self::new(RetryPolicy::once())
    }
}

/// Attempt bookkeeping for one invocation.
#[derive(Debug, Clone)]
pub struct RetryState {
    attempt: u32,
    max_attempts: u32,
    last_error: Option<ClassifiedError>,
}

impl RetryState {
    pub fn new(max_attempts: u32) -> Self {
        Self {
            attempt: 0,
            max_attempts: max_attempts.max(1),
            last_error: None,
        }
    }

    /// Start the next attempt and return its 1-based number.
    pub fn begin_attempt(&mut self) -> u32 {
        self.attempt = (self.attempt + 1).min(self.max_attempts);
        self.attempt
    }

    pub fn record_failure(&mut self, error: ClassifiedError) {
        self.last_error = Some(error);
    }

    pub fn attempt(&self) -> u32 {
        self.attempt
    }

    pub fn max_attempts(&self) -> u32 {
        self.max_attempts
    }

    pub fn last_error(&self) -> Option<&ClassifiedError> {
        self.last_error.as_ref()
    }

    pub fn is_exhausted(&self) -> bool {
        self.attempt >= self.max_attempts
    }
}
