//! Resilience patterns for recourse-runtime.
//!
//! This module provides:
//! - Linear backoff schedule for `backon`
//! - Retry and execution policies
//! - Per-invocation retry state

mod backoff;
mod policy;

pub use backoff::{LinearBackoff, LinearBuilder};
pub use policy::{ExecutionPolicy, RetryPolicy, RetryState};
