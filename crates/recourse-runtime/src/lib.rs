//! # recourse-runtime
//!
//! Resilient execution for Recourse.
//!
//! This crate wraps fallible async operations, retries transient failures
//! with linear backoff, and surfaces the final error:
//! - appended to a bounded error log
//! - shown as a transient notification
//! - recovered (login redirect, page reload) when the taxonomy calls for it
//!
//! Classification itself is deterministic and lives in `recourse-core`.
//!
//! ## Example
//!
//! ```rust,ignore
//! use recourse_runtime::{ErrorHandler, RuntimeConfig};
//! use std::sync::Arc;
//!
//! let handler = Arc::new(
//!     ErrorHandler::builder()
//!         .config(RuntimeConfig::from_file("recourse.yaml")?)
//!         .session_store(session)
//!         .navigator(navigator)
//!         .build()?,
//! );
//!
//! let orders = handler
//!     .execute_with_retry(|| api.list_orders(), Some("orders.list"), None)
//!     .await
//!     .ok();
//! ```

use thiserror::Error;

pub mod config;
pub mod executor;
pub mod handler;
pub mod observability;
pub mod recovery;
pub mod resilience;

pub use config::{ConfigError, Environment, RuntimeConfig};
pub use executor::ResilientExecutor;
pub use handler::{ErrorHandler, ErrorHandlerBuilder};
pub use observability::{
    ErrorLog, ErrorLogEntry, Notification, NotificationCenter, NotificationEvent, NotificationSink,
};
pub use recovery::{Navigator, RecoveryDispatcher, RecoveryOutcome, SessionStore};
pub use resilience::{ExecutionPolicy, LinearBackoff, LinearBuilder, RetryPolicy, RetryState};

/// Errors from the runtime.
#[derive(Error, Debug)]
pub enum RuntimeError {
    #[error("Not configured: {0}")]
    NotConfigured(String),

    #[error(transparent)]
    Config(#[from] ConfigError),
}
