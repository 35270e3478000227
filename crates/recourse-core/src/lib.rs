//! # recourse-core
//!
//! Deterministic failure classification for Recourse.
//!
//! This crate turns whatever a call site catches into a uniform, typed
//! error and answers:
//! - What kind of failure is this?
//! - What may the user be told?
//! - What should happen next?
//!
//! ## Key Guarantees
//!
//! 1. **Total**: classification never panics; the worst case is `UnknownError`
//! 2. **Idempotent**: classifying a `ClassifiedError` returns it unchanged
//! 3. **Display-safe**: templates are used wherever server text could leak internals
//! 4. **No I/O**: side effects live in `recourse-runtime`
//!
//! ## Example
//!
//! ```rust
//! use recourse_core::{classify, decide, ErrorKind, HttpResponse, RecoveryAction};
//!
//! let error = classify(HttpResponse::new(401), Some("reports.load"));
//! assert_eq!(error.kind(), ErrorKind::AuthenticationError);
//! assert_eq!(decide(&error).action, RecoveryAction::RedirectToLogin);
//! ```

pub mod classifier;
pub mod failure;
pub mod messages;
pub mod recovery;
pub mod types;

// Re-export main types at crate root
pub use classifier::{classify, is_cross_origin_message, kind_for_status, Classifier};
pub use failure::{HttpResponse, RawFailure, TransportFailure};
pub use messages::{display_message, template, Locale};
pub use recovery::{decide, RecoveryAction, RecoveryDecision};
pub use types::{
    ClassifiedError, ErrorKind, DETAIL_CONTEXT, DETAIL_FIELD_ERRORS, DETAIL_ORIGINAL_ERROR,
};
