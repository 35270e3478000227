//! Core types for the error model.
//!
//! Every failure that crosses the transport boundary ends up as a
//! [`ClassifiedError`] tagged with exactly one [`ErrorKind`].

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use serde_json::Value as JsonValue;
use std::collections::BTreeMap;
use std::fmt;

use crate::recovery::RecoveryAction;

/// Detail key holding the serialized original cause.
pub const DETAIL_ORIGINAL_ERROR: &str = "originalError";

/// Detail key holding the call-site context label.
pub const DETAIL_CONTEXT: &str = "context";

/// Detail key holding per-field validation messages.
pub const DETAIL_FIELD_ERRORS: &str = "fieldErrors";

/// The closed taxonomy of error kinds.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub enum ErrorKind {
    /// No response was received (transport failure)
    NetworkError,

    /// The transport reported an elapsed deadline
    TimeoutError,

    /// The browser blocked a cross-origin request
    CorsError,

    /// HTTP 400/422 or a client-side shape violation
    ValidationError,

    /// HTTP 401
    AuthenticationError,

    /// HTTP 403
    AuthorizationError,

    /// HTTP 404
    NotFoundError,

    /// HTTP 5xx
    ServerError,

    /// Any other non-2xx status
    ApiError,

    /// Nothing else matched
    UnknownError,
}

impl ErrorKind {
    /// Every kind, in taxonomy order.
    pub const ALL: [ErrorKind; 10] = [
        ErrorKind::NetworkError,
        ErrorKind::TimeoutError,
        ErrorKind::CorsError,
        ErrorKind::ValidationError,
        ErrorKind::AuthenticationError,
        ErrorKind::AuthorizationError,
        ErrorKind::NotFoundError,
        ErrorKind::ServerError,
        ErrorKind::ApiError,
        ErrorKind::UnknownError,
    ];

    /// Stable name, identical to the serialized form.
    pub fn as_str(&self) -> &'static str {
        match self {
            ErrorKind::NetworkError => "NetworkError",
            ErrorKind::TimeoutError => "TimeoutError",
            ErrorKind::CorsError => "CorsError",
            ErrorKind::ValidationError => "ValidationError",
            ErrorKind::AuthenticationError => "AuthenticationError",
            ErrorKind::AuthorizationError => "AuthorizationError",
            ErrorKind::NotFoundError => "NotFoundError",
            ErrorKind::ServerError => "ServerError",
            ErrorKind::ApiError => "ApiError",
            ErrorKind::UnknownError => "UnknownError",
        }
    }

    /// The recovery action this kind calls for by default.
    pub fn default_recovery(&self) -> RecoveryAction {
        match self {
            ErrorKind::NetworkError | ErrorKind::TimeoutError | ErrorKind::ServerError => {
                RecoveryAction::Retry
            }
            ErrorKind::CorsError => RecoveryAction::ReloadPage,
            ErrorKind::AuthenticationError => RecoveryAction::RedirectToLogin,
            ErrorKind::ValidationError
            | ErrorKind::AuthorizationError
            | ErrorKind::NotFoundError
            | ErrorKind::ApiError
            | ErrorKind::UnknownError => RecoveryAction::None,
        }
    }

    /// Kinds that can never succeed on retry.
    ///
    /// Retrying an authentication failure would also re-trigger the
    /// login redirect, so it is part of this set.
    pub fn fails_fast(&self) -> bool {
        matches!(
            self,
            ErrorKind::AuthenticationError
                | ErrorKind::AuthorizationError
                | ErrorKind::NotFoundError
                | ErrorKind::ValidationError
        )
    }

    /// Kinds offered to the user as "try again".
    pub fn is_transient(&self) -> bool {
        matches!(
            self,
            ErrorKind::NetworkError | ErrorKind::TimeoutError | ErrorKind::ServerError
        )
    }

    /// Whether a server-supplied message may replace the localized template.
    ///
    /// Only client-facing 4xx bodies qualify; everything else always shows
    /// the template so backend internals never reach the user.
    pub fn prefers_server_message(&self) -> bool {
        matches!(
            self,
            ErrorKind::ValidationError | ErrorKind::ApiError | ErrorKind::NotFoundError
        )
    }
}

impl fmt::Display for ErrorKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// A failure mapped into the uniform error model.
///
/// Fields are private so the value cannot change after classification.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ClassifiedError {
    message: String,
    http_status: u16,
    kind: ErrorKind,
    #[serde(default)]
    details: BTreeMap<String, JsonValue>,
    timestamp: DateTime<Utc>,
}

impl ClassifiedError {
    /// Create an error of the given kind with no HTTP status.
    pub fn new(kind: ErrorKind, message: impl Into<String>) -> Self {
        Self {
            message: message.into(),
            http_status: 0,
            kind,
            details: BTreeMap::new(),
            timestamp: Utc::now(),
        }
    }

    /// A client-side shape violation, raised before any request is sent.
    pub fn validation(message: impl Into<String>) -> Self {
        Self::new(ErrorKind::ValidationError, message)
    }

    /// Set the HTTP status.
    pub fn with_status(mut self, status: u16) -> Self {
        self.http_status = status;
        self
    }

    /// Attach a detail entry.
    pub fn with_detail(mut self, key: impl Into<String>, value: impl Into<JsonValue>) -> Self {
        self.details.insert(key.into(), value.into());
        self
    }

    /// Human-readable message.
    pub fn message(&self) -> &str {
        &self.message
    }

    /// HTTP status, 0 for non-HTTP faults.
    pub fn http_status(&self) -> u16 {
        self.http_status
    }

    pub fn kind(&self) -> ErrorKind {
        self.kind
    }

    /// All diagnostic details.
    pub fn details(&self) -> &BTreeMap<String, JsonValue> {
        &self.details
    }

    pub fn detail(&self, key: &str) -> Option<&JsonValue> {
        self.details.get(key)
    }

    /// When the error was classified.
    pub fn timestamp(&self) -> DateTime<Utc> {
        self.timestamp
    }

    /// The call-site label, if one was given.
    pub fn context(&self) -> Option<&str> {
        self.details.get(DETAIL_CONTEXT).and_then(JsonValue::as_str)
    }

    /// The serialized original cause. Diagnostics only.
    pub fn original_error(&self) -> Option<&JsonValue> {
        self.details.get(DETAIL_ORIGINAL_ERROR)
    }

    /// Per-field validation messages reported by the server.
    pub fn field_errors(&self) -> BTreeMap<String, Vec<String>> {
        let Some(JsonValue::Object(fields)) = self.details.get(DETAIL_FIELD_ERRORS) else {
            return BTreeMap::new();
        };

        fields
            .iter()
            .map(|(field, messages)| {
                let messages = match messages {
                    JsonValue::Array(items) => items
                        .iter()
                        .filter_map(|m| m.as_str().map(str::to_string))
                        .collect(),
                    JsonValue::String(s) => vec![s.clone()],
                    _ => Vec::new(),
                };
                (field.clone(), messages)
            })
            .collect()
    }

    /// Shorthand for `kind().default_recovery()`.
    pub fn default_recovery(&self) -> RecoveryAction {
        self.kind.default_recovery()
    }
}

impl fmt::Display for ClassifiedError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.message)
    }
}

impl std::error::Error for ClassifiedError {}
