//! Classifier: maps any caught failure into a [`ClassifiedError`].
//!
//! Rules are applied in a fixed order and the first match wins:
//! 1. Already classified → returned unchanged
//! 2. No response received → `NetworkError` (or `TimeoutError` on a deadline signal)
//! 3. Cross-origin marker in the message → `CorsError`
//! 4. HTTP response present → status mapping
//! 5. Anything else → `UnknownError`
//!
//! Classification never panics and never fails.

pub mod patterns;

use serde_json::{json, Value as JsonValue};
use std::error::Error as StdError;

use crate::failure::{connection_code, HttpResponse, RawFailure, TransportFailure};
use crate::messages::{self, Locale};
use crate::types::{
    ClassifiedError, ErrorKind, DETAIL_CONTEXT, DETAIL_FIELD_ERRORS, DETAIL_ORIGINAL_ERROR,
};

pub use patterns::{is_cross_origin_message, is_timeout_code, is_timeout_message};

/// Map an HTTP status to a kind.
///
/// Returns `None` for 2xx, which is not a failure status.
pub fn kind_for_status(status: u16) -> Option<ErrorKind> {
    match status {
        200..=299 => None,
        400 | 422 => Some(ErrorKind::ValidationError),
        401 => Some(ErrorKind::AuthenticationError),
        403 => Some(ErrorKind::AuthorizationError),
        404 => Some(ErrorKind::NotFoundError),
        500..=599 => Some(ErrorKind::ServerError),
        _ => Some(ErrorKind::ApiError),
    }
}

/// Normalized view of a raw failure.
#[derive(Debug, Default)]
struct Observation {
    transport: bool,
    code: Option<String>,
    message: Option<String>,
    response: Option<HttpResponse>,
    timed_out: bool,
    original: JsonValue,
}

impl Observation {
    fn from_transport(failure: TransportFailure) -> Self {
        let original = serde_json::to_value(&failure).unwrap_or(JsonValue::Null);
        Self {
            transport: true,
            code: failure.code,
            message: failure.message,
            response: failure.response,
            timed_out: failure.timed_out,
            original,
        }
    }

    fn from_message(message: String) -> Self {
        Self {
            original: json!({ "message": message }),
            message: Some(message),
            ..Default::default()
        }
    }

    fn from_json(value: JsonValue) -> Self {
        if let Some(failure) = TransportFailure::from_json(&value) {
            return Self {
                original: value,
                ..Self::from_transport(failure)
            };
        }

        let message = match &value {
            JsonValue::String(s) => Some(s.clone()),
            JsonValue::Object(object) => object
                .get("message")
                .and_then(JsonValue::as_str)
                .map(str::to_string),
            _ => None,
        };

        Self {
            message,
            original: value,
            ..Default::default()
        }
    }

    fn from_error(error: Box<dyn StdError + Send + Sync>) -> Self {
        let message = error.to_string();
        let root: &(dyn StdError + 'static) = &*error;
        let sources: Vec<String> = error_chain(root)
            .skip(1)
            .map(|e| e.to_string())
            .collect();
        let original = json!({ "message": message, "sources": sources });

        // Clients wrap the socket error, so look through the whole chain
        let code = error_chain(root).find_map(|e| {
            e.downcast_ref::<std::io::Error>()
                .and_then(|io| connection_code(io.kind()))
        });
        let timed_out = code.is_some_and(patterns::is_timeout_code)
            || error_chain(root).any(|e| patterns::is_timeout_message(&e.to_string()));

        if code.is_some() || timed_out {
            return Self {
                transport: true,
                timed_out,
                code: code.map(str::to_string),
                message: Some(message),
                original,
                ..Default::default()
            };
        }

        Self {
            message: Some(message),
            original,
            ..Default::default()
        }
    }

    fn signals_deadline(&self) -> bool {
        self.timed_out
            || self.code.as_deref().is_some_and(patterns::is_timeout_code)
            || self.message.as_deref().is_some_and(patterns::is_timeout_message)
    }

    fn kind(&self) -> ErrorKind {
        if self.transport && self.response.is_none() {
            return if self.signals_deadline() {
                ErrorKind::TimeoutError
            } else {
                ErrorKind::NetworkError
            };
        }

        if self.message.as_deref().is_some_and(patterns::is_cross_origin_message) {
            return ErrorKind::CorsError;
        }

        self.response
            .as_ref()
            .and_then(|response| kind_for_status(response.status))
            .unwrap_or(ErrorKind::UnknownError)
    }
}

/// The error followed by its `source()` chain.
fn error_chain<'a>(
    error: &'a (dyn StdError + 'static),
) -> impl Iterator<Item = &'a (dyn StdError + 'static)> {
    std::iter::successors(Some(error), |&e| e.source())
}

/// The failure classifier.
#[derive(Debug, Clone, Copy, Default)]
pub struct Classifier {
    locale: Locale,
}

impl Classifier {
    /// Create a classifier with the default (Indonesian) catalog.
    pub fn new() -> Self {
        Self::default()
    }

    /// Create a classifier for a specific message catalog.
    pub fn with_locale(locale: Locale) -> Self {
        Self { locale }
    }

    pub fn locale(&self) -> Locale {
        self.locale
    }

    /// Classify a raw failure.
    ///
    /// # Arguments
    ///
    /// * `raw` - Anything convertible into a [`RawFailure`]
    /// * `context` - Optional call-site label, kept for diagnostics only
    pub fn classify(&self, raw: impl Into<RawFailure>, context: Option<&str>) -> ClassifiedError {
        let observation = match raw.into() {
            RawFailure::Classified(error) => return error,
            RawFailure::Transport(failure) => Observation::from_transport(failure),
            RawFailure::Message(message) => Observation::from_message(message),
            RawFailure::Json(value) => Observation::from_json(value),
            RawFailure::Error(error) => Observation::from_error(error),
            RawFailure::Empty => Observation::default(),
        };

        let kind = observation.kind();
        let server_message = observation
            .response
            .as_ref()
            .and_then(HttpResponse::server_message);
        let message = messages::resolve(kind, server_message, self.locale);
        let status = observation.response.as_ref().map_or(0, |r| r.status);

        if kind == ErrorKind::UnknownError {
            tracing::debug!(context = ?context, "Failure matched no classification rule");
        }

        let mut error = ClassifiedError::new(kind, message)
            .with_status(status)
            .with_detail(DETAIL_CONTEXT, context.map_or(JsonValue::Null, JsonValue::from));

        if kind == ErrorKind::ValidationError {
            let fields = observation
                .response
                .as_ref()
                .and_then(HttpResponse::field_errors);
            if let Some(fields) = fields {
                error = error.with_detail(DETAIL_FIELD_ERRORS, fields.clone());
            }
        }

        error.with_detail(DETAIL_ORIGINAL_ERROR, observation.original)
    }
}

/// Classify with the default classifier.
pub fn classify(raw: impl Into<RawFailure>, context: Option<&str>) -> ClassifiedError {
    Classifier::new().classify(raw, context)
}
