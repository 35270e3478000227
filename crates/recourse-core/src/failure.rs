//! Raw failures as they arrive from the transport layer.
//!
//! The classifier accepts anything a call site can catch: structured
//! transport failures, bare strings, loosely-shaped JSON objects,
//! platform errors, or nothing at all.

use serde::{Deserialize, Serialize};
use serde_json::{json, Map, Value as JsonValue};
use std::error::Error as StdError;
use std::io;

use crate::types::ClassifiedError;

/// An HTTP response attached to a failed request.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct HttpResponse {
    /// Status code
    pub status: u16,

    /// Response body, if any
    #[serde(default)]
    pub data: JsonValue,
}

impl HttpResponse {
    pub fn new(status: u16) -> Self {
        Self {
            status,
            data: JsonValue::Null,
        }
    }

    /// Attach a response body.
    pub fn with_data(mut self, data: JsonValue) -> Self {
        self.data = data;
        self
    }

    /// Attach a `{"message": ...}` body.
    pub fn with_message(self, message: impl Into<String>) -> Self {
        self.with_data(json!({ "message": message.into() }))
    }

    /// The server-supplied message, when the body carries a non-blank one.
    pub fn server_message(&self) -> Option<&str> {
        self.data
            .get("message")
            .and_then(JsonValue::as_str)
            .filter(|m| !m.trim().is_empty())
    }

    /// The `errors` object of a validation body, if present.
    pub fn field_errors(&self) -> Option<&JsonValue> {
        self.data.get("errors").filter(|e| e.is_object())
    }

    fn is_valid_status(status: u64) -> bool {
        (100..=599).contains(&status)
    }
}

/// A failure raised by the transport collaborator.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct TransportFailure {
    /// Transport error code (e.g. `ERR_NETWORK`, `ECONNABORTED`)
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub code: Option<String>,

    /// The failure's own message
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub message: Option<String>,

    /// Stack trace captured by the transport
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub stack: Option<String>,

    /// The response, when one was received
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub response: Option<HttpResponse>,

    /// Explicit deadline signal from the transport
    #[serde(default, skip_serializing_if = "std::ops::Not::not")]
    pub timed_out: bool,
}

impl TransportFailure {
    /// A request that never got a response.
    pub fn network(code: impl Into<String>) -> Self {
        Self {
            code: Some(code.into()),
            ..Default::default()
        }
    }

    /// A request that exceeded its deadline.
    pub fn timeout() -> Self {
        Self {
            code: Some("ECONNABORTED".to_string()),
            timed_out: true,
            ..Default::default()
        }
    }

    /// A request that received a non-success response.
    pub fn http(response: HttpResponse) -> Self {
        Self {
            response: Some(response),
            ..Default::default()
        }
    }

    pub fn with_message(mut self, message: impl Into<String>) -> Self {
        self.message = Some(message.into());
        self
    }

    pub fn with_stack(mut self, stack: impl Into<String>) -> Self {
        self.stack = Some(stack.into());
        self
    }

    /// Lift a loosely-shaped JSON object into a transport failure.
    ///
    /// Returns `None` unless the object looks like one: a `response` with a
    /// valid status, a string `code`, a `request` key, or `isAxiosError`.
    pub fn from_json(value: &JsonValue) -> Option<Self> {
        let object = value.as_object()?;

        let response = object.get("response").and_then(parse_response);
        let code = object
            .get("code")
            .and_then(JsonValue::as_str)
            .map(str::to_string);
        let flagged = object.contains_key("request")
            || object.get("isAxiosError").and_then(JsonValue::as_bool) == Some(true);

        if response.is_none() && code.is_none() && !flagged {
            return None;
        }

        Some(Self {
            code,
            message: string_field(object, "message"),
            stack: string_field(object, "stack"),
            response,
            timed_out: object
                .get("timedOut")
                .and_then(JsonValue::as_bool)
                .unwrap_or(false),
        })
    }
}

fn string_field(object: &Map<String, JsonValue>, key: &str) -> Option<String> {
    object.get(key).and_then(JsonValue::as_str).map(str::to_string)
}

fn parse_response(value: &JsonValue) -> Option<HttpResponse> {
    let object = value.as_object()?;
    let status = match object.get("status")? {
        JsonValue::Number(n) => n.as_u64()?,
        JsonValue::String(s) => s.trim().parse::<u64>().ok()?,
        _ => return None,
    };

    if !HttpResponse::is_valid_status(status) {
        return None;
    }

    Some(HttpResponse {
        status: status as u16,
        data: object.get("data").cloned().unwrap_or(JsonValue::Null),
    })
}

/// Anything a call site can catch.
#[derive(Debug, Default)]
pub enum RawFailure {
    /// Already classified; passes through unchanged
    Classified(ClassifiedError),

    /// Structured transport failure
    Transport(TransportFailure),

    /// A thrown string
    Message(String),

    /// A loosely-shaped value (`null` included)
    Json(JsonValue),

    /// A platform error
    Error(Box<dyn StdError + Send + Sync>),

    /// Nothing was thrown
    #[default]
    Empty,
}

impl RawFailure {
    /// Wrap any platform error.
    pub fn error<E>(error: E) -> Self
    where
        E: StdError + Send + Sync + 'static,
    {
        RawFailure::Error(Box::new(error))
    }

    /// Parse a JSON document, keeping non-JSON input as a plain message.
    pub fn parse(input: &str) -> Self {
        match serde_json::from_str::<JsonValue>(input) {
            Ok(value) => RawFailure::Json(value),
            Err(_) => RawFailure::Message(input.trim().to_string()),
        }
    }
}

impl From<ClassifiedError> for RawFailure {
    fn from(error: ClassifiedError) -> Self {
        RawFailure::Classified(error)
    }
}

impl From<TransportFailure> for RawFailure {
    fn from(failure: TransportFailure) -> Self {
        RawFailure::Transport(failure)
    }
}

impl From<HttpResponse> for RawFailure {
    fn from(response: HttpResponse) -> Self {
        RawFailure::Transport(TransportFailure::http(response))
    }
}

impl From<String> for RawFailure {
    fn from(message: String) -> Self {
        RawFailure::Message(message)
    }
}

impl From<&str> for RawFailure {
    fn from(message: &str) -> Self {
        RawFailure::Message(message.to_string())
    }
}

impl From<JsonValue> for RawFailure {
    fn from(value: JsonValue) -> Self {
        RawFailure::Json(value)
    }
}

impl From<io::Error> for RawFailure {
    fn from(error: io::Error) -> Self {
        match connection_code(error.kind()) {
            Some(code) => RawFailure::Transport(TransportFailure {
                code: Some(code.to_string()),
                message: Some(error.to_string()),
                timed_out: error.kind() == io::ErrorKind::TimedOut,
                ..Default::default()
            }),
            None => RawFailure::error(error),
        }
    }
}

impl From<Box<dyn StdError + Send + Sync>> for RawFailure {
    fn from(error: Box<dyn StdError + Send + Sync>) -> Self {
        RawFailure::Error(error)
    }
}

/// Transport code for I/O error kinds that mean "no connection".
pub(crate) fn connection_code(kind: io::ErrorKind) -> Option<&'static str> {
    match kind {
        io::ErrorKind::TimedOut => Some("ETIMEDOUT"),
        io::ErrorKind::ConnectionRefused => Some("ECONNREFUSED"),
        io::ErrorKind::ConnectionReset => Some("ECONNRESET"),
        io::ErrorKind::ConnectionAborted => Some("ERR_CONNECTION_ABORTED"),
        io::ErrorKind::NotConnected => Some("ENOTCONN"),
        io::ErrorKind::BrokenPipe => Some("EPIPE"),
        _ => None,
    }
}
