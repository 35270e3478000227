//! Bounded, handler-wide error log.

use chrono::{DateTime, Utc};
use parking_lot::RwLock;
use recourse_core::{ClassifiedError, ErrorKind};
use serde::{Deserialize, Serialize};
use serde_json::Value as JsonValue;
use std::collections::{BTreeMap, VecDeque};

use crate::config::Environment;

/// One surfaced error.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ErrorLogEntry {
    /// When the error was recorded
    pub timestamp: DateTime<Utc>,

    /// The error as classified, details included
    pub classified_error: ClassifiedError,

    /// Call-site label
    #[serde(skip_serializing_if = "Option::is_none")]
    pub context: Option<String>,
}

impl ErrorLogEntry {
    pub fn new(error: &ClassifiedError) -> Self {
        Self {
            timestamp: Utc::now(),
            classified_error: error.clone(),
            context: error.context().map(str::to_string),
        }
    }

    pub fn kind(&self) -> ErrorKind {
        self.classified_error.kind()
    }

    /// HTTP status, 0 when none
    pub fn status(&self) -> u16 {
        self.classified_error.http_status()
    }

    /// Internal message, never shown to users
    pub fn message(&self) -> &str {
        self.classified_error.message()
    }

    /// Serialized cause
    pub fn cause(&self) -> Option<&JsonValue> {
        self.classified_error.original_error()
    }
}

/// Ring buffer of surfaced errors.
///
/// Oldest entries are evicted once `capacity` is reached. Outside
/// production every recorded error is mirrored to `tracing` at `error`.
pub struct ErrorLog {
    entries: RwLock<VecDeque<ErrorLogEntry>>,
    capacity: usize,
    environment: Environment,
}

impl ErrorLog {
    pub fn new(capacity: usize, environment: Environment) -> Self {
        let capacity = capacity.max(1);
        Self {
            entries: RwLock::new(VecDeque::with_capacity(capacity)),
            capacity,
            environment,
        }
    }

    /// Append an error, evicting the oldest entry when full.
    pub fn record(&self, error: &ClassifiedError) -> ErrorLogEntry {
        let entry = ErrorLogEntry::new(error);

        {
            let mut entries = self.entries.write();
            if entries.len() == self.capacity {
                entries.pop_front();
            }
            entries.push_back(entry.clone());
        }

        if !self.environment.is_production() {
            tracing::error!(
                kind = %entry.kind(),
                status = entry.status(),
                context = entry.context.as_deref().unwrap_or("-"),
                cause = ?entry.cause(),
                "{}",
                entry.message()
            );
        }

        entry
    }

    /// Snapshot, oldest first.
    pub fn entries(&self) -> Vec<ErrorLogEntry> {
        self.entries.read().iter().cloned().collect()
    }

    pub fn clear(&self) {
        self.entries.write().clear();
    }

    pub fn len(&self) -> usize {
        self.entries.read().len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.read().is_empty()
    }

    pub fn capacity(&self) -> usize {
        self.capacity
    }

    /// Count of logged errors per kind.
    pub fn stats(&self) -> BTreeMap<ErrorKind, usize> {
        let mut stats = BTreeMap::new();
        for entry in self.entries.read().iter() {
            *stats.entry(entry.kind()).or_insert(0) += 1;
        }
        stats
    }

    /// Pretty JSON of the whole log.
    pub fn export_json(&self) -> serde_json::Result<String> {
        serde_json::to_string_pretty(&self.entries())
    }
}

impl Default for ErrorLog {
    fn default() -> Self {
        Self::new(200, Environment::default())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use recourse_core::{classify, HttpResponse};

    #[test]
    fn test_record_and_clear() {
        let log = ErrorLog::default();
        assert!(log.is_empty());

        let entry = log.record(&classify(HttpResponse::new(500), Some("orders.list")));
        assert_eq!(entry.kind(), ErrorKind::ServerError);
        assert_eq!(entry.status(), 500);
        assert_eq!(entry.context.as_deref(), Some("orders.list"));
        assert_eq!(log.len(), 1);

        log.clear();
        assert!(log.is_empty());
    }

    #[test]
    fn test_ring_evicts_oldest() {
        let log = ErrorLog::new(2, Environment::Production);
        log.record(&ClassifiedError::new(ErrorKind::NetworkError, "first"));
        log.record(&ClassifiedError::new(ErrorKind::TimeoutError, "second"));
        log.record(&ClassifiedError::new(ErrorKind::ServerError, "third"));

        let messages: Vec<_> = log
            .entries()
            .iter()
            .map(|e| e.message().to_string())
            .collect();
        assert_eq!(messages, vec!["second", "third"]);
        assert_eq!(log.capacity(), 2);
    }

    #[test]
    fn test_zero_capacity_clamped() {
        let log = ErrorLog::new(0, Environment::Production);
        log.record(&ClassifiedError::new(ErrorKind::NetworkError, "a"));
        assert_eq!(log.len(), 1);
    }

    #[test]
    fn test_stats_per_kind() {
        let log = ErrorLog::default();
        log.record(&ClassifiedError::new(ErrorKind::NetworkError, "a"));
        log.record(&ClassifiedError::new(ErrorKind::NetworkError, "b"));
        log.record(&ClassifiedError::validation("c"));

        let stats = log.stats();
        assert_eq!(stats.get(&ErrorKind::NetworkError), Some(&2));
        assert_eq!(stats.get(&ErrorKind::ValidationError), Some(&1));
        assert_eq!(stats.get(&ErrorKind::ServerError), None);
    }

    #[test]
    fn test_export_json() {
        let log = ErrorLog::default();
        log.record(&classify(HttpResponse::new(404), Some("users.show")));

        let exported: Vec<ErrorLogEntry> =
            serde_json::from_str(&log.export_json().unwrap()).unwrap();
        assert_eq!(exported, log.entries());
        assert!(log.export_json().unwrap().contains("\"classifiedError\""));
    }

    #[test]
    fn test_entry_keeps_details() {
        let log = ErrorLog::default();
        let response = HttpResponse::new(422).with_data(serde_json::json!({
            "message": "Data tidak valid",
            "errors": { "email": ["Email sudah dipakai"] }
        }));
        log.record(&classify(response, Some("users.create")));

        let entry = &log.entries()[0];
        assert_eq!(entry.kind(), ErrorKind::ValidationError);
        assert_eq!(
            entry.classified_error.field_errors()["email"],
            vec!["Email sudah dipakai".to_string()]
        );
        assert!(entry.cause().is_some());
    }
}
