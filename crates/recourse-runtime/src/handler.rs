//! The error handler.
//!
//! Owns the classifier, executor, error log, notifications and recovery
//! dispatcher for one application. Build it once with
//! [`ErrorHandlerBuilder`] and share it as `Arc<ErrorHandler>`.

use parking_lot::RwLock;
use recourse_core::{
    display_message, ClassifiedError, Classifier, ErrorKind, RawFailure, RecoveryDecision,
};
use std::collections::BTreeMap;
use std::future::Future;
use std::sync::Arc;
use tokio::sync::broadcast;

use crate::config::RuntimeConfig;
use crate::executor::ResilientExecutor;
use crate::observability::{
    ErrorLog, ErrorLogEntry, Notification, NotificationCenter, NotificationEvent, NotificationSink,
};
use crate::recovery::{Navigator, RecoveryDispatcher, RecoveryOutcome, SessionStore};
use crate::resilience::{ExecutionPolicy, RetryPolicy};
use crate::RuntimeError;

/// Classifies, retries, logs, notifies and recovers.
pub struct ErrorHandler {
    config: RuntimeConfig,
    executor: ResilientExecutor,
    log: ErrorLog,
    notifications: NotificationCenter,
    recovery: RecoveryDispatcher,
    last_error: RwLock<Option<ClassifiedError>>,
}

impl ErrorHandler {
    /// Start building a handler.
    pub fn builder() -> ErrorHandlerBuilder {
        ErrorHandlerBuilder::new()
    }

    pub fn config(&self) -> &RuntimeConfig {
        &self.config
    }

    /// Classify anything into a [`ClassifiedError`].
    pub fn classify(&self, raw: impl Into<RawFailure>, context: Option<&str>) -> ClassifiedError {
        self.executor.classifier().classify(raw, context)
    }

    /// Run `op` once. On failure the error is logged, notified and
    /// recovered before being returned.
    pub async fn execute<T, E, F, Fut>(
        &self,
        op: F,
        context: Option<&str>,
    ) -> Result<T, ClassifiedError>
    where
        F: FnMut() -> Fut,
        Fut: Future<Output = Result<T, E>>,
        E: Into<RawFailure>,
    {
        self.execute_with_policy(op, context, ExecutionPolicy::default()).await
    }

    /// Like [`execute`](Self::execute) with up to `max_attempts` attempts
    /// (the configured default when `None`).
    pub async fn execute_with_retry<T, E, F, Fut>(
        &self,
        op: F,
        context: Option<&str>,
        max_attempts: Option<u32>,
    ) -> Result<T, ClassifiedError>
    where
        F: FnMut() -> Fut,
        Fut: Future<Output = Result<T, E>>,
        E: Into<RawFailure>,
    {
        let retry = RetryPolicy::linear(
            max_attempts.unwrap_or(self.config.max_attempts),
            self.config.base_delay,
        );
        self.execute_with_policy(op, context, ExecutionPolicy::new(retry)).await
    }

    /// Run `op` under an explicit policy.
    pub async fn execute_with_policy<T, E, F, Fut>(
        &self,
        op: F,
        context: Option<&str>,
        policy: ExecutionPolicy,
    ) -> Result<T, ClassifiedError>
    where
        F: FnMut() -> Fut,
        Fut: Future<Output = Result<T, E>>,
        E: Into<RawFailure>,
    {
        match self.executor.run(op, context, &policy.retry).await {
            Ok(value) => {
                *self.last_error.write() = None;
                // A later 401 is a new expiry, not a duplicate of the last one
                self.recovery.reset();
                Ok(value)
            }
            Err(error) => {
                self.surface(&error, &policy).await;
                Err(error)
            }
        }
    }

    /// Surface a failure caught outside the executor.
    ///
    /// Classifies `raw`, logs it, and notifies and recovers per `policy`.
    /// The retry part of `policy` is ignored.
    pub async fn handle_error(
        &self,
        raw: impl Into<RawFailure>,
        context: Option<&str>,
        policy: ExecutionPolicy,
    ) -> ClassifiedError {
        let error = self.classify(raw, context);
        self.surface(&error, &policy).await;
        error
    }

    async fn surface(&self, error: &ClassifiedError, policy: &ExecutionPolicy) {
        self.log.record(error);
        *self.last_error.write() = Some(error.clone());

        if policy.notify {
            self.notifications
                .notify(error.kind(), self.get_error_message(error))
                .await;
        }
        if policy.recover {
            self.recovery.recover(error).await;
        }
    }

    /// Localized, display-safe message for `error`.
    pub fn get_error_message(&self, error: &ClassifiedError) -> String {
        display_message(error, self.config.locale)
    }

    pub fn get_error_log(&self) -> Vec<ErrorLogEntry> {
        self.log.entries()
    }

    pub fn clear_error_log(&self) {
        self.log.clear();
    }

    pub fn get_error_count(&self) -> usize {
        self.log.len()
    }

    /// Logged errors per kind.
    pub fn error_stats(&self) -> BTreeMap<ErrorKind, usize> {
        self.log.stats()
    }

    /// Pretty JSON of the error log, for bug reports.
    pub fn export_error_log(&self) -> serde_json::Result<String> {
        self.log.export_json()
    }

    /// The most recent surfaced error, cleared by the next success.
    pub fn last_error(&self) -> Option<ClassifiedError> {
        self.last_error.read().clone()
    }

    pub fn decide(&self, error: &ClassifiedError) -> RecoveryDecision {
        self.recovery.decide(error)
    }

    /// Apply the recovery action for `error`.
    pub async fn recover(&self, error: &ClassifiedError) -> RecoveryOutcome {
        self.recovery.recover(error).await
    }

    /// Re-arm the login redirect after the user signs in again.
    pub fn reset_recovery(&self) {
        self.recovery.reset();
    }

    pub fn subscribe_notifications(&self) -> broadcast::Receiver<NotificationEvent> {
        self.notifications.subscribe()
    }

    pub fn active_notifications(&self) -> Vec<Notification> {
        self.notifications.active()
    }

    pub fn dismiss_notification(&self, id: u64) -> bool {
        self.notifications.dismiss(id)
    }
}

/// Builder for [`ErrorHandler`].
pub struct ErrorHandlerBuilder {
    config: RuntimeConfig,
    session: Option<Arc<dyn SessionStore>>,
    navigator: Option<Arc<dyn Navigator>>,
    sinks: Vec<Arc<dyn NotificationSink>>,
}

impl ErrorHandlerBuilder {
    pub fn new() -> Self {
        Self {
            config: RuntimeConfig::default(),
            session: None,
            navigator: None,
            sinks: Vec::new(),
        }
    }

    pub fn config(mut self, config: RuntimeConfig) -> Self {
        self.config = config;
        self
    }

    pub fn session_store(mut self, session: Arc<dyn SessionStore>) -> Self {
        self.session = Some(session);
        self
    }

    pub fn navigator(mut self, navigator: Arc<dyn Navigator>) -> Self {
        self.navigator = Some(navigator);
        self
    }

    /// Register a notification renderer.
    pub fn notification_sink(mut self, sink: Arc<dyn NotificationSink>) -> Self {
        self.sinks.push(sink);
        self
    }

    /// Build the handler.
    pub fn build(self) -> Result<ErrorHandler, RuntimeError> {
        self.config.validate()?;

        let session = self
            .session
            .ok_or_else(|| RuntimeError::NotConfigured("No session store set".to_string()))?;
        let navigator = self
            .navigator
            .ok_or_else(|| RuntimeError::NotConfigured("No navigator set".to_string()))?;

        let notifications =
            NotificationCenter::new(self.config.notification_ttl, self.config.dedup_window);
        for sink in self.sinks {
            notifications.add_sink(sink);
        }

        Ok(ErrorHandler {
            executor: ResilientExecutor::new(Classifier::with_locale(self.config.locale)),
            log: ErrorLog::new(self.config.log_capacity, self.config.environment),
            notifications,
            recovery: RecoveryDispatcher::new(session, navigator),
            last_error: RwLock::new(None),
            config: self.config,
        })
    }
}

impl Default for ErrorHandlerBuilder {
    fn default() -> Self {
        Self::new()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::recovery::testing::{MemorySession, RecordingNavigator};
    use recourse_core::{template, HttpResponse, Locale, TransportFailure};
    use serde_json::json;
    use std::sync::atomic::{AtomicU32, Ordering};
    use std::time::Duration;

    struct Fixture {
        handler: ErrorHandler,
        session: Arc<MemorySession>,
        navigator: Arc<RecordingNavigator>,
    }

    fn fixture(config: RuntimeConfig) -> Fixture {
        let session = Arc::new(MemorySession::default());
        let navigator = Arc::new(RecordingNavigator::default());
        let handler = ErrorHandler::builder()
            .config(config)
            .session_store(session.clone())
            .navigator(navigator.clone())
            .build()
            .unwrap();

        Fixture {
            handler,
            session,
            navigator,
        }
    }

    #[test]
    fn test_builder_requires_collaborators() {
        let missing_session = ErrorHandler::builder()
            .navigator(Arc::new(RecordingNavigator::default()))
            .build();
        assert!(matches!(missing_session, Err(RuntimeError::NotConfigured(_))));

        let missing_navigator = ErrorHandler::builder()
            .session_store(Arc::new(MemorySession::default()))
            .build();
        assert!(matches!(missing_navigator, Err(RuntimeError::NotConfigured(_))));
    }

    #[test]
    fn test_builder_rejects_invalid_config() {
        let config = RuntimeConfig {
            log_capacity: 0,
            ..Default::default()
        };
        let result = ErrorHandler::builder()
            .config(config)
            .session_store(Arc::new(MemorySession::default()))
            .navigator(Arc::new(RecordingNavigator::default()))
            .build();
        assert!(matches!(result, Err(RuntimeError::Config(_))));
    }

    #[tokio::test]
    async fn test_unauthorized_redirects_to_login() {
        let fx = fixture(RuntimeConfig::default());
        let calls = AtomicU32::new(0);

        let result = fx
            .handler
            .execute(
                || {
                    calls.fetch_add(1, Ordering::SeqCst);
                    async { Err::<(), _>(json!({ "response": { "status": 401 } })) }
                },
                Some("dashboard.load"),
            )
            .await;

        let error = result.unwrap_err();
        assert_eq!(error.kind(), ErrorKind::AuthenticationError);
        assert_eq!(calls.load(Ordering::SeqCst), 1);

        let log = fx.handler.get_error_log();
        assert_eq!(log.len(), 1);
        assert_eq!(log[0].kind(), ErrorKind::AuthenticationError);
        assert_eq!(log[0].context.as_deref(), Some("dashboard.load"));

        assert_eq!(*fx.session.clears.lock(), 1);
        assert_eq!(*fx.navigator.logins.lock(), 1);
        assert_eq!(fx.handler.last_error(), Some(error));
    }

    #[tokio::test]
    async fn test_each_expiry_after_success_redirects() {
        let fx = fixture(RuntimeConfig::default());

        let _ = fx
            .handler
            .execute(|| async { Err::<(), _>(HttpResponse::new(401)) }, None)
            .await;
        let _ = fx
            .handler
            .execute(|| async { Ok::<_, HttpResponse>(()) }, None)
            .await;
        let _ = fx
            .handler
            .execute(|| async { Err::<(), _>(HttpResponse::new(401)) }, None)
            .await;

        assert_eq!(fx.handler.get_error_count(), 2);
        assert_eq!(*fx.session.clears.lock(), 2);
        assert_eq!(*fx.navigator.logins.lock(), 2);
    }

    #[tokio::test]
    async fn test_back_to_back_expiries_redirect_once() {
        let fx = fixture(RuntimeConfig::default());

        for _ in 0..2 {
            let _ = fx
                .handler
                .execute(|| async { Err::<(), _>(HttpResponse::new(401)) }, None)
                .await;
        }

        assert_eq!(fx.handler.get_error_count(), 2);
        assert_eq!(*fx.navigator.logins.lock(), 1);
    }

    #[tokio::test]
    async fn test_handle_error_surfaces_caught_failure() {
        let fx = fixture(RuntimeConfig::default());

        let error = fx
            .handler
            .handle_error(
                TransportFailure::network("ERR_NETWORK"),
                Some("upload.avatar"),
                ExecutionPolicy::default(),
            )
            .await;

        assert_eq!(error.kind(), ErrorKind::NetworkError);
        assert_eq!(fx.handler.get_error_count(), 1);
        assert_eq!(
            fx.handler.get_error_log()[0].context.as_deref(),
            Some("upload.avatar")
        );
        assert_eq!(fx.handler.last_error(), Some(error.clone()));

        let active = fx.handler.active_notifications();
        assert_eq!(active.len(), 1);
        assert_eq!(active[0].message, fx.handler.get_error_message(&error));
    }

    #[tokio::test]
    async fn test_handle_error_runs_recovery() {
        let fx = fixture(RuntimeConfig::default());

        let error = fx
            .handler
            .handle_error(HttpResponse::new(401), None, ExecutionPolicy::default())
            .await;

        assert_eq!(error.kind(), ErrorKind::AuthenticationError);
        assert_eq!(*fx.session.clears.lock(), 1);
        assert_eq!(*fx.navigator.logins.lock(), 1);

        let quiet = ExecutionPolicy::default()
            .without_notification()
            .without_recovery();
        fx.handler.handle_error(HttpResponse::new(500), None, quiet).await;
        assert_eq!(fx.handler.get_error_count(), 2);
        assert_eq!(fx.handler.active_notifications().len(), 1);
    }

    #[tokio::test(start_paused = true)]
    async fn test_network_failures_then_success() {
        let fx = fixture(RuntimeConfig::default());
        let calls = AtomicU32::new(0);

        let result = fx
            .handler
            .execute_with_retry(
                || {
                    let n = calls.fetch_add(1, Ordering::SeqCst) + 1;
                    async move {
                        if n <= 2 {
                            Err(TransportFailure::network("ERR_NETWORK"))
                        } else {
                            Ok("ok")
                        }
                    }
                },
                Some("sync.pull"),
                Some(3),
            )
            .await;

        assert_eq!(result.unwrap(), "ok");
        assert_eq!(calls.load(Ordering::SeqCst), 3);
        assert_eq!(fx.handler.get_error_count(), 0);
        assert!(fx.handler.last_error().is_none());
        assert!(fx.handler.active_notifications().is_empty());
    }

    #[tokio::test]
    async fn test_validation_message_shown_verbatim() {
        let fx = fixture(RuntimeConfig::default());
        let calls = AtomicU32::new(0);

        let error = fx
            .handler
            .execute_with_retry(
                || {
                    calls.fetch_add(1, Ordering::SeqCst);
                    async {
                        Err::<(), _>(TransportFailure::http(
                            HttpResponse::new(422).with_message("Nama wajib diisi"),
                        ))
                    }
                },
                Some("customers.save"),
                None,
            )
            .await
            .unwrap_err();

        assert_eq!(error.kind(), ErrorKind::ValidationError);
        assert_eq!(fx.handler.get_error_message(&error), "Nama wajib diisi");
        assert_eq!(calls.load(Ordering::SeqCst), 1);

        let active = fx.handler.active_notifications();
        assert_eq!(active.len(), 1);
        assert_eq!(active[0].message, "Nama wajib diisi");
    }

    #[tokio::test(start_paused = true)]
    async fn test_server_error_retry_bound() {
        let fx = fixture(RuntimeConfig::default());
        let calls = AtomicU32::new(0);

        let error = fx
            .handler
            .execute_with_retry(
                || {
                    calls.fetch_add(1, Ordering::SeqCst);
                    async { Err::<(), _>(HttpResponse::new(500).with_message("SQLSTATE[42S02]")) }
                },
                None,
                None,
            )
            .await
            .unwrap_err();

        assert_eq!(calls.load(Ordering::SeqCst), 3);
        assert_eq!(fx.handler.get_error_count(), 1);
        assert_eq!(
            fx.handler.get_error_message(&error),
            template(ErrorKind::ServerError, Locale::Indonesian)
        );
        assert!(fx.handler.decide(&error).recoverable);
    }

    #[tokio::test]
    async fn test_policy_switches_skip_side_effects() {
        let fx = fixture(RuntimeConfig::default());
        let policy = ExecutionPolicy::default()
            .without_notification()
            .without_recovery();

        let result = fx
            .handler
            .execute_with_policy(
                || async { Err::<(), _>(HttpResponse::new(401)) },
                None,
                policy,
            )
            .await;

        assert!(result.is_err());
        // Logging is unconditional
        assert_eq!(fx.handler.get_error_count(), 1);
        assert!(fx.handler.active_notifications().is_empty());
        assert_eq!(*fx.session.clears.lock(), 0);
        assert_eq!(*fx.navigator.logins.lock(), 0);
    }

    #[tokio::test]
    async fn test_success_clears_last_error() {
        let fx = fixture(RuntimeConfig::default());

        let _ = fx
            .handler
            .execute(|| async { Err::<(), _>(HttpResponse::new(404)) }, None)
            .await;
        assert!(fx.handler.last_error().is_some());

        let value = fx
            .handler
            .execute(|| async { Ok::<_, HttpResponse>(7) }, None)
            .await;
        assert_eq!(value.ok(), Some(7));
        assert!(fx.handler.last_error().is_none());
        // The log keeps history
        assert_eq!(fx.handler.get_error_count(), 1);
    }

    #[tokio::test]
    async fn test_stats_export_and_clear() {
        let fx = fixture(RuntimeConfig {
            locale: Locale::English,
            ..Default::default()
        });

        for status in [404, 404, 403] {
            let _ = fx
                .handler
                .execute(move || async move { Err::<(), _>(HttpResponse::new(status)) }, None)
                .await;
        }

        let stats = fx.handler.error_stats();
        assert_eq!(stats.get(&ErrorKind::NotFoundError), Some(&2));
        assert_eq!(stats.get(&ErrorKind::AuthorizationError), Some(&1));

        let exported: Vec<ErrorLogEntry> =
            serde_json::from_str(&fx.handler.export_error_log().unwrap()).unwrap();
        assert_eq!(exported.len(), 3);

        fx.handler.clear_error_log();
        assert_eq!(fx.handler.get_error_count(), 0);
        assert!(fx.handler.error_stats().is_empty());
    }

    #[tokio::test(start_paused = true)]
    async fn test_notification_dismisses_after_ttl() {
        let fx = fixture(RuntimeConfig {
            notification_ttl: Duration::from_secs(5),
            ..Default::default()
        });
        let mut events = fx.handler.subscribe_notifications();

        let _ = fx
            .handler
            .execute(|| async { Err::<(), _>(TransportFailure::timeout()) }, None)
            .await;

        let shown = match events.recv().await.unwrap() {
            NotificationEvent::Shown(n) => n,
            other => panic!("unexpected event: {other:?}"),
        };
        assert_eq!(shown.kind, ErrorKind::TimeoutError);
        assert_eq!(fx.handler.active_notifications().len(), 1);

        assert_eq!(
            events.recv().await.unwrap(),
            NotificationEvent::Dismissed { id: shown.id }
        );
        assert!(fx.handler.active_notifications().is_empty());
    }

    #[tokio::test]
    async fn test_classify_uses_handler_locale() {
        let fx = fixture(RuntimeConfig {
            locale: Locale::English,
            ..Default::default()
        });

        let error = fx.handler.classify(TransportFailure::network("ERR_NETWORK"), None);
        assert_eq!(error.kind(), ErrorKind::NetworkError);
        assert_eq!(
            fx.handler.get_error_message(&error),
            template(ErrorKind::NetworkError, Locale::English)
        );
    }
}
