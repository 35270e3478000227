//! Retry loop.
//!
//! Runs an operation under a [`RetryPolicy`], classifying every failure.
//! Fail-fast kinds stop immediately; everything else is retried with
//! linear backoff until the attempt budget is spent. Surfacing the final
//! error (log, notify, recover) is the handler's job.

use backon::Retryable;
use parking_lot::Mutex;
use recourse_core::{ClassifiedError, Classifier, RawFailure};
use std::future::Future;
use std::time::Duration;

use crate::resilience::{RetryPolicy, RetryState};

/// Classifying retry executor.
#[derive(Debug, Clone, Copy, Default)]
pub struct ResilientExecutor {
    classifier: Classifier,
}

impl ResilientExecutor {
    pub fn new(classifier: Classifier) -> Self {
        Self { classifier }
    }

    pub fn classifier(&self) -> Classifier {
        self.classifier
    }

    /// Run `op` until it succeeds, fails fast, or exhausts `policy`.
    ///
    /// Attempts are strictly sequential. The returned error is the
    /// classification of the last failure.
    pub async fn run<T, E, F, Fut>(
        &self,
        mut op: F,
        context: Option<&str>,
        policy: &RetryPolicy,
    ) -> Result<T, ClassifiedError>
    where
        F: FnMut() -> Fut,
        Fut: Future<Output = Result<T, E>>,
        E: Into<RawFailure>,
    {
        let classifier = self.classifier;
        let state = Mutex::new(RetryState::new(policy.max_attempts()));

        let attempt = || {
            let number = state.lock().begin_attempt();
            let pending = op();
            let state = &state;
            async move {
                pending.await.map_err(|failure| {
                    let error = classifier.classify(failure, context);
                    tracing::debug!(
                        context = context.unwrap_or("-"),
                        attempt = number,
                        kind = %error.kind(),
                        "Attempt failed"
                    );
                    state.lock().record_failure(error.clone());
                    error
                })
            }
        };

        let result = attempt
            .retry(policy.backoff())
            .sleep(tokio::time::sleep)
            .when(|error: &ClassifiedError| {
                let retry = policy.allows_retry(error.kind());
                if !retry {
                    tracing::info!(
                        context = context.unwrap_or("-"),
                        kind = %error.kind(),
                        "Not retrying failure"
                    );
                }
                retry
            })
            .notify(|error: &ClassifiedError, delay: Duration| {
                let state = state.lock();
                tracing::warn!(
                    context = context.unwrap_or("-"),
                    kind = %error.kind(),
                    attempt = state.attempt(),
                    max_attempts = state.max_attempts(),
                    delay = ?delay,
                    "Retrying after failure"
                );
            })
            .await;

        if result.is_err() {
            let state = state.lock();
            tracing::debug!(
                attempts = state.attempt(),
                last_kind = ?state.last_error().map(|e| e.kind()),
                "Giving up"
            );
        }

        result
    }
}
