//! Recovery side effects.
//!
//! `recourse_core::decide` picks the action; the dispatcher carries it out
//! through the host's session and navigation collaborators.

use async_trait::async_trait;
use recourse_core::{ClassifiedError, RecoveryAction, RecoveryDecision};
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;

/// Persisted credentials of the signed-in user.
#[async_trait]
pub trait SessionStore: Send + Sync {
    /// Drop the token and cached user.
    async fn clear(&self);
}

/// Host navigation.
pub trait Navigator: Send + Sync {
    fn goto_login(&self);

    /// Full reload of the current page.
    fn reload(&self);
}

/// What `apply` actually did.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RecoveryOutcome {
    /// No automatic action
    Nothing,

    /// Caller may offer a manual retry
    RetryOffered,

    /// Session cleared and login shown
    RedirectedToLogin,

    /// A login redirect was already in flight
    RedirectSuppressed,

    Reloaded,
}

/// Applies recovery decisions.
pub struct RecoveryDispatcher {
    session: Arc<dyn SessionStore>,
    navigator: Arc<dyn Navigator>,
    redirecting: AtomicBool,
}

impl RecoveryDispatcher {
    pub fn new(session: Arc<dyn SessionStore>, navigator: Arc<dyn Navigator>) -> Self {
        Self {
            session,
            navigator,
            redirecting: AtomicBool::new(false),
        }
    }

    pub fn decide(&self, error: &ClassifiedError) -> RecoveryDecision {
        recourse_core::decide(error)
    }

    /// Perform the side effect for `decision`.
    pub async fn apply(&self, decision: &RecoveryDecision) -> RecoveryOutcome {
        match decision.action {
            RecoveryAction::None => RecoveryOutcome::Nothing,
            RecoveryAction::Retry => RecoveryOutcome::RetryOffered,
            RecoveryAction::RedirectToLogin => {
                if self.redirecting.swap(true, Ordering::AcqRel) {
                    tracing::debug!("Login redirect already in flight");
                    return RecoveryOutcome::RedirectSuppressed;
                }

                tracing::info!("Session expired, redirecting to login");
                self.session.clear().await;
                self.navigator.goto_login();
                RecoveryOutcome::RedirectedToLogin
            }
            RecoveryAction::ReloadPage => {
                tracing::info!("Cross-origin failure, reloading page");
                self.navigator.reload();
                RecoveryOutcome::Reloaded
            }
        }
    }

    /// Decide and apply in one step.
    pub async fn recover(&self, error: &ClassifiedError) -> RecoveryOutcome {
        let decision = self.decide(error);
        self.apply(&decision).await
    }

    /// Allow the next login redirect, e.g. after the user signs in again.
    pub fn reset(&self) {
        self.redirecting.store(false, Ordering::Release);
    }
}
