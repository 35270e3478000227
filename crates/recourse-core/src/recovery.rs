//! Recovery decisions.
//!
//! Deciding what to do about an error is pure and lives here. Performing
//! the side effect (clearing the session, navigating) belongs to the
//! runtime's dispatcher.

use serde::{Deserialize, Serialize};
use std::fmt;

use crate::types::ClassifiedError;

/// Remedial action for a classified error.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum RecoveryAction {
    /// No automatic action; the caller presents the error
    None,

    /// Offer the user a manual "try again"
    Retry,

    /// Clear the session and go to the login entry point
    RedirectToLogin,

    /// Full page reload
    ReloadPage,
}

impl fmt::Display for RecoveryAction {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            RecoveryAction::None => write!(f, "None"),
            RecoveryAction::Retry => write!(f, "Retry"),
            RecoveryAction::RedirectToLogin => write!(f, "RedirectToLogin"),
            RecoveryAction::ReloadPage => write!(f, "ReloadPage"),
        }
    }
}

/// What the dispatcher should do about an error.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct RecoveryDecision {
    /// Whether a user-initiated retry may succeed
    pub recoverable: bool,

    /// The action to perform
    pub action: RecoveryAction,
}

impl RecoveryDecision {
    /// A decision that performs nothing.
    pub fn none() -> Self {
        Self {
            recoverable: false,
            action: RecoveryAction::None,
        }
    }

    /// Whether applying this decision ends the current interaction.
    pub fn is_terminal(&self) -> bool {
        matches!(
            self.action,
            RecoveryAction::RedirectToLogin | RecoveryAction::ReloadPage
        )
    }
}

/// Decide the recovery for an error from its kind.
///
/// `recoverable` is only true for the transient kinds, which are the only
/// ones offered a manual retry.
pub fn decide(error: &ClassifiedError) -> RecoveryDecision {
    let kind = error.kind();
    RecoveryDecision {
        recoverable: kind.is_transient(),
        action: kind.default_recovery(),
    }
}
