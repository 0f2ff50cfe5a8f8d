//! Results of an authentication attempt.

use std::fmt;

use serde::{Deserialize, Serialize};

use crate::routing::RedirectTarget;

/// Severity of a user-facing message.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum MessageLevel {
    /// Informational.
    Status,
    /// Something needs attention.
    Warning,
    /// Something went wrong.
    Error,
}

/// A message shown to the user after the redirect.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct StatusMessage {
    /// Severity.
    pub level: MessageLevel,
    /// Message text.
    pub text: String,
}

impl StatusMessage {
    /// An error message.
    pub fn error(text: impl Into<String>) -> Self {
        Self {
            level: MessageLevel::Error,
            text: text.into(),
        }
    }

    /// A warning message.
    pub fn warning(text: impl Into<String>) -> Self {
        Self {
            level: MessageLevel::Warning,
            text: text.into(),
        }
    }

    /// A status message.
    pub fn status(text: impl Into<String>) -> Self {
        Self {
            level: MessageLevel::Status,
            text: text.into(),
        }
    }
}

/// How an authentication attempt ended.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum OutcomeStatus {
    /// The account was logged in.
    LoggedIn,
    /// The identity was linked to the current account.
    Linked,
    /// Policy refused the login.
    Rejected,
    /// The account was created and awaits approval.
    PendingApproval,
    /// No account could be found or created.
    Failed,
}

impl OutcomeStatus {
    /// Returns `true` when the browser ends up with an authenticated session.
    #[must_use]
    pub fn is_success(&self) -> bool {
        matches!(self, Self::LoggedIn | Self::Linked)
    }
}

impl fmt::Display for OutcomeStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::LoggedIn => write!(f, "logged_in"),
            Self::Linked => write!(f, "linked"),
            Self::Rejected => write!(f, "rejected"),
            Self::PendingApproval => write!(f, "pending_approval"),
            Self::Failed => write!(f, "failed"),
        }
    }
}

/// Result of [`authenticate`](super::UserProvisioningService::authenticate).
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct AuthOutcome {
    /// Where to send the browser.
    pub redirect: RedirectTarget,
    /// How the attempt ended.
    pub status: OutcomeStatus,
    /// Messages to show after the redirect.
    pub messages: Vec<StatusMessage>,
    /// The account concerned, when one was identified.
    pub user_id: Option<String>,
}

impl AuthOutcome {
    /// Creates an outcome.
    #[must_use]
    pub fn new(redirect: RedirectTarget, status: OutcomeStatus) -> Self {
        Self {
            redirect,
            status,
            messages: Vec::new(),
            user_id: None,
        }
    }

    /// A redirect to the login page.
    #[must_use]
    pub fn login(status: OutcomeStatus) -> Self {
        Self::new(RedirectTarget::login(), status)
    }

    /// Sets the messages.
    #[must_use]
    pub fn with_messages(mut self, messages: Vec<StatusMessage>) -> Self {
        self.messages = messages;
        self
    }

    /// Sets the account concerned.
    #[must_use]
    pub fn with_user(mut self, user_id: impl Into<String>) -> Self {
        self.user_id = Some(user_id.into());
        self
    }

    /// Returns `true` if any error message was recorded.
    #[must_use]
    pub fn has_errors(&self) -> bool {
        self.messages.iter().any(|m| m.level == MessageLevel::Error)
    }
}
