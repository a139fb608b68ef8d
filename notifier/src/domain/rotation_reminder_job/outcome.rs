//! Per-identity outcomes and the run summary.

use std::time::Duration;

use chrono::{DateTime, Utc};

use crate::domain::RecipientAddress;
use crate::domain::ports::IdentityDirectoryError;

/// What happened to one identity during a run.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum IdentityOutcome {
    /// No credential is older than the threshold.
    NoStaleCredential,
    /// The credential listing failed or timed out.
    CredentialsUnavailable {
        /// Failure detail.
        reason: String,
    },
    /// The tag listing failed or timed out.
    TagsUnavailable {
        /// Stale key that could not be resolved to recipients.
        access_key_id: String,
        /// Failure detail.
        reason: String,
    },
    /// The identity opted out of reminders.
    Suppressed {
        /// Stale key that was not reported.
        access_key_id: String,
    },
    /// No email tag with a non-blank value was found.
    NoRecipients {
        /// Stale key that was not reported.
        access_key_id: String,
    },
    /// A reminder was accepted by the mail service.
    Notified {
        /// Stale key that was reported.
        access_key_id: String,
        /// Recipients of the single reminder.
        recipients: Vec<RecipientAddress>,
    },
    /// The mail service refused or did not answer in time.
    DeliveryFailed {
        /// Stale key whose reminder was lost.
        access_key_id: String,
        /// Failure detail.
        reason: String,
    },
}

impl IdentityOutcome {
    /// Return whether this outcome is a failure worth alerting on.
    pub fn is_failure(&self) -> bool {
        matches!(
            self,
            Self::CredentialsUnavailable { .. }
                | Self::TagsUnavailable { .. }
                | Self::DeliveryFailed { .. }
        )
    }
}

/// Outcome recorded for one identity.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct IdentityReport {
    /// Identity user name.
    pub user_name: String,
    /// What happened.
    pub outcome: IdentityOutcome,
}

/// Result of one complete run.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RunSummary {
    /// Single instant every identity was evaluated against.
    pub evaluated_at: DateTime<Utc>,
    /// Reports in enumeration order.
    pub reports: Vec<IdentityReport>,
}

impl RunSummary {
    /// Number of identities enumerated.
    pub fn identities(&self) -> usize {
        self.reports.len()
    }

    /// Number of reminders accepted by the mail service.
    pub fn notified(&self) -> usize {
        self.count(|outcome| matches!(outcome, IdentityOutcome::Notified { .. }))
    }

    /// Number of stale keys held back by suppression.
    pub fn suppressed(&self) -> usize {
        self.count(|outcome| matches!(outcome, IdentityOutcome::Suppressed { .. }))
    }

    /// Number of stale keys with nobody to tell.
    pub fn without_recipients(&self) -> usize {
        self.count(|outcome| matches!(outcome, IdentityOutcome::NoRecipients { .. }))
    }

    /// Number of identities skipped or left unnotified by a failure.
    pub fn failures(&self) -> usize {
        self.count(IdentityOutcome::is_failure)
    }

    /// Outcome for `user_name`, if it was enumerated.
    pub fn outcome_for(&self, user_name: &str) -> Option<&IdentityOutcome> {
        self.reports
            .iter()
            .find(|report| report.user_name == user_name)
            .map(|report| &report.outcome)
    }

    fn count(&self, predicate: impl Fn(&IdentityOutcome) -> bool) -> usize {
        self.reports
            .iter()
            .filter(|report| predicate(&report.outcome))
            .count()
    }
}

/// Failures that abort a run before any identity is processed.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum RunError {
    /// Identities could not be enumerated.
    #[error("failed to list identities: {0}")]
    ListIdentities(#[source] IdentityDirectoryError),
    /// Identity enumeration exceeded its deadline.
    #[error("listing identities timed out after {timeout:?}")]
    ListIdentitiesTimedOut {
        /// Deadline that elapsed.
        timeout: Duration,
    },
}
