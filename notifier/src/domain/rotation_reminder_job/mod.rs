//! Run coordinator for access key rotation reminders.
//!
//! One run enumerates identities once, then walks them strictly in order:
//! find the first stale key, resolve the tag policy, send one reminder, log
//! the outcome. Failures for one identity are recorded and the walk moves
//! on; only enumeration failures abort the run.

use std::sync::Arc;
use std::time::Duration;

use chrono::{DateTime, Utc};
use mockable::Clock;
use tracing::{debug, error, info};

use crate::domain::ports::{
    DIRECTORY_PAGE_SIZE, DeliveryReceipt, IdentityDirectory, IdentityDirectoryError, MailSender,
    MailSenderError,
};
use crate::domain::{
    Identity, IdentityPolicy, NotificationEvent, PolicyDecision, RecipientAddress,
    StaleCredential, first_stale_credential,
};

mod outcome;
mod runtime;
mod step_error;

pub use outcome::{IdentityOutcome, IdentityReport, RunError, RunSummary};
pub use runtime::{
    DEFAULT_CALL_TIMEOUT, DEFAULT_SENDER, RotationReminderPorts, RotationReminderSettings,
};
use step_error::StepError;

/// Domain-owned reminder job.
pub struct RotationReminderJob {
    directory: Arc<dyn IdentityDirectory>,
    mailer: Arc<dyn MailSender>,
    clock: Arc<dyn Clock>,
    settings: RotationReminderSettings,
}

impl RotationReminderJob {
    /// Build a job from its ports, a clock, and run settings.
    /// ```rust,ignore
    /// let job = RotationReminderJob::new(ports, Arc::new(DefaultClock), settings);
    /// let summary = job.run().await?;
    /// ```
    pub fn new(
        ports: RotationReminderPorts,
        clock: Arc<dyn Clock>,
        settings: RotationReminderSettings,
    ) -> Self {
        Self {
            directory: ports.directory,
            mailer: ports.mailer,
            clock,
            settings,
        }
    }

    /// Execute one complete run.
    ///
    /// # Errors
    ///
    /// Returns [`RunError`] when identities cannot be enumerated. Failures
    /// scoped to one identity are reported in the [`RunSummary`] instead.
    pub async fn run(&self) -> Result<RunSummary, RunError> {
        let evaluated_at = self.clock.utc();

        let identities = match self
            .within_deadline(self.directory.list_identities(DIRECTORY_PAGE_SIZE))
            .await
        {
            Ok(identities) => identities,
            Err(StepError::Failed(error)) => {
                error!(error = %error, "failed to list identities; aborting run");
                return Err(RunError::ListIdentities(error));
            }
            Err(StepError::TimedOut(timeout)) => {
                error!(timeout = ?timeout, "listing identities timed out; aborting run");
                return Err(RunError::ListIdentitiesTimedOut { timeout });
            }
        };

        info!(
            identities = identities.len(),
            threshold_days = self.settings.threshold.days(),
            evaluated_at = %evaluated_at.to_rfc3339(),
            "evaluating access keys"
        );

        let mut reports = Vec::with_capacity(identities.len());
        for identity in identities {
            let outcome = self.process_identity(&identity, evaluated_at).await;
            reports.push(IdentityReport {
                user_name: identity.user_name().to_owned(),
                outcome,
            });
        }

        let summary = RunSummary {
            evaluated_at,
            reports,
        };
        info!(
            identities = summary.identities(),
            notified = summary.notified(),
            suppressed = summary.suppressed(),
            without_recipients = summary.without_recipients(),
            failures = summary.failures(),
            "key rotation run complete"
        );
        Ok(summary)
    }

    async fn process_identity(&self, identity: &Identity, now: DateTime<Utc>) -> IdentityOutcome {
        let stale = match self.find_stale_credential(identity, now).await {
            Ok(Some(stale)) => stale,
            Ok(None) => {
                debug!(user = %identity, "no stale access keys");
                return IdentityOutcome::NoStaleCredential;
            }
            Err(error) => {
                error!(user = %identity, error = %error, "failed to list access keys; skipping user");
                return IdentityOutcome::CredentialsUnavailable {
                    reason: error.to_string(),
                };
            }
        };
        let access_key_id = stale.credential.access_key_id.clone();

        let recipients = match self.resolve_policy(identity).await {
            Ok(PolicyDecision::Notify(recipients)) => recipients,
            Ok(PolicyDecision::Suppressed) => {
                info!(
                    user = %identity,
                    access_key_id = %access_key_id,
                    "user ignored: key_rotation tag suppresses reminders"
                );
                return IdentityOutcome::Suppressed { access_key_id };
            }
            Ok(PolicyDecision::NoRecipients) => {
                info!(
                    user = %identity,
                    access_key_id = %access_key_id,
                    "no email found for user with expired key"
                );
                return IdentityOutcome::NoRecipients { access_key_id };
            }
            Err(error) => {
                error!(user = %identity, error = %error, "failed to list user tags; skipping user");
                return IdentityOutcome::TagsUnavailable {
                    access_key_id,
                    reason: error.to_string(),
                };
            }
        };

        let event = NotificationEvent::new(stale, recipients);
        match self.notify(&event).await {
            Ok(receipt) => {
                log_delivery(&event, &receipt, now);
                IdentityOutcome::Notified {
                    access_key_id,
                    recipients: event.recipients,
                }
            }
            Err(error) => {
                error!(
                    user = %identity,
                    access_key_id = %access_key_id,
                    recipients = %join_recipients(&event.recipients),
                    error = %error,
                    "failed to send rotation reminder"
                );
                IdentityOutcome::DeliveryFailed {
                    access_key_id,
                    reason: error.to_string(),
                }
            }
        }
    }

    async fn find_stale_credential(
        &self,
        identity: &Identity,
        now: DateTime<Utc>,
    ) -> Result<Option<StaleCredential>, StepError<IdentityDirectoryError>> {
        let credentials = self
            .within_deadline(self.directory.list_credentials(identity))
            .await?;
        Ok(first_stale_credential(
            credentials,
            self.settings.threshold,
            now,
        ))
    }

    async fn resolve_policy(
        &self,
        identity: &Identity,
    ) -> Result<PolicyDecision, StepError<IdentityDirectoryError>> {
        let tags = self
            .within_deadline(self.directory.list_tags(identity, DIRECTORY_PAGE_SIZE))
            .await?;
        Ok(IdentityPolicy::from_tags(&tags).decision())
    }

    async fn notify(
        &self,
        event: &NotificationEvent,
    ) -> Result<DeliveryReceipt, StepError<MailSenderError>> {
        let message = event.compose(&self.settings.sender);
        self.within_deadline(self.mailer.send(&message)).await
    }

    async fn within_deadline<T, E>(
        &self,
        call: impl Future<Output = Result<T, E>>,
    ) -> Result<T, StepError<E>> {
        let timeout: Duration = self.settings.call_timeout;
        match tokio::time::timeout(timeout, call).await {
            Ok(result) => result.map_err(StepError::Failed),
            Err(_elapsed) => Err(StepError::TimedOut(timeout)),
        }
    }
}

fn log_delivery(event: &NotificationEvent, receipt: &DeliveryReceipt, now: DateTime<Utc>) {
    let credential = &event.credential;
    let created_at = credential.created_at.to_rfc3339();
    for recipient in &event.recipients {
        info!(
            recipient = %recipient,
            access_key_id = %credential.access_key_id,
            user = %credential.user_name,
            created_at = %created_at,
            "notified recipient about stale access key"
        );
    }
    info!(
        user = %credential.user_name,
        access_key_id = %credential.access_key_id,
        recipients = %join_recipients(&event.recipients),
        message_id = %receipt.message_id,
        evaluated_at = %now.to_rfc3339(),
        "rotation reminder sent"
    );
}

fn join_recipients(recipients: &[RecipientAddress]) -> String {
    recipients
        .iter()
        .map(RecipientAddress::as_str)
        .collect::<Vec<_>>()
        .join(",")
}

#[cfg(test)]
mod tests;
