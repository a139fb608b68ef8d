//! Rotation reminder rendering.

use super::ports::OutboundMessage;
use super::{Credential, RecipientAddress, StaleCredential, StalenessThreshold};

/// Fixed subject line for every reminder.
pub const REMINDER_SUBJECT: &str = "Reminder: you have old AWS keys";

const GUIDANCE_URL: &str = "docs.acp.homeoffice.gov.uk/how-to/security/aws-keys";
const SIGN_OFF: &str = "ACP Support Team";

/// One stale key, its threshold, and where the reminder goes.
///
/// Built per identity and dropped once the reminder has been handed to the
/// mail sender.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct NotificationEvent {
    /// The stale credential.
    pub credential: Credential,
    /// Threshold the credential exceeded.
    pub threshold: StalenessThreshold,
    /// Resolved recipients; never empty.
    pub recipients: Vec<RecipientAddress>,
}

impl NotificationEvent {
    /// Pair a stale credential with its resolved recipients.
    pub fn new(stale: StaleCredential, recipients: Vec<RecipientAddress>) -> Self {
        Self {
            credential: stale.credential,
            threshold: stale.threshold,
            recipients,
        }
    }

    /// Render the reminder addressed from `sender`.
    pub fn compose(&self, sender: &str) -> OutboundMessage {
        OutboundMessage {
            sender: sender.to_owned(),
            recipients: self.recipients.clone(),
            subject: REMINDER_SUBJECT.to_owned(),
            body: render_reminder_body(&self.credential, self.threshold),
        }
    }
}

/// Render the plain-text reminder body.
///
/// # Examples
/// ```
/// use chrono::Utc;
/// use notifier::domain::{Credential, StalenessThreshold, render_reminder_body};
///
/// let credential = Credential {
///     access_key_id: "AKIAEXAMPLE".to_owned(),
///     user_name: "alice".to_owned(),
///     created_at: Utc::now(),
/// };
/// let body = render_reminder_body(&credential, StalenessThreshold::default());
/// assert!(body.contains("AKIAEXAMPLE belonging to user alice was created over 90 days ago"));
/// ```
pub fn render_reminder_body(credential: &Credential, threshold: StalenessThreshold) -> String {
    format!(
        "Hi,\nAWS access key id {key} belonging to user {user} was created over {days} days ago.\n\
         You should consider rotating it. Please refer to {GUIDANCE_URL} for further guidance.\n\
         Thanks,\n{SIGN_OFF}",
        key = credential.access_key_id,
        user = credential.user_name,
        days = threshold.days(),
    )
}
