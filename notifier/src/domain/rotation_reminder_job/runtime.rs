//! Port bundle and run settings for the reminder job.

use std::sync::Arc;
use std::time::Duration;

use crate::domain::StalenessThreshold;
use crate::domain::ports::{IdentityDirectory, MailSender};

/// Sender used when none is configured.
pub const DEFAULT_SENDER: &str = "no-reply@digital.homeoffice.gov.uk";

/// Per-call deadline used when none is configured.
pub const DEFAULT_CALL_TIMEOUT: Duration = Duration::from_secs(10);

/// Port bundle required by the reminder job.
pub struct RotationReminderPorts {
    /// Identity directory adapter.
    pub directory: Arc<dyn IdentityDirectory>,
    /// Mail delivery adapter.
    pub mailer: Arc<dyn MailSender>,
}

impl RotationReminderPorts {
    /// Build a strongly-typed port bundle.
    pub fn new(directory: Arc<dyn IdentityDirectory>, mailer: Arc<dyn MailSender>) -> Self {
        Self { directory, mailer }
    }
}

/// Settings fixed for the duration of one run.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RotationReminderSettings {
    /// Age beyond which a key is reported.
    pub threshold: StalenessThreshold,
    /// Sender address for reminders.
    pub sender: String,
    /// Deadline applied to every collaborator call.
    pub call_timeout: Duration,
}

impl Default for RotationReminderSettings {
    fn default() -> Self {
        Self {
            threshold: StalenessThreshold::default(),
            sender: DEFAULT_SENDER.to_owned(),
            call_timeout: DEFAULT_CALL_TIMEOUT,
        }
    }
}
