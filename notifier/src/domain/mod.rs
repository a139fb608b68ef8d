//! Domain model, decision logic, and run orchestration.
//!
//! Staleness and recipient decisions stay independent of the AWS SDK.
//! Adapters plug in through [`ports`].
//!
//! Public surface:
//! - Identity, Credential, MetadataTag: read-only directory snapshots.
//! - StalenessThreshold, first_stale_credential: staleness evaluation.
//! - IdentityPolicy, PolicyDecision, RecipientAddress: tag policy.
//! - NotificationEvent, render_reminder_body: reminder composition.
//! - RotationReminderJob: the once-per-invocation coordinator.

pub mod identity;
pub mod notification;
pub mod policy;
pub mod ports;
pub mod rotation_reminder_job;
pub mod staleness;

pub use self::identity::{Credential, Identity, MetadataTag};
pub use self::notification::{NotificationEvent, REMINDER_SUBJECT, render_reminder_body};
pub use self::policy::{
    EMAIL_TAG_PREFIX, IdentityPolicy, PolicyDecision, RecipientAddress,
    SUPPRESSION_DISABLED_VALUE, SUPPRESSION_TAG_KEY,
};
pub use self::rotation_reminder_job::{
    DEFAULT_CALL_TIMEOUT, DEFAULT_SENDER, IdentityOutcome, IdentityReport, RotationReminderJob,
    RotationReminderPorts, RotationReminderSettings, RunError, RunSummary,
};
pub use self::staleness::{
    DEFAULT_THRESHOLD_DAYS, StaleCredential, StalenessThreshold, first_stale_credential,
};
