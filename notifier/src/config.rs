//! Run configuration parsed from the environment.
//!
//! Configuration is read once at startup into [`NotifierConfig`] and passed
//! down by value; nothing else in the crate reads the environment.

use std::time::Duration;

use mockable::{DefaultEnv, Env};
use tracing::warn;

use crate::domain::{
    DEFAULT_CALL_TIMEOUT, DEFAULT_SENDER, DEFAULT_THRESHOLD_DAYS, RotationReminderSettings,
    StalenessThreshold,
};

/// Staleness threshold in days.
pub const PERIOD_ENV: &str = "PERIOD";
/// Sender address for reminders.
pub const SENDER_ENV: &str = "SENDER";
/// Region hosting the mail service.
pub const SES_REGION_ENV: &str = "SES_REGION";
/// Per-call deadline for collaborator calls, in seconds.
pub const CALL_TIMEOUT_ENV: &str = "CALL_TIMEOUT_SECONDS";

/// Mail service region used when none is configured.
pub const DEFAULT_SES_REGION: &str = "eu-west-1";

const PERIOD_EXPECTED: &str = "a non-negative whole number of days";
const TIMEOUT_EXPECTED: &str = "a positive whole number of seconds";

/// Settings for one invocation.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct NotifierConfig {
    /// Age beyond which a key is reported.
    pub threshold: StalenessThreshold,
    /// Sender address for reminders.
    pub sender: String,
    /// Region hosting the mail service.
    pub ses_region: String,
    /// Deadline applied to every collaborator call.
    pub call_timeout: Duration,
}

impl NotifierConfig {
    /// Project the settings the reminder job needs.
    pub fn reminder_settings(&self) -> RotationReminderSettings {
        RotationReminderSettings {
            threshold: self.threshold,
            sender: self.sender.clone(),
            call_timeout: self.call_timeout,
        }
    }
}

impl Default for NotifierConfig {
    fn default() -> Self {
        Self {
            threshold: StalenessThreshold::default(),
            sender: DEFAULT_SENDER.to_owned(),
            ses_region: DEFAULT_SES_REGION.to_owned(),
            call_timeout: DEFAULT_CALL_TIMEOUT,
        }
    }
}

/// Errors raised while reading configuration.
#[derive(thiserror::Error, Debug, Clone, PartialEq, Eq)]
pub enum NotifierConfigError {
    /// A variable is present but contains an invalid value.
    #[error("invalid value for {name}='{value}'; expected {expected}")]
    InvalidEnv {
        /// Variable name.
        name: &'static str,
        /// Raw value found.
        value: String,
        /// Description of accepted values.
        expected: &'static str,
    },
}

/// Build the run configuration from environment variables.
///
/// Missing variables fall back to their defaults with a warning. A `PERIOD`
/// or `CALL_TIMEOUT_SECONDS` that is present but not a valid number is an
/// error: the run must not evaluate keys against a guessed threshold.
///
/// # Examples
///
/// ```rust
/// use mockable::MockEnv;
/// use notifier::notifier_config_from_env;
///
/// let mut env = MockEnv::new();
/// env.expect_string().returning(|name| match name {
///     "PERIOD" => Some("30".to_owned()),
///     _ => None,
/// });
///
/// let config = notifier_config_from_env(&env).expect("valid configuration");
/// assert_eq!(config.threshold.days(), 30);
/// assert_eq!(config.sender, "no-reply@digital.homeoffice.gov.uk");
/// ```
///
/// # Errors
///
/// Returns [`NotifierConfigError::InvalidEnv`] for unparsable numbers.
pub fn notifier_config_from_env<E: Env>(env: &E) -> Result<NotifierConfig, NotifierConfigError> {
    Ok(NotifierConfig {
        threshold: threshold_from_env(env)?,
        sender: sender_from_env(env),
        ses_region: ses_region_from_env(env),
        call_timeout: call_timeout_from_env(env)?,
    })
}

/// Build the run configuration from the live process environment.
///
/// # Errors
///
/// Returns [`NotifierConfigError::InvalidEnv`] for unparsable numbers.
pub fn notifier_config_from_process_env() -> Result<NotifierConfig, NotifierConfigError> {
    notifier_config_from_env(&DefaultEnv::new())
}

fn threshold_from_env<E: Env>(env: &E) -> Result<StalenessThreshold, NotifierConfigError> {
    let Some(value) = env.string(PERIOD_ENV) else {
        warn!(
            default_days = DEFAULT_THRESHOLD_DAYS,
            "no expiry period specified; defaulting to {DEFAULT_THRESHOLD_DAYS} days"
        );
        return Ok(StalenessThreshold::default());
    };

    value
        .parse::<u32>()
        .map(StalenessThreshold::from_days)
        .map_err(|_| NotifierConfigError::InvalidEnv {
            name: PERIOD_ENV,
            value,
            expected: PERIOD_EXPECTED,
        })
}

fn sender_from_env<E: Env>(env: &E) -> String {
    match non_blank(env, SENDER_ENV) {
        Some(sender) => sender,
        None => {
            warn!(
                default_sender = DEFAULT_SENDER,
                "no sender email address specified; using the default"
            );
            DEFAULT_SENDER.to_owned()
        }
    }
}

fn ses_region_from_env<E: Env>(env: &E) -> String {
    non_blank(env, SES_REGION_ENV).unwrap_or_else(|| DEFAULT_SES_REGION.to_owned())
}

fn call_timeout_from_env<E: Env>(env: &E) -> Result<Duration, NotifierConfigError> {
    let Some(value) = env.string(CALL_TIMEOUT_ENV) else {
        return Ok(DEFAULT_CALL_TIMEOUT);
    };

    match value.parse::<u64>() {
        Ok(seconds) if seconds > 0 => Ok(Duration::from_secs(seconds)),
        _ => Err(NotifierConfigError::InvalidEnv {
            name: CALL_TIMEOUT_ENV,
            value,
            expected: TIMEOUT_EXPECTED,
        }),
    }
}

fn non_blank<E: Env>(env: &E, name: &str) -> Option<String> {
    env.string(name)
        .map(|value| value.trim().to_owned())
        .filter(|value| !value.is_empty())
}
