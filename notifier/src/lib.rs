//! Access key rotation reminders.
//!
//! The crate is a small hexagonal job: the `domain` module owns staleness
//! evaluation, notification policy, and run orchestration behind driven
//! ports; `outbound` provides the IAM and SES adapters; `config` builds the
//! run settings from the process environment once at startup.
//!
//! The job is stateless. Every invocation re-evaluates every IAM user and
//! re-sends reminders for keys that are still stale.

pub mod config;
pub mod domain;
pub mod outbound;

#[cfg(any(test, feature = "test-support"))]
pub mod test_support;

pub use config::{
    NotifierConfig, NotifierConfigError, notifier_config_from_env, notifier_config_from_process_env,
};
