//! AWS outbound adapters.
//!
//! [`IamIdentityDirectory`] implements the `IdentityDirectory` port over IAM
//! and [`SesMailSender`] implements the `MailSender` port over SES. Both share
//! one SDK configuration loaded from the ambient credential chain.

use std::time::Duration;

use aws_config::timeout::TimeoutConfig;
use aws_config::{BehaviorVersion, SdkConfig};

mod iam_directory;
mod ses_mailer;

pub use iam_directory::IamIdentityDirectory;
pub use ses_mailer::SesMailSender;

/// Load the shared SDK configuration with a per-operation deadline.
///
/// Region and credentials come from the default provider chain. The deadline
/// bounds each SDK operation including its retries.
pub async fn load_sdk_config(operation_timeout: Duration) -> SdkConfig {
    let timeouts = TimeoutConfig::builder()
        .operation_timeout(operation_timeout)
        .build();
    aws_config::defaults(BehaviorVersion::latest())
        .timeout_config(timeouts)
        .load()
        .await
}
