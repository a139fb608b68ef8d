//! Scheduled entry point: evaluate every IAM user's access keys once and
//! email reminders for stale ones.
#![cfg_attr(not(any(test, doctest)), deny(clippy::unwrap_used))]
#![cfg_attr(not(any(test, doctest)), deny(clippy::expect_used))]

use std::io;
use std::sync::Arc;

use color_eyre::eyre::{Context, Result};
use mockable::DefaultClock;
use tokio::runtime::Builder;
use tracing::{error, warn};
use tracing_subscriber::{EnvFilter, fmt};

use notifier::domain::{RotationReminderJob, RotationReminderPorts};
use notifier::outbound::aws::{IamIdentityDirectory, SesMailSender, load_sdk_config};
use notifier::{NotifierConfig, notifier_config_from_process_env};

fn main() -> Result<()> {
    color_eyre::install()?;
    init_tracing();

    let config = notifier_config_from_process_env().inspect_err(|err| {
        error!(error = %err, "invalid configuration; no keys evaluated");
    })?;

    let runtime = Builder::new_current_thread()
        .enable_all()
        .build()
        .wrap_err("failed to build notifier runtime")?;
    runtime.block_on(run(config))
}

fn init_tracing() {
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info"));
    if let Err(e) = fmt()
        .with_env_filter(filter)
        .with_writer(io::stderr)
        .json()
        .try_init()
    {
        warn!(error = %e, "tracing init failed");
    }
}

async fn run(config: NotifierConfig) -> Result<()> {
    let sdk_config = load_sdk_config(config.call_timeout).await;
    let directory = Arc::new(IamIdentityDirectory::new(&sdk_config));
    let mailer = Arc::new(SesMailSender::new(&sdk_config, config.ses_region.clone()));

    let job = RotationReminderJob::new(
        RotationReminderPorts::new(directory, mailer),
        Arc::new(DefaultClock),
        config.reminder_settings(),
    );
    job.run().await.wrap_err("key rotation run aborted")?;
    Ok(())
}
