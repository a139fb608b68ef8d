//! Shared test doubles for the rotation reminder job.

use std::collections::HashMap;
use std::sync::{Mutex, MutexGuard, PoisonError};
use std::time::Duration;

use async_trait::async_trait;
use chrono::{DateTime, Local, TimeDelta, TimeZone, Utc};
use mockable::Clock;

use crate::domain::ports::{
    DeliveryReceipt, IdentityDirectory, IdentityDirectoryError, MailSender, MailSenderError,
    OutboundMessage,
};
use crate::domain::{Credential, Identity, MetadataTag};

fn lock<T>(mutex: &Mutex<T>) -> MutexGuard<'_, T> {
    mutex.lock().unwrap_or_else(PoisonError::into_inner)
}

/// Stable "now" used across reminder tests.
pub fn reference_instant() -> DateTime<Utc> {
    Utc.with_ymd_and_hms(2026, 3, 1, 9, 0, 0)
        .single()
        .unwrap_or_default()
}

/// Build a credential created `age_days` before `now`.
pub fn aged_credential(
    access_key_id: &str,
    user_name: &str,
    now: DateTime<Utc>,
    age_days: i64,
) -> Credential {
    Credential {
        access_key_id: access_key_id.to_owned(),
        user_name: user_name.to_owned(),
        created_at: now - TimeDelta::days(age_days),
    }
}

/// Build a tag from string slices.
pub fn tag(key: &str, value: &str) -> MetadataTag {
    MetadataTag::new(key, value)
}

/// Clock pinned to an instant that tests can move.
pub struct MutableClock(Mutex<DateTime<Utc>>);

impl MutableClock {
    /// Pin the clock at `now`.
    pub fn new(now: DateTime<Utc>) -> Self {
        Self(Mutex::new(now))
    }

    /// Move the clock forward by whole days.
    pub fn advance_days(&self, days: i64) {
        *lock(&self.0) += TimeDelta::days(days);
    }
}

impl Clock for MutableClock {
    fn local(&self) -> DateTime<Local> {
        self.utc().with_timezone(&Local)
    }

    fn utc(&self) -> DateTime<Utc> {
        *lock(&self.0)
    }
}

/// One scripted directory user.
#[derive(Debug, Clone)]
pub struct DirectoryUser {
    /// The identity returned by enumeration.
    pub identity: Identity,
    /// Result of listing the user's credentials.
    pub credentials: Result<Vec<Credential>, IdentityDirectoryError>,
    /// Result of listing the user's tags.
    pub tags: Result<Vec<MetadataTag>, IdentityDirectoryError>,
    /// Delay applied before answering the credential listing.
    pub credentials_delay: Option<Duration>,
}

/// In-memory identity directory with scripted answers.
#[derive(Default)]
pub struct InMemoryIdentityDirectory {
    users: Vec<DirectoryUser>,
    list_failure: Option<IdentityDirectoryError>,
    list_delay: Option<Duration>,
    calls: Mutex<Vec<String>>,
}

impl InMemoryIdentityDirectory {
    /// Start with an empty directory.
    pub fn new() -> Self {
        Self::default()
    }

    /// Add a user with credentials and tags.
    #[must_use]
    pub fn with_user(
        mut self,
        user_name: &str,
        credentials: Vec<Credential>,
        tags: Vec<MetadataTag>,
    ) -> Self {
        self.users.push(DirectoryUser {
            identity: Identity::new(user_name),
            credentials: Ok(credentials),
            tags: Ok(tags),
            credentials_delay: None,
        });
        self
    }

    /// Add a user whose credential listing fails.
    #[must_use]
    pub fn with_credentials_failure(mut self, user_name: &str, error: IdentityDirectoryError) -> Self {
        self.users.push(DirectoryUser {
            identity: Identity::new(user_name),
            credentials: Err(error),
            tags: Ok(Vec::new()),
            credentials_delay: None,
        });
        self
    }

    /// Add a user whose tag listing fails.
    #[must_use]
    pub fn with_tags_failure(
        mut self,
        user_name: &str,
        credentials: Vec<Credential>,
        error: IdentityDirectoryError,
    ) -> Self {
        self.users.push(DirectoryUser {
            identity: Identity::new(user_name),
            credentials: Ok(credentials),
            tags: Err(error),
            credentials_delay: None,
        });
        self
    }

    /// Add a user whose credential listing answers only after `delay`.
    #[must_use]
    pub fn with_slow_credentials(
        mut self,
        user_name: &str,
        credentials: Vec<Credential>,
        delay: Duration,
    ) -> Self {
        self.users.push(DirectoryUser {
            identity: Identity::new(user_name),
            credentials: Ok(credentials),
            tags: Ok(Vec::new()),
            credentials_delay: Some(delay),
        });
        self
    }

    /// Make identity enumeration fail.
    #[must_use]
    pub fn with_list_failure(mut self, error: IdentityDirectoryError) -> Self {
        self.list_failure = Some(error);
        self
    }

    /// Make identity enumeration answer only after `delay`.
    #[must_use]
    pub fn with_slow_listing(mut self, delay: Duration) -> Self {
        self.list_delay = Some(delay);
        self
    }

    /// Calls received so far, as `operation:user` strings.
    pub fn calls(&self) -> Vec<String> {
        lock(&self.calls).clone()
    }

    fn record(&self, call: String) {
        lock(&self.calls).push(call);
    }

    fn user(&self, identity: &Identity) -> Result<&DirectoryUser, IdentityDirectoryError> {
        self.users
            .iter()
            .find(|user| &user.identity == identity)
            .ok_or_else(|| IdentityDirectoryError::query(format!("unknown user {identity}")))
    }
}

#[async_trait]
impl IdentityDirectory for InMemoryIdentityDirectory {
    async fn list_identities(
        &self,
        max_items: i32,
    ) -> Result<Vec<Identity>, IdentityDirectoryError> {
        self.record("list_identities".to_owned());
        if let Some(delay) = self.list_delay {
            tokio::time::sleep(delay).await;
        }
        if let Some(error) = &self.list_failure {
            return Err(error.clone());
        }
        let limit = usize::try_from(max_items).unwrap_or(0);
        Ok(self
            .users
            .iter()
            .take(limit)
            .map(|user| user.identity.clone())
            .collect())
    }

    async fn list_credentials(
        &self,
        identity: &Identity,
    ) -> Result<Vec<Credential>, IdentityDirectoryError> {
        self.record(format!("list_credentials:{identity}"));
        let user = self.user(identity)?;
        if let Some(delay) = user.credentials_delay {
            tokio::time::sleep(delay).await;
        }
        user.credentials.clone()
    }

    async fn list_tags(
        &self,
        identity: &Identity,
        _max_items: i32,
    ) -> Result<Vec<MetadataTag>, IdentityDirectoryError> {
        self.record(format!("list_tags:{identity}"));
        self.user(identity)?.tags.clone()
    }
}

/// Mail sender that records every message and fails on request.
#[derive(Default)]
pub struct RecordingMailSender {
    sent: Mutex<Vec<OutboundMessage>>,
    attempts: Mutex<usize>,
    failures: HashMap<String, MailSenderError>,
}

impl RecordingMailSender {
    /// Accept every message.
    pub fn new() -> Self {
        Self::default()
    }

    /// Fail any message addressed to `recipient`.
    #[must_use]
    pub fn failing_for(mut self, recipient: &str, error: MailSenderError) -> Self {
        self.failures.insert(recipient.to_owned(), error);
        self
    }

    /// Messages the sender accepted, in order.
    pub fn sent(&self) -> Vec<OutboundMessage> {
        lock(&self.sent).clone()
    }

    /// Number of send calls, accepted or not.
    pub fn attempts(&self) -> usize {
        *lock(&self.attempts)
    }

    /// Number of accepted copies delivered to `recipient`.
    pub fn copies_for(&self, recipient: &str) -> usize {
        lock(&self.sent)
            .iter()
            .flat_map(|message| message.recipients.iter())
            .filter(|address| address.as_str() == recipient)
            .count()
    }
}

#[async_trait]
impl MailSender for RecordingMailSender {
    async fn send(&self, message: &OutboundMessage) -> Result<DeliveryReceipt, MailSenderError> {
        *lock(&self.attempts) += 1;
        if let Some(error) = message
            .recipients
            .iter()
            .find_map(|recipient| self.failures.get(recipient.as_str()))
        {
            return Err(error.clone());
        }

        let mut sent = lock(&self.sent);
        sent.push(message.clone());
        Ok(DeliveryReceipt {
            message_id: format!("message-{}", sent.len()),
        })
    }
}
