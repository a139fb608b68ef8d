//! Staleness evaluation for access keys.

use std::fmt;

use chrono::{DateTime, TimeDelta, Utc};

use super::Credential;

/// Threshold applied when no period is configured.
pub const DEFAULT_THRESHOLD_DAYS: u32 = 90;

/// Age in whole days beyond which a credential should be rotated.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct StalenessThreshold {
    days: u32,
}

impl StalenessThreshold {
    /// Build a threshold from a day count.
    pub const fn from_days(days: u32) -> Self {
        Self { days }
    }

    /// Configured day count.
    pub const fn days(self) -> u32 {
        self.days
    }

    /// Latest creation instant that is still considered fresh at `now`.
    ///
    /// Thresholds too large to represent push the cutoff to the start of
    /// representable time, so nothing is ever stale.
    pub fn cutoff(self, now: DateTime<Utc>) -> DateTime<Utc> {
        TimeDelta::try_days(i64::from(self.days))
            .and_then(|age| now.checked_sub_signed(age))
            .unwrap_or(DateTime::<Utc>::MIN_UTC)
    }

    /// Return whether a credential created at `created_at` is stale at `now`.
    ///
    /// # Examples
    /// ```
    /// use chrono::{TimeDelta, TimeZone, Utc};
    /// use notifier::domain::StalenessThreshold;
    ///
    /// let now = Utc.with_ymd_and_hms(2026, 3, 1, 9, 0, 0).single().expect("valid time");
    /// let threshold = StalenessThreshold::default();
    /// assert!(threshold.is_stale(now - TimeDelta::days(91), now));
    /// assert!(!threshold.is_stale(now - TimeDelta::days(89), now));
    /// ```
    pub fn is_stale(self, created_at: DateTime<Utc>, now: DateTime<Utc>) -> bool {
        created_at < self.cutoff(now)
    }
}

impl Default for StalenessThreshold {
    fn default() -> Self {
        Self::from_days(DEFAULT_THRESHOLD_DAYS)
    }
}

impl fmt::Display for StalenessThreshold {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{} days", self.days)
    }
}

/// A credential found past its threshold, paired with the threshold used.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct StaleCredential {
    /// The stale credential.
    pub credential: Credential,
    /// Threshold the credential was evaluated against.
    pub threshold: StalenessThreshold,
}

/// Return the first credential, in listing order, that is stale at `now`.
///
/// Later credentials are not inspected once a stale one is found, even if
/// they are older.
pub fn first_stale_credential(
    credentials: impl IntoIterator<Item = Credential>,
    threshold: StalenessThreshold,
    now: DateTime<Utc>,
) -> Option<StaleCredential> {
    credentials
        .into_iter()
        .find(|credential| threshold.is_stale(credential.created_at, now))
        .map(|credential| StaleCredential {
            credential,
            threshold,
        })
}
