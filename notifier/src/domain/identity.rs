//! Identity directory records as seen by the reminder job.
//!
//! These are read-only snapshots of what the directory returned during one
//! run. Nothing here is persisted.

use std::fmt;

use chrono::{DateTime, Utc};

/// A named principal in the identity directory.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct Identity {
    user_name: String,
}

impl Identity {
    /// Wrap a directory user name.
    ///
    /// # Examples
    /// ```
    /// use notifier::domain::Identity;
    ///
    /// let identity = Identity::new("alice");
    /// assert_eq!(identity.user_name(), "alice");
    /// ```
    pub fn new(user_name: impl Into<String>) -> Self {
        Self {
            user_name: user_name.into(),
        }
    }

    /// Directory user name.
    pub fn user_name(&self) -> &str {
        self.user_name.as_str()
    }
}

impl fmt::Display for Identity {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.user_name)
    }
}

/// An access key belonging to exactly one identity.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Credential {
    /// Provider-assigned access key identifier.
    pub access_key_id: String,
    /// Name of the owning identity.
    pub user_name: String,
    /// Instant the key was created.
    pub created_at: DateTime<Utc>,
}

/// One key/value tag attached to an identity.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct MetadataTag {
    /// Tag key, compared case-sensitively.
    pub key: String,
    /// Tag value.
    pub value: String,
}

impl MetadataTag {
    /// Build a tag from any string-like key and value.
    pub fn new(key: impl Into<String>, value: impl Into<String>) -> Self {
        Self {
            key: key.into(),
            value: value.into(),
        }
    }
}
