//! Per-identity notification policy derived from metadata tags.
//!
//! Tags are an untyped key/value bag. [`IdentityPolicy::from_tags`] is the one
//! place that interprets them; everything downstream works with the typed
//! record and its [`PolicyDecision`].

use std::fmt;

use tracing::debug;

use super::MetadataTag;

/// Tag key that opts an identity out of reminders.
pub const SUPPRESSION_TAG_KEY: &str = "key_rotation";

/// The only `key_rotation` value that keeps reminders enabled.
pub const SUPPRESSION_DISABLED_VALUE: &str = "false";

/// Prefix marking a tag whose value is a recipient address.
pub const EMAIL_TAG_PREFIX: &str = "email";

/// A recipient address taken from an email-designated tag.
///
/// ## Invariants
/// - Trimmed and non-empty. The value is otherwise kept as written.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct RecipientAddress(String);

impl RecipientAddress {
    /// Take a raw tag value as an address, ignoring surrounding whitespace.
    ///
    /// # Examples
    /// ```
    /// use notifier::domain::RecipientAddress;
    ///
    /// let address = RecipientAddress::parse(" alice@example.com ").expect("valid");
    /// assert_eq!(address.as_str(), "alice@example.com");
    /// assert!(RecipientAddress::parse("   ").is_none());
    /// assert_eq!(RecipientAddress::parse("ops-team").expect("kept").as_str(), "ops-team");
    /// ```
    pub fn parse(raw: &str) -> Option<Self> {
        let trimmed = raw.trim();
        (!trimmed.is_empty()).then(|| Self(trimmed.to_owned()))
    }

    /// Borrow the address.
    pub fn as_str(&self) -> &str {
        self.0.as_str()
    }
}

impl fmt::Display for RecipientAddress {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

impl AsRef<str> for RecipientAddress {
    fn as_ref(&self) -> &str {
        self.as_str()
    }
}

/// Typed notification policy for one identity.
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub struct IdentityPolicy {
    /// Reminders are switched off for every key of the identity.
    pub suppressed: bool,
    /// Recipients in tag discovery order. Empty when suppressed.
    pub recipients: Vec<RecipientAddress>,
}

/// What to do with a stale key once policy has been applied.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum PolicyDecision {
    /// The identity opted out through the suppression tag.
    Suppressed,
    /// No email tag with a non-blank value was found.
    NoRecipients,
    /// Send one reminder to these recipients.
    Notify(Vec<RecipientAddress>),
}

impl IdentityPolicy {
    /// Interpret an identity's tags.
    ///
    /// A `key_rotation` tag with any value other than the exact string
    /// `false` suppresses reminders, and recipients are then not collected.
    /// Otherwise every tag whose key starts with `email` contributes its
    /// value, in order, without deduplication. Blank values are skipped.
    ///
    /// # Examples
    /// ```
    /// use notifier::domain::{IdentityPolicy, MetadataTag, PolicyDecision};
    ///
    /// let policy = IdentityPolicy::from_tags(&[
    ///     MetadataTag::new("key_rotation", "true"),
    ///     MetadataTag::new("email", "bob@example.com"),
    /// ]);
    /// assert_eq!(policy.decision(), PolicyDecision::Suppressed);
    /// ```
    pub fn from_tags(tags: &[MetadataTag]) -> Self {
        let suppressed = tags
            .iter()
            .find(|tag| tag.key == SUPPRESSION_TAG_KEY)
            .is_some_and(|tag| tag.value != SUPPRESSION_DISABLED_VALUE);
        if suppressed {
            return Self {
                suppressed: true,
                recipients: Vec::new(),
            };
        }

        let recipients = tags
            .iter()
            .filter(|tag| tag.key.starts_with(EMAIL_TAG_PREFIX))
            .filter_map(|tag| {
                let address = RecipientAddress::parse(&tag.value);
                if address.is_none() {
                    debug!(key = %tag.key, "ignoring blank email tag");
                }
                address
            })
            .collect();

        Self {
            suppressed: false,
            recipients,
        }
    }

    /// Collapse the record into a send decision.
    pub fn decision(self) -> PolicyDecision {
        if self.suppressed {
            PolicyDecision::Suppressed
        } else if self.recipients.is_empty() {
            PolicyDecision::NoRecipients
        } else {
            PolicyDecision::Notify(self.recipients)
        }
    }
}
