//! IAM-backed identity directory adapter.
//!
//! This adapter owns SDK details only: request construction, response
//! decoding into domain records, and SDK error classification.

use async_trait::async_trait;
use aws_config::SdkConfig;
use aws_sdk_iam::Client;
use aws_sdk_iam::error::{DisplayErrorContext, SdkError};
use aws_sdk_iam::primitives::DateTime as SmithyDateTime;
use aws_sdk_iam::types::{AccessKeyMetadata, Tag};
use chrono::{DateTime, Utc};
use tracing::warn;

use crate::domain::ports::{IdentityDirectory, IdentityDirectoryError};
use crate::domain::{Credential, Identity, MetadataTag};

/// Identity directory backed by the IAM `ListUsers`, `ListAccessKeys`, and
/// `ListUserTags` operations.
#[derive(Clone, Debug)]
pub struct IamIdentityDirectory {
    client: Client,
}

impl IamIdentityDirectory {
    /// Build an adapter from a loaded SDK configuration.
    pub fn new(config: &SdkConfig) -> Self {
        Self::from_client(Client::new(config))
    }

    /// Wrap an existing IAM client.
    pub fn from_client(client: Client) -> Self {
        Self { client }
    }
}

#[async_trait]
impl IdentityDirectory for IamIdentityDirectory {
    async fn list_identities(
        &self,
        max_items: i32,
    ) -> Result<Vec<Identity>, IdentityDirectoryError> {
        let output = self
            .client
            .list_users()
            .max_items(max_items)
            .send()
            .await
            .map_err(|error| map_sdk_error("ListUsers", &error))?;

        Ok(output
            .users()
            .iter()
            .map(|user| Identity::new(user.user_name()))
            .collect())
    }

    async fn list_credentials(
        &self,
        identity: &Identity,
    ) -> Result<Vec<Credential>, IdentityDirectoryError> {
        let output = self
            .client
            .list_access_keys()
            .user_name(identity.user_name())
            .send()
            .await
            .map_err(|error| map_sdk_error("ListAccessKeys", &error))?;

        Ok(output
            .access_key_metadata()
            .iter()
            .filter_map(|metadata| credential_from_metadata(identity, metadata))
            .collect())
    }

    async fn list_tags(
        &self,
        identity: &Identity,
        max_items: i32,
    ) -> Result<Vec<MetadataTag>, IdentityDirectoryError> {
        let output = self
            .client
            .list_user_tags()
            .user_name(identity.user_name())
            .max_items(max_items)
            .send()
            .await
            .map_err(|error| map_sdk_error("ListUserTags", &error))?;

        Ok(output.tags().iter().map(tag_from_sdk).collect())
    }
}

/// Decode one key record, dropping records the provider returned without an
/// id or creation date.
fn credential_from_metadata(
    identity: &Identity,
    metadata: &AccessKeyMetadata,
) -> Option<Credential> {
    let Some(access_key_id) = metadata.access_key_id() else {
        warn!(user = %identity, "skipping access key without an id");
        return None;
    };
    let Some(created_at) = metadata.create_date().and_then(to_chrono) else {
        warn!(
            user = %identity,
            access_key_id,
            "skipping access key without a usable creation date"
        );
        return None;
    };

    Some(Credential {
        access_key_id: access_key_id.to_owned(),
        user_name: metadata
            .user_name()
            .unwrap_or_else(|| identity.user_name())
            .to_owned(),
        created_at,
    })
}

fn tag_from_sdk(tag: &Tag) -> MetadataTag {
    MetadataTag::new(tag.key(), tag.value())
}

fn to_chrono(instant: &SmithyDateTime) -> Option<DateTime<Utc>> {
    DateTime::from_timestamp(instant.secs(), instant.subsec_nanos())
}

fn map_sdk_error<E, R>(operation: &str, error: &SdkError<E, R>) -> IdentityDirectoryError
where
    E: std::error::Error + 'static,
    R: std::fmt::Debug,
{
    let message = format!("{operation}: {}", DisplayErrorContext(error));
    match error {
        SdkError::TimeoutError(_) => IdentityDirectoryError::timeout(message),
        SdkError::DispatchFailure(_) => IdentityDirectoryError::connection(message),
        _ => IdentityDirectoryError::query(message),
    }
}

#[cfg(test)]
mod tests {
    //! Regression coverage for non-network IAM mapping helpers.

    use super::*;
    use aws_sdk_iam::operation::list_users::ListUsersError;
    use rstest::rstest;

    const CREATED_SECS: i64 = 1_700_000_000;

    fn identity() -> Identity {
        Identity::new("alice")
    }

    #[test]
    fn decodes_access_key_metadata() {
        let metadata = AccessKeyMetadata::builder()
            .user_name("alice")
            .access_key_id("AKIAALICE")
            .create_date(SmithyDateTime::from_secs(CREATED_SECS))
            .build();

        let credential =
            credential_from_metadata(&identity(), &metadata).expect("metadata should decode");

        assert_eq!(credential.access_key_id, "AKIAALICE");
        assert_eq!(credential.user_name, "alice");
        assert_eq!(credential.created_at.timestamp(), CREATED_SECS);
    }

    #[test]
    fn falls_back_to_the_queried_user_name() {
        let metadata = AccessKeyMetadata::builder()
            .access_key_id("AKIAALICE")
            .create_date(SmithyDateTime::from_secs(CREATED_SECS))
            .build();

        let credential =
            credential_from_metadata(&identity(), &metadata).expect("metadata should decode");

        assert_eq!(credential.user_name, "alice");
    }

    #[rstest]
    #[case::missing_id(
        AccessKeyMetadata::builder()
            .create_date(SmithyDateTime::from_secs(CREATED_SECS))
            .build()
    )]
    #[case::missing_date(AccessKeyMetadata::builder().access_key_id("AKIAALICE").build())]
    fn skips_incomplete_metadata(#[case] metadata: AccessKeyMetadata) {
        assert!(credential_from_metadata(&identity(), &metadata).is_none());
    }

    #[test]
    fn preserves_sub_second_precision() {
        let instant = SmithyDateTime::from_fractional_secs(CREATED_SECS, 0.5);
        let converted = to_chrono(&instant).expect("instant should convert");
        assert_eq!(converted.timestamp_subsec_millis(), 500);
    }

    #[test]
    fn decodes_tags() {
        let tag = Tag::builder()
            .key("email_manager")
            .value("boss@example.com")
            .build()
            .expect("tag should build");

        assert_eq!(
            tag_from_sdk(&tag),
            MetadataTag::new("email_manager", "boss@example.com")
        );
    }

    #[test]
    fn maps_timeouts_to_timeout_errors() {
        let error: SdkError<ListUsersError, ()> = SdkError::timeout_error("deadline elapsed");

        let mapped = map_sdk_error("ListUsers", &error);

        assert!(
            matches!(mapped, IdentityDirectoryError::Timeout { ref message } if message.starts_with("ListUsers")),
            "timeouts should map to Timeout: {mapped:?}",
        );
    }

    #[test]
    fn maps_construction_failures_to_query_errors() {
        let error: SdkError<ListUsersError, ()> =
            SdkError::construction_failure("missing user name");

        let mapped = map_sdk_error("ListAccessKeys", &error);

        assert!(
            matches!(mapped, IdentityDirectoryError::Query { .. }),
            "construction failures should map to Query: {mapped:?}",
        );
    }
}
