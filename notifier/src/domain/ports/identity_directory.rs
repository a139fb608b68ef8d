//! Driven port for querying the identity directory.
//!
//! The domain only needs three read-only queries; adapters own pagination
//! limits, transport, and response decoding.

use async_trait::async_trait;

use super::define_port_error;
use crate::domain::{Credential, Identity, MetadataTag};

/// Page size used for identity and tag listings.
pub const DIRECTORY_PAGE_SIZE: i32 = 1000;

define_port_error! {
    /// Errors surfaced while querying the identity directory.
    pub enum IdentityDirectoryError {
        /// No session could be established with the directory.
        Connection {
            /// Transport failure detail.
            message: String,
        } => "identity directory connection failed: {message}",
        /// The directory call exceeded its deadline.
        Timeout {
            /// Operation that timed out.
            message: String,
        } => "identity directory timeout: {message}",
        /// The directory rejected or failed the query.
        Query {
            /// Service failure detail.
            message: String,
        } => "identity directory query failed: {message}",
    }
}

/// Port for the identity directory queries the reminder job needs.
#[cfg_attr(test, mockall::automock)]
#[async_trait]
pub trait IdentityDirectory: Send + Sync {
    /// List identities, returning at most `max_items`.
    async fn list_identities(&self, max_items: i32)
    -> Result<Vec<Identity>, IdentityDirectoryError>;

    /// List an identity's credentials in provider order.
    async fn list_credentials(
        &self,
        identity: &Identity,
    ) -> Result<Vec<Credential>, IdentityDirectoryError>;

    /// List an identity's tags, returning at most `max_items`.
    async fn list_tags(
        &self,
        identity: &Identity,
        max_items: i32,
    ) -> Result<Vec<MetadataTag>, IdentityDirectoryError>;
}
