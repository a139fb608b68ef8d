//! Outbound adapters implementing domain ports for external infrastructure.
//!
//! Adapters are thin translators between domain types and provider SDK
//! representations. They contain no business logic.
//!
//! - **aws**: IAM identity directory and SES mail delivery.

pub mod aws;
