//! Driven port for delivering reminder mail.

use async_trait::async_trait;

use super::define_port_error;
use crate::domain::RecipientAddress;

/// A fully rendered plain-text message ready for dispatch.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct OutboundMessage {
    /// Sender address.
    pub sender: String,
    /// Every recipient receives the same single message.
    pub recipients: Vec<RecipientAddress>,
    /// Subject line.
    pub subject: String,
    /// UTF-8 plain-text body.
    pub body: String,
}

/// Provider acknowledgement for an accepted message.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DeliveryReceipt {
    /// Provider-assigned message identifier.
    pub message_id: String,
}

define_port_error! {
    /// Errors surfaced while handing a message to the mail service.
    pub enum MailSenderError {
        /// No session could be established with the mail service.
        Connection {
            /// Transport failure detail.
            message: String,
        } => "mail service connection failed: {message}",
        /// The send call exceeded its deadline.
        Timeout {
            /// Operation that timed out.
            message: String,
        } => "mail service timeout: {message}",
        /// The message could not be built for the provider.
        InvalidMessage {
            /// Validation failure detail.
            message: String,
        } => "mail message invalid: {message}",
        /// The mail service refused the message.
        Rejected {
            /// Service failure detail.
            message: String,
        } => "mail service rejected message: {message}",
    }
}

/// Port for sending one message to one or more recipients.
#[cfg_attr(test, mockall::automock)]
#[async_trait]
pub trait MailSender: Send + Sync {
    /// Send `message` to all of its recipients in a single dispatch.
    async fn send(&self, message: &OutboundMessage) -> Result<DeliveryReceipt, MailSenderError>;
}
