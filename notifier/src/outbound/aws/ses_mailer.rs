//! SES-backed mail sender.

use async_trait::async_trait;
use aws_config::{Region, SdkConfig};
use aws_sdk_ses::Client;
use aws_sdk_ses::error::{BuildError, DisplayErrorContext, SdkError};
use aws_sdk_ses::types::{Body, Content, Destination, Message};

use crate::domain::RecipientAddress;
use crate::domain::ports::{DeliveryReceipt, MailSender, MailSenderError, OutboundMessage};

const CHARSET: &str = "UTF-8";

/// Mail sender backed by the SES `SendEmail` operation.
///
/// Every recipient is placed on the `To` line of a single request.
#[derive(Clone, Debug)]
pub struct SesMailSender {
    client: Client,
}

impl SesMailSender {
    /// Build an adapter that sends through `region`, overriding the region of
    /// the shared SDK configuration.
    pub fn new(config: &SdkConfig, region: impl Into<String>) -> Self {
        let ses_config = aws_sdk_ses::config::Builder::from(config)
            .region(Region::new(region.into()))
            .build();
        Self::from_client(Client::from_conf(ses_config))
    }

    /// Wrap an existing SES client.
    pub fn from_client(client: Client) -> Self {
        Self { client }
    }
}

#[async_trait]
impl MailSender for SesMailSender {
    async fn send(&self, message: &OutboundMessage) -> Result<DeliveryReceipt, MailSenderError> {
        let output = self
            .client
            .send_email()
            .source(&message.sender)
            .destination(destination(&message.recipients))
            .message(build_message(message)?)
            .send()
            .await
            .map_err(|error| map_sdk_error(&error))?;

        Ok(DeliveryReceipt {
            message_id: output.message_id().to_owned(),
        })
    }
}

fn destination(recipients: &[RecipientAddress]) -> Destination {
    Destination::builder()
        .set_to_addresses(Some(
            recipients
                .iter()
                .map(|recipient| recipient.as_str().to_owned())
                .collect(),
        ))
        .build()
}

fn build_message(message: &OutboundMessage) -> Result<Message, MailSenderError> {
    let subject = utf8_content(&message.subject)?;
    let text = utf8_content(&message.body)?;
    Ok(Message::builder()
        .subject(subject)
        .body(Body::builder().text(text).build())
        .build())
}

fn utf8_content(data: &str) -> Result<Content, MailSenderError> {
    Content::builder()
        .charset(CHARSET)
        .data(data)
        .build()
        .map_err(map_build_error)
}

fn map_build_error(error: BuildError) -> MailSenderError {
    MailSenderError::invalid_message(error.to_string())
}

fn map_sdk_error<E, R>(error: &SdkError<E, R>) -> MailSenderError
where
    E: std::error::Error + 'static,
    R: std::fmt::Debug,
{
    let message = format!("SendEmail: {}", DisplayErrorContext(error));
    match error {
        SdkError::TimeoutError(_) => MailSenderError::timeout(message),
        SdkError::DispatchFailure(_) => MailSenderError::connection(message),
        SdkError::ConstructionFailure(_) => MailSenderError::invalid_message(message),
        _ => MailSenderError::rejected(message),
    }
}
