//! Domain ports for the hexagonal boundary.

mod macros;
pub(crate) use macros::define_port_error;

mod identity_directory;
mod mail_sender;

#[cfg(test)]
pub use identity_directory::MockIdentityDirectory;
pub use identity_directory::{DIRECTORY_PAGE_SIZE, IdentityDirectory, IdentityDirectoryError};
#[cfg(test)]
pub use mail_sender::MockMailSender;
pub use mail_sender::{DeliveryReceipt, MailSender, MailSenderError, OutboundMessage};
