//! Mailer abstraction over the outbound transport

use async_trait::async_trait;

#[cfg(test)]
use mockall::mock;

mod errors;
mod message;

pub use errors::MailerError;
pub use message::{Attachment, Mailbox, OutgoingMessage};

/// Delivers fully addressed messages
#[async_trait]
pub trait Mailer: Clone + Send + Sync + 'static {
    /// Send a message
    ///
    /// # Arguments
    /// * `message` - The [`OutgoingMessage`] with its sender, recipients and bodies.
    ///
    /// # Returns
    /// A [`Result`] indicating success or failure.
    async fn send(&self, message: &OutgoingMessage) -> Result<(), MailerError>;
}

#[cfg(test)]
mock! {
    pub Mailer {}

    impl Clone for Mailer {
        fn clone(&self) -> Self;
    }

    #[async_trait]
    impl Mailer for Mailer {
        async fn send(&self, message: &OutgoingMessage) -> Result<(), MailerError>;
    }
}

#[cfg(test)]
pub mod tests {
    pub use super::MockMailer;
}
