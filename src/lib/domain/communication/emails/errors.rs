//! Error types for composing and sending emails

use thiserror::Error;
use tracing::debug;

use crate::domain::{
    communication::mailer::MailerError,
    members::errors::MemberLookupError,
};

/// Errors raised while composing or sending an email
#[derive(Debug, Error)]
pub enum EmailError {
    /// The address is not a valid email address
    #[error("\"{0}\" is not a valid email address")]
    InvalidRecipient(String),

    /// The address is already a recipient of this email
    #[error("\"{0}\" is already a recipient")]
    DuplicateRecipient(String),

    /// The email has no recipients
    #[error("the email has no recipients")]
    NoRecipients,

    /// Attachments exceed the allowed size
    #[error("attachments exceed the maximum size of {max_bytes} bytes")]
    AttachmentTooLarge {
        /// The allowed total in bytes
        max_bytes: u64,
    },

    /// The transport failed; remaining batches were not sent
    #[error("the email could not be sent: {0}")]
    SendFailed(String),

    /// Some individual sends failed in single mode
    #[error("the email could not be sent to {} recipient(s): {last_error}", failed.len())]
    RecipientsFailed {
        /// The most recent transport error
        last_error: String,

        /// Display names and addresses of the failed recipients
        failed: Vec<String>,
    },

    /// Unknown error
    #[error(transparent)]
    UnknownError(#[from] anyhow::Error),
}

impl EmailError {
    /// A message for the member who triggered the send; only administrators
    /// see which recipients failed.
    pub fn describe(&self, show_recipients: bool) -> String {
        match self {
            EmailError::RecipientsFailed { last_error, failed } if show_recipients => format!(
                "The email could not be sent to the following recipients: {}. Last error: {}",
                failed.join(", "),
                last_error
            ),
            EmailError::RecipientsFailed { last_error, failed } => format!(
                "The email could not be sent to {} recipient(s). Last error: {}",
                failed.len(),
                last_error
            ),
            _ => self.to_string(),
        }
    }
}

impl From<MailerError> for EmailError {
    fn from(err: MailerError) -> Self {
        debug!("MailerError -> EmailError");

        match err {
            MailerError::SendError(message) => EmailError::SendFailed(message),
            MailerError::InvalidEmail => {
                EmailError::SendFailed("invalid email address".to_string())
            }
            MailerError::UnknownError(e) => EmailError::SendFailed(e.to_string()),
        }
    }
}

impl From<MemberLookupError> for EmailError {
    fn from(err: MemberLookupError) -> Self {
        debug!("MemberLookupError -> EmailError");

        match err {
            MemberLookupError::UnknownError(e) => EmailError::UnknownError(e),
        }
    }
}
