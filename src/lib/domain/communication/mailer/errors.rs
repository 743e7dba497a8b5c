//! Mailer errors

use lettre::{address::AddressError, error::Error, transport::smtp};
use thiserror::Error;

/// Mailer errors
#[derive(Debug, Error)]
pub enum MailerError {
    /// The transport rejected or failed to deliver the message
    #[error("{0}")]
    SendError(String),

    /// Invalid email address
    #[error("Invalid email address")]
    InvalidEmail,

    /// Unknown error
    #[error(transparent)]
    UnknownError(anyhow::Error),
}

impl From<anyhow::Error> for MailerError {
    fn from(err: anyhow::Error) -> Self {
        MailerError::UnknownError(err)
    }
}

impl From<AddressError> for MailerError {
    fn from(_err: AddressError) -> Self {
        MailerError::InvalidEmail
    }
}

impl From<Error> for MailerError {
    fn from(err: Error) -> Self {
        MailerError::UnknownError(err.into())
    }
}

impl From<smtp::Error> for MailerError {
    fn from(err: smtp::Error) -> Self {
        MailerError::SendError(err.to_string())
    }
}
