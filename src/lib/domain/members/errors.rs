//! Errors for member lookups

use thiserror::Error;

/// Errors that can occur when looking up member addresses
#[derive(Debug, Error)]
pub enum MemberLookupError {
    /// Unknown error
    #[error(transparent)]
    UnknownError(#[from] anyhow::Error),
}

impl From<sqlx::Error> for MemberLookupError {
    fn from(err: sqlx::Error) -> Self {
        MemberLookupError::UnknownError(err.into())
    }
}
