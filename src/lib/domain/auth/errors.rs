//! Error types for sessions

use thiserror::Error;

/// Errors that can occur when loading a session
#[derive(Debug, Error)]
pub enum SessionError {
    /// No valid session for the presented id
    #[error("session not found or expired")]
    SessionNotFound,

    /// Unknown error
    #[error(transparent)]
    UnknownError(#[from] anyhow::Error),
}

impl From<sqlx::Error> for SessionError {
    fn from(err: sqlx::Error) -> Self {
        match err {
            sqlx::Error::RowNotFound => SessionError::SessionNotFound,
            _ => SessionError::UnknownError(err.into()),
        }
    }
}
