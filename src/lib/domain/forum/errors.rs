//! Error types for the forum

use thiserror::Error;
use uuid::Uuid;

/// Errors raised by forum queries and commands
#[derive(Debug, Error)]
pub enum ForumError {
    /// Topic not found
    #[error("topic with id \"{0}\" not found")]
    TopicNotFound(Uuid),

    /// Post not found
    #[error("post with id \"{0}\" not found")]
    PostNotFound(Uuid),

    /// The member may not perform this action
    #[error("not authorized")]
    NotAuthorized,

    /// Submitted data is incomplete or inconsistent
    #[error("{0}")]
    InvalidInput(String),

    /// Unknown error
    #[error(transparent)]
    UnknownError(#[from] anyhow::Error),
}
