//! Session lookup

use async_trait::async_trait;

#[cfg(test)]
use mockall::mock;

mod session;

pub use session::{CurrentUser, Session};

use super::errors::SessionError;

/// Session repository
#[async_trait]
pub trait SessionRepository: Clone + Send + Sync + 'static {
    /// Load an unexpired session together with its member
    async fn get_session(&self, session_id: &str) -> Result<Session, SessionError>;
}

#[cfg(test)]
mock! {
    pub SessionRepository {}

    impl Clone for SessionRepository {
        fn clone(&self) -> Self;
    }

    #[async_trait]
    impl SessionRepository for SessionRepository {
        async fn get_session(&self, session_id: &str) -> Result<Session, SessionError>;
    }
}

#[cfg(test)]
pub mod tests {
    pub use super::session::tests::{administrator, member};
}
