//! Application state module

use std::{fmt, sync::Arc};

use chrono::{DateTime, Utc};

use crate::domain::{
    auth::SessionRepository, communication::emails::EmailService, forum::ForumSettings,
    forum::ForumTopicService,
};

/// Application configuration
#[derive(Clone, Debug)]
pub struct AppConfig {
    /// The base URL of the application
    pub base_url: String,

    /// Forum display settings
    pub forum: ForumSettings,

    /// Notify the notification role about new topics and posts
    pub notify_new_entries: bool,

    /// Largest request body accepted, in bytes
    pub upload_limit_bytes: usize,
}

/// Global application state
#[derive(Clone)]
pub struct AppState<F, S, E>
where
    F: ForumTopicService,
    S: SessionRepository,
    E: EmailService,
{
    /// The time the server started
    pub start_time: DateTime<Utc>,

    /// The application configuration
    pub config: AppConfig,

    /// Forum topic service
    pub forum: Arc<F>,

    /// Session lookup
    pub sessions: Arc<S>,

    /// Email service
    pub emails: Arc<E>,
}

impl<F, S, E> AppState<F, S, E>
where
    F: ForumTopicService,
    S: SessionRepository,
    E: EmailService,
{
    /// Create a new application state
    pub fn new(config: AppConfig, forum: F, sessions: S, emails: E) -> Self {
        Self {
            start_time: Utc::now(),
            config,
            forum: Arc::new(forum),
            sessions: Arc::new(sessions),
            emails: Arc::new(emails),
        }
    }
}

impl<F, S, E> fmt::Debug for AppState<F, S, E>
where
    F: ForumTopicService,
    S: SessionRepository,
    E: EmailService,
{
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("AppState")
            .field("start_time", &self.start_time)
            .field("config", &self.config)
            .field("forum", &"ForumTopicService")
            .field("sessions", &"SessionRepository")
            .field("emails", &"EmailService")
            .finish()
    }
}

#[cfg(test)]
pub mod tests {
    use std::sync::Arc;

    use chrono::Utc;

    use crate::domain::{
        auth::tests::MockSessionRepository, communication::emails::tests::MockEmailService,
        forum::tests::MockForumTopicService, forum::ForumSettings,
    };

    use super::{AppConfig, AppState};

    /// State for handler tests; unset services have no expectations
    pub fn test_state(
        forum: Option<MockForumTopicService>,
        sessions: Option<MockSessionRepository>,
        emails: Option<MockEmailService>,
    ) -> AppState<MockForumTopicService, MockSessionRepository, MockEmailService> {
        let config = AppConfig {
            base_url: "https://example.com".to_string(),
            forum: ForumSettings::default(),
            notify_new_entries: true,
            upload_limit_bytes: 1024 * 1024,
        };

        AppState {
            start_time: Utc::now(),
            config,
            forum: Arc::new(forum.unwrap_or_default()),
            sessions: Arc::new(sessions.unwrap_or_default()),
            emails: Arc::new(emails.unwrap_or_default()),
        }
    }
}
