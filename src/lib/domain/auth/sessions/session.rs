//! Session and current user

use constant_time_eq::constant_time_eq;
use uuid::Uuid;

use crate::domain::communication::{email_addresses::EmailAddress, mailer::Mailbox};

/// The signed-in member
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct CurrentUser {
    /// Member UUID
    pub id: Uuid,

    /// First name
    pub first_name: String,

    /// Last name
    pub last_name: String,

    /// Primary email address
    pub email: EmailAddress,

    /// Member of a role with administrator rights
    pub is_administrator: bool,

    /// Member of a role that administers the forum
    pub is_forum_administrator: bool,
}

impl CurrentUser {
    /// Full name
    pub fn name(&self) -> String {
        format!("{} {}", self.first_name, self.last_name)
            .trim()
            .to_string()
    }

    /// The member as a sender or recipient mailbox
    pub fn mailbox(&self) -> Mailbox {
        Mailbox::new(self.email.clone(), self.name())
    }

    /// Whether the member may change forum content written by `author_id`
    pub fn can_edit_forum_entry(&self, author_id: &Uuid) -> bool {
        self.is_administrator || self.is_forum_administrator || self.id == *author_id
    }
}

/// An active session
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct Session {
    /// Session id from the cookie
    pub id: String,

    /// Token that form submissions must echo back
    pub csrf_token: String,

    /// The signed-in member
    pub user: CurrentUser,
}

impl Session {
    /// Compare a submitted CSRF token in constant time
    pub fn verify_csrf_token(&self, token: &str) -> bool {
        !self.csrf_token.is_empty() && constant_time_eq(self.csrf_token.as_bytes(), token.as_bytes())
    }
}
