//! Email Address

use std::fmt;

use lazy_static::lazy_static;
use regex::Regex;
use thiserror::Error;

use EmailAddressError::*;

lazy_static! {
    static ref EMAIL_REGEX: Regex =
        Regex::new(r"^[A-Za-z0-9._%+\-']+@[A-Za-z0-9](?:[A-Za-z0-9\-]*[A-Za-z0-9])?(?:\.[A-Za-z0-9](?:[A-Za-z0-9\-]*[A-Za-z0-9])?)*\.[A-Za-z]{2,}$")
            .expect("email regex is valid");
}

/// An error that can occur when creating an email address
#[derive(Debug, Error, PartialEq, Eq)]
pub enum EmailAddressError {
    /// The email address is empty
    #[error("email is empty")]
    EmptyEmailAddress,

    /// The email address is invalid
    #[error("email is invalid")]
    InvalidEmailAddress,
}

/// A syntactically valid email address
#[derive(Clone, Debug, PartialEq, Eq, Hash)]
pub struct EmailAddress(String);

impl EmailAddress {
    /// Create a new email address, trimming surrounding whitespace
    pub fn new(raw: &str) -> Result<Self, EmailAddressError> {
        let trimmed = raw.trim();

        if trimmed.is_empty() {
            return Err(EmptyEmailAddress);
        }

        if trimmed.contains("..") || !EMAIL_REGEX.is_match(trimmed) {
            return Err(InvalidEmailAddress);
        }

        Ok(Self(trimmed.to_string()))
    }

    /// Wrap a value that was validated before it was stored
    pub fn new_unchecked(raw: &str) -> Self {
        Self(raw.to_string())
    }

    /// The address as a string slice
    pub fn as_str(&self) -> &str {
        &self.0
    }

    /// Whether both addresses name the same mailbox, ignoring case
    pub fn same_mailbox(&self, other: &EmailAddress) -> bool {
        self.0.eq_ignore_ascii_case(&other.0)
    }

    /// The domain part of the address
    pub fn domain(&self) -> &str {
        self.0.rsplit_once('@').map(|(_, d)| d).unwrap_or("")
    }
}

impl fmt::Display for EmailAddress {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

impl From<EmailAddress> for String {
    fn from(email: EmailAddress) -> Self {
        email.0
    }
}

impl TryFrom<&str> for EmailAddress {
    type Error = EmailAddressError;

    fn try_from(raw: &str) -> Result<Self, Self::Error> {
        Self::new(raw)
    }
}
