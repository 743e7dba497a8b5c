//! Recipient list of a single email

use std::collections::BTreeMap;

use crate::domain::communication::{email_addresses::EmailAddress, mailer::Mailbox};

use super::errors::EmailError;

/// One entry of an email's recipient list
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct Recipient {
    /// The recipient's address
    pub address: EmailAddress,

    /// The display name
    pub name: String,

    /// First name, for personalized templates
    pub first_name: String,

    /// Last name, for personalized templates
    pub last_name: String,

    /// Extra profile fields available as `#recipient_<key>#`
    pub extra: BTreeMap<String, String>,
}

impl Recipient {
    /// Create a recipient with a display name only
    pub fn new(address: EmailAddress, name: &str) -> Self {
        Self {
            address,
            name: name.trim().to_string(),
            first_name: String::new(),
            last_name: String::new(),
            extra: BTreeMap::new(),
        }
    }

    /// Create a recipient from a member's first and last name
    pub fn member(address: EmailAddress, first_name: &str, last_name: &str) -> Self {
        let name = format!("{} {}", first_name.trim(), last_name.trim());

        Self {
            address,
            name: name.trim().to_string(),
            first_name: first_name.trim().to_string(),
            last_name: last_name.trim().to_string(),
            extra: BTreeMap::new(),
        }
    }

    /// Attach an extra template field
    pub fn with_field(mut self, key: &str, value: &str) -> Self {
        self.extra.insert(key.to_lowercase(), value.to_string());
        self
    }

    /// The recipient as a transport mailbox
    pub fn mailbox(&self) -> Mailbox {
        Mailbox::new(self.address.clone(), self.name.clone())
    }

    /// The name to show in recipient listings, falling back to the address
    pub fn display_name(&self) -> &str {
        if self.name.is_empty() {
            self.address.as_str()
        } else {
            &self.name
        }
    }
}

/// Ordered recipients with unique addresses
#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub struct RecipientList {
    recipients: Vec<Recipient>,
}

impl RecipientList {
    /// Add a recipient, rejecting a mailbox that is already present
    pub fn add(&mut self, recipient: Recipient) -> Result<(), EmailError> {
        if self.contains(&recipient.address) {
            return Err(EmailError::DuplicateRecipient(
                recipient.address.to_string(),
            ));
        }

        self.recipients.push(recipient);

        Ok(())
    }

    /// Whether the mailbox is already a recipient
    pub fn contains(&self, address: &EmailAddress) -> bool {
        self.recipients
            .iter()
            .any(|r| r.address.same_mailbox(address))
    }

    /// The recipients in insertion order
    pub fn as_slice(&self) -> &[Recipient] {
        &self.recipients
    }

    /// Display names of all recipients
    pub fn names(&self) -> Vec<String> {
        self.recipients
            .iter()
            .map(|r| r.display_name().to_string())
            .collect()
    }

    /// Number of recipients
    pub fn len(&self) -> usize {
        self.recipients.len()
    }

    /// Whether there are no recipients
    pub fn is_empty(&self) -> bool {
        self.recipients.is_empty()
    }

    /// Remove all recipients
    pub fn clear(&mut self) {
        self.recipients.clear();
    }
}
