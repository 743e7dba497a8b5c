//! Outgoing message

use std::fmt;

use crate::domain::communication::email_addresses::EmailAddress;

/// An address with an optional display name
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct Mailbox {
    /// The mailbox address
    pub address: EmailAddress,

    /// The display name
    pub name: Option<String>,
}

impl Mailbox {
    /// Create a mailbox, dropping blank names
    pub fn new(address: EmailAddress, name: impl Into<String>) -> Self {
        let name = name.into();
        let name = name.trim();

        Self {
            address,
            name: (!name.is_empty()).then(|| name.to_string()),
        }
    }

    /// Create a mailbox without a display name
    pub fn bare(address: EmailAddress) -> Self {
        Self {
            address,
            name: None,
        }
    }
}

impl fmt::Display for Mailbox {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match &self.name {
            Some(name) => write!(f, "{} <{}>", name, self.address),
            None => write!(f, "{}", self.address),
        }
    }
}

/// A file attached to a message
#[derive(Clone, PartialEq, Eq)]
pub struct Attachment {
    /// The file name shown to recipients
    pub filename: String,

    /// The MIME content type
    pub content_type: String,

    /// The raw file content
    pub data: Vec<u8>,
}

impl fmt::Debug for Attachment {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Attachment")
            .field("filename", &self.filename)
            .field("content_type", &self.content_type)
            .field("size", &self.data.len())
            .finish()
    }
}

/// A fully addressed message handed to the transport
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct OutgoingMessage {
    /// The `From` header
    pub from: Mailbox,

    /// The `Reply-To` header
    pub reply_to: Option<Mailbox>,

    /// Visible recipients
    pub to: Vec<Mailbox>,

    /// Blind-copy recipients
    pub bcc: Vec<Mailbox>,

    /// The subject of the email
    pub subject: String,

    /// The plain text body of the email
    pub plain_body: String,

    /// The HTML body, when the message is sent as HTML
    pub html_body: Option<String>,

    /// Attached files
    pub attachments: Vec<Attachment>,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_mailbox_display() {
        let address = EmailAddress::new_unchecked("jane@example.com");

        assert_eq!(
            Mailbox::new(address.clone(), "Jane Doe").to_string(),
            "Jane Doe <jane@example.com>"
        );
        assert_eq!(Mailbox::new(address, "  ").to_string(), "jane@example.com");
    }

    #[test]
    fn test_attachment_debug_hides_content() {
        let attachment = Attachment {
            filename: "minutes.pdf".to_string(),
            content_type: "application/pdf".to_string(),
            data: vec![0; 2048],
        };

        let debug = format!("{attachment:?}");

        assert!(debug.contains("minutes.pdf"));
        assert!(debug.contains("2048"));
    }
}
