//! Composed email

use std::collections::BTreeMap;

use crate::domain::communication::{
    email_addresses::EmailAddress,
    mailer::{Attachment, Mailbox},
};

use super::{
    errors::EmailError,
    recipients::{Recipient, RecipientList},
    template::{html_to_plain, RenderedBodies},
};

/// An email being composed: sender, bodies, recipients and send options.
///
/// Sending clears the recipient list so the same email can go to another
/// audience afterwards.
#[derive(Clone, Debug)]
pub struct Email {
    sender: Mailbox,
    subject: String,
    html_body: String,
    plain_body: String,
    recipients: RecipientList,
    attachments: Vec<Attachment>,
    max_attachment_bytes: u64,
    send_as_html: bool,
    copy_to_sender: bool,
    list_recipients_in_copy: bool,
}

impl Email {
    /// Create an empty email from `sender`
    pub fn new(sender: Mailbox, max_attachment_bytes: u64) -> Self {
        Self {
            sender,
            subject: String::new(),
            html_body: String::new(),
            plain_body: String::new(),
            recipients: RecipientList::default(),
            attachments: Vec::new(),
            max_attachment_bytes,
            send_as_html: true,
            copy_to_sender: false,
            list_recipients_in_copy: false,
        }
    }

    /// The member who sends the email
    pub fn sender(&self) -> &Mailbox {
        &self.sender
    }

    /// Set the subject
    pub fn set_subject(&mut self, subject: &str) {
        self.subject = subject.trim().to_string();
    }

    /// The subject
    pub fn subject(&self) -> &str {
        &self.subject
    }

    /// Use `html` as the body without the organization template
    pub fn set_text(&mut self, html: &str) {
        self.html_body = html.to_string();
        self.plain_body = html_to_plain(html);
    }

    /// Use bodies rendered from the organization template
    pub fn set_bodies(&mut self, bodies: RenderedBodies) {
        self.html_body = bodies.html;
        self.plain_body = bodies.plain;
    }

    /// The HTML body, before per-recipient substitution
    pub fn html_body(&self) -> &str {
        &self.html_body
    }

    /// The plain text body, before per-recipient substitution
    pub fn plain_body(&self) -> &str {
        &self.plain_body
    }

    /// Add a recipient by address and display name.
    ///
    /// Fails for malformed addresses and for addresses already in the list.
    pub fn add_recipient(&mut self, address: &str, name: &str) -> Result<(), EmailError> {
        let address = parse_address(address)?;

        self.recipients.add(Recipient::new(address, name))
    }

    /// Add a member by address, first and last name.
    ///
    /// `fields` become available as `#recipient_<name>#`.
    pub fn add_member_recipient(
        &mut self,
        address: &str,
        first_name: &str,
        last_name: &str,
        fields: &BTreeMap<String, String>,
    ) -> Result<(), EmailError> {
        let address = parse_address(address)?;

        let recipient = fields.iter().fold(
            Recipient::member(address, first_name, last_name),
            |recipient, (name, value)| recipient.with_field(name, value),
        );

        self.recipients.add(recipient)
    }

    /// The recipients
    pub fn recipients(&self) -> &RecipientList {
        &self.recipients
    }

    /// Display names of all recipients
    pub fn recipient_names(&self) -> Vec<String> {
        self.recipients.names()
    }

    /// Remove every recipient
    pub fn clear_recipients(&mut self) {
        self.recipients.clear();
    }

    /// Attach a file, keeping the total below the allowed size
    pub fn add_attachment(&mut self, attachment: Attachment) -> Result<(), EmailError> {
        let total = self
            .attachments
            .iter()
            .map(|a| a.data.len() as u64)
            .sum::<u64>()
            + attachment.data.len() as u64;

        if total > self.max_attachment_bytes {
            return Err(EmailError::AttachmentTooLarge {
                max_bytes: self.max_attachment_bytes,
            });
        }

        self.attachments.push(attachment);

        Ok(())
    }

    /// The attached files
    pub fn attachments(&self) -> &[Attachment] {
        &self.attachments
    }

    /// Send the HTML body alongside the plain text
    pub fn send_as_html(&mut self, enabled: bool) {
        self.send_as_html = enabled;
    }

    /// Whether the HTML body is sent
    pub fn is_html(&self) -> bool {
        self.send_as_html
    }

    /// Send a copy to the sender after all recipients have been served
    pub fn set_copy_to_sender(&mut self, enabled: bool) {
        self.copy_to_sender = enabled;
    }

    /// Whether a copy goes to the sender
    pub fn copy_to_sender(&self) -> bool {
        self.copy_to_sender
    }

    /// List the original recipients at the top of the sender's copy
    pub fn set_list_recipients_in_copy(&mut self, enabled: bool) {
        self.list_recipients_in_copy = enabled;
    }

    /// Whether the sender's copy lists the recipients
    pub fn list_recipients_in_copy(&self) -> bool {
        self.list_recipients_in_copy
    }
}

fn parse_address(raw: &str) -> Result<EmailAddress, EmailError> {
    EmailAddress::new(raw).map_err(|_| EmailError::InvalidRecipient(raw.trim().to_string()))
}
