//! Splitting a recipient list into bulk send batches

use crate::domain::communication::mailer::Mailbox;

use super::recipients::Recipient;

/// Addressing of one bulk message
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct Batch<'a> {
    /// The recipients covered by this batch
    pub recipients: &'a [Recipient],

    /// The `To` header
    pub to: Vec<Mailbox>,

    /// The `Bcc` header
    pub bcc: Vec<Mailbox>,
}

impl Batch<'_> {
    /// The only recipient of a direct batch
    pub fn single_recipient(&self) -> Option<&Recipient> {
        match self.recipients {
            [recipient] => Some(recipient),
            _ => None,
        }
    }
}

/// Chunk `recipients` into batches of at most `batch_size` and choose the
/// addressing of each.
///
/// A batch with one recipient is addressed directly. Larger batches go to
/// `To` when recipients may see each other, otherwise to `Bcc` with
/// `placeholder` as the `To` address, since some providers reject messages
/// without one.
pub fn plan_batches<'a>(
    recipients: &'a [Recipient],
    batch_size: usize,
    recipients_visible: bool,
    placeholder: &Mailbox,
) -> Vec<Batch<'a>> {
    recipients
        .chunks(batch_size.max(1))
        .map(|chunk| {
            let mailboxes = chunk.iter().map(Recipient::mailbox).collect::<Vec<_>>();

            if chunk.len() == 1 || recipients_visible {
                Batch {
                    recipients: chunk,
                    to: mailboxes,
                    bcc: Vec::new(),
                }
            } else {
                Batch {
                    recipients: chunk,
                    to: vec![placeholder.clone()],
                    bcc: mailboxes,
                }
            }
        })
        .collect()
}
