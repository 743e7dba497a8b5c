//! Composing emails to members and dispatching them through the mailer

mod batching;
mod email;
mod recipients;
mod service;
mod settings;
mod template;

pub mod errors;

pub use batching::{plan_batches, Batch};
pub use email::Email;
pub use recipients::{Recipient, RecipientList};
pub use service::{EmailService, EmailServiceImpl};
pub use settings::{MailSettings, OrganizationSettings, PlaceholderRecipient, SendingMode, SizeUnit};
pub use template::{escape_html, html_to_plain, EmailTemplate, RenderedBodies, TemplateContext};
