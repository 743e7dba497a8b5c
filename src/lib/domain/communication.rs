//! Member communication: addresses, mailer abstraction and composed emails

pub mod email_addresses;
pub mod emails;
pub mod mailer;
