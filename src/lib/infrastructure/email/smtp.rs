//! SMTP mailer implementation

use std::{fmt, time::Duration};

use anyhow::{anyhow, Result};
use async_trait::async_trait;
use clap::{ArgAction, Parser};
use lettre::{
    message::{
        header::ContentType, Attachment as AttachmentPart, Mailbox as LettreMailbox, MultiPart,
        SinglePart,
    },
    transport::smtp::{
        authentication::Credentials,
        client::{Tls, TlsParameters},
    },
    AsyncSmtpTransport, AsyncTransport, Message, Tokio1Executor,
};
use tracing::debug;

use crate::domain::communication::mailer::{Mailbox, Mailer, MailerError, OutgoingMessage};

/// SMTP configuration
#[derive(Clone, Default, Parser)]
pub struct SMTPConfig {
    /// The SMTP host
    #[clap(long = "smtp-host", env = "SMTP_HOST")]
    pub host: String,

    /// The SMTP port
    #[clap(long = "smtp-port", env = "SMTP_PORT", default_value_t = 587)]
    pub port: u16,

    /// The SMTP username
    #[clap(long = "smtp-user", env = "SMTP_USER", default_value = "")]
    pub username: String,

    /// The SMTP password
    #[clap(long = "smtp-password", env = "SMTP_PASSWORD", default_value = "")]
    pub password: String,

    /// Verify the TLS certificate
    #[clap(long = "smtp-verify-tls", env = "SMTP_VERIFY_TLS", default_value_t = true, action = ArgAction::Set)]
    pub verify_tls: bool,

    /// Enable STARTTLS (TLS upgrade on connection)
    #[clap(long = "smtp-starttls", env = "SMTP_STARTTLS", default_value_t = true, action = ArgAction::Set)]
    pub starttls: bool,

    /// Seconds to wait for the SMTP server
    #[clap(long = "smtp-timeout-secs", env = "SMTP_TIMEOUT_SECS", default_value_t = 30)]
    pub timeout_secs: u64,
}

impl fmt::Debug for SMTPConfig {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("SMTPConfig")
            .field("host", &self.host)
            .field("port", &self.port)
            .field("username", &self.username)
            .field("password", &"********")
            .field("verify_tls", &self.verify_tls)
            .field("starttls", &self.starttls)
            .field("timeout_secs", &self.timeout_secs)
            .finish()
    }
}

/// SMTP mailer
#[derive(Clone)]
pub struct SMTPMailer {
    config: SMTPConfig,
    transport: AsyncSmtpTransport<Tokio1Executor>,
}

impl SMTPMailer {
    /// Create a new SMTP mailer
    pub fn new(config: SMTPConfig) -> Result<Self> {
        let tls_parameters = TlsParameters::builder(config.host.clone())
            .dangerous_accept_invalid_certs(!config.verify_tls)
            .build()?;

        let tls = if config.starttls {
            Tls::Required(tls_parameters)
        } else {
            Tls::Wrapper(tls_parameters)
        };

        let mut builder = AsyncSmtpTransport::<Tokio1Executor>::builder_dangerous(&config.host)
            .port(config.port)
            .tls(tls)
            .timeout(Some(Duration::from_secs(config.timeout_secs)));

        if !config.username.is_empty() {
            builder = builder.credentials(Credentials::new(
                config.username.clone(),
                config.password.clone(),
            ));
        }

        Ok(Self {
            transport: builder.build(),
            config,
        })
    }
}

impl fmt::Debug for SMTPMailer {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("SMTPMailer")
            .field("config", &self.config)
            .finish()
    }
}

#[async_trait]
impl Mailer for SMTPMailer {
    #[mutants::skip]
    async fn send(&self, message: &OutgoingMessage) -> Result<(), MailerError> {
        let email = build_message(message)?;

        self.transport.send(email).await?;

        debug!(
            "sent \"{}\" via {}:{}",
            message.subject, self.config.host, self.config.port
        );

        Ok(())
    }
}

fn mailbox(mailbox: &Mailbox) -> Result<LettreMailbox, MailerError> {
    Ok(LettreMailbox::new(
        mailbox.name.clone(),
        mailbox.address.as_str().parse()?,
    ))
}

/// Unknown content types are sent as `application/octet-stream`
fn content_type(raw: &str) -> Result<ContentType, MailerError> {
    ContentType::parse(raw)
        .or_else(|_| ContentType::parse("application/octet-stream"))
        .map_err(|err| MailerError::UnknownError(anyhow!("invalid content type: {err}")))
}

/// Convert an [`OutgoingMessage`] to a MIME message.
///
/// The body is `multipart/alternative` when HTML is sent, and wrapped in
/// `multipart/mixed` when there are attachments.
fn build_message(message: &OutgoingMessage) -> Result<Message, MailerError> {
    let mut builder = Message::builder()
        .from(mailbox(&message.from)?)
        .subject(message.subject.clone());

    if let Some(reply_to) = &message.reply_to {
        builder = builder.reply_to(mailbox(reply_to)?);
    }

    for to in &message.to {
        builder = builder.to(mailbox(to)?);
    }

    for bcc in &message.bcc {
        builder = builder.bcc(mailbox(bcc)?);
    }

    let plain = SinglePart::plain(message.plain_body.clone());

    let body = match &message.html_body {
        Some(html) => MultiPart::alternative()
            .singlepart(plain)
            .singlepart(SinglePart::html(html.clone())),
        None if message.attachments.is_empty() => return Ok(builder.singlepart(plain)?),
        None => MultiPart::mixed().singlepart(plain),
    };

    if message.attachments.is_empty() {
        return Ok(builder.multipart(body)?);
    }

    let mut mixed = if message.html_body.is_some() {
        MultiPart::mixed().multipart(body)
    } else {
        body
    };

    for attachment in &message.attachments {
        mixed = mixed.singlepart(
            AttachmentPart::new(attachment.filename.clone())
                .body(attachment.data.clone(), content_type(&attachment.content_type)?),
        );
    }

    Ok(builder.multipart(mixed)?)
}

#[cfg(test)]
mod tests {
    use testresult::TestResult;

    use crate::domain::communication::{email_addresses::EmailAddress, mailer::Attachment};

    use super::*;

    fn mailbox(address: &str, name: &str) -> Mailbox {
        Mailbox::new(EmailAddress::new_unchecked(address), name)
    }

    fn message() -> OutgoingMessage {
        OutgoingMessage {
            from: mailbox("noreply@example.com", "Jane Doe"),
            reply_to: Some(mailbox("jane@example.com", "Jane Doe")),
            to: vec![mailbox("board@example.com", "Board")],
            bcc: vec![
                mailbox("john@example.com", "John Roe"),
                mailbox("alex@example.com", ""),
            ],
            subject: "General assembly".to_string(),
            plain_body: "See you on Friday".to_string(),
            html_body: Some("<p>See you on Friday</p>".to_string()),
            attachments: Vec::new(),
        }
    }

    #[test]
    fn test_envelope_includes_blind_copies() -> TestResult {
        let email = build_message(&message())?;

        let recipients = email
            .envelope()
            .to()
            .iter()
            .map(|address| address.to_string())
            .collect::<Vec<_>>();

        assert_eq!(recipients.len(), 3);
        assert!(recipients.contains(&"john@example.com".to_string()));
        assert!(recipients.contains(&"alex@example.com".to_string()));

        let formatted = String::from_utf8(email.formatted())?;

        assert!(formatted.contains("Reply-To: "));
        assert!(formatted.contains("<jane@example.com>"));
        assert!(!formatted.contains("john@example.com"));
        assert!(formatted.contains("multipart/alternative"));

        Ok(())
    }

    #[test]
    fn test_plain_message_without_attachments() -> TestResult {
        let email = build_message(&OutgoingMessage {
            html_body: None,
            reply_to: None,
            ..message()
        })?;

        let formatted = String::from_utf8(email.formatted())?;

        assert!(!formatted.contains("multipart"));
        assert!(!formatted.contains("Reply-To"));
        assert!(formatted.contains("See you on Friday"));

        Ok(())
    }

    #[test]
    fn test_attachments_use_mixed_body() -> TestResult {
        let email = build_message(&OutgoingMessage {
            attachments: vec![Attachment {
                filename: "agenda.txt".to_string(),
                content_type: "not a content type".to_string(),
                data: b"1. Welcome".to_vec(),
            }],
            ..message()
        })?;

        let formatted = String::from_utf8(email.formatted())?;

        assert!(formatted.contains("multipart/mixed"));
        assert!(formatted.contains("multipart/alternative"));
        assert!(formatted.contains("filename=\"agenda.txt\""));
        assert!(formatted.contains("application/octet-stream"));

        Ok(())
    }

    #[test]
    fn test_invalid_address() {
        let result = build_message(&OutgoingMessage {
            to: vec![mailbox("not an address", "")],
            ..message()
        });

        assert!(matches!(result, Err(MailerError::InvalidEmail)));
    }

    #[test]
    fn test_debug_hides_password() {
        let config = SMTPConfig {
            host: "smtp.example.com".to_string(),
            password: "secret".to_string(),
            ..SMTPConfig::default()
        };

        assert!(!format!("{config:?}").contains("secret"));
    }
}
