//! Mail dispatch and organization settings

use std::path::PathBuf;

use clap::{ArgAction, Parser, ValueEnum};
use uuid::Uuid;

/// How a message with several recipients is delivered
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, ValueEnum)]
pub enum SendingMode {
    /// One message per batch of recipients
    #[default]
    Bulk,

    /// One personalized message per recipient
    Single,
}

/// Who receives the visible `To` copy when a batch goes out as blind copies
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, ValueEnum)]
pub enum PlaceholderRecipient {
    /// The member who sends the message
    #[default]
    Sender,

    /// The organization's administrator address
    Administrator,
}

/// Units accepted by [`MailSettings::max_attachment_size`]
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum SizeUnit {
    /// Bytes
    Byte,
    /// 1024 bytes
    KiB,
    /// 1024 KiB
    MiB,
    /// 1024 MiB
    GiB,
    /// 1024 GiB
    TiB,
}

impl SizeUnit {
    fn bytes(self) -> u64 {
        match self {
            SizeUnit::Byte => 1,
            SizeUnit::KiB => 1 << 10,
            SizeUnit::MiB => 1 << 20,
            SizeUnit::GiB => 1 << 30,
            SizeUnit::TiB => 1 << 40,
        }
    }
}

/// Settings that drive how emails are composed and sent
#[derive(Clone, Debug, Parser)]
pub struct MailSettings {
    /// Whether emails are sent at all
    #[arg(long, env = "MAIL_SEND_ENABLED", default_value_t = true, action = ArgAction::Set)]
    pub send_enabled: bool,

    /// Bulk or single sending
    #[arg(long, env = "MAIL_SENDING_MODE", value_enum, default_value_t = SendingMode::Bulk)]
    pub sending_mode: SendingMode,

    /// Maximum recipients per message in bulk mode
    #[arg(long, env = "MAIL_RECIPIENTS_PER_BATCH", default_value_t = 50)]
    pub recipients_per_batch: usize,

    /// Put all batch members into `To` instead of blind copy
    #[arg(long, env = "MAIL_RECIPIENTS_VISIBLE", default_value_t = false, action = ArgAction::Set)]
    pub recipients_visible: bool,

    /// Who is put into `To` when a batch is blind-copied
    #[arg(long, env = "MAIL_PLACEHOLDER_RECIPIENT", value_enum, default_value_t = PlaceholderRecipient::Sender)]
    pub placeholder_recipient: PlaceholderRecipient,

    /// Address used in `From`; the member's address then goes to `Reply-To`
    #[arg(long, env = "MAIL_SENDER_ADDRESS")]
    pub sender_address: Option<String>,

    /// Send HTML bodies alongside the plain text
    #[arg(long, env = "MAIL_SEND_AS_HTML", default_value_t = true, action = ArgAction::Set)]
    pub send_as_html: bool,

    /// Largest total attachment size in MiB
    #[arg(long, env = "MAIL_MAX_ATTACHMENT_SIZE_MIB", default_value_t = 20)]
    pub max_attachment_size_mib: u64,

    /// Largest request body the server accepts, in bytes
    #[arg(long, env = "UPLOAD_LIMIT_BYTES", default_value_t = 10 * 1024 * 1024)]
    pub upload_limit_bytes: u64,

    /// Organization email template with `#placeholder#` tokens
    #[arg(long, env = "MAIL_TEMPLATE_PATH", default_value = "mail_templates/template.html")]
    pub template_path: PathBuf,

    /// Role whose members receive system notifications
    #[arg(long, env = "MAIL_NOTIFICATION_ROLE")]
    pub notification_role: Option<Uuid>,

    /// Notify the notification role about new forum entries
    #[arg(long, env = "MAIL_NOTIFY_NEW_ENTRIES", default_value_t = false, action = ArgAction::Set)]
    pub notify_new_entries: bool,
}

impl MailSettings {
    /// The largest attachment size allowed, as the smaller of the upload limit
    /// and the configured maximum, expressed in `unit`.
    pub fn max_attachment_size(&self, unit: SizeUnit) -> f64 {
        let configured = self
            .max_attachment_size_mib
            .saturating_mul(SizeUnit::MiB.bytes());
        let bytes = configured.min(self.upload_limit_bytes);

        bytes as f64 / unit.bytes() as f64
    }

    /// The recipients per batch, never below one
    pub fn batch_size(&self) -> usize {
        self.recipients_per_batch.max(1)
    }
}

impl Default for MailSettings {
    fn default() -> Self {
        Self {
            send_enabled: true,
            sending_mode: SendingMode::Bulk,
            recipients_per_batch: 50,
            recipients_visible: false,
            placeholder_recipient: PlaceholderRecipient::Sender,
            sender_address: None,
            send_as_html: true,
            max_attachment_size_mib: 20,
            upload_limit_bytes: 10 * 1024 * 1024,
            template_path: PathBuf::from("mail_templates/template.html"),
            notification_role: None,
            notify_new_entries: false,
        }
    }
}

/// Organization details used in templates and system messages
#[derive(Clone, Debug, Default, Parser)]
pub struct OrganizationSettings {
    /// Full organization name
    #[arg(long = "organization-name", env = "ORGANIZATION_NAME", default_value = "")]
    pub name: String,

    /// Short organization name
    #[arg(long = "organization-shortname", env = "ORGANIZATION_SHORTNAME", default_value = "")]
    pub short_name: String,

    /// Organization homepage
    #[arg(long = "organization-website", env = "ORGANIZATION_WEBSITE", default_value = "")]
    pub website: String,

    /// Administrator mailbox; also the sender of system notifications
    #[arg(long = "administrator-email", env = "ADMINISTRATOR_EMAIL")]
    pub administrator_email: String,

    /// Display name used for system notifications
    #[arg(long = "administrator-name", env = "ADMINISTRATOR_NAME", default_value = "Administrator")]
    pub administrator_name: String,
}

#[cfg(test)]
mod tests {
    use super::*;

    fn settings(max_mib: u64, upload_limit_bytes: u64) -> MailSettings {
        MailSettings {
            max_attachment_size_mib: max_mib,
            upload_limit_bytes,
            ..MailSettings::default()
        }
    }

    #[test]
    fn test_max_attachment_size_uses_configured_maximum_when_smaller() {
        let settings = settings(2, 8 * 1024 * 1024);

        assert_eq!(settings.max_attachment_size(SizeUnit::Byte), 2_097_152.0);
        assert_eq!(settings.max_attachment_size(SizeUnit::KiB), 2048.0);
        assert_eq!(settings.max_attachment_size(SizeUnit::MiB), 2.0);
    }

    #[test]
    fn test_max_attachment_size_uses_upload_limit_when_smaller() {
        let settings = settings(20, 512 * 1024);

        assert_eq!(settings.max_attachment_size(SizeUnit::KiB), 512.0);
        assert_eq!(settings.max_attachment_size(SizeUnit::MiB), 0.5);
    }

    #[test]
    fn test_max_attachment_size_large_units() {
        let settings = settings(3 * 1024 * 1024, u64::MAX);

        assert_eq!(settings.max_attachment_size(SizeUnit::GiB), 3072.0);
        assert_eq!(settings.max_attachment_size(SizeUnit::TiB), 3.0);
    }

    #[test]
    fn test_max_attachment_size_never_exceeds_either_limit() {
        for (max_mib, limit) in [(1, 3_000_000), (5, 1_000), (0, 10), (7, 7 * 1024 * 1024)] {
            let settings = settings(max_mib, limit);
            let bytes = settings.max_attachment_size(SizeUnit::Byte);

            assert!(bytes <= limit as f64);
            assert!(bytes <= (max_mib * 1024 * 1024) as f64);
        }
    }

    #[test]
    fn test_batch_size_is_at_least_one() {
        let settings = MailSettings {
            recipients_per_batch: 0,
            ..MailSettings::default()
        };

        assert_eq!(settings.batch_size(), 1);
    }
}
