//! Email service: recipient lookup, templating and dispatch

use std::sync::Arc;

use async_trait::async_trait;
use tracing::{debug, info, warn};
use uuid::Uuid;

#[cfg(test)]
use mockall::mock;

use crate::domain::{
    auth::CurrentUser,
    communication::{
        email_addresses::EmailAddress,
        mailer::{Mailbox, Mailer, OutgoingMessage},
    },
    members::{MemberAddress, MemberRepository, MembershipStatus},
};

use super::{
    batching::plan_batches,
    errors::EmailError,
    recipients::Recipient,
    settings::{MailSettings, OrganizationSettings, PlaceholderRecipient, SendingMode, SizeUnit},
    template::{escape_html, personalize_html, personalize_plain, EmailTemplate, TemplateContext},
    Email,
};

/// Email service
#[async_trait]
pub trait EmailService: Clone + Send + Sync + 'static {
    /// Starts an email from `sender` with the configured send options.
    fn new_email(&self, sender: &CurrentUser) -> Email;

    /// Renders `message` into the organization template and stores the
    /// resulting HTML and plain text bodies on `email`.
    ///
    /// Recipient placeholders are left in place and filled in at send time.
    fn set_template_text(&self, email: &mut Email, message: &str);

    /// Adds the members of a role as recipients.
    ///
    /// # Arguments
    /// * `email` - The email to add recipients to.
    /// * `role_id` - The UUID of the role.
    /// * `status` - Which memberships count.
    ///
    /// # Returns
    /// The number of recipients added. Invalid and duplicate addresses are skipped.
    async fn add_recipients_by_role(
        &self,
        email: &mut Email,
        role_id: &Uuid,
        status: MembershipStatus,
    ) -> Result<usize, EmailError>;

    /// Adds every address of one member as recipients.
    ///
    /// # Returns
    /// The number of recipients added.
    async fn add_recipients_by_user(
        &self,
        email: &mut Email,
        member_id: &Uuid,
    ) -> Result<usize, EmailError>;

    /// Sends the email to all recipients, then optionally a copy to the sender.
    ///
    /// The recipient list is cleared once the attempt completes, whether it
    /// succeeded or not. When sending is disabled this is a no-op.
    async fn send_email(&self, email: &mut Email) -> Result<(), EmailError>;

    /// Sends a system notification to the members of the notification role.
    async fn send_notification(&self, subject: &str, message: &str) -> Result<(), EmailError>;

    /// The largest total attachment size, expressed in `unit`.
    fn max_attachment_size(&self, unit: SizeUnit) -> f64;
}

#[cfg(test)]
mock! {
    pub EmailService {}

    impl Clone for EmailService {
        fn clone(&self) -> Self;
    }

    #[async_trait]
    impl EmailService for EmailService {
        fn new_email(&self, sender: &CurrentUser) -> Email;
        fn set_template_text(&self, email: &mut Email, message: &str);
        async fn add_recipients_by_role(
            &self,
            email: &mut Email,
            role_id: &Uuid,
            status: MembershipStatus,
        ) -> Result<usize, EmailError>;
        async fn add_recipients_by_user(
            &self,
            email: &mut Email,
            member_id: &Uuid,
        ) -> Result<usize, EmailError>;
        async fn send_email(&self, email: &mut Email) -> Result<(), EmailError>;
        async fn send_notification(&self, subject: &str, message: &str) -> Result<(), EmailError>;
        fn max_attachment_size(&self, unit: SizeUnit) -> f64;
    }
}

/// Email service implementation
#[derive(Debug, Clone)]
pub struct EmailServiceImpl<M, R>
where
    M: Mailer,
    R: MemberRepository,
{
    mailer: Arc<M>,
    members: Arc<R>,
    settings: MailSettings,
    organization: OrganizationSettings,
}

impl<M, R> EmailServiceImpl<M, R>
where
    M: Mailer,
    R: MemberRepository,
{
    /// Creates a new email service.
    pub fn new(
        mailer: Arc<M>,
        members: Arc<R>,
        settings: MailSettings,
        organization: OrganizationSettings,
    ) -> Self {
        Self {
            mailer,
            members,
            settings,
            organization,
        }
    }

    fn add_member_addresses(
        email: &mut Email,
        addresses: Vec<MemberAddress>,
    ) -> usize {
        let mut added = 0;

        for row in addresses {
            match email.add_member_recipient(
                &row.email,
                &row.first_name,
                &row.last_name,
                &row.fields,
            ) {
                Ok(()) => added += 1,
                Err(err) => debug!("skipping address of member {}: {}", row.member_id, err),
            }
        }

        added
    }

    /// `From` and `Reply-To` for a message from `sender`
    fn from_headers(&self, sender: &Mailbox) -> (Mailbox, Option<Mailbox>) {
        let Some(raw) = self.settings.sender_address.as_deref() else {
            return (sender.clone(), None);
        };

        match EmailAddress::new(raw) {
            Ok(address) if address.same_mailbox(&sender.address) => (sender.clone(), None),
            Ok(address) => (
                Mailbox {
                    address,
                    name: sender.name.clone(),
                },
                Some(sender.clone()),
            ),
            Err(err) => {
                warn!("ignoring invalid MAIL_SENDER_ADDRESS \"{}\": {}", raw, err);
                (sender.clone(), None)
            }
        }
    }

    /// The visible `To` of a blind-copied batch
    fn placeholder(&self, email: &Email) -> Mailbox {
        match self.settings.placeholder_recipient {
            PlaceholderRecipient::Sender => email.sender().clone(),
            PlaceholderRecipient::Administrator => {
                match EmailAddress::new(&self.organization.administrator_email) {
                    Ok(address) => Mailbox::new(address, self.organization.administrator_name.clone()),
                    Err(_) => {
                        warn!("administrator address is invalid; using the sender as placeholder");
                        email.sender().clone()
                    }
                }
            }
        }
    }

    fn message(
        &self,
        email: &Email,
        to: Vec<Mailbox>,
        bcc: Vec<Mailbox>,
        recipient: Option<&Recipient>,
    ) -> OutgoingMessage {
        let (from, reply_to) = self.from_headers(email.sender());

        OutgoingMessage {
            from,
            reply_to,
            to,
            bcc,
            subject: email.subject().to_string(),
            plain_body: personalize_plain(email.plain_body(), recipient),
            html_body: email
                .is_html()
                .then(|| personalize_html(email.html_body(), recipient)),
            attachments: email.attachments().to_vec(),
        }
    }

    async fn send_individually(&self, email: &Email) -> Result<(), EmailError> {
        let mut last_error = None;
        let mut failed = Vec::new();

        for recipient in email.recipients().as_slice() {
            let message = self.message(email, vec![recipient.mailbox()], Vec::new(), Some(recipient));

            if let Err(err) = self.mailer.send(&message).await {
                warn!(
                    "could not send \"{}\" to {}: {}",
                    email.subject(),
                    recipient.address,
                    err
                );

                last_error = Some(err.to_string());
                failed.push(recipient.mailbox().to_string());
            }
        }

        match last_error {
            Some(last_error) => Err(EmailError::RecipientsFailed { last_error, failed }),
            None => Ok(()),
        }
    }

    async fn send_in_batches(&self, email: &Email) -> Result<(), EmailError> {
        let placeholder = self.placeholder(email);
        let batches = plan_batches(
            email.recipients().as_slice(),
            self.settings.batch_size(),
            self.settings.recipients_visible,
            &placeholder,
        );

        let count = batches.len();

        for (index, batch) in batches.into_iter().enumerate() {
            let message = self.message(email, batch.to.clone(), batch.bcc.clone(), batch.single_recipient());

            self.mailer.send(&message).await?;

            debug!(
                "sent batch {}/{} of \"{}\" ({} recipients)",
                index + 1,
                count,
                email.subject(),
                batch.recipients.len()
            );
        }

        Ok(())
    }

    async fn send_copy_to_sender(&self, email: &Email, names: &[String]) -> Result<(), EmailError> {
        let mut html = personalize_html(email.html_body(), None);
        let mut plain = personalize_plain(email.plain_body(), None);

        if email.list_recipients_in_copy() {
            let listing = names.join("; ");

            html = format!(
                "<p>This message was sent to the following recipients:</p><p>{}</p><hr />{}",
                escape_html(&listing),
                html
            );
            plain = format!(
                "This message was sent to the following recipients:\n{}\n\n{}",
                listing, plain
            );
        }

        let (from, reply_to) = self.from_headers(email.sender());

        let message = OutgoingMessage {
            from,
            reply_to,
            to: vec![email.sender().clone()],
            bcc: Vec::new(),
            subject: format!("Copy: {}", email.subject()),
            plain_body: plain,
            html_body: email.is_html().then_some(html),
            attachments: email.attachments().to_vec(),
        };

        self.mailer.send(&message).await?;

        Ok(())
    }

    async fn dispatch(&self, email: &Email) -> Result<(), EmailError> {
        let names = email.recipient_names();

        match self.settings.sending_mode {
            SendingMode::Single => self.send_individually(email).await?,
            SendingMode::Bulk => self.send_in_batches(email).await?,
        }

        if email.copy_to_sender() {
            self.send_copy_to_sender(email, &names).await?;
        }

        info!(
            "sent \"{}\" to {} recipient(s)",
            email.subject(),
            names.len()
        );

        Ok(())
    }
}

#[async_trait]
impl<M, R> EmailService for EmailServiceImpl<M, R>
where
    M: Mailer,
    R: MemberRepository,
{
    fn new_email(&self, sender: &CurrentUser) -> Email {
        let max_bytes = self.max_attachment_size(SizeUnit::Byte) as u64;
        let mut email = Email::new(sender.mailbox(), max_bytes);

        email.send_as_html(self.settings.send_as_html);

        email
    }

    fn set_template_text(&self, email: &mut Email, message: &str) {
        let template = EmailTemplate::load(&self.settings.template_path);
        let recipients = email.recipient_names().join(", ");

        let bodies = {
            let sender = email.sender();

            template.render(&TemplateContext {
                sender_name: sender.name.as_deref().unwrap_or(""),
                sender_email: sender.address.as_str(),
                subject: email.subject(),
                message,
                recipients: &recipients,
                organization: &self.organization,
            })
        };

        email.set_bodies(bodies);
    }

    async fn add_recipients_by_role(
        &self,
        email: &mut Email,
        role_id: &Uuid,
        status: MembershipStatus,
    ) -> Result<usize, EmailError> {
        let addresses = self.members.addresses_by_role(role_id, status).await?;
        let added = Self::add_member_addresses(email, addresses);

        debug!("added {} {} member(s) of role {}", added, status, role_id);

        Ok(added)
    }

    async fn add_recipients_by_user(
        &self,
        email: &mut Email,
        member_id: &Uuid,
    ) -> Result<usize, EmailError> {
        let addresses = self.members.addresses_by_member(member_id).await?;

        Ok(Self::add_member_addresses(email, addresses))
    }

    async fn send_email(&self, email: &mut Email) -> Result<(), EmailError> {
        if !self.settings.send_enabled {
            info!("email sending is disabled; not sending \"{}\"", email.subject());
            return Ok(());
        }

        if email.recipients().is_empty() {
            return Err(EmailError::NoRecipients);
        }

        let result = self.dispatch(email).await;

        email.clear_recipients();

        result
    }

    async fn send_notification(&self, subject: &str, message: &str) -> Result<(), EmailError> {
        let Some(role_id) = self.settings.notification_role else {
            debug!("no notification role configured; skipping \"{}\"", subject);
            return Ok(());
        };

        let address = EmailAddress::new(&self.organization.administrator_email).map_err(|_| {
            EmailError::InvalidRecipient(self.organization.administrator_email.clone())
        })?;

        let sender = Mailbox::new(address, self.organization.administrator_name.clone());
        let mut email = Email::new(sender, self.max_attachment_size(SizeUnit::Byte) as u64);

        email.send_as_html(self.settings.send_as_html);
        email.set_subject(&match self.organization.short_name.as_str() {
            "" => subject.to_string(),
            short_name => format!("[{short_name}] {subject}"),
        });

        if self
            .add_recipients_by_role(&mut email, &role_id, MembershipStatus::Active)
            .await?
            == 0
        {
            debug!("notification role {} has no members with an address", role_id);
            return Ok(());
        }

        self.set_template_text(&mut email, message);
        self.send_email(&mut email).await
    }

    fn max_attachment_size(&self, unit: SizeUnit) -> f64 {
        self.settings.max_attachment_size(unit)
    }
}

#[cfg(test)]
mod tests {
    use std::{
        collections::BTreeMap,
        sync::{Arc, Mutex},
    };

    use anyhow::anyhow;
    use mockall::predicate::eq;
    use testresult::TestResult;

    use crate::domain::{
        auth::tests::member,
        communication::mailer::{tests::MockMailer, MailerError},
        members::tests::MockMemberRepository,
    };

    use super::*;

    type Sent = Arc<Mutex<Vec<OutgoingMessage>>>;

    fn settings(mode: SendingMode) -> MailSettings {
        MailSettings {
            sending_mode: mode,
            recipients_per_batch: 2,
            template_path: "/nonexistent/template.html".into(),
            ..MailSettings::default()
        }
    }

    fn organization() -> OrganizationSettings {
        OrganizationSettings {
            name: "Rowing Club Riverside".to_string(),
            short_name: "RCR".to_string(),
            website: "https://rowing.example.org".to_string(),
            administrator_email: "admin@rowing.example.org".to_string(),
            administrator_name: "Club Administration".to_string(),
        }
    }

    fn recording_mailer(sent: &Sent) -> MockMailer {
        let sent = sent.clone();
        let mut mailer = MockMailer::new();

        mailer.expect_send().returning(move |message| {
            sent.lock().expect("lock").push(message.clone());
            Ok(())
        });

        mailer
    }

    fn service(
        mailer: MockMailer,
        members: MockMemberRepository,
        settings: MailSettings,
    ) -> EmailServiceImpl<MockMailer, MockMemberRepository> {
        EmailServiceImpl::new(Arc::new(mailer), Arc::new(members), settings, organization())
    }

    fn email_with_recipients(
        service: &EmailServiceImpl<MockMailer, MockMemberRepository>,
        count: usize,
    ) -> Email {
        let mut email = service.new_email(&member().user);
        email.set_subject("Regatta");

        for i in 1..=count {
            email
                .add_member_recipient(
                    &format!("member{i}@example.com"),
                    "Member",
                    &i.to_string(),
                    &BTreeMap::new(),
                )
                .expect("valid recipient");
        }

        service.set_template_text(&mut email, "<p>Dear #recipient_firstname# #recipient_lastname#,</p>");

        email
    }

    fn address(member_id: Uuid, email: &str, first: &str, last: &str) -> MemberAddress {
        MemberAddress {
            member_id,
            email: email.to_string(),
            first_name: first.to_string(),
            last_name: last.to_string(),
            fields: BTreeMap::new(),
        }
    }

    #[tokio::test]
    async fn test_add_recipients_by_role_skips_invalid_and_duplicates() -> TestResult {
        let role_id = Uuid::now_v7();
        let mut members = MockMemberRepository::new();

        members
            .expect_addresses_by_role()
            .times(1)
            .with(eq(role_id), eq(MembershipStatus::Active))
            .returning(|_, _| {
                Ok(vec![
                    address(Uuid::now_v7(), "jane@example.com", "Jane", "Doe"),
                    address(Uuid::now_v7(), "broken-address", "Bob", "Broken"),
                    address(Uuid::now_v7(), "JANE@example.com", "Jane", "Twice"),
                    address(Uuid::now_v7(), "john@example.com", "John", "Roe"),
                ])
            });

        let service = service(MockMailer::new(), members, settings(SendingMode::Bulk));
        let mut email = service.new_email(&member().user);

        let added = service
            .add_recipients_by_role(&mut email, &role_id, MembershipStatus::Active)
            .await?;

        assert_eq!(added, 2);
        assert_eq!(
            email.recipient_names(),
            vec!["Jane Doe".to_string(), "John Roe".to_string()]
        );

        Ok(())
    }

    #[tokio::test]
    async fn test_add_recipients_by_user_counts_every_address() -> TestResult {
        let member_id = Uuid::now_v7();
        let mut members = MockMemberRepository::new();

        members
            .expect_addresses_by_member()
            .times(1)
            .with(eq(member_id))
            .returning(move |_| {
                Ok(vec![
                    address(member_id, "jane@example.com", "Jane", "Doe"),
                    address(member_id, "jane.doe@work.example.com", "Jane", "Doe"),
                ])
            });

        let service = service(MockMailer::new(), members, settings(SendingMode::Bulk));
        let mut email = service.new_email(&member().user);

        assert_eq!(service.add_recipients_by_user(&mut email, &member_id).await?, 2);

        Ok(())
    }

    #[tokio::test]
    async fn test_member_lookup_failure_is_reported() {
        let mut members = MockMemberRepository::new();

        members
            .expect_addresses_by_member()
            .returning(|_| Err(anyhow!("connection reset").into()));

        let service = service(MockMailer::new(), members, settings(SendingMode::Bulk));
        let mut email = service.new_email(&member().user);

        let result = service.add_recipients_by_user(&mut email, &Uuid::now_v7()).await;

        assert!(matches!(result, Err(EmailError::UnknownError(_))));
    }

    #[tokio::test]
    async fn test_sending_disabled_is_a_no_op() -> TestResult {
        let mut mailer = MockMailer::new();
        mailer.expect_send().times(0);

        let service = service(
            mailer,
            MockMemberRepository::new(),
            MailSettings {
                send_enabled: false,
                ..settings(SendingMode::Bulk)
            },
        );
        let mut email = email_with_recipients(&service, 3);

        service.send_email(&mut email).await?;

        assert_eq!(email.recipients().len(), 3);

        Ok(())
    }

    #[tokio::test]
    async fn test_send_without_recipients_fails() {
        let service = service(
            MockMailer::new(),
            MockMemberRepository::new(),
            settings(SendingMode::Bulk),
        );
        let mut email = service.new_email(&member().user);

        let result = service.send_email(&mut email).await;

        assert!(matches!(result, Err(EmailError::NoRecipients)));
    }

    #[tokio::test]
    async fn test_bulk_single_recipient_is_sent_to_directly() -> TestResult {
        let sent = Sent::default();
        let service = service(
            recording_mailer(&sent),
            MockMemberRepository::new(),
            settings(SendingMode::Bulk),
        );
        let mut email = email_with_recipients(&service, 1);

        service.send_email(&mut email).await?;

        let sent = sent.lock().expect("lock");
        assert_eq!(sent.len(), 1);
        assert_eq!(sent[0].to[0].to_string(), "Member 1 <member1@example.com>");
        assert!(sent[0].bcc.is_empty());
        assert_eq!(sent[0].plain_body, "Dear Member 1,");

        Ok(())
    }

    #[tokio::test]
    async fn test_bulk_batches_use_bcc_with_sender_placeholder() -> TestResult {
        let sent = Sent::default();
        let service = service(
            recording_mailer(&sent),
            MockMemberRepository::new(),
            settings(SendingMode::Bulk),
        );
        let mut email = email_with_recipients(&service, 5);

        service.send_email(&mut email).await?;

        let sent = sent.lock().expect("lock");
        assert_eq!(sent.len(), 3);
        assert_eq!(sent[0].to, vec![member().user.mailbox()]);
        assert_eq!(sent[0].bcc.len(), 2);
        assert_eq!(sent[1].bcc.len(), 2);
        assert_eq!(sent[0].plain_body, "Dear  ,");
        assert_eq!(sent[2].to[0].address.as_str(), "member5@example.com");
        assert!(sent[2].bcc.is_empty());

        Ok(())
    }

    #[tokio::test]
    async fn test_bulk_administrator_placeholder_and_visible_recipients() -> TestResult {
        let sent = Sent::default();
        let service = service(
            recording_mailer(&sent),
            MockMemberRepository::new(),
            MailSettings {
                placeholder_recipient: PlaceholderRecipient::Administrator,
                ..settings(SendingMode::Bulk)
            },
        );
        let mut email = email_with_recipients(&service, 2);

        service.send_email(&mut email).await?;

        assert_eq!(
            sent.lock().expect("lock")[0].to[0].address.as_str(),
            "admin@rowing.example.org"
        );

        let sent = Sent::default();
        let service = super::EmailServiceImpl::new(
            Arc::new(recording_mailer(&sent)),
            Arc::new(MockMemberRepository::new()),
            MailSettings {
                recipients_visible: true,
                ..settings(SendingMode::Bulk)
            },
            organization(),
        );
        let mut email = email_with_recipients(&service, 2);

        service.send_email(&mut email).await?;

        let sent = sent.lock().expect("lock");
        assert_eq!(sent[0].to.len(), 2);
        assert!(sent[0].bcc.is_empty());

        Ok(())
    }

    #[tokio::test]
    async fn test_bulk_failure_aborts_remaining_batches() {
        let mut mailer = MockMailer::new();

        mailer
            .expect_send()
            .times(1)
            .returning(|_| Err(MailerError::SendError("554 rejected".to_string())));

        let service = service(mailer, MockMemberRepository::new(), settings(SendingMode::Bulk));
        let mut email = email_with_recipients(&service, 5);

        let result = service.send_email(&mut email).await;

        assert!(matches!(result, Err(EmailError::SendFailed(m)) if m == "554 rejected"));
        assert!(email.recipients().is_empty());
    }

    #[tokio::test]
    async fn test_single_mode_reports_only_failed_recipients_and_tries_all() {
        let mut calls = 0;
        let mut mailer = MockMailer::new();

        mailer.expect_send().times(5).returning(move |_| {
            calls += 1;

            if calls <= 2 {
                Ok(())
            } else {
                Err(MailerError::SendError(format!("failure {calls}")))
            }
        });

        let service = service(mailer, MockMemberRepository::new(), settings(SendingMode::Single));
        let mut email = email_with_recipients(&service, 5);

        let result = service.send_email(&mut email).await;

        match result {
            Err(EmailError::RecipientsFailed { last_error, failed }) => {
                assert_eq!(last_error, "failure 5");
                assert_eq!(
                    failed,
                    vec![
                        "Member 3 <member3@example.com>".to_string(),
                        "Member 4 <member4@example.com>".to_string(),
                        "Member 5 <member5@example.com>".to_string(),
                    ]
                );
            }
            other => panic!("unexpected result: {other:?}"),
        }
    }

    #[tokio::test]
    async fn test_single_mode_personalizes_each_message() -> TestResult {
        let sent = Sent::default();
        let service = service(
            recording_mailer(&sent),
            MockMemberRepository::new(),
            settings(SendingMode::Single),
        );
        let mut email = email_with_recipients(&service, 3);

        service.send_email(&mut email).await?;

        let sent = sent.lock().expect("lock");
        assert_eq!(
            sent.iter().map(|m| m.plain_body.as_str()).collect::<Vec<_>>(),
            vec!["Dear Member 1,", "Dear Member 2,", "Dear Member 3,"]
        );
        assert!(sent.iter().all(|m| m.to.len() == 1 && m.bcc.is_empty()));

        Ok(())
    }

    #[tokio::test]
    async fn test_member_profile_fields_fill_recipient_placeholders() -> TestResult {
        let member_id = Uuid::now_v7();
        let sent = Sent::default();
        let mut members = MockMemberRepository::new();

        members.expect_addresses_by_member().returning(move |_| {
            let mut row = address(member_id, "john@example.com", "John", "Roe");
            row.fields
                .insert("membership_number".to_string(), "1042".to_string());
            Ok(vec![row])
        });

        let service = service(recording_mailer(&sent), members, settings(SendingMode::Single));
        let mut email = service.new_email(&member().user);
        email.set_subject("Dues");

        service.add_recipients_by_user(&mut email, &member_id).await?;
        service.set_template_text(
            &mut email,
            "<p>Number #recipient_membership_number# for #recipient_firstname#</p>",
        );
        service.send_email(&mut email).await?;

        let sent = sent.lock().expect("lock");
        assert_eq!(sent[0].plain_body, "Number 1042 for John");

        Ok(())
    }

    #[tokio::test]
    async fn test_email_can_be_reused_after_sending() -> TestResult {
        let sent = Sent::default();
        let service = service(
            recording_mailer(&sent),
            MockMemberRepository::new(),
            settings(SendingMode::Bulk),
        );
        let mut email = email_with_recipients(&service, 2);

        service.send_email(&mut email).await?;

        assert!(email.recipients().is_empty());
        assert!(email.recipient_names().is_empty());

        email.add_recipient("board@example.com", "Board")?;
        service.send_email(&mut email).await?;

        let sent = sent.lock().expect("lock");
        assert_eq!(sent.len(), 2);
        assert_eq!(sent[1].to[0].address.as_str(), "board@example.com");

        Ok(())
    }

    #[tokio::test]
    async fn test_copy_to_sender_lists_recipients() -> TestResult {
        let sent = Sent::default();
        let service = service(
            recording_mailer(&sent),
            MockMemberRepository::new(),
            settings(SendingMode::Bulk),
        );
        let mut email = email_with_recipients(&service, 2);
        email.set_copy_to_sender(true);
        email.set_list_recipients_in_copy(true);

        service.send_email(&mut email).await?;

        let sent = sent.lock().expect("lock");
        let copy = sent.last().expect("copy was sent");

        assert_eq!(sent.len(), 2);
        assert_eq!(copy.to, vec![member().user.mailbox()]);
        assert!(copy.bcc.is_empty());
        assert_eq!(copy.subject, "Copy: Regatta");
        assert!(copy
            .plain_body
            .starts_with("This message was sent to the following recipients:\nMember 1; Member 2"));

        Ok(())
    }

    #[tokio::test]
    async fn test_system_sender_address_moves_sender_to_reply_to() -> TestResult {
        let sent = Sent::default();
        let service = service(
            recording_mailer(&sent),
            MockMemberRepository::new(),
            MailSettings {
                sender_address: Some("noreply@rowing.example.org".to_string()),
                ..settings(SendingMode::Bulk)
            },
        );
        let mut email = email_with_recipients(&service, 1);

        service.send_email(&mut email).await?;

        let sent = sent.lock().expect("lock");
        assert_eq!(
            sent[0].from.to_string(),
            "Jane Doe <noreply@rowing.example.org>"
        );
        assert_eq!(sent[0].reply_to, Some(member().user.mailbox()));

        Ok(())
    }

    #[tokio::test]
    async fn test_plain_only_when_html_disabled() -> TestResult {
        let sent = Sent::default();
        let service = service(
            recording_mailer(&sent),
            MockMemberRepository::new(),
            MailSettings {
                send_as_html: false,
                ..settings(SendingMode::Bulk)
            },
        );
        let mut email = email_with_recipients(&service, 1);

        service.send_email(&mut email).await?;

        assert_eq!(sent.lock().expect("lock")[0].html_body, None);

        Ok(())
    }

    #[tokio::test]
    async fn test_send_notification_to_notification_role() -> TestResult {
        let role_id = Uuid::now_v7();
        let sent = Sent::default();
        let mut members = MockMemberRepository::new();

        members
            .expect_addresses_by_role()
            .times(1)
            .with(eq(role_id), eq(MembershipStatus::Active))
            .returning(|_, _| Ok(vec![address(Uuid::now_v7(), "board@example.com", "Board", "Member")]));

        let service = service(
            recording_mailer(&sent),
            members,
            MailSettings {
                notification_role: Some(role_id),
                ..settings(SendingMode::Bulk)
            },
        );

        service
            .send_notification("New forum topic", "<p>A topic was created.</p>")
            .await?;

        let sent = sent.lock().expect("lock");
        assert_eq!(sent.len(), 1);
        assert_eq!(sent[0].subject, "[RCR] New forum topic");
        assert_eq!(
            sent[0].from.to_string(),
            "Club Administration <admin@rowing.example.org>"
        );
        assert_eq!(sent[0].plain_body, "A topic was created.");

        Ok(())
    }

    #[tokio::test]
    async fn test_send_notification_without_role_is_skipped() -> TestResult {
        let mut mailer = MockMailer::new();
        mailer.expect_send().times(0);

        let service = service(mailer, MockMemberRepository::new(), settings(SendingMode::Bulk));

        service.send_notification("Subject", "Message").await?;

        Ok(())
    }
}
