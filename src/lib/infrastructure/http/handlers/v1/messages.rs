//! Send message handler

use axum::{
    extract::{rejection::JsonRejection, State},
    Json,
};
use base64::{engine::general_purpose::STANDARD, Engine};
use serde::{Deserialize, Serialize};
use tracing::info;
use utoipa::ToSchema;
use uuid::Uuid;

use crate::{
    domain::{
        auth::SessionRepository,
        communication::{emails::errors::EmailError, emails::EmailService, mailer::Attachment},
        forum::ForumTopicService,
        members::MembershipStatus,
    },
    infrastructure::http::{errors::ApiError, session::RequiredSession, state::AppState},
};

/// A base64 encoded file
#[derive(Clone, Debug, Serialize, Deserialize, ToSchema)]
pub struct AttachmentBody {
    /// File name shown to recipients
    #[schema(example = "agenda.pdf")]
    pub filename: String,

    /// MIME content type
    #[schema(example = "application/pdf")]
    pub content_type: String,

    /// Base64 encoded content
    pub data: String,
}

/// Send message request body
#[derive(Clone, Debug, Serialize, Deserialize, ToSchema)]
pub struct SendMessageBody {
    /// Subject line
    #[schema(example = "General assembly")]
    pub subject: String,

    /// HTML message, inserted into the organization template
    #[schema(example = "<p>Dear #recipient_firstname#, see you on Friday.</p>")]
    pub body: String,

    /// Roles whose members receive the message
    #[serde(default)]
    pub roles: Vec<Uuid>,

    /// Members who receive the message
    #[serde(default)]
    pub members: Vec<Uuid>,

    /// Which memberships of the roles count
    #[serde(default)]
    pub membership_status: MembershipStatus,

    /// Send a copy to the sender
    #[serde(default)]
    pub copy_to_sender: bool,

    /// List the recipients in the copy to the sender
    #[serde(default)]
    pub list_recipients_in_copy: bool,

    /// Files attached to the message
    #[serde(default)]
    pub attachments: Vec<AttachmentBody>,
}

impl TryFrom<AttachmentBody> for Attachment {
    type Error = ApiError;

    fn try_from(body: AttachmentBody) -> Result<Self, Self::Error> {
        let data = STANDARD.decode(body.data.trim()).map_err(|_| {
            ApiError::new_422(&format!(
                "The attachment \"{}\" could not be read",
                body.filename
            ))
        })?;

        Ok(Self {
            filename: body.filename,
            content_type: body.content_type,
            data,
        })
    }
}

/// Send message response body
#[derive(Debug, Serialize, Deserialize, ToSchema)]
pub struct SendMessageResponse {
    /// Number of recipients the message was sent to
    #[schema(example = 12)]
    pub recipients: usize,
}

/// Send a message to roles and members
#[utoipa::path(
    post,
    operation_id = "send_message",
    tag = "Messages",
    path = "/api/v1/messages",
    request_body = SendMessageBody,
    responses(
        (status = StatusCode::OK, description = "Message sent", body = SendMessageResponse),
        (status = StatusCode::UNAUTHORIZED, description = "Not signed in", body = ErrorResponse),
        (status = StatusCode::FORBIDDEN, description = "Not allowed to write to roles", body = ErrorResponse),
        (status = StatusCode::UNPROCESSABLE_ENTITY, description = "Unprocessable entity", body = ErrorResponse, example = json!({"error": "No recipients were selected"})),
        (status = StatusCode::BAD_GATEWAY, description = "The mail server rejected the message", body = ErrorResponse),
    )
)]
pub async fn handler<F, S, E>(
    State(state): State<AppState<F, S, E>>,
    RequiredSession(session): RequiredSession,
    request: Result<Json<SendMessageBody>, JsonRejection>,
) -> Result<Json<SendMessageResponse>, ApiError>
where
    F: ForumTopicService,
    S: SessionRepository,
    E: EmailService,
{
    let Json(request) = request?;
    let user = &session.user;

    if request.subject.trim().is_empty() {
        return Err(ApiError::new_422("Please enter a subject"));
    }

    if !request.roles.is_empty() && !user.is_administrator {
        return Err(ApiError::new_403(
            "Only administrators may write to the members of a role",
        ));
    }

    let show_recipients = user.is_administrator;
    let email_error = |err: EmailError| ApiError::from_email_error(err, show_recipients);

    let mut email = state.emails.new_email(user);

    email.set_subject(request.subject.trim());
    email.set_copy_to_sender(request.copy_to_sender);
    email.set_list_recipients_in_copy(request.list_recipients_in_copy);

    for attachment in request.attachments {
        email
            .add_attachment(attachment.try_into()?)
            .map_err(email_error)?;
    }

    let mut recipients = 0;

    for role_id in &request.roles {
        recipients += state
            .emails
            .add_recipients_by_role(&mut email, role_id, request.membership_status)
            .await
            .map_err(email_error)?;
    }

    for member_id in &request.members {
        recipients += state
            .emails
            .add_recipients_by_user(&mut email, member_id)
            .await
            .map_err(email_error)?;
    }

    if recipients == 0 {
        return Err(email_error(EmailError::NoRecipients));
    }

    state.emails.set_template_text(&mut email, &request.body);
    state.emails.send_email(&mut email).await.map_err(email_error)?;

    info!(
        "{} sent \"{}\" to {} recipients",
        user.id,
        request.subject.trim(),
        recipients
    );

    Ok(Json(SendMessageResponse { recipients }))
}
