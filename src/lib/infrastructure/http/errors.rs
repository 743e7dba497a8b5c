//! API and page error-handling module

use std::fmt;

use axum::{
    extract::rejection::{FormRejection, JsonRejection, QueryRejection},
    http::StatusCode,
    response::{IntoResponse, Response},
    Json,
};
use serde::{Deserialize, Serialize};
use tracing::{error, warn};
use utoipa::ToSchema;

use crate::{
    domain::{
        auth::errors::SessionError, communication::emails::errors::EmailError,
        forum::errors::ForumError,
    },
    infrastructure::http::templates::errors::ErrorTemplate,
};

/// An error response
#[derive(Debug, Deserialize, Serialize, ToSchema)]
pub struct ErrorResponse {
    /// The error message
    #[schema(example = "Internal server error")]
    pub error: String,
}

/// An error raised in the API
#[derive(Debug, Deserialize, ToSchema)]
pub struct ApiError {
    /// The status code
    #[schema(example = 500, value_type = u16)]
    #[serde(with = "http_serde::status_code")]
    pub status: StatusCode,

    /// The error message
    #[schema(example = "Internal server error")]
    pub message: String,
}

impl ApiError {
    /// Create a new API error
    pub fn new(status: StatusCode, message: &str) -> Self {
        Self {
            status,
            message: message.to_string(),
        }
    }

    /// Create a new unauthorized error
    pub fn new_401(message: &str) -> Self {
        Self::new(StatusCode::UNAUTHORIZED, message)
    }

    /// Create a new forbidden error
    pub fn new_403(message: &str) -> Self {
        Self::new(StatusCode::FORBIDDEN, message)
    }

    /// Create a new not found error
    pub fn new_404(message: &str) -> Self {
        Self::new(StatusCode::NOT_FOUND, message)
    }

    /// Create a new unprocessable entity error
    pub fn new_422(message: &str) -> Self {
        Self::new(StatusCode::UNPROCESSABLE_ENTITY, message)
    }

    /// Create new internal server error
    pub fn new_500(message: &str) -> Self {
        Self::new(StatusCode::INTERNAL_SERVER_ERROR, message)
    }

    /// Map an [`EmailError`]; failed recipients are only named when
    /// `show_recipients` is set.
    pub fn from_email_error(err: EmailError, show_recipients: bool) -> Self {
        let message = err.describe(show_recipients);

        match err {
            EmailError::InvalidRecipient(_)
            | EmailError::DuplicateRecipient(_)
            | EmailError::NoRecipients
            | EmailError::AttachmentTooLarge { .. } => ApiError::new_422(&message),
            EmailError::SendFailed(_) | EmailError::RecipientsFailed { .. } => {
                warn!("{}", message);
                ApiError::new(StatusCode::BAD_GATEWAY, &message)
            }
            EmailError::UnknownError(err) => unknown_error(err),
        }
    }
}

impl fmt::Display for ApiError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.message)
    }
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        (
            self.status,
            Json(ErrorResponse {
                error: self.message,
            }),
        )
            .into_response()
    }
}

impl From<anyhow::Error> for ApiError {
    fn from(err: anyhow::Error) -> Self {
        unknown_error(err)
    }
}

impl From<EmailError> for ApiError {
    fn from(err: EmailError) -> Self {
        ApiError::from_email_error(err, false)
    }
}

impl From<SessionError> for ApiError {
    fn from(err: SessionError) -> Self {
        match err {
            SessionError::SessionNotFound => ApiError::new_401("Please sign in"),
            SessionError::UnknownError(err) => unknown_error(err),
        }
    }
}

impl From<JsonRejection> for ApiError {
    fn from(rejection: JsonRejection) -> Self {
        ApiError::new(rejection.status(), &rejection.body_text())
    }
}

fn unknown_error(err: anyhow::Error) -> ApiError {
    error!("{:?}", err);

    ApiError::new_500("An unknown error occurred, please try again")
}

/// An error rendered as an HTML page
#[derive(Debug)]
pub struct PageError {
    /// The status code
    pub status: StatusCode,

    /// The message shown on the page
    pub message: String,
}

impl PageError {
    /// Create a new page error
    pub fn new(status: StatusCode, message: &str) -> Self {
        Self {
            status,
            message: message.to_string(),
        }
    }

    /// The generic "not authorized" page
    pub fn not_authorized() -> Self {
        Self::new(
            StatusCode::FORBIDDEN,
            "You are not authorized to perform this action.",
        )
    }
}

impl IntoResponse for PageError {
    fn into_response(self) -> Response {
        let template = ErrorTemplate {
            status: self.status.as_u16(),
            message: self.message,
        };

        (self.status, template).into_response()
    }
}

impl From<ForumError> for PageError {
    fn from(err: ForumError) -> Self {
        match err {
            ForumError::TopicNotFound(_) => {
                PageError::new(StatusCode::NOT_FOUND, "The topic does not exist.")
            }
            ForumError::PostNotFound(_) => {
                PageError::new(StatusCode::NOT_FOUND, "The post does not exist.")
            }
            ForumError::NotAuthorized => PageError::not_authorized(),
            ForumError::InvalidInput(message) => {
                PageError::new(StatusCode::UNPROCESSABLE_ENTITY, &message)
            }
            ForumError::UnknownError(err) => unknown_page_error(err),
        }
    }
}

impl From<SessionError> for PageError {
    fn from(err: SessionError) -> Self {
        match err {
            SessionError::SessionNotFound => PageError::not_authorized(),
            SessionError::UnknownError(err) => unknown_page_error(err),
        }
    }
}

impl From<QueryRejection> for PageError {
    fn from(rejection: QueryRejection) -> Self {
        PageError::new(StatusCode::UNPROCESSABLE_ENTITY, &rejection.body_text())
    }
}

impl From<FormRejection> for PageError {
    fn from(rejection: FormRejection) -> Self {
        PageError::new(StatusCode::UNPROCESSABLE_ENTITY, &rejection.body_text())
    }
}

fn unknown_page_error(err: anyhow::Error) -> PageError {
    error!("{:?}", err);

    PageError::new(
        StatusCode::INTERNAL_SERVER_ERROR,
        "An unknown error occurred, please try again.",
    )
}

#[cfg(test)]
mod tests {
    use anyhow::anyhow;
    use axum::{body::to_bytes, http::StatusCode, response::IntoResponse};
    use testresult::TestResult;
    use uuid::Uuid;

    use super::*;

    #[tokio::test]
    async fn test_error_response() -> TestResult {
        let error = ApiError {
            status: StatusCode::INTERNAL_SERVER_ERROR,
            message: "Internal server error".to_string(),
        };

        let response = error.into_response();
        let body = to_bytes(response.into_body(), usize::MAX).await?;

        assert_eq!(body, r#"{"error":"Internal server error"}"#);

        Ok(())
    }

    #[test]
    fn test_unknown_errors_are_not_leaked() {
        let api_error = ApiError::from(anyhow!("connection refused"));

        assert_eq!(api_error.status, StatusCode::INTERNAL_SERVER_ERROR);
        assert_eq!(
            api_error.message,
            "An unknown error occurred, please try again"
        );
    }

    #[test]
    fn test_recipients_failed_for_members() {
        let err = EmailError::RecipientsFailed {
            last_error: "550 mailbox unavailable".to_string(),
            failed: vec!["John Roe <john@example.com>".to_string()],
        };

        let api_error = ApiError::from_email_error(err, false);

        assert_eq!(api_error.status, StatusCode::BAD_GATEWAY);
        assert!(!api_error.message.contains("john@example.com"));
    }

    #[test]
    fn test_no_recipients_is_unprocessable() {
        let api_error = ApiError::from(EmailError::NoRecipients);

        assert_eq!(api_error.status, StatusCode::UNPROCESSABLE_ENTITY);
    }

    #[tokio::test]
    async fn test_forum_errors_render_pages() -> TestResult {
        let not_found = PageError::from(ForumError::TopicNotFound(Uuid::now_v7()));
        let forbidden = PageError::from(ForumError::NotAuthorized);

        assert_eq!(not_found.status, StatusCode::NOT_FOUND);
        assert_eq!(forbidden.status, StatusCode::FORBIDDEN);

        let response = forbidden.into_response();

        assert_eq!(response.status(), StatusCode::FORBIDDEN);

        let body = to_bytes(response.into_body(), usize::MAX).await?;
        let html = String::from_utf8(body.to_vec())?;

        assert!(html.contains("You are not authorized to perform this action."));

        Ok(())
    }
}
