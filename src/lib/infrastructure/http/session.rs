//! Session cookie extractors

use async_trait::async_trait;
use axum::{
    extract::FromRequestParts,
    http::{header::COOKIE, request::Parts, HeaderMap},
};
use cookie::Cookie;

use crate::{
    domain::{
        auth::{errors::SessionError, Session, SessionRepository},
        communication::emails::EmailService,
        forum::ForumTopicService,
    },
    infrastructure::http::{
        errors::{ApiError, PageError},
        state::AppState,
    },
};

/// Name of the session cookie
pub const SESSION_COOKIE: &str = "session_id";

/// The session of the signed-in member, if any
#[derive(Debug, Clone)]
pub struct OptionalSession(pub Option<Session>);

/// The session of the signed-in member; rejects anonymous API requests
#[derive(Debug, Clone)]
pub struct RequiredSession(pub Session);

/// The value of the session cookie
pub fn session_id(headers: &HeaderMap) -> Option<String> {
    headers
        .get_all(COOKIE)
        .iter()
        .filter_map(|value| value.to_str().ok())
        .flat_map(Cookie::split_parse)
        .filter_map(Result::ok)
        .find(|cookie| cookie.name() == SESSION_COOKIE)
        .map(|cookie| cookie.value_trimmed().to_string())
        .filter(|value| !value.is_empty())
}

async fn load_session<S>(sessions: &S, headers: &HeaderMap) -> Result<Option<Session>, SessionError>
where
    S: SessionRepository,
{
    let Some(id) = session_id(headers) else {
        return Ok(None);
    };

    match sessions.get_session(&id).await {
        Ok(session) => Ok(Some(session)),
        Err(SessionError::SessionNotFound) => Ok(None),
        Err(err) => Err(err),
    }
}

#[async_trait]
impl<F, S, E> FromRequestParts<AppState<F, S, E>> for OptionalSession
where
    F: ForumTopicService,
    S: SessionRepository,
    E: EmailService,
{
    type Rejection = PageError;

    async fn from_request_parts(
        parts: &mut Parts,
        state: &AppState<F, S, E>,
    ) -> Result<Self, Self::Rejection> {
        Ok(Self(load_session(state.sessions.as_ref(), &parts.headers).await?))
    }
}

#[async_trait]
impl<F, S, E> FromRequestParts<AppState<F, S, E>> for RequiredSession
where
    F: ForumTopicService,
    S: SessionRepository,
    E: EmailService,
{
    type Rejection = ApiError;

    async fn from_request_parts(
        parts: &mut Parts,
        state: &AppState<F, S, E>,
    ) -> Result<Self, Self::Rejection> {
        load_session(state.sessions.as_ref(), &parts.headers)
            .await?
            .map(Self)
            .ok_or_else(|| ApiError::new_401("Please sign in"))
    }
}
