//! JSON API, version 1

use axum::{
    routing::{get, post},
    Json, Router,
};
use utoipa::OpenApi;

use crate::{
    domain::{
        auth::SessionRepository, communication::emails::EmailService, forum::ForumTopicService,
    },
    infrastructure::http::{open_api::ApiDocs, state::AppState},
};

pub mod messages;
pub mod uptime;

/// Routes of the v1 API
pub fn router<F, S, E>() -> Router<AppState<F, S, E>>
where
    F: ForumTopicService,
    S: SessionRepository,
    E: EmailService,
{
    Router::new()
        .route("/openapi.json", get(Json(ApiDocs::openapi())))
        .route("/uptime", get(uptime::handler))
        .route("/messages", post(messages::handler))
}
