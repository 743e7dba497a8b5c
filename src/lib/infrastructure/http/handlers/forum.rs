//! Forum page handlers

use axum::{
    routing::{get, post},
    Router,
};

use crate::{
    domain::{
        auth::SessionRepository, communication::emails::EmailService, forum::ForumTopicService,
    },
    infrastructure::http::state::AppState,
};

pub mod post_edit;
pub mod save;
pub mod topic;
pub mod topic_edit;

/// Routes of the forum pages
pub fn router<F, S, E>() -> Router<AppState<F, S, E>>
where
    F: ForumTopicService,
    S: SessionRepository,
    E: EmailService,
{
    Router::new()
        .route("/forum", post(save::handler))
        .route("/forum/topic", get(topic::handler))
        .route("/forum/topic/edit", get(topic_edit::handler))
        .route("/forum/post/edit", get(post_edit::handler))
}

/// URL of a topic page
pub(crate) fn topic_url(base_url: &str, topic_id: &uuid::Uuid, offset: i64) -> String {
    let base_url = base_url.trim_end_matches('/');

    if offset > 0 {
        format!("{base_url}/forum/topic?topic_uuid={topic_id}&offset={offset}")
    } else {
        format!("{base_url}/forum/topic?topic_uuid={topic_id}")
    }
}
