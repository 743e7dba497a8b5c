//! Topic page handler

use axum::extract::{rejection::QueryRejection, Query, State};
use serde::Deserialize;
use uuid::Uuid;

use crate::{
    domain::{
        auth::SessionRepository,
        communication::emails::EmailService,
        forum::{ForumTopicPresenter, ForumTopicService},
    },
    infrastructure::http::{
        errors::PageError, session::OptionalSession, state::AppState,
        templates::forum::TopicTemplate,
    },
};

/// Query parameters of the topic page
#[derive(Clone, Debug, Deserialize)]
pub struct TopicQuery {
    /// The topic to show
    pub topic_uuid: Uuid,

    /// Index of the first post on the page
    #[serde(default)]
    pub offset: i64,
}

/// Show one page of a topic and count the view
pub async fn handler<F, S, E>(
    State(state): State<AppState<F, S, E>>,
    OptionalSession(session): OptionalSession,
    query: Result<Query<TopicQuery>, QueryRejection>,
) -> Result<TopicTemplate, PageError>
where
    F: ForumTopicService,
    S: SessionRepository,
    E: EmailService,
{
    let Query(query) = query?;

    let presenter = ForumTopicPresenter::new(
        state.forum.as_ref(),
        &state.config.forum,
        &state.config.base_url,
        session.as_ref(),
    );

    let page = presenter.topic_page(&query.topic_uuid, query.offset).await?;

    Ok(TopicTemplate { page })
}
