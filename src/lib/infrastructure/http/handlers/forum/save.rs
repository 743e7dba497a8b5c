//! Forum form submissions

use axum::{
    extract::{
        rejection::{FormRejection, QueryRejection},
        Query, State,
    },
    http::StatusCode,
    response::Redirect,
    Form,
};
use serde::Deserialize;
use tracing::{info, warn};
use uuid::Uuid;

use crate::{
    domain::{
        auth::{CurrentUser, SessionRepository},
        communication::emails::{escape_html, EmailService},
        forum::{errors::ForumError, ForumTopicService, TopicInput},
    },
    infrastructure::http::{
        errors::PageError, handlers::forum::topic_url, session::OptionalSession,
        state::AppState,
    },
};

/// What the submission does
#[derive(Clone, Copy, Debug, PartialEq, Eq, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum SaveMode {
    /// Create or update a topic and its first post
    TopicSave,

    /// Reply to a topic or update a post
    PostSave,

    /// Delete a post
    PostDelete,
}

/// Query parameters of a submission
#[derive(Clone, Debug, Deserialize)]
pub struct SaveQuery {
    /// What to do
    pub mode: SaveMode,

    /// The topic the submission belongs to
    pub topic_uuid: Option<Uuid>,

    /// The post to update or delete
    pub post_uuid: Option<Uuid>,
}

/// Submitted form fields
#[derive(Clone, Debug, Default, Deserialize)]
pub struct SaveForm {
    /// Token from the session the form was rendered for
    #[serde(default)]
    pub adm_csrf_token: String,

    /// Topic title
    #[serde(default)]
    pub title: String,

    /// Post text
    #[serde(default)]
    pub text: String,

    /// Topic category
    pub category_uuid: Option<Uuid>,
}

/// Save or delete forum content, then redirect to the topic
pub async fn handler<F, S, E>(
    State(state): State<AppState<F, S, E>>,
    OptionalSession(session): OptionalSession,
    query: Result<Query<SaveQuery>, QueryRejection>,
    form: Result<Form<SaveForm>, FormRejection>,
) -> Result<Redirect, PageError>
where
    F: ForumTopicService,
    S: SessionRepository,
    E: EmailService,
{
    let Query(query) = query?;
    let Form(form) = form?;

    let session = session.ok_or_else(PageError::not_authorized)?;

    if !session.verify_csrf_token(&form.adm_csrf_token) {
        warn!("rejected forum submission with invalid CSRF token");

        return Err(PageError::new(
            StatusCode::FORBIDDEN,
            "The form has expired, please reload the page and try again.",
        ));
    }

    let user = &session.user;

    let url = match query.mode {
        SaveMode::TopicSave => save_topic(&state, user, query.topic_uuid, form).await?,
        SaveMode::PostSave => {
            let topic_id = query.topic_uuid.ok_or_else(no_topic_selected)?;

            save_post(&state, user, &topic_id, query.post_uuid, &form.text).await?
        }
        SaveMode::PostDelete => {
            let post_id = query.post_uuid.ok_or_else(|| {
                ForumError::InvalidInput("No post was selected".to_string())
            })?;

            let topic_id = state.forum.delete_post(user, &post_id).await?;

            topic_url(&state.config.base_url, &topic_id, 0)
        }
    };

    Ok(Redirect::to(&url))
}

fn no_topic_selected() -> ForumError {
    ForumError::InvalidInput("No topic was selected".to_string())
}

async fn save_topic<F, S, E>(
    state: &AppState<F, S, E>,
    user: &CurrentUser,
    topic_id: Option<Uuid>,
    form: SaveForm,
) -> Result<String, ForumError>
where
    F: ForumTopicService,
    S: SessionRepository,
    E: EmailService,
{
    let category_id = form
        .category_uuid
        .ok_or_else(|| ForumError::InvalidInput("Please choose a category".to_string()))?;

    let input = TopicInput {
        category_id,
        title: form.title,
        text: form.text,
    };

    let saved_id = state.forum.save_topic(user, topic_id, &input).await?;
    let url = topic_url(&state.config.base_url, &saved_id, 0);

    if topic_id.is_none() {
        info!("topic {} created by {}", saved_id, user.id);

        let message = format!(
            "<p>{} created the topic <a href=\"{}\">{}</a>.</p><p>{}</p>",
            escape_html(&user.name()),
            url,
            escape_html(input.title.trim()),
            escape_html(input.text.trim()),
        );

        notify(state, &format!("New forum topic: {}", input.title.trim()), &message).await;
    }

    Ok(url)
}

async fn save_post<F, S, E>(
    state: &AppState<F, S, E>,
    user: &CurrentUser,
    topic_id: &Uuid,
    post_id: Option<Uuid>,
    text: &str,
) -> Result<String, ForumError>
where
    F: ForumTopicService,
    S: SessionRepository,
    E: EmailService,
{
    let saved_id = state.forum.save_post(user, topic_id, post_id, text).await?;

    if post_id.is_some() {
        return Ok(format!(
            "{}#post_{saved_id}",
            topic_url(&state.config.base_url, topic_id, 0)
        ));
    }

    let url = match state.forum.posts_page(topic_id, 0, 1).await {
        Ok(page) => {
            let per_page = state.config.forum.posts_per_page.max(1);
            let last_page = (page.total.max(1) - 1) / per_page * per_page;

            topic_url(&state.config.base_url, topic_id, last_page)
        }
        Err(err) => {
            warn!("failed to count posts of topic {}: {}", topic_id, err);
            topic_url(&state.config.base_url, topic_id, 0)
        }
    };

    if state.config.notify_new_entries {
        match state.forum.topic(topic_id).await {
            Ok(topic) => {
                let message = format!(
                    "<p>{} replied to <a href=\"{}\">{}</a>.</p><p>{}</p>",
                    escape_html(&user.name()),
                    url,
                    escape_html(&topic.title),
                    escape_html(text.trim()),
                );

                notify(state, &format!("New forum post: {}", topic.title), &message).await;
            }
            Err(err) => warn!("not notifying about post {}: {}", saved_id, err),
        }
    }

    Ok(format!("{url}#post_{saved_id}"))
}

/// Notification failures never fail the submission
async fn notify<F, S, E>(state: &AppState<F, S, E>, subject: &str, message: &str)
where
    F: ForumTopicService,
    S: SessionRepository,
    E: EmailService,
{
    if !state.config.notify_new_entries {
        return;
    }

    if let Err(err) = state.emails.send_notification(subject, message).await {
        warn!("failed to send forum notification: {}", err);
    }
}
