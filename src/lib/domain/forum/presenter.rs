//! Builds the view models of the topic page and the edit forms

use std::fmt::Write;

use chrono::{DateTime, Utc};
use tracing::warn;
use uuid::Uuid;

use crate::domain::auth::Session;

use super::{
    errors::ForumError,
    service::ForumTopicService,
    settings::ForumSettings,
    topic::{Post, Topic},
    views::{
        ActionKind, ActionLink, CategoryOption, PageLink, Pagination, PostFormView, PostRow,
        TopicFormView, TopicPage,
    },
};

const DELETE_CONFIRMATION: &str = "Do you really want to delete this post?";

/// Presents forum topics to the member behind `session`
#[derive(Debug)]
pub struct ForumTopicPresenter<'a, F>
where
    F: ForumTopicService,
{
    service: &'a F,
    settings: &'a ForumSettings,
    base_url: &'a str,
    session: Option<&'a Session>,
}

impl<'a, F> ForumTopicPresenter<'a, F>
where
    F: ForumTopicService,
{
    /// Create a presenter for one request
    pub fn new(
        service: &'a F,
        settings: &'a ForumSettings,
        base_url: &'a str,
        session: Option<&'a Session>,
    ) -> Self {
        Self {
            service,
            settings,
            base_url: base_url.trim_end_matches('/'),
            session,
        }
    }

    /// Count the view and build one page of the topic.
    ///
    /// `offset` is clamped to the existing pages and aligned to a page start.
    pub async fn topic_page(&self, topic_id: &Uuid, offset: i64) -> Result<TopicPage, ForumError> {
        let topic = self.service.view_topic(topic_id).await?;
        let per_page = self.settings.posts_per_page.max(1);

        let mut offset = align_offset(offset, per_page);
        let mut page = self.service.posts_page(topic_id, offset, per_page).await?;

        let clamped = clamp_offset(offset, page.total, per_page);
        if clamped != offset {
            offset = clamped;
            page = self.service.posts_page(topic_id, offset, per_page).await?;
        }

        let base_url = self.base_url;
        let pagination = paginate(page.total, per_page, offset, |offset| {
            format!("{base_url}/forum/topic?topic_uuid={topic_id}&offset={offset}")
        });

        let oldest_post_id = page.posts.first().filter(|_| offset == 0).map(|post| post.id);

        let posts = page
            .posts
            .iter()
            .map(|post| self.post_row(&topic, post, topic.is_first_post(post, oldest_post_id)))
            .collect();

        Ok(TopicPage {
            topic_id: topic.id,
            title: topic.title.clone(),
            category: topic.category.name.clone(),
            views: topic.views,
            posts,
            pagination,
            reply_url: self
                .session
                .map(|_| format!("{base_url}/forum/post/edit?topic_uuid={topic_id}")),
        })
    }

    /// The form to create a topic, or to edit `topic_id`
    pub async fn topic_form(&self, topic_id: Option<Uuid>) -> Result<TopicFormView, ForumError> {
        let session = self.session.ok_or(ForumError::NotAuthorized)?;
        let categories = self.service.categories().await?;

        let (topic, first_post) = match topic_id {
            Some(id) => {
                let topic = self.service.topic(&id).await?;

                if !session.user.can_edit_forum_entry(&topic.created_by) {
                    return Err(ForumError::NotAuthorized);
                }

                let first_post = self.first_post(&topic).await?;

                (Some(topic), first_post)
            }
            None => (None, None),
        };

        let selected = topic.as_ref().map(|t| t.category.id);
        let action_url = match topic_id {
            Some(id) => format!("{}/forum?mode=topic_save&topic_uuid={id}", self.base_url),
            None => format!("{}/forum?mode=topic_save", self.base_url),
        };

        Ok(TopicFormView {
            topic_id,
            title: topic.as_ref().map(|t| t.title.clone()).unwrap_or_default(),
            text: first_post
                .as_ref()
                .map(|p| p.text.clone())
                .unwrap_or_default(),
            categories: categories
                .into_iter()
                .map(|c| CategoryOption {
                    selected: Some(c.id) == selected,
                    id: c.id,
                    name: c.name,
                })
                .collect(),
            last_change: first_post.as_ref().map(|p| self.change_line(p)),
            action_url,
            csrf_token: session.csrf_token.clone(),
        })
    }

    /// The form to reply to `topic_id`, or to edit `post_id`
    pub async fn post_form(
        &self,
        topic_id: Option<Uuid>,
        post_id: Option<Uuid>,
    ) -> Result<PostFormView, ForumError> {
        let session = self.session.ok_or(ForumError::NotAuthorized)?;

        let post = match post_id {
            Some(id) => {
                let post = self.service.post(&id).await?;

                if topic_id.is_some_and(|topic_id| topic_id != post.topic_id) {
                    return Err(ForumError::PostNotFound(id));
                }

                if !session.user.can_edit_forum_entry(&post.author.id) {
                    return Err(ForumError::NotAuthorized);
                }

                Some(post)
            }
            None => None,
        };

        let topic_id = match (&post, topic_id) {
            (Some(post), _) => post.topic_id,
            (None, Some(topic_id)) => topic_id,
            (None, None) => {
                return Err(ForumError::InvalidInput(
                    "No topic was selected".to_string(),
                ))
            }
        };

        let topic = self.service.topic(&topic_id).await?;

        let mut action_url = format!(
            "{}/forum?mode=post_save&topic_uuid={topic_id}",
            self.base_url
        );
        if let Some(post) = &post {
            action_url.push_str(&format!("&post_uuid={}", post.id));
        }

        Ok(PostFormView {
            topic_id,
            topic_title: topic.title,
            post_id: post.as_ref().map(|p| p.id),
            text: post.as_ref().map(|p| p.text.clone()).unwrap_or_default(),
            last_change: post.as_ref().map(|p| self.change_line(p)),
            action_url,
            csrf_token: session.csrf_token.clone(),
        })
    }

    async fn first_post(&self, topic: &Topic) -> Result<Option<Post>, ForumError> {
        match topic.first_post_id {
            Some(id) => self.service.post(&id).await.map(Some),
            None => Ok(self
                .service
                .posts_page(&topic.id, 0, 1)
                .await?
                .posts
                .into_iter()
                .next()),
        }
    }

    fn post_row(&self, topic: &Topic, post: &Post, is_first: bool) -> PostRow {
        PostRow {
            id: post.id,
            author_name: post.author.name.clone(),
            author_photo_url: format!(
                "{}/profile/photo?user_uuid={}",
                self.base_url, post.author.id
            ),
            created_at: self.format_timestamp(&post.created_at),
            category: topic.category.name.clone(),
            last_change: post.changed.as_ref().map(|changed| {
                format!(
                    "Last edited by {} on {}",
                    changed.editor_name,
                    self.format_timestamp(&changed.changed_at)
                )
            }),
            paragraphs: paragraphs(&post.text),
            actions: post_actions(post, is_first, self.session, self.base_url),
        }
    }

    fn change_line(&self, post: &Post) -> String {
        match &post.changed {
            Some(changed) => format!(
                "Last edited by {} on {}",
                changed.editor_name,
                self.format_timestamp(&changed.changed_at)
            ),
            None => format!(
                "Created by {} on {}",
                post.author.name,
                self.format_timestamp(&post.created_at)
            ),
        }
    }

    fn format_timestamp(&self, timestamp: &DateTime<Utc>) -> String {
        let format = format!("{} {}", self.settings.date_format, self.settings.time_format);
        let mut formatted = String::new();

        if write!(formatted, "{}", timestamp.format(&format)).is_err() {
            warn!(format = %format, "invalid date or time format, using RFC 3339");

            return timestamp.to_rfc3339();
        }

        formatted
    }
}

/// The actions the member behind `session` may take on `post`.
///
/// The first post of a topic gets a single edit link to the topic form, since
/// deleting it would delete the topic. Later posts get an edit link to the
/// post form followed by a delete action.
pub fn post_actions(
    post: &Post,
    is_first: bool,
    session: Option<&Session>,
    base_url: &str,
) -> Vec<ActionLink> {
    let Some(session) = session else {
        return Vec::new();
    };

    if !session.user.can_edit_forum_entry(&post.author.id) {
        return Vec::new();
    }

    if is_first {
        return vec![ActionLink {
            kind: ActionKind::Edit,
            label: "Edit".to_string(),
            url: format!("{base_url}/forum/topic/edit?topic_uuid={}", post.topic_id),
            csrf_token: None,
            confirm: None,
        }];
    }

    vec![
        ActionLink {
            kind: ActionKind::Edit,
            label: "Edit".to_string(),
            url: format!("{base_url}/forum/post/edit?post_uuid={}", post.id),
            csrf_token: None,
            confirm: None,
        },
        ActionLink {
            kind: ActionKind::Delete,
            label: "Delete".to_string(),
            url: format!("{base_url}/forum?mode=post_delete&post_uuid={}", post.id),
            csrf_token: Some(session.csrf_token.clone()),
            confirm: Some(DELETE_CONFIRMATION.to_string()),
        },
    ]
}

/// Page links for `total` posts shown `per_page` at a time.
///
/// `offset` is clamped to `[0, start of the last page]` and aligned to a page
/// start before the current page is marked.
pub fn paginate<U>(total: i64, per_page: i64, offset: i64, url: U) -> Pagination
where
    U: Fn(i64) -> String,
{
    let per_page = per_page.max(1);
    let total = total.max(0);
    let offset = clamp_offset(align_offset(offset, per_page), total, per_page);
    let page_count = ((total + per_page - 1) / per_page).max(1);

    let pages = (0..page_count)
        .map(|page| {
            let page_offset = page * per_page;

            PageLink {
                number: page + 1,
                url: url(page_offset),
                current: page_offset == offset,
            }
        })
        .collect();

    Pagination {
        offset,
        per_page,
        total,
        pages,
    }
}

fn align_offset(offset: i64, per_page: i64) -> i64 {
    (offset.max(0) / per_page) * per_page
}

fn clamp_offset(offset: i64, total: i64, per_page: i64) -> i64 {
    let last_page_start = if total > 0 {
        ((total - 1) / per_page) * per_page
    } else {
        0
    };

    offset.clamp(0, last_page_start)
}

fn paragraphs(text: &str) -> Vec<String> {
    text.replace("\r\n", "\n")
        .split("\n\n")
        .map(str::trim)
        .filter(|p| !p.is_empty())
        .map(str::to_string)
        .collect()
}
