//! Forum topic service module

use std::sync::Arc;

use async_trait::async_trait;
use tracing::info;
use uuid::Uuid;

#[cfg(test)]
use mockall::mock;

use crate::domain::auth::CurrentUser;

use super::{
    errors::ForumError,
    repository::ForumRepository,
    topic::{Category, NewPost, NewTopic, Post, Topic, TopicChanges, TopicInput},
};

/// One page of posts and the number of posts in the whole topic
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct PostsPage {
    /// Posts on this page, oldest first
    pub posts: Vec<Post>,

    /// Posts in the topic
    pub total: i64,
}

/// Forum topic service
#[async_trait]
pub trait ForumTopicService: Clone + Send + Sync + 'static {
    /// Load a topic.
    ///
    /// # Returns
    /// The [`Topic`], or [`ForumError::TopicNotFound`] if there is no topic with this id.
    async fn topic(&self, id: &Uuid) -> Result<Topic, ForumError>;

    /// Load a topic and count the view
    async fn view_topic(&self, id: &Uuid) -> Result<Topic, ForumError>;

    /// A page of posts of a topic ordered by creation time
    async fn posts_page(
        &self,
        topic_id: &Uuid,
        offset: i64,
        limit: i64,
    ) -> Result<PostsPage, ForumError>;

    /// Load a post.
    ///
    /// # Returns
    /// The [`Post`], or [`ForumError::PostNotFound`] if there is no post with this id.
    async fn post(&self, id: &Uuid) -> Result<Post, ForumError>;

    /// Categories available in the topic form
    async fn categories(&self) -> Result<Vec<Category>, ForumError>;

    /// Create a topic with its first post, or update an existing one.
    ///
    /// # Arguments
    /// * `user` - The member submitting the form.
    /// * `topic_id` - The topic to update, or [`None`] to create one.
    /// * `input` - Category, title and text of the first post.
    ///
    /// # Returns
    /// The topic UUID.
    async fn save_topic(
        &self,
        user: &CurrentUser,
        topic_id: Option<Uuid>,
        input: &TopicInput,
    ) -> Result<Uuid, ForumError>;

    /// Reply to a topic, or edit an existing post of it.
    ///
    /// # Returns
    /// The post UUID.
    async fn save_post(
        &self,
        user: &CurrentUser,
        topic_id: &Uuid,
        post_id: Option<Uuid>,
        text: &str,
    ) -> Result<Uuid, ForumError>;

    /// Delete a post that is not the first of its topic.
    ///
    /// # Returns
    /// The UUID of the topic the post belonged to.
    async fn delete_post(&self, user: &CurrentUser, post_id: &Uuid) -> Result<Uuid, ForumError>;
}

#[cfg(test)]
mock! {
    pub ForumTopicService {}

    impl Clone for ForumTopicService {
        fn clone(&self) -> Self;
    }

    #[async_trait]
    impl ForumTopicService for ForumTopicService {
        async fn topic(&self, id: &Uuid) -> Result<Topic, ForumError>;
        async fn view_topic(&self, id: &Uuid) -> Result<Topic, ForumError>;
        async fn posts_page(
            &self,
            topic_id: &Uuid,
            offset: i64,
            limit: i64,
        ) -> Result<PostsPage, ForumError>;
        async fn post(&self, id: &Uuid) -> Result<Post, ForumError>;
        async fn categories(&self) -> Result<Vec<Category>, ForumError>;
        async fn save_topic(
            &self,
            user: &CurrentUser,
            topic_id: Option<Uuid>,
            input: &TopicInput,
        ) -> Result<Uuid, ForumError>;
        async fn save_post(
            &self,
            user: &CurrentUser,
            topic_id: &Uuid,
            post_id: Option<Uuid>,
            text: &str,
        ) -> Result<Uuid, ForumError>;
        async fn delete_post(&self, user: &CurrentUser, post_id: &Uuid) -> Result<Uuid, ForumError>;
    }
}

/// Forum topic service implementation
#[derive(Debug, Clone)]
pub struct ForumTopicServiceImpl<R>
where
    R: ForumRepository,
{
    repo: Arc<R>,
}

impl<R> ForumTopicServiceImpl<R>
where
    R: ForumRepository,
{
    /// Create a new forum topic service
    pub fn new(repo: Arc<R>) -> Self {
        Self { repo }
    }

    async fn ensure_category(&self, category_id: &Uuid) -> Result<(), ForumError> {
        let categories = self.repo.get_categories().await?;

        if categories.iter().any(|c| c.id == *category_id) {
            Ok(())
        } else {
            Err(ForumError::InvalidInput(
                "Please choose a category".to_string(),
            ))
        }
    }
}

#[async_trait]
impl<R> ForumTopicService for ForumTopicServiceImpl<R>
where
    R: ForumRepository,
{
    async fn topic(&self, id: &Uuid) -> Result<Topic, ForumError> {
        self.repo.get_topic(id).await
    }

    async fn view_topic(&self, id: &Uuid) -> Result<Topic, ForumError> {
        let mut topic = self.repo.get_topic(id).await?;

        topic.views = self.repo.increment_topic_views(id).await?;

        Ok(topic)
    }

    async fn posts_page(
        &self,
        topic_id: &Uuid,
        offset: i64,
        limit: i64,
    ) -> Result<PostsPage, ForumError> {
        let total = self.repo.count_posts(topic_id).await?;
        let posts = self
            .repo
            .get_posts(topic_id, offset.max(0), limit.max(1))
            .await?;

        Ok(PostsPage { posts, total })
    }

    async fn post(&self, id: &Uuid) -> Result<Post, ForumError> {
        self.repo.get_post(id).await
    }

    async fn categories(&self) -> Result<Vec<Category>, ForumError> {
        self.repo.get_categories().await
    }

    async fn save_topic(
        &self,
        user: &CurrentUser,
        topic_id: Option<Uuid>,
        input: &TopicInput,
    ) -> Result<Uuid, ForumError> {
        let input = input.validated()?;

        self.ensure_category(&input.category_id).await?;

        match topic_id {
            Some(id) => {
                let topic = self.repo.get_topic(&id).await?;

                if !user.can_edit_forum_entry(&topic.created_by) {
                    return Err(ForumError::NotAuthorized);
                }

                let changes = TopicChanges {
                    category_id: input.category_id,
                    title: input.title,
                    text: input.text,
                    editor_id: user.id,
                };

                self.repo.update_topic(&id, &changes).await?;

                info!(topic_id = %id, editor_id = %user.id, "topic updated");

                Ok(id)
            }
            None => {
                let topic = NewTopic {
                    id: Uuid::now_v7(),
                    first_post_id: Uuid::now_v7(),
                    category_id: input.category_id,
                    title: input.title,
                    text: input.text,
                    created_by: user.id,
                };

                self.repo.create_topic(&topic).await?;

                info!(topic_id = %topic.id, created_by = %user.id, "topic created");

                Ok(topic.id)
            }
        }
    }

    async fn save_post(
        &self,
        user: &CurrentUser,
        topic_id: &Uuid,
        post_id: Option<Uuid>,
        text: &str,
    ) -> Result<Uuid, ForumError> {
        let text = text.trim();

        if text.is_empty() {
            return Err(ForumError::InvalidInput("Please enter a text".to_string()));
        }

        match post_id {
            Some(id) => {
                let post = self.repo.get_post(&id).await?;

                if post.topic_id != *topic_id {
                    return Err(ForumError::PostNotFound(id));
                }

                if !user.can_edit_forum_entry(&post.author.id) {
                    return Err(ForumError::NotAuthorized);
                }

                self.repo.update_post(&id, text, &user.id).await?;

                info!(post_id = %id, editor_id = %user.id, "post updated");

                Ok(id)
            }
            None => {
                let topic = self.repo.get_topic(topic_id).await?;

                let post = NewPost {
                    id: Uuid::now_v7(),
                    topic_id: topic.id,
                    text: text.to_string(),
                    created_by: user.id,
                };

                self.repo.create_post(&post).await?;

                info!(post_id = %post.id, topic_id = %topic.id, "post created");

                Ok(post.id)
            }
        }
    }

    async fn delete_post(&self, user: &CurrentUser, post_id: &Uuid) -> Result<Uuid, ForumError> {
        let post = self.repo.get_post(post_id).await?;

        if !user.can_edit_forum_entry(&post.author.id) {
            return Err(ForumError::NotAuthorized);
        }

        let topic = self.repo.get_topic(&post.topic_id).await?;

        let oldest_post_id = match topic.first_post_id {
            Some(_) => None,
            None => self
                .repo
                .get_posts(&topic.id, 0, 1)
                .await?
                .first()
                .map(|oldest| oldest.id),
        };

        if topic.is_first_post(&post, oldest_post_id) {
            return Err(ForumError::InvalidInput(
                "The first post of a topic cannot be deleted".to_string(),
            ));
        }

        self.repo.delete_post(post_id).await?;

        info!(post_id = %post_id, topic_id = %topic.id, "post deleted");

        Ok(topic.id)
    }
}
