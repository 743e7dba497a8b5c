//! Forum repository module

use async_trait::async_trait;
use uuid::Uuid;

#[cfg(test)]
use mockall::mock;

use super::{
    errors::ForumError,
    topic::{Category, NewPost, NewTopic, Post, Topic, TopicChanges},
};

/// Forum repository
#[async_trait]
pub trait ForumRepository: Clone + Send + Sync + 'static {
    /// Load a topic with its category
    async fn get_topic(&self, id: &Uuid) -> Result<Topic, ForumError>;

    /// Increment the view counter and return the new value
    async fn increment_topic_views(&self, id: &Uuid) -> Result<i64, ForumError>;

    /// Posts of a topic ordered by creation time
    async fn get_posts(&self, topic_id: &Uuid, offset: i64, limit: i64)
        -> Result<Vec<Post>, ForumError>;

    /// Number of posts in a topic
    async fn count_posts(&self, topic_id: &Uuid) -> Result<i64, ForumError>;

    /// Load a single post
    async fn get_post(&self, id: &Uuid) -> Result<Post, ForumError>;

    /// All categories ordered by name
    async fn get_categories(&self) -> Result<Vec<Category>, ForumError>;

    /// Insert a topic and its first post
    async fn create_topic(&self, topic: &NewTopic) -> Result<(), ForumError>;

    /// Update a topic and the text of its first post
    async fn update_topic(&self, id: &Uuid, changes: &TopicChanges) -> Result<(), ForumError>;

    /// Insert a reply
    async fn create_post(&self, post: &NewPost) -> Result<(), ForumError>;

    /// Replace the text of a post and record the editor
    async fn update_post(&self, id: &Uuid, text: &str, editor_id: &Uuid)
        -> Result<(), ForumError>;

    /// Remove a post
    async fn delete_post(&self, id: &Uuid) -> Result<(), ForumError>;
}

#[cfg(test)]
mock! {
    pub ForumRepository {}

    impl Clone for ForumRepository {
        fn clone(&self) -> Self;
    }

    #[async_trait]
    impl ForumRepository for ForumRepository {
        async fn get_topic(&self, id: &Uuid) -> Result<Topic, ForumError>;
        async fn increment_topic_views(&self, id: &Uuid) -> Result<i64, ForumError>;
        async fn get_posts(&self, topic_id: &Uuid, offset: i64, limit: i64)
            -> Result<Vec<Post>, ForumError>;
        async fn count_posts(&self, topic_id: &Uuid) -> Result<i64, ForumError>;
        async fn get_post(&self, id: &Uuid) -> Result<Post, ForumError>;
        async fn get_categories(&self) -> Result<Vec<Category>, ForumError>;
        async fn create_topic(&self, topic: &NewTopic) -> Result<(), ForumError>;
        async fn update_topic(&self, id: &Uuid, changes: &TopicChanges) -> Result<(), ForumError>;
        async fn create_post(&self, post: &NewPost) -> Result<(), ForumError>;
        async fn update_post(&self, id: &Uuid, text: &str, editor_id: &Uuid)
            -> Result<(), ForumError>;
        async fn delete_post(&self, id: &Uuid) -> Result<(), ForumError>;
    }
}
