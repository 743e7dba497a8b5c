//! Topic and post models

use chrono::{DateTime, Utc};
use uuid::Uuid;

use super::errors::ForumError;

/// Forum category
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct Category {
    /// Category UUID
    pub id: Uuid,

    /// Category name
    pub name: String,
}

/// Forum topic
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct Topic {
    /// Topic UUID
    pub id: Uuid,

    /// Topic title
    pub title: String,

    /// How often the topic page was viewed
    pub views: i64,

    /// The post that opened the topic
    pub first_post_id: Option<Uuid>,

    /// The category the topic belongs to
    pub category: Category,

    /// The member who created the topic
    pub created_by: Uuid,

    /// Created at date in UTC
    pub created_at: DateTime<Utc>,
}

impl Topic {
    /// Whether `post` opened this topic.
    ///
    /// `oldest_post_id` stands in for topics without a recorded first post.
    pub fn is_first_post(&self, post: &Post, oldest_post_id: Option<Uuid>) -> bool {
        self.first_post_id.or(oldest_post_id) == Some(post.id)
    }
}

/// Author of a post
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct Author {
    /// Member UUID
    pub id: Uuid,

    /// Full name
    pub name: String,
}

/// The last change of a post
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct PostChange {
    /// Name of the member who edited the post
    pub editor_name: String,

    /// Changed at date in UTC
    pub changed_at: DateTime<Utc>,
}

/// Forum post
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct Post {
    /// Post UUID
    pub id: Uuid,

    /// The topic the post belongs to
    pub topic_id: Uuid,

    /// Post body
    pub text: String,

    /// The member who wrote the post
    pub author: Author,

    /// Created at date in UTC
    pub created_at: DateTime<Utc>,

    /// The last edit, if any
    pub changed: Option<PostChange>,
}

/// Fields submitted with the topic form
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct TopicInput {
    /// Category UUID
    pub category_id: Uuid,

    /// Topic title
    pub title: String,

    /// Text of the first post
    pub text: String,
}

impl TopicInput {
    /// Trim the fields and reject empty ones
    pub fn validated(&self) -> Result<Self, ForumError> {
        let title = self.title.trim();
        let text = self.text.trim();

        if title.is_empty() {
            return Err(ForumError::InvalidInput("Please enter a title".to_string()));
        }

        if text.is_empty() {
            return Err(ForumError::InvalidInput("Please enter a text".to_string()));
        }

        Ok(Self {
            category_id: self.category_id,
            title: title.to_string(),
            text: text.to_string(),
        })
    }
}

/// A topic to create together with its first post
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct NewTopic {
    /// Topic UUID
    pub id: Uuid,

    /// UUID of the first post
    pub first_post_id: Uuid,

    /// Category UUID
    pub category_id: Uuid,

    /// Topic title
    pub title: String,

    /// Text of the first post
    pub text: String,

    /// The member who creates the topic
    pub created_by: Uuid,
}

/// Changes to an existing topic and its first post
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct TopicChanges {
    /// Category UUID
    pub category_id: Uuid,

    /// Topic title
    pub title: String,

    /// Text of the first post
    pub text: String,

    /// The member who edits the topic
    pub editor_id: Uuid,
}

/// A reply to create
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct NewPost {
    /// Post UUID
    pub id: Uuid,

    /// The topic to reply to
    pub topic_id: Uuid,

    /// Post body
    pub text: String,

    /// The member who writes the post
    pub created_by: Uuid,
}

#[cfg(test)]
pub mod tests {
    use chrono::Duration;

    use super::*;

    /// A topic created yesterday whose first post is `first_post_id`
    pub fn topic(created_by: Uuid, first_post_id: Uuid) -> Topic {
        Topic {
            id: Uuid::now_v7(),
            title: "Spring regatta".to_string(),
            views: 41,
            first_post_id: Some(first_post_id),
            category: Category {
                id: Uuid::now_v7(),
                name: "Events".to_string(),
            },
            created_by,
            created_at: Utc::now() - Duration::days(1),
        }
    }

    /// A post by `author_id` in `topic_id`
    pub fn post(topic_id: Uuid, author_id: Uuid, text: &str) -> Post {
        Post {
            id: Uuid::now_v7(),
            topic_id,
            text: text.to_string(),
            author: Author {
                id: author_id,
                name: "Jane Doe".to_string(),
            },
            created_at: Utc::now() - Duration::hours(2),
            changed: None,
        }
    }

    #[test]
    fn test_topic_input_is_trimmed() -> Result<(), ForumError> {
        let input = TopicInput {
            category_id: Uuid::now_v7(),
            title: "  Boat maintenance ".to_string(),
            text: "\nWho has the keys?\n".to_string(),
        };

        let validated = input.validated()?;

        assert_eq!(validated.title, "Boat maintenance");
        assert_eq!(validated.text, "Who has the keys?");

        Ok(())
    }

    #[test]
    fn test_topic_input_requires_title_and_text() {
        let input = TopicInput {
            category_id: Uuid::now_v7(),
            title: " ".to_string(),
            text: "Text".to_string(),
        };

        assert!(matches!(input.validated(), Err(ForumError::InvalidInput(_))));

        let input = TopicInput {
            title: "Title".to_string(),
            text: String::new(),
            ..input
        };

        assert!(matches!(input.validated(), Err(ForumError::InvalidInput(_))));
    }

    #[test]
    fn test_is_first_post() {
        let author = Uuid::now_v7();
        let first = post(Uuid::now_v7(), author, "first");
        let reply = post(first.topic_id, author, "reply");
        let topic = topic(author, first.id);

        assert!(topic.is_first_post(&first, None));
        assert!(!topic.is_first_post(&reply, Some(reply.id)));
    }

    #[test]
    fn test_oldest_post_is_first_without_reference() {
        let author = Uuid::now_v7();
        let first = post(Uuid::now_v7(), author, "first");
        let reply = post(first.topic_id, author, "reply");
        let mut topic = topic(author, first.id);
        topic.first_post_id = None;

        assert!(topic.is_first_post(&first, Some(first.id)));
        assert!(!topic.is_first_post(&reply, Some(first.id)));
        assert!(!topic.is_first_post(&first, None));
    }
}
