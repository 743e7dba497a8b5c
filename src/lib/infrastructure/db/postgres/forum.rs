//! Postgres implementation of the ForumRepository trait

use anyhow::anyhow;
use async_trait::async_trait;
use chrono::{DateTime, Utc};
use sqlx::{query, query_as, query_scalar, Error::RowNotFound, FromRow};
use uuid::Uuid;

use crate::{
    domain::forum::{
        errors::ForumError, Author, Category, ForumRepository, NewPost, NewTopic, Post,
        PostChange, Topic, TopicChanges,
    },
    infrastructure::db::postgres::PostgresDatabase,
};

#[derive(FromRow)]
struct TopicRecord {
    id: Uuid,
    title: String,
    views: i64,
    first_post_id: Option<Uuid>,
    category_id: Uuid,
    category_name: String,
    created_by: Uuid,
    created_at: DateTime<Utc>,
}

impl From<TopicRecord> for Topic {
    fn from(record: TopicRecord) -> Self {
        Topic {
            id: record.id,
            title: record.title,
            views: record.views,
            first_post_id: record.first_post_id,
            category: Category {
                id: record.category_id,
                name: record.category_name,
            },
            created_by: record.created_by,
            created_at: record.created_at,
        }
    }
}

#[derive(FromRow)]
struct PostRecord {
    id: Uuid,
    topic_id: Uuid,
    text: String,
    author_id: Uuid,
    author_name: String,
    created_at: DateTime<Utc>,
    editor_name: Option<String>,
    changed_at: Option<DateTime<Utc>>,
}

impl From<PostRecord> for Post {
    fn from(record: PostRecord) -> Self {
        let changed = match (record.editor_name, record.changed_at) {
            (Some(editor_name), Some(changed_at)) => Some(PostChange {
                editor_name,
                changed_at,
            }),
            _ => None,
        };

        Post {
            id: record.id,
            topic_id: record.topic_id,
            text: record.text,
            author: Author {
                id: record.author_id,
                name: record.author_name,
            },
            created_at: record.created_at,
            changed,
        }
    }
}

#[derive(FromRow)]
struct CategoryRecord {
    id: Uuid,
    name: String,
}

const SELECT_POSTS: &str = r#"
    SELECT
        p.id,
        p.topic_id,
        p.text,
        a.id AS author_id,
        TRIM(a.first_name || ' ' || a.last_name) AS author_name,
        p.created_at,
        TRIM(e.first_name || ' ' || e.last_name) AS editor_name,
        p.changed_at
    FROM forum_posts p
    JOIN members a ON a.id = p.created_by
    LEFT JOIN members e ON e.id = p.changed_by
"#;

fn unknown_error(err: sqlx::Error) -> ForumError {
    ForumError::UnknownError(anyhow!("Unknown database error: {:?}", err))
}

#[async_trait]
impl ForumRepository for PostgresDatabase {
    #[mutants::skip]
    async fn get_topic(&self, id: &Uuid) -> Result<Topic, ForumError> {
        let record = query_as::<_, TopicRecord>(
            r#"
            SELECT
                t.id,
                t.title,
                t.views,
                t.first_post_id,
                c.id AS category_id,
                c.name AS category_name,
                t.created_by,
                t.created_at
            FROM forum_topics t
            JOIN forum_categories c ON c.id = t.category_id
            WHERE t.id = $1
            "#,
        )
        .bind(id)
        .fetch_one(&self.pool)
        .await
        .map_err(|err| match err {
            RowNotFound => ForumError::TopicNotFound(*id),
            _ => unknown_error(err),
        })?;

        Ok(record.into())
    }

    #[mutants::skip]
    async fn increment_topic_views(&self, id: &Uuid) -> Result<i64, ForumError> {
        query_scalar::<_, i64>(
            r#"
            UPDATE forum_topics
            SET views = views + 1
            WHERE id = $1
            RETURNING views
            "#,
        )
        .bind(id)
        .fetch_one(&self.pool)
        .await
        .map_err(|err| match err {
            RowNotFound => ForumError::TopicNotFound(*id),
            _ => unknown_error(err),
        })
    }

    #[mutants::skip]
    async fn get_posts(
        &self,
        topic_id: &Uuid,
        offset: i64,
        limit: i64,
    ) -> Result<Vec<Post>, ForumError> {
        let sql = format!(
            "{SELECT_POSTS} WHERE p.topic_id = $1 ORDER BY p.created_at, p.id OFFSET $2 LIMIT $3"
        );

        let records = query_as::<_, PostRecord>(&sql)
            .bind(topic_id)
            .bind(offset)
            .bind(limit)
            .fetch_all(&self.pool)
            .await
            .map_err(unknown_error)?;

        Ok(records.into_iter().map(Post::from).collect())
    }

    #[mutants::skip]
    async fn count_posts(&self, topic_id: &Uuid) -> Result<i64, ForumError> {
        query_scalar::<_, i64>("SELECT COUNT(*) FROM forum_posts WHERE topic_id = $1")
            .bind(topic_id)
            .fetch_one(&self.pool)
            .await
            .map_err(unknown_error)
    }

    #[mutants::skip]
    async fn get_post(&self, id: &Uuid) -> Result<Post, ForumError> {
        let sql = format!("{SELECT_POSTS} WHERE p.id = $1");

        let record = query_as::<_, PostRecord>(&sql)
            .bind(id)
            .fetch_one(&self.pool)
            .await
            .map_err(|err| match err {
                RowNotFound => ForumError::PostNotFound(*id),
                _ => unknown_error(err),
            })?;

        Ok(record.into())
    }

    #[mutants::skip]
    async fn get_categories(&self) -> Result<Vec<Category>, ForumError> {
        let records = query_as::<_, CategoryRecord>(
            "SELECT id, name FROM forum_categories ORDER BY name",
        )
        .fetch_all(&self.pool)
        .await
        .map_err(unknown_error)?;

        Ok(records
            .into_iter()
            .map(|record| Category {
                id: record.id,
                name: record.name,
            })
            .collect())
    }

    #[mutants::skip]
    async fn create_topic(&self, topic: &NewTopic) -> Result<(), ForumError> {
        let mut tx = self.pool.begin().await.map_err(unknown_error)?;

        query(
            r#"
            INSERT INTO forum_topics (id, category_id, title, first_post_id, created_by)
            VALUES ($1, $2, $3, $4, $5)
            "#,
        )
        .bind(topic.id)
        .bind(topic.category_id)
        .bind(&topic.title)
        .bind(topic.first_post_id)
        .bind(topic.created_by)
        .execute(&mut *tx)
        .await
        .map_err(unknown_error)?;

        query(
            r#"
            INSERT INTO forum_posts (id, topic_id, text, created_by)
            VALUES ($1, $2, $3, $4)
            "#,
        )
        .bind(topic.first_post_id)
        .bind(topic.id)
        .bind(&topic.text)
        .bind(topic.created_by)
        .execute(&mut *tx)
        .await
        .map_err(unknown_error)?;

        tx.commit().await.map_err(unknown_error)
    }

    #[mutants::skip]
    async fn update_topic(&self, id: &Uuid, changes: &TopicChanges) -> Result<(), ForumError> {
        let mut tx = self.pool.begin().await.map_err(unknown_error)?;

        let result = query("UPDATE forum_topics SET category_id = $2, title = $3 WHERE id = $1")
            .bind(id)
            .bind(changes.category_id)
            .bind(&changes.title)
            .execute(&mut *tx)
            .await
            .map_err(unknown_error)?;

        if result.rows_affected() == 0 {
            return Err(ForumError::TopicNotFound(*id));
        }

        query(
            r#"
            UPDATE forum_posts
            SET text = $2, changed_by = $3, changed_at = NOW()
            WHERE id = (
                SELECT COALESCE(
                    t.first_post_id,
                    (SELECT p.id FROM forum_posts p WHERE p.topic_id = t.id
                     ORDER BY p.created_at, p.id LIMIT 1)
                )
                FROM forum_topics t
                WHERE t.id = $1
            )
            "#,
        )
        .bind(id)
        .bind(&changes.text)
        .bind(changes.editor_id)
        .execute(&mut *tx)
        .await
        .map_err(unknown_error)?;

        tx.commit().await.map_err(unknown_error)
    }

    #[mutants::skip]
    async fn create_post(&self, post: &NewPost) -> Result<(), ForumError> {
        query(
            r#"
            INSERT INTO forum_posts (id, topic_id, text, created_by)
            VALUES ($1, $2, $3, $4)
            "#,
        )
        .bind(post.id)
        .bind(post.topic_id)
        .bind(&post.text)
        .bind(post.created_by)
        .execute(&self.pool)
        .await
        .map_err(unknown_error)?;

        Ok(())
    }

    #[mutants::skip]
    async fn update_post(&self, id: &Uuid, text: &str, editor_id: &Uuid) -> Result<(), ForumError> {
        let result = query(
            r#"
            UPDATE forum_posts
            SET text = $2, changed_by = $3, changed_at = NOW()
            WHERE id = $1
            "#,
        )
        .bind(id)
        .bind(text)
        .bind(editor_id)
        .execute(&self.pool)
        .await
        .map_err(unknown_error)?;

        if result.rows_affected() == 0 {
            return Err(ForumError::PostNotFound(*id));
        }

        Ok(())
    }

    #[mutants::skip]
    async fn delete_post(&self, id: &Uuid) -> Result<(), ForumError> {
        let result = query("DELETE FROM forum_posts WHERE id = $1")
            .bind(id)
            .execute(&self.pool)
            .await
            .map_err(unknown_error)?;

        if result.rows_affected() == 0 {
            return Err(ForumError::PostNotFound(*id));
        }

        Ok(())
    }
}
