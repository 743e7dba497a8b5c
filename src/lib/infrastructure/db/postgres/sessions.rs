//! Postgres implementation of the SessionRepository trait

use async_trait::async_trait;
use sqlx::{query_as, FromRow};
use uuid::Uuid;

use crate::{
    domain::{
        auth::{errors::SessionError, CurrentUser, Session, SessionRepository},
        communication::email_addresses::EmailAddress,
    },
    infrastructure::db::postgres::PostgresDatabase,
};

#[derive(FromRow)]
struct SessionRecord {
    id: String,
    csrf_token: String,
    member_id: Uuid,
    first_name: String,
    last_name: String,
    email: String,
    is_administrator: bool,
    is_forum_administrator: bool,
}

impl From<SessionRecord> for Session {
    fn from(record: SessionRecord) -> Self {
        Session {
            id: record.id,
            csrf_token: record.csrf_token,
            user: CurrentUser {
                id: record.member_id,
                first_name: record.first_name,
                last_name: record.last_name,
                email: EmailAddress::new_unchecked(&record.email),
                is_administrator: record.is_administrator,
                is_forum_administrator: record.is_forum_administrator,
            },
        }
    }
}

#[async_trait]
impl SessionRepository for PostgresDatabase {
    #[mutants::skip]
    async fn get_session(&self, session_id: &str) -> Result<Session, SessionError> {
        let record = query_as::<_, SessionRecord>(
            r#"
            SELECT
                s.id,
                s.csrf_token,
                m.id AS member_id,
                m.first_name,
                m.last_name,
                m.email,
                EXISTS (
                    SELECT 1 FROM memberships ms
                    JOIN roles r ON r.id = ms.role_id
                    WHERE ms.member_id = m.id
                      AND r.is_administrator
                      AND (ms.ends_on IS NULL OR ms.ends_on >= CURRENT_DATE)
                ) AS is_administrator,
                EXISTS (
                    SELECT 1 FROM memberships ms
                    JOIN roles r ON r.id = ms.role_id
                    WHERE ms.member_id = m.id
                      AND r.is_forum_administrator
                      AND (ms.ends_on IS NULL OR ms.ends_on >= CURRENT_DATE)
                ) AS is_forum_administrator
            FROM sessions s
            JOIN members m ON m.id = s.member_id
            WHERE s.id = $1
              AND s.expires_at > NOW()
            "#,
        )
        .bind(session_id)
        .fetch_one(&self.pool)
        .await?;

        Ok(record.into())
    }
}
