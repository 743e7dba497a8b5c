//! Post form handler

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
        templates::forum::PostFormTemplate,
    },
};

/// Query parameters of the post form
#[derive(Clone, Debug, Deserialize)]
pub struct PostEditQuery {
    /// The topic to reply to
    pub topic_uuid: Option<Uuid>,

    /// The post to edit
    pub post_uuid: Option<Uuid>,
}

/// Show the form to reply to a topic or to edit a post
pub async fn handler<F, S, E>(
    State(state): State<AppState<F, S, E>>,
    OptionalSession(session): OptionalSession,
    query: Result<Query<PostEditQuery>, QueryRejection>,
) -> Result<PostFormTemplate, PageError>
where
    F: ForumTopicService,
    S: SessionRepository,
    E: EmailService,
{
    let Query(query) = query?;

    let form = ForumTopicPresenter::new(
        state.forum.as_ref(),
        &state.config.forum,
        &state.config.base_url,
        session.as_ref(),
    )
    .post_form(query.topic_uuid, query.post_uuid)
    .await?;

    Ok(PostFormTemplate { form })
}

#[cfg(test)]
mod tests {
    use axum::http::StatusCode;
    use axum_test::TestServer;
    use mockall::predicate::eq;
    use testresult::TestResult;
    use uuid::Uuid;

    use crate::{
        domain::{
            auth::tests::{member, MockSessionRepository},
            forum::tests::{post, topic, MockForumTopicService},
        },
        infrastructure::http::{servers::https::router, state::tests::test_state},
    };

    fn signed_in() -> MockSessionRepository {
        let session = member();
        let mut sessions = MockSessionRepository::new();

        sessions
            .expect_get_session()
            .returning(move |_| Ok(session.clone()));

        sessions
    }

    #[tokio::test]
    async fn test_edit_own_post() -> TestResult {
        let session = member();
        let topic = topic(Uuid::now_v7(), Uuid::now_v7());
        let reply = post(topic.id, session.user.id, "Count me in");
        let reply_id = reply.id;
        let topic_id = topic.id;
        let mut forum = MockForumTopicService::new();
        let mut sessions = MockSessionRepository::new();

        sessions
            .expect_get_session()
            .returning(move |_| Ok(session.clone()));

        forum
            .expect_post()
            .with(eq(reply_id))
            .returning(move |_| Ok(reply.clone()));

        forum
            .expect_topic()
            .with(eq(topic_id))
            .returning(move |_| Ok(topic.clone()));

        let state = test_state(Some(forum), Some(sessions), None);

        let response = TestServer::new(router(state))?
            .get("/forum/post/edit")
            .add_query_param("post_uuid", reply_id)
            .add_header("cookie".parse()?, "session_id=member-session".parse()?)
            .await;

        response.assert_status_ok();

        let html = response.text();

        assert!(html.contains("Edit post"));
        assert!(html.contains("Count me in"));
        assert!(html.contains(&format!("post_uuid={reply_id}")));

        Ok(())
    }

    #[tokio::test]
    async fn test_edit_post_of_another_member() -> TestResult {
        let topic = topic(Uuid::now_v7(), Uuid::now_v7());
        let reply = post(topic.id, Uuid::now_v7(), "Not yours");
        let reply_id = reply.id;
        let mut forum = MockForumTopicService::new();

        forum
            .expect_post()
            .returning(move |_| Ok(reply.clone()));

        let state = test_state(Some(forum), Some(signed_in()), None);

        let response = TestServer::new(router(state))?
            .get("/forum/post/edit")
            .add_query_param("post_uuid", reply_id)
            .add_header("cookie".parse()?, "session_id=member-session".parse()?)
            .expect_failure()
            .await;

        assert_eq!(response.status_code(), StatusCode::FORBIDDEN);

        Ok(())
    }

    #[tokio::test]
    async fn test_no_topic_selected() -> TestResult {
        let state = test_state(None, Some(signed_in()), None);

        let response = TestServer::new(router(state))?
            .get("/forum/post/edit")
            .add_header("cookie".parse()?, "session_id=member-session".parse()?)
            .expect_failure()
            .await;

        assert_eq!(response.status_code(), StatusCode::UNPROCESSABLE_ENTITY);
        assert!(response.text().contains("No topic was selected"));

        Ok(())
    }
}
