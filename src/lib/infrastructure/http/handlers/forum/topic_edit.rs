//! Topic form handler

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
        templates::forum::TopicFormTemplate,
    },
};

/// Query parameters of the topic form
#[derive(Clone, Debug, Deserialize)]
pub struct TopicEditQuery {
    /// The topic to edit; a new topic when missing
    pub topic_uuid: Option<Uuid>,
}

/// Show the form to create or edit a topic
pub async fn handler<F, S, E>(
    State(state): State<AppState<F, S, E>>,
    OptionalSession(session): OptionalSession,
    query: Result<Query<TopicEditQuery>, QueryRejection>,
) -> Result<TopicFormTemplate, PageError>
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
    .topic_form(query.topic_uuid)
    .await?;

    Ok(TopicFormTemplate { form })
}

#[cfg(test)]
mod tests {
    use axum::http::StatusCode;
    use axum_test::TestServer;
    use testresult::TestResult;
    use uuid::Uuid;

    use crate::{
        domain::{
            auth::tests::{member, MockSessionRepository},
            forum::{tests::MockForumTopicService, Category},
        },
        infrastructure::http::{servers::https::router, state::tests::test_state},
    };

    #[tokio::test]
    async fn test_new_topic_form() -> TestResult {
        let session = member();
        let mut forum = MockForumTopicService::new();
        let mut sessions = MockSessionRepository::new();

        sessions
            .expect_get_session()
            .returning(move |_| Ok(session.clone()));

        forum.expect_categories().times(1).returning(|| {
            Ok(vec![Category {
                id: Uuid::now_v7(),
                name: "Events".to_string(),
            }])
        });

        let state = test_state(Some(forum), Some(sessions), None);

        let response = TestServer::new(router(state))?
            .get("/forum/topic/edit")
            .add_header("cookie".parse()?, "session_id=member-session".parse()?)
            .await;

        response.assert_status_ok();

        let html = response.text();

        assert!(html.contains("New topic"));
        assert!(html.contains("Events"));
        assert!(html.contains(r#"name="adm_csrf_token" value="member-csrf-token""#));

        Ok(())
    }

    #[tokio::test]
    async fn test_anonymous_visitor_is_rejected() -> TestResult {
        let state = test_state(None, None, None);

        let response = TestServer::new(router(state))?
            .get("/forum/topic/edit")
            .expect_failure()
            .await;

        assert_eq!(response.status_code(), StatusCode::FORBIDDEN);

        Ok(())
    }
}
