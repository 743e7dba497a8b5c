//! Uptime handler

use axum::{extract::State, Json};
use chrono::Utc;
use serde::{Deserialize, Serialize};
use utoipa::ToSchema;

use crate::{
    domain::{
        auth::SessionRepository, communication::emails::EmailService, forum::ForumTopicService,
    },
    infrastructure::http::{errors::ApiError, state::AppState},
};

/// The uptime response
#[derive(Debug, Serialize, Deserialize, ToSchema)]
pub struct UptimeResponse {
    /// The uptime of the application in seconds
    #[schema(example = 123)]
    pub uptime: i64,
}

/// Get the uptime of the application
#[utoipa::path(
    get,
    operation_id = "uptime",
    tag = "System",
    path = "/api/v1/uptime",
    responses(
        (status = StatusCode::OK, description = "Uptime response", body = UptimeResponse),
    )
)]
pub async fn handler<F, S, E>(
    State(state): State<AppState<F, S, E>>,
) -> Result<Json<UptimeResponse>, ApiError>
where
    F: ForumTopicService,
    S: SessionRepository,
    E: EmailService,
{
    let uptime = Utc::now().timestamp() - state.start_time.timestamp();

    Ok(Json(UptimeResponse { uptime }))
}

#[cfg(test)]
mod tests {
    use axum_test::TestServer;
    use chrono::Utc;
    use testresult::TestResult;

    use crate::infrastructure::http::{
        handlers::v1::uptime::UptimeResponse, servers::https::router, state::tests::test_state,
    };

    #[tokio::test]
    async fn test_uptime_handler() -> TestResult {
        let state = test_state(None, None, None);
        let start_time = state.start_time;

        let response = TestServer::new(router(state))?.get("/api/v1/uptime").await;

        response.assert_status_ok();

        let json = response.json::<UptimeResponse>();
        let elapsed = Utc::now().timestamp() - start_time.timestamp();

        assert!(
            json.uptime >= 0 && json.uptime <= elapsed,
            "App uptime should be measured from the start time"
        );

        Ok(())
    }

    #[tokio::test]
    async fn test_openapi_document() -> TestResult {
        let state = test_state(None, None, None);

        let response = TestServer::new(router(state))?
            .get("/api/v1/openapi.json")
            .await;

        response.assert_status_ok();

        let json = response.json::<serde_json::Value>();

        assert!(json["paths"]["/api/v1/messages"].is_object());
        assert!(json["paths"]["/api/v1/uptime"].is_object());

        Ok(())
    }
}
