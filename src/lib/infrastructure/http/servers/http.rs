//! Plain HTTP server that redirects every request to HTTPS

use std::net::SocketAddr;

use anyhow::{Context, Result};
use async_trait::async_trait;
use axum::{extract::State, http::Uri, response::Redirect, routing::get, Router};
use axum_server::Handle;
use tracing::{debug, info};

use crate::infrastructure::http::{shutdown_signal, Server};

/// The application's HTTP server
#[derive(Debug)]
pub struct HttpServer {
    router: Router,
    address: SocketAddr,
}

impl HttpServer {
    /// Returns a new HTTP server for `address` redirecting to `base_url`.
    pub fn new(address: SocketAddr, base_url: &str) -> Self {
        Self {
            router: router(base_url.trim_end_matches('/').to_string()),
            address,
        }
    }
}

#[async_trait]
impl Server for HttpServer {
    #[mutants::skip]
    async fn run(self) -> Result<()> {
        debug!("HTTP Server listening on {}", self.address);

        let handle = Handle::new();

        let server = axum_server::bind(self.address)
            .handle(handle.clone())
            .serve(self.router.into_make_service());

        tokio::select! {
            result = server => result.with_context(|| format!("failed to serve on {}", self.address))?,
            _ = shutdown_signal(Some(handle)) => {
                info!("Shutting down HTTP server");
            }
        }

        Ok(())
    }
}

async fn redirect_handler(State(base_url): State<String>, uri: Uri) -> Redirect {
    let path = uri
        .path_and_query()
        .map(|path| path.as_str())
        .unwrap_or("/");

    debug!("redirecting to HTTPS: {}{}", base_url, path);

    Redirect::permanent(&format!("{base_url}{path}"))
}

/// Create the router for the HTTP server
pub fn router(base_url: String) -> Router {
    Router::new()
        .route("/", get(redirect_handler))
        .route("/*path", get(redirect_handler))
        .with_state(base_url)
}

#[cfg(test)]
mod tests {
    use axum::http::StatusCode;
    use axum_test::TestServer;
    use testresult::TestResult;

    use super::router;

    #[tokio::test]
    async fn test_redirects_to_https_with_query() -> TestResult {
        let server = TestServer::new(router("https://example.com".to_string()))?;

        let response = server.get("/forum/topic?topic_uuid=abc&offset=20").await;

        assert_eq!(response.status_code(), StatusCode::PERMANENT_REDIRECT);
        assert_eq!(
            response.header("location"),
            "https://example.com/forum/topic?topic_uuid=abc&offset=20"
        );

        Ok(())
    }
}
