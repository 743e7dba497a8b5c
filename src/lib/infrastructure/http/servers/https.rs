//! HTTPS application server

use std::net::SocketAddr;

use anyhow::{Context, Result};
use async_trait::async_trait;
use axum::{extract::DefaultBodyLimit, extract::Request, Router};
use axum_server::{tls_rustls::RustlsConfig, Handle};
use tower_http::{catch_panic::CatchPanicLayer, trace::TraceLayer};
use tracing::{debug, info, info_span};

use crate::{
    domain::{
        auth::SessionRepository, communication::emails::EmailService, forum::ForumTopicService,
    },
    infrastructure::http::{
        handlers::{forum, panic_handler, v1},
        shutdown_signal,
        state::AppState,
        Server,
    },
};

/// The application's HTTPS server
#[derive(Debug)]
pub struct HttpsServer {
    router: Router,
    address: SocketAddr,
    tls_config: RustlsConfig,
}

impl HttpsServer {
    /// Returns a new HTTPS server for `address` serving `state`.
    pub async fn new<F, S, E>(
        address: SocketAddr,
        cert_path: &str,
        key_path: &str,
        state: AppState<F, S, E>,
    ) -> Result<Self>
    where
        F: ForumTopicService,
        S: SessionRepository,
        E: EmailService,
    {
        let tls_config = RustlsConfig::from_pem_file(cert_path, key_path)
            .await
            .context("failed to load TLS config")?;

        Ok(Self {
            router: router(state),
            address,
            tls_config,
        })
    }
}

#[async_trait]
impl Server for HttpsServer {
    #[mutants::skip]
    async fn run(self) -> Result<()> {
        debug!("HTTPS Server listening on {}", self.address);

        let handle = Handle::new();

        let server = axum_server::bind_rustls(self.address, self.tls_config)
            .handle(handle.clone())
            .serve(self.router.into_make_service());

        tokio::select! {
            result = server => result.context("server error")?,
            _ = shutdown_signal(Some(handle)) => {
                info!("Shutting down HTTPS server");
            }
        }

        Ok(())
    }
}

/// Room for the JSON fields around the attachments
const REQUEST_OVERHEAD_BYTES: usize = 64 * 1024;

/// Largest request body that can carry `upload_limit` bytes of base64 encoded attachments
pub fn request_body_limit(upload_limit: usize) -> usize {
    (upload_limit / 3 + 1)
        .saturating_mul(4)
        .saturating_add(REQUEST_OVERHEAD_BYTES)
}

/// Create the router for the HTTPS server
pub fn router<F, S, E>(state: AppState<F, S, E>) -> Router
where
    F: ForumTopicService,
    S: SessionRepository,
    E: EmailService,
{
    let trace_layer = TraceLayer::new_for_http().make_span_with(|request: &Request<_>| {
        let uri = request.uri().to_string();
        info_span!("http_request", method = ?request.method(), uri)
    });

    let body_limit = DefaultBodyLimit::max(request_body_limit(state.config.upload_limit_bytes));

    Router::new()
        .merge(forum::router())
        .nest("/api/v1", v1::router())
        .layer(body_limit)
        .layer(CatchPanicLayer::custom(panic_handler))
        .layer(trace_layer)
        .with_state(state)
}
