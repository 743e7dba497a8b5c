//! HTTP Server

use std::time::Duration;

use anyhow::Result;
use async_trait::async_trait;
use axum_server::Handle;
use clap::Parser;
use tokio::signal;
use tracing::{debug, error};

pub mod errors;
pub mod handlers;
pub mod open_api;
pub mod servers;
pub mod session;
pub mod state;
pub mod templates;

/// Configuration for the HTTP server.
#[derive(Debug, Clone, PartialEq, Eq, Parser)]
pub struct HttpServerConfig {
    /// The port to listen on for HTTP
    #[arg(long, env = "HTTP_PORT", default_value = "80")]
    pub http_port: u16,

    /// The port to listen on for HTTPS
    #[arg(long, env = "HTTPS_PORT", default_value = "443")]
    pub https_port: u16,

    /// The URL the portal is reached at, without a trailing slash
    #[arg(long, env = "BASE_URL")]
    pub base_url: String,

    /// Path to the PEM encoded TLS certificate
    #[arg(long, env = "CERT_PATH", default_value = "certs/cert.pem")]
    pub cert_path: String,

    /// Path to the PEM encoded TLS private key
    #[arg(long, env = "KEY_PATH", default_value = "certs/key.pem")]
    pub key_path: String,
}

/// A server that runs until shut down
#[async_trait]
pub trait Server {
    /// Serve requests until a shutdown signal arrives
    async fn run(self) -> Result<()>;
}

/// Resolve on Ctrl+C or SIGTERM, then shut `handle` down gracefully
#[mutants::skip]
pub async fn shutdown_signal(handle: Option<Handle>) {
    let ctrl_c = async {
        if let Err(err) = signal::ctrl_c().await {
            error!("failed to install Ctrl+C handler: {}", err);
            std::future::pending::<()>().await;
        }
    };

    #[cfg(unix)]
    let terminate = async {
        match signal::unix::signal(signal::unix::SignalKind::terminate()) {
            Ok(mut stream) => {
                stream.recv().await;
            }
            Err(err) => {
                error!("failed to install signal handler: {}", err);
                std::future::pending::<()>().await;
            }
        }
    };

    #[cfg(not(unix))]
    let terminate = std::future::pending::<()>();

    tokio::select! {
        _ = ctrl_c => {},
        _ = terminate => {},
    }

    if let Some(handle) = handle {
        debug!("shutting down gracefully");
        handle.graceful_shutdown(Some(Duration::from_secs(10)));
    }
}
