#![warn(
    missing_debug_implementations,
    rust_2018_idioms,
    missing_docs,
    rustdoc::broken_intra_doc_links,
    rustdoc::missing_crate_level_docs
)]

//! Member portal server: forum pages and the messages API

use std::{
    net::{Ipv4Addr, Ipv6Addr, SocketAddr},
    sync::Arc,
};

use anyhow::{anyhow, Result};
use clap::Parser;
use member_portal::{
    domain::{
        communication::emails::{EmailServiceImpl, MailSettings, OrganizationSettings},
        forum::{ForumSettings, ForumTopicServiceImpl},
    },
    infrastructure::{
        db::postgres::{DatabaseConnectionDetails, PostgresDatabase},
        email::smtp::{SMTPConfig, SMTPMailer},
        http::{
            servers::{http::HttpServer, https::HttpsServer},
            state::{AppConfig, AppState},
            HttpServerConfig, Server,
        },
    },
};
use tracing::info;

/// Command-line arguments / environment variables
#[derive(Debug, Parser)]
pub struct Args {
    /// The HTTP server configuration
    #[clap(flatten)]
    pub server: HttpServerConfig,

    /// The database connection details
    #[clap(flatten)]
    pub db: DatabaseConnectionDetails,

    /// The SMTP transport
    #[clap(flatten)]
    pub smtp: SMTPConfig,

    /// How emails are composed and sent
    #[clap(flatten)]
    pub mail: MailSettings,

    /// Organization details
    #[clap(flatten)]
    pub organization: OrganizationSettings,

    /// Forum display settings
    #[clap(flatten)]
    pub forum: ForumSettings,
}

#[mutants::skip]
#[tokio::main]
async fn main() -> Result<()> {
    if let Err(e) = dotenvy::dotenv() {
        if !e.not_found() {
            eprintln!("Failed to load environment: {}", e);

            return Err(e.into());
        }
    }

    tracing_subscriber::fmt::init();

    rustls::crypto::ring::default_provider()
        .install_default()
        .map_err(|_| anyhow!("failed to install the rustls crypto provider"))?;

    let args = Args::parse();

    let postgres = Arc::new(PostgresDatabase::new(&args.db).await?);
    postgres.migrate().await?;

    let mailer = Arc::new(SMTPMailer::new(args.smtp)?);

    let config = AppConfig {
        base_url: args.server.base_url.trim_end_matches('/').to_string(),
        forum: args.forum,
        notify_new_entries: args.mail.notify_new_entries,
        upload_limit_bytes: usize::try_from(args.mail.upload_limit_bytes).unwrap_or(usize::MAX),
    };

    let state = AppState::new(
        config,
        ForumTopicServiceImpl::new(postgres.clone()),
        postgres.as_ref().clone(),
        EmailServiceImpl::new(mailer, postgres, args.mail, args.organization),
    );

    let http_port = args.server.http_port;
    let https_port = args.server.https_port;

    info!(
        "starting member portal on ports {} and {}",
        http_port, https_port
    );

    let _ = tokio::join!(
        tokio::spawn(
            HttpServer::new(
                SocketAddr::new(Ipv4Addr::UNSPECIFIED.into(), http_port),
                &args.server.base_url,
            )
            .run()
        ),
        tokio::spawn(
            HttpServer::new(
                SocketAddr::new(Ipv6Addr::UNSPECIFIED.into(), http_port),
                &args.server.base_url,
            )
            .run()
        ),
        tokio::spawn(
            HttpsServer::new(
                SocketAddr::new(Ipv4Addr::UNSPECIFIED.into(), https_port),
                &args.server.cert_path,
                &args.server.key_path,
                state.clone(),
            )
            .await?
            .run()
        ),
        tokio::spawn(
            HttpsServer::new(
                SocketAddr::new(Ipv6Addr::UNSPECIFIED.into(), https_port),
                &args.server.cert_path,
                &args.server.key_path,
                state,
            )
            .await?
            .run()
        ),
    );

    Ok(())
}
