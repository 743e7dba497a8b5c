//! Postgres module

use anyhow::{Context, Result};
use clap::Parser;
use sqlx::{postgres::PgPoolOptions, PgPool};
use tracing::info;

mod forum;
mod members;
mod sessions;

/// Database connection
#[derive(Debug, Clone)]
pub struct PostgresDatabase {
    /// The database connection pool
    pub pool: PgPool,
}

impl PostgresDatabase {
    /// Create a new database connection
    #[mutants::skip]
    pub async fn new(details: &DatabaseConnectionDetails) -> Result<Self> {
        let pool = PgPoolOptions::new()
            .max_connections(details.max_connections)
            .connect(&details.connection_string)
            .await
            .context("failed to connect to the database")?;

        Ok(Self { pool })
    }

    /// Apply pending migrations
    #[mutants::skip]
    pub async fn migrate(&self) -> Result<()> {
        sqlx::migrate!("./migrations")
            .run(&self.pool)
            .await
            .context("failed to run database migrations")?;

        info!("database migrations applied");

        Ok(())
    }

    /// Returns the underlying database connection
    pub fn connection(&self) -> &PgPool {
        &self.pool
    }
}

/// Database connection details
#[derive(Clone, Debug, Parser)]
pub struct DatabaseConnectionDetails {
    /// The database connection string
    #[arg(long, env = "DATABASE_URL")]
    pub connection_string: String,

    /// Maximum number of pooled connections
    #[arg(long, env = "DATABASE_MAX_CONNECTIONS", default_value_t = 10)]
    pub max_connections: u32,
}
