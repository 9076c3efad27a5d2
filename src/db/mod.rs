mod error;
mod models;
pub mod repositories;

use anyhow::{Context, Result};
use sqlx::postgres::{PgPool, PgPoolOptions};
use tracing::info;

use crate::config::DatabaseConfig;

pub use error::{DatabaseError, StoreResult};
pub use models::*;

/// Initialize the database connection pool and bring the schema up to date
pub async fn init_pool(config: &DatabaseConfig, url: &str) -> Result<PgPool> {
    let pool = PgPoolOptions::new()
        .max_connections(config.max_connections.unwrap_or(10))
        .min_connections(config.min_connections.unwrap_or(1))
        .connect(url)
        .await
        .context("Failed to connect to the database")?;

    sqlx::migrate!("./migrations")
        .run(&pool)
        .await
        .context("Failed to run database migrations")?;

    info!("Database pool ready, migrations applied");
    Ok(pool)
}
