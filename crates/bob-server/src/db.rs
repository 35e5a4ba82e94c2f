//! Postgres connection for artifact and deployment metadata.
//!
//! The database is optional. Without a URL the server keeps metadata in
//! memory, which suits development and tests.

use std::time::Duration;

use sqlx::postgres::{PgPool, PgPoolOptions};

use crate::error::ServerResult;

/// Connect to `url` and apply the embedded migrations.
///
/// Returns `None` without a URL.
pub async fn init_pool(url: Option<&str>) -> ServerResult<Option<PgPool>> {
    let Some(url) = url else {
        tracing::warn!("no database_url configured, metadata will not survive restarts");
        return Ok(None);
    };

    let pool = PgPoolOptions::new()
        .max_connections(20)
        .min_connections(2)
        .acquire_timeout(Duration::from_secs(5))
        .connect(url)
        .await?;
    tracing::info!("connected to PostgreSQL");

    sqlx::migrate!("./migrations").run(&pool).await.map_err(sqlx::Error::from)?;
    tracing::info!("database migrations applied");

    Ok(Some(pool))
}
