//! Relational storage: the credential store (`users`) and the image record
//! store (`images`).

pub mod images;
pub mod users;

use anyhow::{Context, Result};
use sqlx::sqlite::{SqliteConnectOptions, SqlitePoolOptions};
use sqlx::{Pool, Sqlite};
use std::str::FromStr;
use std::time::Duration;

use crate::config::DbConfig;

pub use images::{AnalysisFields, AnalysisOutcome, AnalysisStatus, ImageRecord, NewImage};
pub use users::{PublicUser, User};

/// Database connection pool type
pub type DbPool = Pool<Sqlite>;

pub async fn create_pool(database_url: &str, db_config: &DbConfig) -> Result<DbPool> {
    let options = SqliteConnectOptions::from_str(database_url)
        .with_context(|| format!("Invalid DATABASE_URL: {}", database_url))?
        .create_if_missing(true)
        .foreign_keys(true);

    let pool = SqlitePoolOptions::new()
        .max_connections(db_config.max_connections)
        .acquire_timeout(Duration::from_secs(db_config.acquire_timeout_secs))
        .connect_with(options)
        .await
        .context("Failed to connect to database")?;

    Ok(pool)
}

pub async fn run_migrations(pool: &DbPool) -> Result<()> {
    sqlx::migrate!("./migrations")
        .run(pool)
        .await
        .context("Failed to run database migrations")?;
    Ok(())
}

/// File-backed pool in a scratch directory, migrated and ready to use
#[cfg(test)]
pub(crate) async fn test_pool() -> (DbPool, tempfile::TempDir) {
    let dir = tempfile::tempdir().unwrap();
    let url = format!("sqlite://{}", dir.path().join("test.db").display());
    let pool = create_pool(&url, &DbConfig::default()).await.unwrap();
    run_migrations(&pool).await.unwrap();
    (pool, dir)
}
