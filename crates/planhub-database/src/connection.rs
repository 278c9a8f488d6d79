//! PostgreSQL pool setup shared by the store adapters.

use std::time::Duration;

use sqlx::postgres::{PgPool, PgPoolOptions};
use tracing::info;

use planhub_core::config::database::DatabaseConfig;
use planhub_core::error::{AppError, ErrorKind};
use planhub_core::result::AppResult;

/// The connection pool every `Pg*Store` draws from.
///
/// Cheap to clone; all clones share the same underlying pool.
#[derive(Debug, Clone)]
pub struct DatabasePool {
    pool: PgPool,
}

impl DatabasePool {
    /// Open the pool against the configured database.
    ///
    /// The connection URL is never logged; it carries credentials.
    pub async fn connect(config: &DatabaseConfig) -> AppResult<Self> {
        let pool = PgPoolOptions::new()
            .max_connections(config.pool_size)
            .acquire_timeout(Duration::from_secs(config.acquire_timeout_seconds))
            .idle_timeout(Duration::from_secs(config.idle_timeout_seconds))
            .connect(&config.url)
            .await
            .map_err(|e| {
                AppError::with_source(ErrorKind::Database, "Failed to connect to PostgreSQL", e)
            })?;

        info!(
            pool_size = config.pool_size,
            acquire_timeout_seconds = config.acquire_timeout_seconds,
            "Connected to PostgreSQL"
        );
        Ok(Self { pool })
    }

    /// The underlying sqlx pool, for ad-hoc queries outside the stores.
    pub fn pool(&self) -> &PgPool {
        &self.pool
    }

    /// Round-trip a query to verify the database is reachable.
    pub async fn health_check(&self) -> AppResult<()> {
        sqlx::query("SELECT 1")
            .execute(&self.pool)
            .await
            .map(|_| ())
            .map_err(|e| AppError::with_source(ErrorKind::Database, "Health check failed", e))
    }

    /// Close every connection in the pool.
    pub async fn close(&self) {
        self.pool.close().await;
        info!("Database pool closed");
    }
}
