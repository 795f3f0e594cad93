use std::time::Duration;

use sqlx::{postgres::PgPoolOptions, PgPool};
use tracing::info;

use super::store::StoreError;
use crate::config::DatabaseConfig;

/// Builds and checks the connection pool for the backing store
pub struct DatabaseManager;

impl DatabaseManager {
    /// Create the pool described by `config`. Connections are opened lazily
    /// per request and returned when the request finishes.
    pub async fn connect(config: &DatabaseConfig) -> Result<PgPool, StoreError> {
        let connection_string = Self::connection_string(config)?;

        let pool = PgPoolOptions::new()
            .max_connections(config.max_connections)
            .acquire_timeout(Duration::from_secs(config.connection_timeout))
            .connect(&connection_string)
            .await?;

        info!(
            "Created database pool (max {} connections, schema '{}')",
            config.max_connections, config.schema
        );
        Ok(pool)
    }

    fn connection_string(config: &DatabaseConfig) -> Result<String, StoreError> {
        let base = config
            .url
            .as_deref()
            .ok_or(StoreError::ConfigMissing("DATABASE_URL"))?;

        let url = url::Url::parse(base).map_err(|_| StoreError::InvalidDatabaseUrl)?;
        match url.scheme() {
            "postgres" | "postgresql" => Ok(url.into()),
            _ => Err(StoreError::InvalidDatabaseUrl),
        }
    }

    /// Pings the pool to ensure connectivity
    pub async fn health_check(pool: &PgPool) -> Result<(), StoreError> {
        sqlx::query("SELECT 1").execute(pool).await?;
        Ok(())
    }
}
