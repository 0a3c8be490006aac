//! Database connection pool management
//!
//! Uses a sqlx MySqlPool capped at `max_connections` (1 by default, one
//! shared session).

use sqlx::mysql::MySqlPoolOptions;
use sqlx::MySqlPool;

use crate::config::DatabaseConfig;

/// Connect to the MySQL server described by `config`.
///
/// # Errors
///
/// Returns an error if the connection fails.
///
/// # Example
///
/// ```ignore
/// let pool = create_pool(&DatabaseConfig::new("localhost", "appcensus", "appcensus", "pw")).await?;
/// ```
pub async fn create_pool(config: &DatabaseConfig) -> Result<MySqlPool, sqlx::Error> {
    pool_options(config)
        .connect_with(config.connect_options())
        .await
}

/// Build a pool that connects on first use. Must be called inside a tokio
/// runtime.
pub fn create_lazy_pool(config: &DatabaseConfig) -> MySqlPool {
    pool_options(config).connect_lazy_with(config.connect_options())
}

fn pool_options(config: &DatabaseConfig) -> MySqlPoolOptions {
    MySqlPoolOptions::new().max_connections(config.max_connections.max(1))
}
