//! The census database handle and its statement executor

use sqlx::mysql::{MySqlQueryResult, MySqlRow};
use sqlx::MySqlPool;
use tracing::info;

use super::query::{Statement, ValueLogging};
use super::repos::{AppRepo, CategoryRepo, CompanyRepo, ReleaseRepo, SchedulerRepo, TestResultRepo};
use super::pool;
use crate::config::DatabaseConfig;
use crate::error::{DbError, DbResult};

/// Explicit handle to the census database.
///
/// Cloning is cheap and shares the underlying session. Once [`close`](Self::close)
/// has run, every operation fails with [`DbError::NotConnected`] before
/// anything is sent.
#[derive(Clone)]
pub struct CensusDb {
    pool: MySqlPool,
    value_logging: ValueLogging,
}

impl CensusDb {
    /// Connect using `config`.
    pub async fn connect(config: &DatabaseConfig) -> DbResult<Self> {
        let pool = pool::create_pool(config).await?;
        info!(
            host = %config.host,
            database = %config.database,
            user = %config.user,
            "Connected to census database"
        );
        Ok(Self::from_pool(pool))
    }

    /// Handle whose connection is opened on first use.
    pub fn connect_lazy(config: &DatabaseConfig) -> Self {
        Self::from_pool(pool::create_lazy_pool(config))
    }

    pub fn from_pool(pool: MySqlPool) -> Self {
        Self {
            pool,
            value_logging: ValueLogging::default(),
        }
    }

    pub fn with_value_logging(mut self, value_logging: ValueLogging) -> Self {
        self.value_logging = value_logging;
        self
    }

    pub fn pool(&self) -> &MySqlPool {
        &self.pool
    }

    pub fn is_open(&self) -> bool {
        !self.pool.is_closed()
    }

    /// Close the session. Clones of this handle are closed too.
    pub async fn close(&self) {
        self.pool.close().await;
        info!("Closed census database connection");
    }

    pub fn companies(&self) -> CompanyRepo<'_> {
        CompanyRepo::new(self)
    }

    pub fn apps(&self) -> AppRepo<'_> {
        AppRepo::new(self)
    }

    pub fn releases(&self) -> ReleaseRepo<'_> {
        ReleaseRepo::new(self)
    }

    pub fn categories(&self) -> CategoryRepo<'_> {
        CategoryRepo::new(self)
    }

    pub fn results(&self) -> TestResultRepo<'_> {
        TestResultRepo::new(self)
    }

    pub fn scheduler(&self) -> SchedulerRepo<'_> {
        SchedulerRepo::new(self)
    }

    // ========================================================================
    // Executor
    // ========================================================================

    pub(crate) fn ensure_open(&self) -> DbResult<()> {
        if self.pool.is_closed() {
            return Err(DbError::NotConnected);
        }
        Ok(())
    }

    fn log_statement(&self, stmt: &Statement) {
        if stmt.values().is_empty() {
            info!(sql = %compact_sql(stmt.sql()), "Query");
        } else {
            info!(
                sql = %compact_sql(stmt.sql()),
                values = %self.value_logging.render(stmt.values()),
                "Query"
            );
        }
    }

    async fn execute(&self, stmt: &Statement) -> DbResult<MySqlQueryResult> {
        self.ensure_open()?;
        self.log_statement(stmt);
        Ok(stmt.query().execute(&self.pool).await?)
    }

    /// Run a write and report the commit. Every statement is committed on
    /// its own.
    pub(crate) async fn write(&self, stmt: &Statement) -> DbResult<u64> {
        let result = self.execute(stmt).await?;
        info!(rows_affected = result.rows_affected(), "DB committed");
        Ok(result.rows_affected())
    }

    pub(crate) async fn fetch_optional(&self, stmt: &Statement) -> DbResult<Option<MySqlRow>> {
        self.ensure_open()?;
        self.log_statement(stmt);
        Ok(stmt.query().fetch_optional(&self.pool).await?)
    }

    pub(crate) async fn fetch_all(&self, stmt: &Statement) -> DbResult<Vec<MySqlRow>> {
        self.ensure_open()?;
        self.log_statement(stmt);
        Ok(stmt.query().fetch_all(&self.pool).await?)
    }
}

/// Collapse the indentation of multi-line SQL for single-line log records.
fn compact_sql(sql: &str) -> String {
    sql.split_whitespace().collect::<Vec<_>>().join(" ")
}
