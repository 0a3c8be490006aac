//! Scheduler queries - which app/version to test next
//!
//! Candidates are apps in [`RunStatus::Available`] with at least one untested
//! release, ranked by priority, then install count.

use sqlx::mysql::MySqlRow;
use sqlx::Row;
use tracing::{debug, info, warn};

use crate::db::query::Statement;
use crate::db::CensusDb;
use crate::error::DbResult;
use crate::models::{AppToTest, RunStatus};

const CANDIDATE_SQL: &str = r#"
    SELECT apps.id,
           apps.packageName,
           MAX(appReleases.versionCode),
           apps.installCount,
           apps.priority
    FROM apps
    INNER JOIN appReleases
        ON apps.id = appReleases.appId AND appReleases.tested = 0
    WHERE apps.runStatus = ?
    GROUP BY apps.id, apps.packageName, apps.installCount, apps.priority
    ORDER BY apps.priority DESC, apps.installCount DESC
    LIMIT 1
"#;

/// Scheduler repository
pub struct SchedulerRepo<'a> {
    db: &'a CensusDb,
}

impl<'a> SchedulerRepo<'a> {
    pub fn new(db: &'a CensusDb) -> Self {
        Self { db }
    }

    /// Highest ranked candidate and its newest untested version code.
    ///
    /// Nothing is reserved: concurrent callers can be handed the same app.
    /// Use [`claim_app_to_test`](Self::claim_app_to_test) when several
    /// testers share the database.
    pub async fn get_app_to_test(&self) -> DbResult<Option<AppToTest>> {
        match self.next_candidate().await? {
            Some((_, candidate)) => {
                log_candidate(&candidate);
                Ok(Some(candidate))
            }
            None => {
                warn!("Found no apps to test from the database");
                Ok(None)
            }
        }
    }

    /// Pick the same candidate as [`get_app_to_test`](Self::get_app_to_test)
    /// and move it to [`RunStatus::Testing`].
    ///
    /// The candidate is read without locks and then claimed with an update
    /// that only matches while the app is still available. When a concurrent
    /// claimer got there first the update matches nothing and the next
    /// candidate is tried, so `None` means no candidate is left.
    pub async fn claim_app_to_test(&self) -> DbResult<Option<AppToTest>> {
        loop {
            let Some((app_id, candidate)) = self.next_candidate().await? else {
                warn!("Found no apps to claim from the database");
                return Ok(None);
            };

            let claim = Statement::new("UPDATE apps SET runStatus = ? WHERE id = ? AND runStatus = ?")
                .bind(RunStatus::Testing.code())
                .bind(app_id)
                .bind(RunStatus::Available.code());
            if self.db.write(&claim).await? == 1 {
                info!("Claimed app {} ({}) for testing", app_id, candidate.package_name);
                log_candidate(&candidate);
                return Ok(Some(candidate));
            }

            debug!("App {} was claimed concurrently, trying the next candidate", app_id);
        }
    }

    async fn next_candidate(&self) -> DbResult<Option<(i64, AppToTest)>> {
        let select = Statement::new(CANDIDATE_SQL).bind(RunStatus::Available.code());
        match self.db.fetch_optional(&select).await? {
            Some(row) => Ok(Some(candidate_from_row(&row)?)),
            None => Ok(None),
        }
    }
}

fn candidate_from_row(row: &MySqlRow) -> DbResult<(i64, AppToTest)> {
    let app_id = row.try_get(0)?;
    let candidate = AppToTest {
        package_name: row.try_get(1)?,
        version_code: row.try_get(2)?,
        install_count: row.try_get(3)?,
        priority: row.try_get(4)?,
    };
    Ok((app_id, candidate))
}

fn log_candidate(candidate: &AppToTest) {
    info!(
        "Found package {} version code {} (priority {}, {} installs)",
        candidate.package_name, candidate.version_code, candidate.priority, candidate.install_count
    );
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::DatabaseConfig;
    use crate::error::DbError;

    #[test]
    fn candidate_query_ranks_available_apps() {
        let sql = CANDIDATE_SQL.split_whitespace().collect::<Vec<_>>().join(" ");
        assert!(sql.contains("WHERE apps.runStatus = ?"));
        assert!(sql.contains("ORDER BY apps.priority DESC, apps.installCount DESC LIMIT 1"));
        assert!(!sql.contains("FOR UPDATE"));
    }

    #[tokio::test]
    async fn claim_on_closed_handle_fails_fast() {
        let db = CensusDb::connect_lazy(&DatabaseConfig::new("db.invalid", "appcensus", "appcensus", ""));
        db.close().await;

        let err = db.scheduler().claim_app_to_test().await.unwrap_err();
        assert!(matches!(err, DbError::NotConnected));
    }
}
