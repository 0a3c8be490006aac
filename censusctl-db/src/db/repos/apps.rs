//! App repository
//!
//! Apps are keyed by package name. Besides the upsert this holds the
//! single-column updates the testing pipeline performs on `apps`.

use tracing::{info, warn};

use super::first_id;
use crate::db::query::{Statement, Upsert};
use crate::db::CensusDb;
use crate::error::{DbError, DbResult};
use crate::models::{current_timestamp, NewApp, RunStatus};

/// App repository
pub struct AppRepo<'a> {
    db: &'a CensusDb,
}

impl<'a> AppRepo<'a> {
    pub fn new(db: &'a CensusDb) -> Self {
        Self { db }
    }

    /// Insert or update an app, returning its id.
    ///
    /// Every column is overwritten on conflict, including `runStatus`.
    pub async fn insert_app(&self, app: &NewApp) -> DbResult<i64> {
        let upsert = Upsert::table("apps")
            .value("packageName", app.package_name.as_str())
            .value("commonName", app.common_name.as_str())
            .value("devCompanyId", app.dev_company_id)
            .value("productUrl", app.product_url.as_deref())
            .value("timestampLastChecked", app.resolved_last_checked())
            .value("iconUrl", app.icon_url.as_deref())
            .value("installCount", app.install_count)
            .value("runStatus", app.run_status.code())
            .value("isFamily", app.is_family)
            .build();
        self.db.write(&upsert).await?;

        let id = self.require_app_id(&app.package_name).await?;
        info!("Added {} ({}) to apps table", id, app.package_name);
        Ok(id)
    }

    /// Set `timestampLastChecked` (now when `last_checked` is `None`) and
    /// return the app id.
    pub async fn update_app_check_time(
        &self,
        package_name: &str,
        last_checked: Option<i64>,
    ) -> DbResult<i64> {
        let last_checked = last_checked.unwrap_or_else(current_timestamp);
        let update = Statement::new("UPDATE apps SET timestampLastChecked = ? WHERE packageName = ?")
            .bind(last_checked)
            .bind(package_name);
        self.db.write(&update).await?;

        let id = self.require_app_id(package_name).await?;
        info!("Updated check time to {} for {} ({})", last_checked, id, package_name);
        Ok(id)
    }

    /// Validate a raw run status code, then store it.
    ///
    /// Codes outside -1..=2 fail with [`DbError::InvalidRunStatus`] and
    /// nothing is sent to the database.
    pub async fn update_app_run_status(&self, package_name: &str, run_status: i32) -> DbResult<()> {
        let status =
            RunStatus::try_from(run_status).map_err(|_| DbError::InvalidRunStatus(run_status))?;
        self.set_run_status(package_name, status).await
    }

    pub async fn set_run_status(&self, package_name: &str, status: RunStatus) -> DbResult<()> {
        let update = Statement::new("UPDATE apps SET runStatus = ? WHERE packageName = ?")
            .bind(status.code())
            .bind(package_name);
        self.db.write(&update).await?;

        info!("Updated run status to {} for package {}", status, package_name);
        Ok(())
    }

    pub async fn update_app_icon(&self, package_name: &str, icon_url: Option<&str>) -> DbResult<()> {
        warn!("update_app_icon() is meant for testing purposes only");
        let update = Statement::new("UPDATE apps SET iconUrl = ? WHERE packageName = ?")
            .bind(icon_url)
            .bind(package_name);
        self.db.write(&update).await?;

        info!("Updated iconUrl for {}", package_name);
        Ok(())
    }

    pub async fn update_family(&self, package_name: &str, is_family: bool) -> DbResult<()> {
        warn!("update_family() is meant for testing purposes only");
        let update = Statement::new("UPDATE apps SET isFamily = ? WHERE packageName = ?")
            .bind(is_family)
            .bind(package_name);
        self.db.write(&update).await?;

        info!("Updated family flag to {} for {}", is_family, package_name);
        Ok(())
    }

    pub async fn update_app_install_count(
        &self,
        package_name: &str,
        install_count: i64,
    ) -> DbResult<()> {
        warn!("update_app_install_count() is meant for testing purposes only");
        let update = Statement::new("UPDATE apps SET installCount = ? WHERE packageName = ?")
            .bind(install_count)
            .bind(package_name);
        self.db.write(&update).await?;

        info!("Updated installCount for {} to {}", package_name, install_count);
        Ok(())
    }

    /// Resolve a package name to its app id.
    pub async fn get_app_id(&self, package_name: &str) -> DbResult<Option<i64>> {
        let select = Statement::new("SELECT id FROM apps WHERE packageName = ?").bind(package_name);

        match self.db.fetch_optional(&select).await? {
            Some(row) => {
                let id = first_id(&row)?;
                info!("Found appId {} for package {}", id, package_name);
                Ok(Some(id))
            }
            None => {
                warn!("Found no appId for package {}", package_name);
                Ok(None)
            }
        }
    }

    async fn require_app_id(&self, package_name: &str) -> DbResult<i64> {
        self.get_app_id(package_name)
            .await?
            .ok_or_else(|| DbError::not_found("app", package_name))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::DatabaseConfig;

    fn unreachable_db() -> CensusDb {
        CensusDb::connect_lazy(&DatabaseConfig::new("db.invalid", "appcensus", "appcensus", ""))
    }

    #[tokio::test]
    async fn invalid_run_status_rejected_before_any_statement() {
        let db = unreachable_db();

        for code in [5, 3, -2] {
            let err = db
                .apps()
                .update_app_run_status("com.example.app", code)
                .await
                .unwrap_err();
            assert!(matches!(err, DbError::InvalidRunStatus(c) if c == code));
        }

        // The lazy pool never opened a connection.
        assert_eq!(db.pool().size(), 0);
    }

    #[tokio::test]
    async fn closed_handle_fails_fast() {
        let db = unreachable_db();
        db.close().await;

        let err = db.apps().get_app_id("com.example.app").await.unwrap_err();
        assert!(matches!(err, DbError::NotConnected));

        let err = db
            .apps()
            .update_app_run_status("com.example.app", 1)
            .await
            .unwrap_err();
        assert!(matches!(err, DbError::NotConnected));
    }
}
