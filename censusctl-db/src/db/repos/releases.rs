//! Release repository
//!
//! Releases are keyed by `(appId, versionCode)`.

use tracing::{info, warn};

use super::first_id;
use crate::db::query::{Statement, Upsert};
use crate::db::CensusDb;
use crate::error::{DbError, DbResult};
use crate::models::{NewRelease, RunStatus};

/// Release repository
pub struct ReleaseRepo<'a> {
    db: &'a CensusDb,
}

impl<'a> ReleaseRepo<'a> {
    pub fn new(db: &'a CensusDb) -> Self {
        Self { db }
    }

    /// Insert or update a release, returning its id.
    pub async fn insert_app_release(&self, release: &NewRelease) -> DbResult<i64> {
        let upsert = Upsert::table("appReleases")
            .value("appId", release.app_id)
            .value("versionCode", release.version_code)
            .value("versionString", release.version_string.as_str())
            .value("timestampPublish", release.timestamp_publish)
            .value("timestampDownload", release.timestamp_download)
            .value("hasInAppPurchases", release.has_in_app_purchases)
            .value("hasAds", release.has_ads)
            .value("socialNetworks", release.social_networks)
            .value("tested", release.tested)
            .build();
        self.db.write(&upsert).await?;

        let select = Statement::new("SELECT id FROM appReleases WHERE appId = ? AND versionCode = ?")
            .bind(release.app_id)
            .bind(release.version_code);
        let row = self.db.fetch_optional(&select).await?.ok_or_else(|| {
            DbError::not_found(
                "release",
                format!("app {} version {}", release.app_id, release.version_code),
            )
        })?;
        let id = first_id(&row)?;

        info!("Added {} ({}) to appReleases table", id, release.version_code);
        Ok(id)
    }

    /// Set the tested flag of a release.
    ///
    /// Marking a release tested also puts its app back to
    /// [`RunStatus::Available`]. That is a second, separately committed
    /// statement: a failure in between leaves the release tested and the
    /// app status unchanged.
    pub async fn update_release_tested(&self, release_id: i64, tested: bool) -> DbResult<()> {
        let update = Statement::new("UPDATE appReleases SET tested = ? WHERE id = ?")
            .bind(tested)
            .bind(release_id);
        self.db.write(&update).await?;
        info!("Marked release id {} as tested={}", release_id, tested);

        if tested {
            let reset = Statement::new(
                r#"
                UPDATE apps
                SET runStatus = ?
                WHERE id IN (SELECT appId FROM appReleases WHERE id = ?)
                "#,
            )
            .bind(RunStatus::Available.code())
            .bind(release_id);
            self.db.write(&reset).await?;
            info!("Marked app for release id {} as runStatus=0", release_id);
        }

        Ok(())
    }

    /// Resolve `(package, version code)` to a release id.
    pub async fn get_release_id(
        &self,
        package_name: &str,
        version_code: i64,
    ) -> DbResult<Option<i64>> {
        let select = Statement::new(
            r#"
            SELECT id FROM appReleases
            WHERE appId IN (SELECT id FROM apps WHERE packageName = ?)
            AND versionCode = ?
            "#,
        )
        .bind(package_name)
        .bind(version_code);

        match self.db.fetch_optional(&select).await? {
            Some(row) => {
                let id = first_id(&row)?;
                info!(
                    "Found releaseId {} for package {} version {}",
                    id, package_name, version_code
                );
                Ok(Some(id))
            }
            None => {
                warn!(
                    "Found no releaseId for package {} version {}",
                    package_name, version_code
                );
                Ok(None)
            }
        }
    }

    pub async fn is_app_in_db(&self, package_name: &str, version_code: i64) -> DbResult<bool> {
        Ok(self.get_release_id(package_name, version_code).await?.is_some())
    }
}
