//! Test result repository - permission usage and network transmissions
//!
//! Rows are upserted on the schema's unique keys and only ever deleted in
//! bulk, per release, before a release is re-tested.

use tracing::info;

use crate::db::query::{Statement, Upsert};
use crate::db::CensusDb;
use crate::error::DbResult;
use crate::models::{NewPermission, NewTransmission};

/// Test result repository
pub struct TestResultRepo<'a> {
    db: &'a CensusDb,
}

impl<'a> TestResultRepo<'a> {
    pub fn new(db: &'a CensusDb) -> Self {
        Self { db }
    }

    pub async fn insert_permission(&self, permission: &NewPermission) -> DbResult<()> {
        let upsert = Upsert::table("testPermissions")
            .value("timestamp", permission.timestamp)
            .value("releaseId", permission.release_id)
            .value("permission", permission.permission.as_str())
            .value("isUsed", permission.is_used)
            .value("testerId", permission.tester_id.as_deref())
            .build();
        self.db.write(&upsert).await?;

        info!(
            "Added permission {} ({}) for release ID {}",
            permission.permission, permission.is_used, permission.release_id
        );
        Ok(())
    }

    /// Delete every permission result of a release, returning the count.
    pub async fn clear_permission_results(&self, release_id: i64) -> DbResult<u64> {
        let delete = Statement::new("DELETE FROM testPermissions WHERE releaseId = ?").bind(release_id);
        let removed = self.db.write(&delete).await?;

        info!("Removed all permissions results for release ID {}", release_id);
        Ok(removed)
    }

    pub async fn insert_transmission(&self, transmission: &NewTransmission) -> DbResult<()> {
        let upsert = Upsert::table("testTransmissions")
            .value("timestamp", transmission.timestamp)
            .value("releaseId", transmission.release_id)
            .value("domain", transmission.domain.as_deref())
            .value("tlsSNI", transmission.tls_sni.as_deref())
            .value("ipAddress", transmission.ip_address.as_deref())
            .value("port", transmission.port)
            .value("isTLS", transmission.is_tls)
            .value("dataType", transmission.data_type.as_str())
            .value("payload", transmission.payload.as_deref())
            .value("testerId", transmission.tester_id.as_deref())
            .build();
        self.db.write(&upsert).await?;

        info!(
            "Added data transmission of type {} to domain {} ({}) for release ID {}",
            transmission.data_type,
            transmission.domain.as_deref().unwrap_or("-"),
            transmission.ip_address.as_deref().unwrap_or("-"),
            transmission.release_id
        );
        Ok(())
    }

    /// Delete every transmission result of a release, returning the count.
    pub async fn clear_transmission_results(&self, release_id: i64) -> DbResult<u64> {
        let delete =
            Statement::new("DELETE FROM testTransmissions WHERE releaseId = ?").bind(release_id);
        let removed = self.db.write(&delete).await?;

        info!("Removed all transmissions results for release ID {}", release_id);
        Ok(removed)
    }
}
