//! Company repository
//!
//! Companies are keyed by display name (`commonName`).

use tracing::info;

use super::first_id;
use crate::db::query::{Statement, Upsert};
use crate::db::CensusDb;
use crate::error::{DbError, DbResult};
use crate::models::NewCompany;

/// Company repository
pub struct CompanyRepo<'a> {
    db: &'a CensusDb,
}

impl<'a> CompanyRepo<'a> {
    pub fn new(db: &'a CensusDb) -> Self {
        Self { db }
    }

    /// Insert or update a company, returning its id.
    ///
    /// The type falls back to `"dev"` when a developer id is given without
    /// an explicit type. An existing row keeps its stored developer id.
    pub async fn insert_company(&self, company: &NewCompany) -> DbResult<i64> {
        self.db.write(&company_upsert(company)).await?;

        let id = self.id_for_name(&company.name).await?;
        info!("Added {} ({}) to companies table", id, company.name);
        Ok(id)
    }

    async fn id_for_name(&self, name: &str) -> DbResult<i64> {
        let select = Statement::new("SELECT id FROM companies WHERE commonName = ?").bind(name);
        let row = self
            .db
            .fetch_optional(&select)
            .await?
            .ok_or_else(|| DbError::not_found("company", name))?;
        first_id(&row)
    }
}

fn company_upsert(company: &NewCompany) -> Statement {
    Upsert::table("companies")
        .insert_only("googleDevId", company.google_dev_id.as_deref())
        .value("commonName", company.name.as_str())
        .value("type", company.resolved_type())
        .build()
}
