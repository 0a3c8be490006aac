//! Category repository
//!
//! Category names are unique and inserted idempotently. An app's mapping is
//! reconciled to exactly the requested set on every call.

use std::collections::BTreeSet;

use serde::Serialize;
use tracing::info;

use super::first_id;
use crate::db::query::{placeholders, InsertIgnore, SqlValue, Statement};
use crate::db::CensusDb;
use crate::error::DbResult;

/// Mapping rows to drop and to add for one app, in ascending key order.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct MappingDelta {
    pub removed: Vec<i64>,
    pub added: Vec<i64>,
}

impl MappingDelta {
    pub fn is_empty(&self) -> bool {
        self.removed.is_empty() && self.added.is_empty()
    }
}

/// Set difference in both directions between the mapped and wanted keys.
pub fn plan_mapping_changes(current: &[i64], wanted: &[i64]) -> MappingDelta {
    let current: BTreeSet<i64> = current.iter().copied().collect();
    let wanted: BTreeSet<i64> = wanted.iter().copied().collect();

    MappingDelta {
        removed: current.difference(&wanted).copied().collect(),
        added: wanted.difference(&current).copied().collect(),
    }
}

/// Category repository
pub struct CategoryRepo<'a> {
    db: &'a CensusDb,
}

impl<'a> CategoryRepo<'a> {
    pub fn new(db: &'a CensusDb) -> Self {
        Self { db }
    }

    /// Map `app_id` to exactly `categories`, creating missing category rows.
    ///
    /// An empty list is a no-op (existing mappings are kept). Reads, deletes
    /// and inserts commit separately, so concurrent calls for the same app
    /// can lose updates.
    pub async fn insert_categories<S: AsRef<str>>(
        &self,
        app_id: i64,
        categories: &[S],
    ) -> DbResult<MappingDelta> {
        let names: BTreeSet<&str> = categories.iter().map(AsRef::as_ref).collect();
        if names.is_empty() {
            return Ok(MappingDelta::default());
        }

        let insert = names
            .iter()
            .fold(InsertIgnore::table("categories", &["categoryName"]), |insert, name| {
                insert.row(vec![SqlValue::from(*name)])
            })
            .build();
        self.db.write(&insert).await?;
        info!("Added {:?} to categories table", names);

        let select = Statement::new(format!(
            "SELECT id FROM categories WHERE categoryName IN ({})",
            placeholders(names.len())
        ))
        .bind_all(names.iter().copied());
        let wanted = self.ids(&select).await?;
        info!("App {} has current category keys {:?}", app_id, wanted);

        let select = Statement::new("SELECT categoryId FROM appCategoriesMapping WHERE appId = ?")
            .bind(app_id);
        let current = self.ids(&select).await?;
        info!("App {} has old category keys {:?}", app_id, current);

        let delta = plan_mapping_changes(&current, &wanted);

        if !delta.removed.is_empty() {
            let delete = Statement::new(format!(
                "DELETE FROM appCategoriesMapping WHERE appId = ? AND categoryId IN ({})",
                placeholders(delta.removed.len())
            ))
            .bind(app_id)
            .bind_all(delta.removed.iter().copied());
            self.db.write(&delete).await?;
            info!("App {} lost old category keys {:?}", app_id, delta.removed);
        }

        if !delta.added.is_empty() {
            let insert = delta
                .added
                .iter()
                .fold(
                    InsertIgnore::table("appCategoriesMapping", &["appId", "categoryId"]),
                    |insert, category_id| {
                        insert.row(vec![SqlValue::from(app_id), SqlValue::from(*category_id)])
                    },
                )
                .build();
            self.db.write(&insert).await?;
            info!("App {} gained new category keys {:?}", app_id, delta.added);
        }

        Ok(delta)
    }

    async fn ids(&self, select: &Statement) -> DbResult<Vec<i64>> {
        self.db
            .fetch_all(select)
            .await?
            .iter()
            .map(first_id)
            .collect()
    }
}
