//! Repository implementations for the census tables
//!
//! Each repository borrows the [`CensusDb`](super::CensusDb) handle and
//! follows these patterns:
//! - Upserts go through `Upsert`, then select the key by business key
//! - Getters return `Ok(None)` for missing rows and log a warning
//! - Preconditions are checked before any statement is built

pub mod apps;
pub mod categories;
pub mod companies;
pub mod releases;
pub mod results;
pub mod scheduler;

pub use apps::AppRepo;
pub use categories::{plan_mapping_changes, CategoryRepo, MappingDelta};
pub use companies::CompanyRepo;
pub use releases::ReleaseRepo;
pub use results::TestResultRepo;
pub use scheduler::SchedulerRepo;

use sqlx::mysql::MySqlRow;
use sqlx::Row;

use crate::error::DbResult;

/// First column of `row` as an id.
pub(crate) fn first_id(row: &MySqlRow) -> DbResult<i64> {
    Ok(row.try_get::<i64, _>(0)?)
}
