//! Database layer - handle, executor and repositories
//!
//! # Design Principles
//!
//! - One explicit handle (`CensusDb`), no global connection state
//! - Every statement goes through the executor, which logs it
//! - Upserts rely on the schema's unique keys (ON DUPLICATE KEY UPDATE),
//!   then read the key back by business key
//! - Each write commits on its own unless an operation opens a transaction

pub mod handle;
pub mod pool;
pub mod query;
pub mod repos;

pub use handle::CensusDb;
pub use pool::{create_lazy_pool, create_pool};
pub use query::{InsertIgnore, SqlValue, Statement, Upsert, ValueLogging};
pub use repos::*;
