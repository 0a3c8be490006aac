//! censusctl-db: data-access layer for the app census testing pipeline
//!
//! Records companies, apps, releases, categories and the permission and
//! network results of automated test runs, and picks the next app to test.
//! The schema is owned elsewhere; this crate only reads and writes it.
//!
//! ```ignore
//! use censusctl_db::{CensusDb, DatabaseConfig, NewApp, NewCompany};
//!
//! let db = CensusDb::connect(&DatabaseConfig::new("localhost", "appcensus", "appcensus", "pw")).await?;
//! let company = db.companies().insert_company(&NewCompany::new("Example Corp")).await?;
//! let app = db.apps().insert_app(&NewApp::new(company, "com.example.app", "Example")).await?;
//! if let Some(next) = db.scheduler().get_app_to_test().await? {
//!     println!("test {} @ {}", next.package_name, next.version_code);
//! }
//! ```

pub mod config;
pub mod db;
pub mod error;
pub mod models;

pub use config::{CensusConfig, DatabaseConfig, LoggingConfig};
pub use db::{CensusDb, MappingDelta, ValueLogging};
pub use error::{DbError, DbResult};
pub use models::{
    current_timestamp, AppToTest, NewApp, NewCompany, NewPermission, NewRelease, NewTransmission,
    RunStatus,
};
