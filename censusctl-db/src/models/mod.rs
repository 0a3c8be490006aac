//! Domain models for the census tables

mod records;
mod run_status;
mod validation;

pub use records::*;
pub use run_status::RunStatus;
pub use validation::ValidationError;
