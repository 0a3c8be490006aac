//! Error types for censusctl-db

use thiserror::Error;

pub type DbResult<T> = Result<T, DbError>;

/// Database error type
///
/// Precondition failures (`NotConnected`, `InvalidRunStatus`) are raised before
/// any statement reaches the server. Driver errors pass through untouched.
#[derive(Debug, Error)]
pub enum DbError {
    #[error("no database connection established, connect a CensusDb handle first")]
    NotConnected,

    #[error("invalid run status {0}, must be -1 (error), 0 (available), 1 (testing) or 2 (logs to process)")]
    InvalidRunStatus(i32),

    #[error("database error: {0}")]
    Sqlx(#[from] sqlx::Error),

    #[error("not found: {resource} '{id}'")]
    NotFound { resource: &'static str, id: String },
}

impl DbError {
    pub(crate) fn not_found(resource: &'static str, id: impl ToString) -> Self {
        Self::NotFound {
            resource,
            id: id.to_string(),
        }
    }

    /// True for failures raised before a statement was sent.
    pub fn is_precondition(&self) -> bool {
        matches!(self, Self::NotConnected | Self::InvalidRunStatus(_))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn error_display() {
        let err = DbError::not_found("app", "com.example.app");
        assert_eq!(err.to_string(), "not found: app 'com.example.app'");

        let err = DbError::InvalidRunStatus(5);
        assert!(err.to_string().starts_with("invalid run status 5"));
    }

    #[test]
    fn precondition_classification() {
        assert!(DbError::NotConnected.is_precondition());
        assert!(DbError::InvalidRunStatus(7).is_precondition());
        assert!(!DbError::Sqlx(sqlx::Error::RowNotFound).is_precondition());
        assert!(!DbError::not_found("release", 3).is_precondition());
    }
}
