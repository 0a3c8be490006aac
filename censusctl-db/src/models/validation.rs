//! Validation error types

use thiserror::Error;

/// Rejected value parsed from user input (CLI arguments, config, env)
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum ValidationError {
    #[error("{field} cannot be empty")]
    Empty { field: &'static str },

    #[error("invalid {field} value: '{value}'")]
    InvalidVariant { field: &'static str, value: String },
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn error_display() {
        let err = ValidationError::InvalidVariant {
            field: "run status",
            value: "5".into(),
        };
        assert_eq!(err.to_string(), "invalid run status value: '5'");
        assert_eq!(
            ValidationError::Empty { field: "package name" }.to_string(),
            "package name cannot be empty"
        );
    }
}
