//! App run status
//!
//! Stored as a small integer in `apps.runStatus`. The schema does not constrain
//! the column, so every write goes through [`RunStatus`].

use std::fmt;
use std::str::FromStr;

use serde::{Deserialize, Serialize};

use super::ValidationError;

/// Where an app sits in the testing cycle.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum RunStatus {
    #[serde(rename = "error")]
    Failed,
    Available,
    Testing,
    LogsToProcess,
}

impl RunStatus {
    pub const ALL: [RunStatus; 4] = [
        RunStatus::Failed,
        RunStatus::Available,
        RunStatus::Testing,
        RunStatus::LogsToProcess,
    ];

    /// Column value.
    pub fn code(self) -> i32 {
        match self {
            Self::Failed => -1,
            Self::Available => 0,
            Self::Testing => 1,
            Self::LogsToProcess => 2,
        }
    }

    pub fn as_str(self) -> &'static str {
        match self {
            Self::Failed => "error",
            Self::Available => "available",
            Self::Testing => "testing",
            Self::LogsToProcess => "logs_to_process",
        }
    }
}

impl TryFrom<i32> for RunStatus {
    type Error = ValidationError;

    fn try_from(code: i32) -> Result<Self, ValidationError> {
        Self::ALL
            .into_iter()
            .find(|status| status.code() == code)
            .ok_or_else(|| ValidationError::InvalidVariant {
                field: "run status",
                value: code.to_string(),
            })
    }
}

/// Accepts either the numeric code or the name (`available`, `logs-to-process`, ...).
impl FromStr for RunStatus {
    type Err = ValidationError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let trimmed = s.trim();
        if trimmed.is_empty() {
            return Err(ValidationError::Empty { field: "run status" });
        }

        if let Ok(code) = trimmed.parse::<i32>() {
            return Self::try_from(code);
        }

        let normalized = trimmed.to_ascii_lowercase().replace('-', "_");
        Self::ALL
            .into_iter()
            .find(|status| status.as_str() == normalized)
            .ok_or_else(|| ValidationError::InvalidVariant {
                field: "run status",
                value: trimmed.to_owned(),
            })
    }
}

impl fmt::Display for RunStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{} ({})", self.as_str(), self.code())
    }
}
