//! Error types for configuration loading.

use thiserror::Error;

/// Result alias for configuration operations.
pub type ConfigResult<T> = Result<T, ConfigError>;

/// Configuration failures.
#[derive(Debug, Error, PartialEq, Eq)]
pub enum ConfigError {
    /// Field contained an invalid value.
    #[error("invalid configuration field")]
    InvalidField {
        /// Field that failed validation.
        field: &'static str,
        /// Offending value when available.
        value: Option<String>,
        /// Machine-readable reason for the failure.
        reason: &'static str,
    },
}

impl ConfigError {
    /// Invalid-field error for `field`.
    #[must_use]
    pub fn invalid(
        field: &'static str,
        value: Option<String>,
        reason: &'static str,
    ) -> Self {
        Self::InvalidField {
            field,
            value,
            reason,
        }
    }

    /// Operator-facing description including the field and reason.
    #[must_use]
    pub fn detail(&self) -> String {
        match self {
            Self::InvalidField {
                field,
                value: Some(value),
                reason,
            } => format!("{field}: {reason} (got '{value}')"),
            Self::InvalidField {
                field,
                value: None,
                reason,
            } => format!("{field}: {reason}"),
        }
    }
}
