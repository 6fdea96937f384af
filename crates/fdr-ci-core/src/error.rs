//! Error types for fdr-ci-core.
//!
//! Only construction and configuration can fail. Query-time anomalies
//! (NaN p-values, empty strata, unfrozen cutoffs) degrade toward the
//! conservative "dependent" decision instead of surfacing here.

use thiserror::Error;

/// Top-level error type for fdr-ci-core.
#[derive(Debug, Error)]
pub enum FdrError {
    /// Target false discovery rate outside the open interval (0, 1).
    #[error("Invalid target FDR: {value} (must lie strictly between 0 and 1)")]
    InvalidTargetFdr {
        /// Rejected value
        value: f64,
    },

    #[error("Configuration error: {0}")]
    ConfigError(String),

    /// Invalid parameter provided.
    #[error("Invalid parameter: {message}")]
    InvalidParameter {
        /// Description of what's wrong with the parameter
        message: String,
    },
}

impl FdrError {
    /// Create an InvalidTargetFdr error.
    pub fn invalid_target_fdr(value: f64) -> Self {
        Self::InvalidTargetFdr { value }
    }

    /// Create an InvalidParameter error.
    pub fn invalid_parameter(message: impl Into<String>) -> Self {
        Self::InvalidParameter {
            message: message.into(),
        }
    }
}

impl From<config::ConfigError> for FdrError {
    fn from(err: config::ConfigError) -> Self {
        FdrError::ConfigError(err.to_string())
    }
}

impl From<toml::de::Error> for FdrError {
    fn from(err: toml::de::Error) -> Self {
        FdrError::ConfigError(format!("Failed to parse config file: {}", err))
    }
}

/// Result type alias for fdr-ci operations.
pub type FdrResult<T> = Result<T, FdrError>;
