//! Core error types for `EPBMeter`.

use thiserror::Error;

/// Core error type for `EPBMeter` operations.
#[derive(Debug, Error)]
pub enum CoreError {
    /// Invalid configuration.
    #[error("Invalid configuration: {0}")]
    InvalidConfig(String),

    /// Invalid data from API response.
    #[error("Invalid data: {0}")]
    InvalidData(String),

    /// Unknown IANA time zone name.
    #[error("Unknown time zone: {0}")]
    UnknownTimeZone(String),

    /// Serialization/deserialization error.
    #[error("Serialization error: {0}")]
    Serialization(#[from] serde_json::Error),
}
