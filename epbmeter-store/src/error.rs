//! Store error types.

use epbmeter_core::CoreError;
use epbmeter_fetch::{EpbError, HttpError, KeychainError};
use thiserror::Error;

/// Errors that can occur in the store.
#[derive(Debug, Error)]
pub enum StoreError {
    /// Credentials were rejected. Polling should stop until they change.
    #[error("Authentication failed: {0}")]
    AuthFailed(String),

    /// Fetch error.
    #[error("Fetch failed: {0}")]
    FetchFailed(String),

    /// No credentials in the environment or keychain.
    #[error("No EPB credentials found; run `epbmeter login` or set EPB_USERNAME and EPB_PASSWORD")]
    CredentialsMissing,

    /// Keychain error.
    #[error(transparent)]
    Keychain(#[from] KeychainError),

    /// IO error.
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    /// Serialization error.
    #[error("Serialization error: {0}")]
    Serialization(#[from] serde_json::Error),

    /// Configuration error.
    #[error("Configuration error: {0}")]
    Config(String),
}

impl StoreError {
    /// Returns true if this is a transient error that might succeed on retry.
    pub fn is_transient(&self) -> bool {
        matches!(self, StoreError::FetchFailed(_) | StoreError::Io(_))
    }

    /// Returns true if the credentials need attention.
    pub fn is_auth(&self) -> bool {
        matches!(self, StoreError::AuthFailed(_) | StoreError::CredentialsMissing)
    }

    /// Maps a client error, keeping authentication failures distinct.
    pub(crate) fn from_fetch(err: EpbError) -> Self {
        match err {
            EpbError::Auth(msg) => StoreError::AuthFailed(msg),
            other => StoreError::FetchFailed(other.to_string()),
        }
    }
}

impl From<CoreError> for StoreError {
    fn from(err: CoreError) -> Self {
        StoreError::Config(err.to_string())
    }
}

impl From<HttpError> for StoreError {
    fn from(err: HttpError) -> Self {
        StoreError::Config(format!("HTTP client: {err}"))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_auth_errors_are_kept_apart() {
        let err = StoreError::from_fetch(EpbError::Auth("bad password".to_string()));
        assert!(matches!(err, StoreError::AuthFailed(ref m) if m == "bad password"));
        assert!(err.is_auth());
        assert!(!err.is_transient());

        let err = StoreError::from_fetch(EpbError::Api {
            status: Some(503),
            message: "down".to_string(),
        });
        assert!(matches!(err, StoreError::FetchFailed(_)));
        assert!(err.is_transient());
    }
}
