//! Fetch error types.

use reqwest::StatusCode;
use thiserror::Error;

// ============================================================================
// Client Error
// ============================================================================

/// Error returned by [`EpbClient`](crate::EpbClient) operations.
///
/// Callers branch on the three kinds: credentials rejected, the API
/// answered with something unusable, or the network is broken.
#[derive(Debug, Error)]
pub enum EpbError {
    /// Credentials rejected or the login response was malformed.
    #[error("Authentication failed: {0}")]
    Auth(String),

    /// The API returned an unexpected status or body.
    #[error("API error{}: {message}", status_suffix(.status))]
    Api {
        /// HTTP status, when the failure came from a response.
        status: Option<u16>,
        /// Response body or description.
        message: String,
    },

    /// Connection failure or timeout.
    #[error("Transport error: {0}")]
    Transport(#[source] reqwest::Error),
}

/// Coarse classification of an [`EpbError`].
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ErrorKind {
    /// Stop polling and ask for new credentials.
    Auth,
    /// Log and skip this cycle.
    Api,
    /// Transient; retry on the host's own schedule.
    Transport,
}

impl EpbError {
    /// Error for a non-success response.
    pub fn status(status: StatusCode, body: impl Into<String>) -> Self {
        Self::Api {
            status: Some(status.as_u16()),
            message: body.into(),
        }
    }

    /// Error for a failure that did not come with a response status.
    pub fn unexpected(message: impl Into<String>) -> Self {
        Self::Api {
            status: None,
            message: message.into(),
        }
    }

    /// Returns the error kind.
    pub fn kind(&self) -> ErrorKind {
        match self {
            Self::Auth(_) => ErrorKind::Auth,
            Self::Api { .. } => ErrorKind::Api,
            Self::Transport(_) => ErrorKind::Transport,
        }
    }

    /// Returns true if the same call might succeed later without changes.
    pub fn is_transient(&self) -> bool {
        self.kind() == ErrorKind::Transport
    }

    /// Returns true if the request timed out.
    pub fn is_timeout(&self) -> bool {
        matches!(self, Self::Transport(e) if e.is_timeout())
    }
}

fn status_suffix(status: &Option<u16>) -> String {
    status.map(|s| format!(" (HTTP {s})")).unwrap_or_default()
}

impl From<HttpError> for EpbError {
    fn from(err: HttpError) -> Self {
        match err {
            HttpError::Request(e) => EpbError::Transport(e),
            other => EpbError::unexpected(other.to_string()),
        }
    }
}

// ============================================================================
// HTTP Error
// ============================================================================

/// HTTP-specific error type.
#[derive(Debug, Error)]
pub enum HttpError {
    /// Request error.
    #[error("Request error: {0}")]
    Request(#[from] reqwest::Error),

    /// Domain not allowed.
    #[error("Domain not allowed: {0}")]
    DomainNotAllowed(String),

    /// Invalid URL.
    #[error("Invalid URL: {0}")]
    InvalidUrl(String),

    /// Invalid header value.
    #[error("Invalid header value for {0}")]
    InvalidHeader(&'static str),
}

// ============================================================================
// Keychain Error
// ============================================================================

/// Error type for keychain operations.
#[derive(Debug, Error)]
pub enum KeychainError {
    /// Credential not found.
    #[error("Credential not found for {service}/{account}")]
    NotFound {
        /// Service name.
        service: String,
        /// Account name.
        account: String,
    },

    /// Access denied.
    #[error("Access denied to keychain")]
    AccessDenied,

    /// Platform error.
    #[error("Platform error: {0}")]
    Platform(String),

    /// Generic error.
    #[error("Keychain error: {0}")]
    Other(String),
}

impl From<keyring::Error> for KeychainError {
    fn from(err: keyring::Error) -> Self {
        match err {
            keyring::Error::NoEntry => KeychainError::NotFound {
                service: String::new(),
                account: String::new(),
            },
            keyring::Error::Ambiguous(_) => {
                KeychainError::Other("Ambiguous credential entry".to_string())
            }
            keyring::Error::PlatformFailure(e) => KeychainError::Platform(e.to_string()),
            keyring::Error::NoStorageAccess(_) => KeychainError::AccessDenied,
            _ => KeychainError::Other(err.to_string()),
        }
    }
}
